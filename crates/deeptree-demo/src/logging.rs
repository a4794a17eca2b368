#![forbid(unsafe_code)]

//! Log subscriber setup and the tracing diagnostic sink.

use deeptree_core::{DiagnosticEvent, DiagnosticSink};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::error::{DemoError, Result};

/// Install the global subscriber. `RUST_LOG` overrides the default level.
pub fn init(verbose: bool, json: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);
    let installed = if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().without_time().with_writer(std::io::stderr))
            .try_init()
    };
    installed.map_err(|err| DemoError::Logging {
        message: err.to_string(),
    })
}

/// Forwards every recompute and memo decision as a debug event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&mut self, event: &DiagnosticEvent<'_>) {
        debug!(
            target: "deeptree::diagnostics",
            kind = event.kind.event_name(),
            category = event.category,
            node = %event.node,
            count = event.count,
            "diagnostic"
        );
    }
}
