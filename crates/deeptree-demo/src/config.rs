#![forbid(unsafe_code)]

//! Run configuration.
//!
//! Command-line arguments (with `DEEPTREE_*` environment fallbacks) are
//! resolved against the variant's defaults into a [`DemoConfig`].

use clap::{Args, ValueEnum};
use tracing::debug;

use crate::app::Variant;
use crate::error::Result;
use crate::inputs::RangeInput;
use crate::script::{Trigger, parse_script};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    #[arg(long, value_enum, default_value_t = Variant::Baseline, env = "DEEPTREE_VARIANT")]
    pub variant: Variant,

    /// Initial depth of the above tree; clamped to [0, 100].
    #[arg(long, env = "DEEPTREE_ABOVE_DEPTH", allow_negative_numbers = true)]
    pub above_depth: Option<i64>,

    /// Initial depth of the below tree; clamped to [0, 100].
    #[arg(long, env = "DEEPTREE_BELOW_DEPTH", allow_negative_numbers = true)]
    pub below_depth: Option<i64>,

    /// Trigger to apply after mounting, repeatable. Replaces the variant's
    /// default script.
    #[arg(long = "trigger", short = 't', value_name = "TRIGGER")]
    pub triggers: Vec<String>,

    /// Mount only; apply no triggers.
    #[arg(long, conflicts_with = "triggers")]
    pub mount_only: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text, env = "DEEPTREE_FORMAT")]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoConfig {
    pub variant: Variant,
    pub above_depth: u32,
    pub below_depth: u32,
    pub script: Vec<Trigger>,
    pub format: OutputFormat,
}

impl DemoConfig {
    /// The variant's default depths and canned script.
    #[must_use]
    pub fn for_variant(variant: Variant) -> Self {
        let (above_depth, below_depth) = variant.default_depths();
        Self {
            variant,
            above_depth,
            below_depth,
            script: variant.default_script(),
            format: OutputFormat::default(),
        }
    }

    pub fn from_args(args: &RunArgs) -> Result<Self> {
        let mut config = Self::for_variant(args.variant);
        if let Some(raw) = args.above_depth {
            config.above_depth = RangeInput::DEPTH.clamp(raw);
        }
        if let Some(raw) = args.below_depth {
            config.below_depth = RangeInput::DEPTH.clamp(raw);
        }
        if args.mount_only {
            config.script.clear();
        } else if !args.triggers.is_empty() {
            config.script = parse_script(&args.triggers)?;
        }
        config.format = args.format;
        debug!(?config, "resolved run configuration");
        Ok(config)
    }
}
