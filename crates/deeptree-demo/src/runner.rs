#![forbid(unsafe_code)]

//! Mount the app, apply a script and collect a [`RunReport`].

use deeptree_core::{ChannelHandle, ChannelKey, ReactiveError, Runtime, WriteReport};
use tracing::{info, info_span};

use crate::app::{AppParams, AppRoot, LOADING, Variant, depth_key};
use crate::config::DemoConfig;
use crate::error::{DemoError, Result};
use crate::inputs::RangeInput;
use crate::logging::TracingSink;
use crate::report::{ChainReport, RunReport, StepReport};
use crate::script::{Side, Trigger};

/// A mounted demo app.
#[derive(Debug)]
pub struct Demo {
    rt: Runtime,
    variant: Variant,
}

impl Demo {
    pub fn mount(variant: Variant, above_depth: u32, below_depth: u32) -> Result<Self> {
        let mut rt = Runtime::new().with_sink(TracingSink);
        rt.mount(
            AppRoot,
            AppParams {
                policy: variant.policy(),
                above_depth,
                below_depth,
            },
        )?;
        Ok(Self { rt, variant })
    }

    #[must_use]
    pub fn variant(&self) -> Variant {
        self.variant
    }

    #[must_use]
    pub fn runtime(&self) -> &Runtime {
        &self.rt
    }

    /// Apply one trigger and return what the write reached.
    pub fn apply(&mut self, trigger: &Trigger) -> Result<WriteReport> {
        let report = match *trigger {
            Trigger::Toggle { scope } => {
                let loading = self.loading_for(scope)?;
                self.rt.update(loading, |value| !value)?
            }
            Trigger::Check { value } => {
                let loading = self.loading_for(None)?;
                self.rt.write(loading, value)?
            }
            Trigger::Depth { side, raw } => {
                let depth = RangeInput::DEPTH.clamp(raw);
                let handle = self.root_channel(&depth_key(side))?;
                self.rt.write(handle, depth)?
            }
        };
        Ok(report)
    }

    fn root_channel<V: 'static>(&self, key: &ChannelKey<V>) -> Result<ChannelHandle<V>> {
        let root = self.rt.root().ok_or(ReactiveError::NotMounted)?;
        Ok(self.rt.provided(root, key)?)
    }

    /// The `loading` channel a side's tree sees, or the root one.
    fn loading_for(&self, scope: Option<Side>) -> Result<ChannelHandle<bool>> {
        let Some(side) = scope else {
            return self.root_channel(&LOADING);
        };
        let category = format!("{} render count", side.label());
        let tree = self
            .rt
            .find(&category)
            .ok_or_else(|| DemoError::invalid(format!("no {} tree is mounted", side.label())))?;
        Ok(self.rt.resolve(tree, &LOADING)?)
    }

    /// Marker sequences of both trees, above first.
    #[must_use]
    pub fn chains(&self) -> Vec<ChainReport> {
        self.rt
            .output()
            .chains()
            .into_iter()
            .map(ChainReport::from_markers)
            .collect()
    }

    /// The status line under the togglers.
    #[must_use]
    pub fn status(&self) -> String {
        self.rt
            .output()
            .texts()
            .last()
            .map(|text| (*text).to_owned())
            .unwrap_or_default()
    }
}

/// Mount `config.variant` and apply its script in order.
pub fn run(config: &DemoConfig) -> Result<RunReport> {
    let span = info_span!("deeptree.demo", variant = config.variant.name());
    let _guard = span.enter();

    let mut demo = Demo::mount(config.variant, config.above_depth, config.below_depth)?;
    let mounted = demo.runtime().counter().snapshot();
    info!(recomputes = mounted.total, "mounted");
    let mount = StepReport {
        trigger: None,
        changed: true,
        recomputed: usize::try_from(mounted.total).unwrap_or(usize::MAX),
        delta: mounted,
    };

    let mut steps = Vec::with_capacity(config.script.len());
    for trigger in &config.script {
        let before = demo.runtime().counter().snapshot();
        let write = demo.apply(trigger)?;
        let delta = demo.runtime().counter().snapshot().since(&before);
        info!(
            %trigger,
            changed = write.changed,
            recomputed = write.recomputed.len(),
            "applied trigger"
        );
        steps.push(StepReport {
            trigger: Some(trigger.to_string()),
            changed: write.changed,
            recomputed: write.recomputed.len(),
            delta,
        });
    }

    Ok(RunReport {
        variant: config.variant,
        policy: config.variant.policy(),
        above_depth: config.above_depth,
        below_depth: config.below_depth,
        mount,
        steps,
        totals: demo.runtime().counter().snapshot(),
        output: demo.chains(),
        status: demo.status(),
    })
}
