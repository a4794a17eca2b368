#![forbid(unsafe_code)]

//! The demo application.
//!
//! ```text
//! AppRoot            provides loading, above_depth, below_depth
//! └── TheApp         reads all three
//!     ├── DeepTreeToggler "above"  ─ DeepTree "above" ─ nesters…
//!     ├── DeepTreeToggler "below"  ─ DeepTree "below" ─ nesters…
//!     └── "loading" | "not loading"
//! ```
//!
//! A [`Variant`] picks the [`Policy`]: whether togglers sit behind memo
//! boundaries, whether nesters read `loading`, and whether the below
//! toggler provides its own `loading` channel.

use clap::ValueEnum;
use deeptree_core::{
    ChannelKey, Component, DeepTree, DeepTreeParams, RenderCx, Result, View,
};
use serde::Serialize;

use crate::script::{Side, Trigger};

pub const LOADING: ChannelKey<bool> = ChannelKey::new("loading");
pub const ABOVE_DEPTH: ChannelKey<u32> = ChannelKey::new("above_depth");
pub const BELOW_DEPTH: ChannelKey<u32> = ChannelKey::new("below_depth");

/// Depth key for one side of the app.
#[must_use]
pub const fn depth_key(side: Side) -> ChannelKey<u32> {
    match side {
        Side::Above => ABOVE_DEPTH,
        Side::Below => BELOW_DEPTH,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// Memoized togglers, nesters read nothing.
    Baseline,
    /// Togglers re-render with the app.
    Unmemoized,
    /// Memoized togglers, every nester reads `loading`.
    Subscribed,
    /// The below tree sees its own `loading` channel.
    NestedScope,
    /// Baseline app driven through the depth sliders.
    Slider,
}

/// Structural choices a variant makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Policy {
    pub memoize_togglers: bool,
    pub nesters_watch: bool,
    pub nested_scope: bool,
}

impl Variant {
    pub const ALL: [Self; 5] = [
        Self::Baseline,
        Self::Unmemoized,
        Self::Subscribed,
        Self::NestedScope,
        Self::Slider,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Baseline => "baseline",
            Self::Unmemoized => "unmemoized",
            Self::Subscribed => "subscribed",
            Self::NestedScope => "nested-scope",
            Self::Slider => "slider",
        }
    }

    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Baseline => "memoized togglers shield both trees from loading toggles",
            Self::Unmemoized => "without memo boundaries every toggle re-renders both trees",
            Self::Subscribed => "nesters read loading directly and recompute despite the memo boundary",
            Self::NestedScope => "the below tree reads an inner loading channel that shadows the outer one",
            Self::Slider => "depth sliders rebuild a chain whenever its depth changes",
        }
    }

    #[must_use]
    pub const fn policy(self) -> Policy {
        match self {
            Self::Baseline | Self::Slider => Policy {
                memoize_togglers: true,
                nesters_watch: false,
                nested_scope: false,
            },
            Self::Unmemoized => Policy {
                memoize_togglers: false,
                nesters_watch: false,
                nested_scope: false,
            },
            Self::Subscribed => Policy {
                memoize_togglers: true,
                nesters_watch: true,
                nested_scope: false,
            },
            Self::NestedScope => Policy {
                memoize_togglers: true,
                nesters_watch: true,
                nested_scope: true,
            },
        }
    }

    /// Initial `(above, below)` depths.
    #[must_use]
    pub const fn default_depths(self) -> (u32, u32) {
        match self {
            Self::NestedScope => (5, 5),
            _ => (0, 10),
        }
    }

    /// Triggers applied when no script is given.
    #[must_use]
    pub fn default_script(self) -> Vec<Trigger> {
        match self {
            Self::Baseline => vec![
                Trigger::Toggle { scope: None },
                Trigger::Toggle { scope: None },
            ],
            Self::Unmemoized => vec![Trigger::Toggle { scope: None }],
            Self::Subscribed => vec![
                Trigger::Toggle { scope: None },
                Trigger::Check { value: true },
            ],
            Self::NestedScope => vec![
                Trigger::Toggle {
                    scope: Some(Side::Below),
                },
                Trigger::Toggle { scope: None },
            ],
            Self::Slider => vec![
                Trigger::Depth {
                    side: Side::Below,
                    raw: 5,
                },
                Trigger::Depth {
                    side: Side::Above,
                    raw: 3,
                },
                Trigger::Toggle { scope: None },
                Trigger::Depth {
                    side: Side::Below,
                    raw: 150,
                },
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppParams {
    pub policy: Policy,
    pub above_depth: u32,
    pub below_depth: u32,
}

/// Owns the app-wide channels.
pub struct AppRoot;

impl Component for AppRoot {
    type Params = AppParams;

    fn category(&self, _: &AppParams) -> String {
        "root render count".into()
    }

    fn render(&self, params: &AppParams, cx: &mut RenderCx<'_>) -> Result<View> {
        cx.provide(&LOADING, false, |cx, _| {
            cx.provide(&ABOVE_DEPTH, params.above_depth, |cx, _| {
                cx.provide(&BELOW_DEPTH, params.below_depth, |cx, _| {
                    cx.child(TheApp, params.policy)
                })
            })
        })
    }
}

/// Reads the app context and lays out both togglers.
pub struct TheApp;

impl Component for TheApp {
    type Params = Policy;

    fn category(&self, _: &Policy) -> String {
        "app render count".into()
    }

    fn render(&self, policy: &Policy, cx: &mut RenderCx<'_>) -> Result<View> {
        let loading = cx.read(&LOADING)?;
        let above = cx.read(&ABOVE_DEPTH)?;
        let below = cx.read(&BELOW_DEPTH)?;

        let above = toggler(
            cx,
            policy,
            TogglerParams {
                label: Side::Above.label(),
                depth: above,
                watch: policy.nesters_watch,
                inner_scope: false,
            },
        )?;
        let below = toggler(
            cx,
            policy,
            TogglerParams {
                label: Side::Below.label(),
                depth: below,
                watch: policy.nesters_watch,
                inner_scope: policy.nested_scope,
            },
        )?;
        let status = if loading { "loading" } else { "not loading" };
        Ok(View::group([above, below, View::text(status)]))
    }
}

fn toggler(cx: &mut RenderCx<'_>, policy: &Policy, params: TogglerParams) -> Result<View> {
    if policy.memoize_togglers {
        cx.memo(DeepTreeToggler, params)
    } else {
        cx.child(DeepTreeToggler, params)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TogglerParams {
    pub label: &'static str,
    pub depth: u32,
    pub watch: bool,
    /// Provide a fresh `loading` channel to this toggler's tree.
    pub inner_scope: bool,
}

/// A deep tree plus the button that toggles `loading`.
pub struct DeepTreeToggler;

impl DeepTreeToggler {
    fn body(params: &TogglerParams, cx: &mut RenderCx<'_>) -> Result<View> {
        let tree = DeepTreeParams::new(params.label, params.depth);
        let tree = if params.watch {
            cx.child(DeepTree::watching(LOADING), tree)?
        } else {
            cx.child(DeepTree::new(), tree)?
        };
        Ok(View::group([tree, View::text("Toggle loading")]))
    }
}

impl Component for DeepTreeToggler {
    type Params = TogglerParams;

    fn category(&self, params: &TogglerParams) -> String {
        format!("{} toggler render count", params.label)
    }

    fn render(&self, params: &TogglerParams, cx: &mut RenderCx<'_>) -> Result<View> {
        if params.inner_scope {
            cx.provide(&LOADING, false, |cx, _| Self::body(params, cx))
        } else {
            Self::body(params, cx)
        }
    }
}
