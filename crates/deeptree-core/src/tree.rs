#![forbid(unsafe_code)]

//! Linear chains of nested nodes.
//!
//! [`DeepTree`] mounts a [`Chain`] of `depth` [`Nester`] nodes wrapped around
//! a leaf. The outermost nester has level 1 and the innermost level `depth`;
//! a nester's node depth is its distance to the leaf, so the outermost one
//! sits at depth `depth` and the innermost at depth 1.
//!
//! The chain is mounted under a key equal to its depth: changing the depth
//! destroys every nester of the previous chain and mounts a fresh one.

use std::fmt;
use std::rc::Rc;

use crate::error::{ReactiveError, Result};
use crate::reactive::{ChannelKey, Component, Marker, RenderCx, View};

/// Deepest chain a [`DeepTree`] will build.
pub const MAX_DEPTH: u32 = 100;

/// One nesting level of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub level: u32,
    /// Distance to the leaf.
    pub depth: u32,
}

/// Shape of a chain, outermost link first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    label: String,
    links: Vec<Link>,
}

impl Chain {
    #[must_use]
    pub fn build(depth: u32, label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            links: (1..=depth)
                .map(|level| Link {
                    level,
                    depth: depth - level + 1,
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Number of nesting levels.
    #[must_use]
    pub fn depth(&self) -> u32 {
        self.links.last().map_or(0, |link| link.level)
    }

    #[must_use]
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    #[must_use]
    pub fn link(&self, index: usize) -> Option<Link> {
        self.links.get(index).copied()
    }

    /// Markers a mounted chain of this shape produces: levels from the
    /// innermost out, then the leaf.
    #[must_use]
    pub fn expected_markers(&self) -> Vec<Marker> {
        self.links
            .iter()
            .rev()
            .map(|link| Marker::Level {
                level: link.level,
                label: self.label.clone(),
                depth: link.depth,
            })
            .chain(std::iter::once(Marker::Leaf {
                label: self.label.clone(),
            }))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeepTreeParams {
    pub label: String,
    pub depth: u32,
}

impl DeepTreeParams {
    #[must_use]
    pub fn new(label: impl Into<String>, depth: u32) -> Self {
        Self {
            label: label.into(),
            depth,
        }
    }
}

/// Root of a chain. Counts under `"{label} render count"`.
///
/// With a watched key every nester reads that channel, which subscribes the
/// whole chain to it.
pub struct DeepTree<V = bool> {
    watch: Option<ChannelKey<V>>,
}

impl DeepTree {
    /// A chain whose nesters read no channel.
    #[must_use]
    pub const fn new() -> Self {
        Self { watch: None }
    }
}

impl Default for DeepTree {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> DeepTree<V> {
    /// A chain whose nesters all read `key`.
    #[must_use]
    pub const fn watching(key: ChannelKey<V>) -> Self {
        Self { watch: Some(key) }
    }
}

impl<V> Clone for DeepTree<V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for DeepTree<V> {}

impl<V> fmt::Debug for DeepTree<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeepTree").field("watch", &self.watch).finish()
    }
}

impl<V> Component for DeepTree<V>
where
    V: Clone + PartialEq + fmt::Debug + 'static,
{
    type Params = DeepTreeParams;

    fn category(&self, params: &DeepTreeParams) -> String {
        format!("{} render count", params.label)
    }

    fn render(&self, params: &DeepTreeParams, cx: &mut RenderCx<'_>) -> Result<View> {
        if params.depth > MAX_DEPTH {
            return Err(ReactiveError::render(
                self.category(params),
                format!("depth {} exceeds {MAX_DEPTH}", params.depth),
            ));
        }
        if params.depth == 0 {
            return Ok(View::leaf(params.label.as_str()));
        }
        let chain = Rc::new(Chain::build(params.depth, params.label.as_str()));
        cx.keyed_child(
            u64::from(params.depth),
            Nester { watch: self.watch },
            NestParams { chain, index: 0 },
        )
    }
}

/// Position of one nester within its chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestParams {
    pub chain: Rc<Chain>,
    /// Index into [`Chain::links`], outermost first.
    pub index: usize,
}

/// One nesting level. Counts under `"nester level {level} render count"`.
pub struct Nester<V = bool> {
    watch: Option<ChannelKey<V>>,
}

impl<V> Clone for Nester<V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for Nester<V> {}

impl<V> fmt::Debug for Nester<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Nester").field("watch", &self.watch).finish()
    }
}

impl<V> Component for Nester<V>
where
    V: Clone + PartialEq + fmt::Debug + 'static,
{
    type Params = NestParams;

    fn category(&self, params: &NestParams) -> String {
        let level = params.chain.link(params.index).map_or(0, |link| link.level);
        format!("nester level {level} render count")
    }

    fn render(&self, params: &NestParams, cx: &mut RenderCx<'_>) -> Result<View> {
        let link = params.chain.link(params.index).ok_or_else(|| {
            ReactiveError::render(self.category(params), "index past the end of the chain")
        })?;
        if let Some(key) = &self.watch {
            cx.read(key)?;
        }
        let inner = if params.index + 1 < params.chain.links().len() {
            cx.child(
                *self,
                NestParams {
                    chain: Rc::clone(&params.chain),
                    index: params.index + 1,
                },
            )?
        } else {
            View::leaf(params.chain.label())
        };
        Ok(View::nest(link.level, params.chain.label(), link.depth, inner))
    }
}
