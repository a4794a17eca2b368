#![forbid(unsafe_code)]

//! Derived nodes.
//!
//! A [`Component`] defines how a node renders: its output is a pure function
//! of its explicit parameters and of the channels it reads through
//! [`RenderCx`]. The runtime stores one [`NodeSlot`] per live node.

use std::any::{TypeId, type_name};
use std::fmt;
use std::rc::Rc;

use super::channel::ChannelId;
use super::memo::MemoRecord;
use super::runtime::RenderCx;
use super::scope::ScopeFrame;
use super::value::DynValue;
use super::view::View;
use crate::error::{ReactiveError, Result};

/// Identity of one node instance. Ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(transparent))]
pub struct NodeId(u64);

impl NodeId {
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// A derived node definition.
///
/// `render` must be deterministic in `params` and the values it reads:
/// the runtime is free to call it on either invalidation path and expects
/// the same output for the same inputs.
pub trait Component: 'static {
    /// Explicit parameters passed by the parent. Memo boundaries compare
    /// these by value.
    type Params: Clone + PartialEq + fmt::Debug + 'static;

    /// Diagnostic bucket for this node's recomputations.
    fn category(&self, params: &Self::Params) -> String;

    fn render(&self, params: &Self::Params, cx: &mut RenderCx<'_>) -> Result<View>;
}

/// Object-safe view of a [`Component`] with erased parameters.
pub(crate) trait ErasedComponent {
    fn component_type(&self) -> TypeId;
    fn component_name(&self) -> &'static str;
    fn category(&self, params: &dyn DynValue) -> Result<String>;
    fn render(&self, params: &dyn DynValue, cx: &mut RenderCx<'_>) -> Result<View>;
}

pub(crate) struct Erased<C>(pub(crate) C);

impl<C: Component> Erased<C> {
    fn params<'p>(params: &'p dyn DynValue) -> Result<&'p C::Params> {
        params
            .as_any()
            .downcast_ref::<C::Params>()
            .ok_or(ReactiveError::ParamsType {
                component: type_name::<C>(),
            })
    }
}

impl<C: Component> ErasedComponent for Erased<C> {
    fn component_type(&self) -> TypeId {
        TypeId::of::<C>()
    }

    fn component_name(&self) -> &'static str {
        type_name::<C>()
    }

    fn category(&self, params: &dyn DynValue) -> Result<String> {
        Ok(self.0.category(Self::params(params)?))
    }

    fn render(&self, params: &dyn DynValue, cx: &mut RenderCx<'_>) -> Result<View> {
        self.0.render(Self::params(params)?, cx)
    }
}

/// Public snapshot of a live node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInfo {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub category: String,
    pub component: &'static str,
    /// Distance from the root node.
    pub tree_depth: usize,
    pub key: Option<u64>,
    pub memoized: bool,
    pub children: Vec<NodeId>,
    /// Channels read during the latest successful render.
    pub reads: Vec<ChannelId>,
    /// Channels this node provides to its subtree.
    pub provides: Vec<ChannelId>,
}

/// Stored state of one live node.
pub(crate) struct NodeSlot {
    pub(crate) parent: Option<NodeId>,
    pub(crate) tree_depth: usize,
    pub(crate) key: Option<u64>,
    pub(crate) component: Rc<dyn ErasedComponent>,
    pub(crate) params: Box<dyn DynValue>,
    pub(crate) category: String,
    /// Provider stack this node was last rendered under.
    pub(crate) scope: ScopeFrame,
    pub(crate) reads: Vec<ChannelId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) provides: Vec<ChannelId>,
    pub(crate) output: View,
    pub(crate) memo: Option<MemoRecord>,
}

impl NodeSlot {
    /// Whether this slot can be reused for a child call of the given shape.
    pub(crate) fn accepts(&self, component: TypeId, key: Option<u64>, memoized: bool) -> bool {
        self.component.component_type() == component
            && self.key == key
            && self.memo.is_some() == memoized
    }

    pub(crate) fn info(&self, id: NodeId) -> NodeInfo {
        NodeInfo {
            id,
            parent: self.parent,
            category: self.category.clone(),
            component: self.component.component_name(),
            tree_depth: self.tree_depth,
            key: self.key,
            memoized: self.memo.is_some(),
            children: self.children.clone(),
            reads: self.reads.clone(),
            provides: self.provides.clone(),
        }
    }
}

impl fmt::Debug for NodeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeSlot")
            .field("category", &self.category)
            .field("params", &self.params)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("reads", &self.reads)
            .field("memo", &self.memo)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Label;

    impl Component for Label {
        type Params = String;

        fn category(&self, params: &String) -> String {
            format!("{params} render count")
        }

        fn render(&self, params: &String, _cx: &mut RenderCx<'_>) -> Result<View> {
            Ok(View::leaf(params.clone()))
        }
    }

    #[test]
    fn node_id_display() {
        assert_eq!(NodeId::new(12).to_string(), "n12");
        assert_eq!(NodeId::new(12).get(), 12);
    }

    #[test]
    fn erased_category_downcasts_params() {
        let erased = Erased(Label);
        let params: Box<dyn DynValue> = Box::new(String::from("below"));
        assert_eq!(erased.category(&*params), Ok("below render count".to_owned()));
        assert_eq!(erased.component_type(), TypeId::of::<Label>());
    }

    #[test]
    fn erased_category_rejects_wrong_params() {
        let erased = Erased(Label);
        let params: Box<dyn DynValue> = Box::new(3u32);
        assert!(matches!(
            erased.category(&*params),
            Err(ReactiveError::ParamsType { .. })
        ));
    }
}
