#![forbid(unsafe_code)]

//! Named broadcast channels.
//!
//! A channel holds one value and the set of nodes that read it during their
//! latest render. It is created by a provider node (see
//! [`RenderCx::provide`](super::RenderCx::provide)) and lives exactly as long
//! as that node.
//!
//! [`ChannelKey`] names a channel for lookup through the scope stack.
//! [`ChannelHandle`] addresses one concrete channel instance and is what
//! external triggers write to.

use std::collections::BTreeSet;
use std::fmt;
use std::marker::PhantomData;

use super::node::NodeId;
use super::value::DynValue;

/// Identity of one channel instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(transparent))]
pub struct ChannelId(u64);

impl ChannelId {
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Typed name used to provide and read a channel.
///
/// Two providers using the same key name shadow each other; the type
/// parameter only guards reads against mismatched values.
pub struct ChannelKey<V> {
    name: &'static str,
    _marker: PhantomData<fn() -> V>,
}

impl<V> ChannelKey<V> {
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<V> Clone for ChannelKey<V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for ChannelKey<V> {}

impl<V> PartialEq for ChannelKey<V> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<V> Eq for ChannelKey<V> {}

impl<V> fmt::Debug for ChannelKey<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ChannelKey").field(&self.name).finish()
    }
}

/// Typed reference to one concrete channel.
///
/// Handles are plain ids: comparing two handles compares channel identity,
/// which keeps them stable inside memoized parameters.
pub struct ChannelHandle<V> {
    id: ChannelId,
    name: &'static str,
    _marker: PhantomData<fn() -> V>,
}

impl<V> ChannelHandle<V> {
    pub(crate) const fn new(id: ChannelId, name: &'static str) -> Self {
        Self {
            id,
            name,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub const fn id(&self) -> ChannelId {
        self.id
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<V> Clone for ChannelHandle<V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for ChannelHandle<V> {}

impl<V> PartialEq for ChannelHandle<V> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<V> Eq for ChannelHandle<V> {}

impl<V> fmt::Debug for ChannelHandle<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChannelHandle({} `{}`)", self.id, self.name)
    }
}

/// Read-only snapshot of a channel for inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub id: ChannelId,
    pub name: &'static str,
    pub owner: NodeId,
    pub version: u64,
    pub subscribers: Vec<NodeId>,
}

/// Stored channel state.
pub(crate) struct Channel {
    name: &'static str,
    owner: NodeId,
    value: Box<dyn DynValue>,
    /// Bumped once per write that changed the value.
    version: u64,
    subscribers: BTreeSet<NodeId>,
}

impl Channel {
    pub(crate) fn new(name: &'static str, owner: NodeId, value: Box<dyn DynValue>) -> Self {
        Self {
            name,
            owner,
            value,
            version: 0,
            subscribers: BTreeSet::new(),
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn owner(&self) -> NodeId {
        self.owner
    }

    pub(crate) fn value(&self) -> &dyn DynValue {
        &*self.value
    }

    /// Clone the current value out as `V`, if the channel holds a `V`.
    pub(crate) fn get<V: Clone + 'static>(&self) -> Option<V> {
        self.value.as_any().downcast_ref::<V>().cloned()
    }

    pub(crate) fn holds<V: 'static>(&self) -> bool {
        self.value.as_any().is::<V>()
    }

    /// Replace the value. Returns `false` (and changes nothing) when the new
    /// value equals the current one.
    pub(crate) fn replace(&mut self, value: Box<dyn DynValue>) -> bool {
        if self.value.eq_dyn(&*value) {
            return false;
        }
        self.value = value;
        self.version += 1;
        true
    }

    pub(crate) fn subscribe(&mut self, node: NodeId) {
        self.subscribers.insert(node);
    }

    pub(crate) fn unsubscribe(&mut self, node: NodeId) {
        self.subscribers.remove(&node);
    }

    pub(crate) fn subscribers(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.subscribers.iter().copied()
    }

    pub(crate) fn info(&self, id: ChannelId) -> ChannelInfo {
        ChannelInfo {
            id,
            name: self.name,
            owner: self.owner,
            version: self.version,
            subscribers: self.subscribers().collect(),
        }
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.name)
            .field("value", &self.value)
            .field("version", &self.version)
            .field("subscribers", &self.subscribers)
            .finish()
    }
}
