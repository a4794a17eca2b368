#![forbid(unsafe_code)]

//! Scoped broadcast channels and selective re-computation.
//!
//! This module provides the propagation primitives:
//!
//! - [`ChannelKey`] / [`ChannelHandle`]: a named shared value with a
//!   subscriber set, owned by the node that provides it.
//! - [`ScopeFrame`]: persistent stack of providers visible below a point in
//!   the tree; inner frames shadow outer ones of the same name.
//! - [`Component`]: a derived node definition. Its output is a pure function
//!   of explicit parameters plus the channels it reads while rendering.
//! - Memo boundaries ([`RenderCx::memo`]): skip a child's recomputation from
//!   the parent path when its parameters compare equal.
//! - [`InvocationCounter`] / [`DiagnosticSink`]: per-category and per-node
//!   recomputation counts.
//!
//! # Architecture
//!
//! [`Runtime`] owns every node and channel in arenas keyed by id. Rendering
//! is synchronous: a node's render mounts or updates its children in call
//! order and embeds them as [`View::Slot`]s. [`Runtime::output`] resolves the
//! slots, so a node recomputed from a channel write is visible without
//! re-running its ancestors.
//!
//! There are two invalidation paths and they stay separate:
//!
//! 1. **Parent path**: a parent re-renders and passes parameters to its
//!    children. A memo boundary compares them and may stop here.
//! 2. **Channel path**: a write with a changed value re-renders every node
//!    currently subscribed to that channel. Memo boundaries are not
//!    consulted.
//!
//! # Invariants
//!
//! 1. After a successful render, a node's subscriptions equal exactly the
//!    channels it read during that render.
//! 2. Writing a value equal to the current one is a no-op (no version bump,
//!    no recomputation).
//! 3. During one write, every node subscribed at the time of the write
//!    recomputes exactly once, ancestors first.
//! 4. A memo skip leaves the wrapped subtree's subscriptions untouched.
//! 5. Destroying a node destroys its subtree, its subscriptions and every
//!    channel it provides.

pub mod channel;
pub mod counter;
mod memo;
pub mod node;
pub mod runtime;
pub mod scope;
mod value;
pub mod view;

pub use channel::{ChannelHandle, ChannelId, ChannelInfo, ChannelKey};
pub use counter::{
    CounterSnapshot, DiagnosticEvent, DiagnosticKind, DiagnosticSink, InvocationCounter,
};
pub use node::{Component, NodeId, NodeInfo};
pub use runtime::{RenderCx, Runtime, WriteReport};
pub use scope::ScopeFrame;
pub use view::{Marker, View};
