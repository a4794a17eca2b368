#![forbid(unsafe_code)]

//! The propagation runtime.
//!
//! # Design
//!
//! [`Runtime`] owns every live node and channel. Rendering a node runs its
//! [`Component::render`] with a [`RenderCx`] that records which channels it
//! reads, which children it mounts and which channels it provides. When the
//! render succeeds those records replace the node's previous ones; when it
//! fails, everything the render created is torn down again and the node
//! keeps its previous output and subscriptions.
//!
//! Children are reconciled by call position. The i-th child call reuses the
//! i-th previous child when component type, key and memo-ness match;
//! otherwise a fresh node is mounted and the old one destroyed.
//!
//! # Write flush
//!
//! A write that changes a channel's value snapshots the channel's subscriber
//! set, orders it ancestors-first and re-renders each subscriber that has
//! not already been re-rendered during this flush. Memo boundaries are not
//! consulted on this path; every memo boundary between a recomputed
//! subscriber and its nearest recomputed ancestor is reported as a
//! [`DiagnosticKind::MemoBypass`].
//!
//! Writes issued from inside a render ([`RenderCx::schedule`]) are queued
//! and applied in FIFO order once the current operation completes.
//!
//! # Failure Modes
//!
//! - **Unbound read**: [`ReactiveError::UnboundChannel`]. During
//!   [`Runtime::mount`] this rejects the whole tree.
//! - **Render error**: the failing node and each ancestor on the render
//!   stack roll back; the error is returned to the caller of the trigger.
//!   During a write flush the other subscribers still recompute against
//!   the new value before the first error is returned.

use std::any::{Any, type_name};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use ahash::{AHashMap, AHashSet};
use tracing::{debug, debug_span, trace, trace_span, warn};

use super::channel::{Channel, ChannelHandle, ChannelId, ChannelInfo, ChannelKey};
use super::counter::{DiagnosticEvent, DiagnosticKind, DiagnosticSink, InvocationCounter};
use super::memo::{MemoRecord, ParamsEq, params_eq};
use super::node::{Component, Erased, ErasedComponent, NodeId, NodeInfo, NodeSlot};
use super::scope::ScopeFrame;
use super::value::DynValue;
use super::view::View;
use crate::error::{ReactiveError, Result};

type UpdateFn = Box<dyn FnOnce(&dyn Any) -> Option<Box<dyn DynValue>>>;

/// One externally or internally issued channel mutation.
enum Trigger {
    Write {
        channel: ChannelId,
        value: Box<dyn DynValue>,
    },
    Update {
        channel: ChannelId,
        expected: &'static str,
        update: UpdateFn,
    },
}

/// How a child call treats parent-path re-renders.
enum Boundary {
    Plain,
    Memo(Option<ParamsEq>),
}

/// Outcome of a single write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReport {
    pub channel: ChannelId,
    /// False when the written value equalled the current one.
    pub changed: bool,
    /// Subscribers at the time of the write, in the order they were visited.
    pub notified: Vec<NodeId>,
    /// Every node recomputed by this write, on either path, sorted by id.
    pub recomputed: Vec<NodeId>,
}

impl WriteReport {
    fn unchanged(channel: ChannelId) -> Self {
        Self {
            channel,
            changed: false,
            notified: Vec::new(),
            recomputed: Vec::new(),
        }
    }
}

/// Owner of the node tree and its channels.
///
/// The runtime is single-threaded (`!Send`): every trigger takes `&mut self`
/// and runs to completion before returning.
pub struct Runtime {
    nodes: AHashMap<NodeId, NodeSlot>,
    channels: AHashMap<ChannelId, Channel>,
    root: Option<NodeId>,
    next_node: u64,
    next_channel: u64,
    counter: InvocationCounter,
    sinks: Vec<Box<dyn DiagnosticSink>>,
    queue: VecDeque<Trigger>,
    /// Nodes recomputed during the write currently being flushed.
    pass: Option<AHashSet<NodeId>>,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("root", &self.root)
            .field("nodes", &self.nodes.len())
            .field("channels", &self.channels.len())
            .field("queued", &self.queue.len())
            .field("recomputes", &self.counter.total())
            .finish()
    }
}

impl Runtime {
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: AHashMap::new(),
            channels: AHashMap::new(),
            root: None,
            next_node: 0,
            next_channel: 0,
            counter: InvocationCounter::new(),
            sinks: Vec::new(),
            queue: VecDeque::new(),
            pass: None,
        }
    }

    /// Attach an additional diagnostic sink.
    #[must_use]
    pub fn with_sink(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.add_sink(sink);
        self
    }

    pub fn add_sink(&mut self, sink: impl DiagnosticSink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    // ── Tree lifecycle ──────────────────────────────────────────────────

    /// Mount `component` as the root, replacing any mounted tree.
    ///
    /// If any node fails to render (for example by reading an unbound
    /// channel) the whole tree is discarded and the error returned.
    pub fn mount<C: Component>(&mut self, component: C, params: C::Params) -> Result<NodeId> {
        self.unmount();
        let id = self.create_node(
            None,
            Rc::new(Erased(component)),
            Box::new(params),
            None,
            Boundary::Plain,
            ScopeFrame::root(),
        )?;
        self.root = Some(id);

        let span = debug_span!("deeptree.mount", root = %id);
        let _guard = span.enter();
        if let Err(err) = self.render_node(id) {
            self.destroy(id);
            debug!(%err, "mount rejected");
            return Err(err);
        }
        self.drain();
        debug!(nodes = self.nodes.len(), channels = self.channels.len(), "mounted");
        Ok(id)
    }

    /// Destroy the mounted tree, if any.
    pub fn unmount(&mut self) {
        if let Some(root) = self.root.take() {
            self.destroy(root);
        }
        self.queue.clear();
    }

    /// Re-render the root with new explicit parameters (parent path).
    pub fn set_root_params<P>(&mut self, params: P) -> Result<()>
    where
        P: Clone + PartialEq + fmt::Debug + 'static,
    {
        let root = self.root.ok_or(ReactiveError::NotMounted)?;
        let slot = self
            .nodes
            .get_mut(&root)
            .ok_or(ReactiveError::NodeGone { node: root })?;
        if !slot.params.as_any().is::<P>() {
            return Err(ReactiveError::ParamsType {
                component: slot.component.component_name(),
            });
        }
        let previous = std::mem::replace(&mut slot.params, Box::new(params));
        let result = self.render_node(root);
        if result.is_err() {
            if let Some(slot) = self.nodes.get_mut(&root) {
                slot.params = previous;
            }
        }
        self.drain();
        result
    }

    // ── Triggers ────────────────────────────────────────────────────────

    /// Replace a channel's value and recompute its subscribers.
    pub fn write<V>(&mut self, handle: ChannelHandle<V>, value: V) -> Result<WriteReport>
    where
        V: Clone + PartialEq + fmt::Debug + 'static,
    {
        self.dispatch(Trigger::Write {
            channel: handle.id(),
            value: Box::new(value),
        })
    }

    /// Write `f(current)` to the channel.
    pub fn update<V>(
        &mut self,
        handle: ChannelHandle<V>,
        f: impl FnOnce(&V) -> V + 'static,
    ) -> Result<WriteReport>
    where
        V: Clone + PartialEq + fmt::Debug + 'static,
    {
        self.dispatch(Trigger::Update {
            channel: handle.id(),
            expected: type_name::<V>(),
            update: Box::new(move |current: &dyn Any| {
                current
                    .downcast_ref::<V>()
                    .map(|value| Box::new(f(value)) as Box<dyn DynValue>)
            }),
        })
    }

    fn dispatch(&mut self, trigger: Trigger) -> Result<WriteReport> {
        let report = self.apply(trigger);
        self.drain();
        report
    }

    /// Apply writes scheduled from inside renders, oldest first.
    fn drain(&mut self) {
        while let Some(next) = self.queue.pop_front() {
            if let Err(err) = self.apply(next) {
                warn!(%err, "scheduled write failed");
            }
        }
    }

    fn apply(&mut self, trigger: Trigger) -> Result<WriteReport> {
        let (channel_id, value) = match trigger {
            Trigger::Write { channel, value } => (channel, value),
            Trigger::Update {
                channel,
                expected,
                update,
            } => {
                let current = self
                    .channels
                    .get(&channel)
                    .ok_or(ReactiveError::ChannelGone { channel })?;
                let name = current.name();
                let value = update(current.value().as_any())
                    .ok_or(ReactiveError::ValueType { name, expected })?;
                (channel, value)
            }
        };

        let channel = self
            .channels
            .get_mut(&channel_id)
            .ok_or(ReactiveError::ChannelGone {
                channel: channel_id,
            })?;
        let span = debug_span!("deeptree.write", channel = %channel_id, name = channel.name());
        let _guard = span.enter();

        if !channel.replace(value) {
            debug!("value unchanged, nothing to propagate");
            return Ok(WriteReport::unchanged(channel_id));
        }
        let mut notified: Vec<NodeId> = channel.subscribers().collect();
        notified.sort_by_key(|id| {
            let depth = self.nodes.get(id).map_or(usize::MAX, |slot| slot.tree_depth);
            (depth, *id)
        });

        self.pass = Some(AHashSet::new());
        let result = self.propagate(&notified);
        let mut recomputed: Vec<NodeId> = self
            .pass
            .take()
            .map(|pass| pass.into_iter().collect())
            .unwrap_or_default();
        recomputed.sort_unstable();
        result?;

        debug!(
            notified = notified.len(),
            recomputed = recomputed.len(),
            "write propagated"
        );
        Ok(WriteReport {
            channel: channel_id,
            changed: true,
            notified,
            recomputed,
        })
    }

    /// Recompute every target. A failing target rolls back on its own; the
    /// remaining targets still recompute and the first error is returned.
    fn propagate(&mut self, targets: &[NodeId]) -> Result<()> {
        let mut reported = AHashSet::new();
        let mut first_error = None;
        for &id in targets {
            if !self.nodes.contains_key(&id) {
                trace!(node = %id, "subscriber destroyed earlier in this write");
                continue;
            }
            if self.pass.as_ref().is_some_and(|pass| pass.contains(&id)) {
                continue;
            }
            self.report_bypasses(id, &mut reported);
            if let Err(err) = self.render_node(id) {
                debug!(node = %id, %err, "subscriber failed, continuing flush");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Report each memo boundary between `id` and the nearest ancestor
    /// already recomputed in this flush. Each boundary is reported once
    /// per write.
    fn report_bypasses(&mut self, id: NodeId, reported: &mut AHashSet<NodeId>) {
        let mut boundaries = Vec::new();
        let mut cursor = Some(id);
        while let Some(node) = cursor {
            if self.pass.as_ref().is_some_and(|pass| pass.contains(&node)) {
                break;
            }
            let Some(slot) = self.nodes.get(&node) else {
                break;
            };
            if slot.memo.is_some() && reported.insert(node) {
                boundaries.push((node, slot.category.clone()));
            }
            cursor = slot.parent;
        }
        for (boundary, category) in boundaries {
            trace!(subscriber = %id, boundary = %boundary, %category, "channel write bypasses memo boundary");
            self.emit(DiagnosticKind::MemoBypass, &category, boundary);
        }
    }

    // ── Inspection ──────────────────────────────────────────────────────

    #[must_use]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    #[must_use]
    pub fn counter(&self) -> &InvocationCounter {
        &self.counter
    }

    pub fn reset_counter(&mut self) {
        self.counter.reset();
    }

    /// Number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    #[must_use]
    pub fn node(&self, node: NodeId) -> Option<NodeInfo> {
        self.nodes.get(&node).map(|slot| slot.info(node))
    }

    #[must_use]
    pub fn channel(&self, channel: ChannelId) -> Option<ChannelInfo> {
        self.channels.get(&channel).map(|ch| ch.info(channel))
    }

    /// Live channels with the given name, oldest first.
    #[must_use]
    pub fn channels_named(&self, name: &str) -> Vec<ChannelId> {
        let mut ids: Vec<ChannelId> = self
            .channels
            .iter()
            .filter(|(_, ch)| ch.name() == name)
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Current subscribers of a channel.
    #[must_use]
    pub fn subscribers(&self, channel: ChannelId) -> Vec<NodeId> {
        self.channels
            .get(&channel)
            .map(|ch| ch.subscribers().collect())
            .unwrap_or_default()
    }

    /// Current value of a channel, without subscribing.
    pub fn read<V: Clone + 'static>(&self, handle: ChannelHandle<V>) -> Result<V> {
        let channel = self
            .channels
            .get(&handle.id())
            .ok_or(ReactiveError::ChannelGone {
                channel: handle.id(),
            })?;
        channel.get::<V>().ok_or(ReactiveError::ValueType {
            name: channel.name(),
            expected: type_name::<V>(),
        })
    }

    /// The channel `node` would read for `key`.
    pub fn resolve<V: 'static>(&self, node: NodeId, key: &ChannelKey<V>) -> Result<ChannelHandle<V>> {
        let slot = self
            .nodes
            .get(&node)
            .ok_or(ReactiveError::NodeGone { node })?;
        let channel = slot
            .scope
            .resolve(key.name())
            .ok_or(ReactiveError::UnboundChannel {
                name: key.name(),
                node,
            })?;
        self.typed_handle(channel, key.name())
    }

    /// The channel `node` itself provides under `key`, if any.
    pub fn provided<V: 'static>(&self, node: NodeId, key: &ChannelKey<V>) -> Result<ChannelHandle<V>> {
        let slot = self
            .nodes
            .get(&node)
            .ok_or(ReactiveError::NodeGone { node })?;
        let channel = slot
            .provides
            .iter()
            .copied()
            .find(|id| self.channels.get(id).is_some_and(|ch| ch.name() == key.name()))
            .ok_or(ReactiveError::UnboundChannel {
                name: key.name(),
                node,
            })?;
        self.typed_handle(channel, key.name())
    }

    fn typed_handle<V: 'static>(&self, id: ChannelId, name: &'static str) -> Result<ChannelHandle<V>> {
        let channel = self
            .channels
            .get(&id)
            .ok_or(ReactiveError::ChannelGone { channel: id })?;
        if !channel.holds::<V>() {
            return Err(ReactiveError::ValueType {
                name,
                expected: type_name::<V>(),
            });
        }
        Ok(ChannelHandle::new(id, name))
    }

    /// Descendants of `node` in pre-order, excluding `node`.
    #[must_use]
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self
            .nodes
            .get(&node)
            .map(|slot| slot.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(next) = stack.pop() {
            out.push(next);
            if let Some(slot) = self.nodes.get(&next) {
                stack.extend(slot.children.iter().rev());
            }
        }
        out
    }

    /// Live nodes whose category equals `category`, in tree order.
    #[must_use]
    pub fn find_all(&self, category: &str) -> Vec<NodeId> {
        let Some(root) = self.root else {
            return Vec::new();
        };
        std::iter::once(root)
            .chain(self.descendants(root))
            .filter(|id| {
                self.nodes
                    .get(id)
                    .is_some_and(|slot| slot.category == category)
            })
            .collect()
    }

    #[must_use]
    pub fn find(&self, category: &str) -> Option<NodeId> {
        self.find_all(category).into_iter().next()
    }

    /// Fully resolved output of the root, or [`View::Empty`] if unmounted.
    #[must_use]
    pub fn output(&self) -> View {
        self.root
            .and_then(|root| self.output_of(root))
            .unwrap_or_default()
    }

    /// Fully resolved output of one node.
    #[must_use]
    pub fn output_of(&self, node: NodeId) -> Option<View> {
        self.nodes
            .get(&node)
            .map(|slot| self.materialize(&slot.output))
    }

    /// Resolved `lastOutput` of a memoized node's record.
    #[must_use]
    pub fn memo_output(&self, node: NodeId) -> Option<View> {
        let record = self.nodes.get(&node)?.memo.as_ref()?;
        record.last_output().map(|view| self.materialize(view))
    }

    fn materialize(&self, view: &View) -> View {
        match view {
            View::Slot { node } => self
                .nodes
                .get(node)
                .map_or(View::Empty, |slot| self.materialize(&slot.output)),
            View::Nest {
                level,
                label,
                depth,
                child,
            } => View::Nest {
                level: *level,
                label: label.clone(),
                depth: *depth,
                child: Box::new(self.materialize(child)),
            },
            View::Group { items } => View::Group {
                items: items.iter().map(|item| self.materialize(item)).collect(),
            },
            View::Empty | View::Leaf { .. } | View::Text { .. } => view.clone(),
        }
    }

    // ── Node bookkeeping ────────────────────────────────────────────────

    fn emit(&mut self, kind: DiagnosticKind, category: &str, node: NodeId) {
        let count = self.counter.record(kind, category, node);
        let event = DiagnosticEvent {
            kind,
            category,
            node,
            count,
        };
        for sink in &mut self.sinks {
            sink.record(&event);
        }
    }

    fn create_node(
        &mut self,
        parent: Option<NodeId>,
        component: Rc<dyn ErasedComponent>,
        params: Box<dyn DynValue>,
        key: Option<u64>,
        boundary: Boundary,
        scope: ScopeFrame,
    ) -> Result<NodeId> {
        let category = component.category(&*params)?;
        let tree_depth = parent
            .and_then(|parent| self.nodes.get(&parent))
            .map_or(0, |slot| slot.tree_depth + 1);
        self.next_node += 1;
        let id = NodeId::new(self.next_node);
        let memo = match boundary {
            Boundary::Plain => None,
            Boundary::Memo(eq) => Some(MemoRecord::new(eq)),
        };
        trace!(node = %id, parent = ?parent, %category, "mount node");
        self.nodes.insert(
            id,
            NodeSlot {
                parent,
                tree_depth,
                key,
                component,
                params,
                category,
                scope,
                reads: Vec::new(),
                children: Vec::new(),
                provides: Vec::new(),
                output: View::Empty,
                memo,
            },
        );
        Ok(id)
    }

    fn create_channel(&mut self, name: &'static str, owner: NodeId, value: Box<dyn DynValue>) -> ChannelId {
        self.next_channel += 1;
        let id = ChannelId::new(self.next_channel);
        trace!(channel = %id, name, owner = %owner, "provide channel");
        self.channels.insert(id, Channel::new(name, owner, value));
        id
    }

    /// Parent-path trigger for an existing child.
    fn update_child(
        &mut self,
        id: NodeId,
        component: Rc<dyn ErasedComponent>,
        params: Box<dyn DynValue>,
        boundary: Boundary,
        scope: ScopeFrame,
    ) -> Result<()> {
        let slot = self
            .nodes
            .get_mut(&id)
            .ok_or(ReactiveError::NodeGone { node: id })?;
        slot.component = component;
        slot.scope = scope;
        if let Boundary::Memo(eq) = boundary {
            if let Some(record) = slot.memo.as_mut() {
                record.set_eq(eq);
                if record.matches(&*params) {
                    let category = slot.category.clone();
                    let _span =
                        trace_span!("deeptree.memo_skip", node = %id, category = %category).entered();
                    trace!("parameters unchanged");
                    self.emit(DiagnosticKind::MemoSkip, &category, id);
                    return Ok(());
                }
            }
        }
        let previous = std::mem::replace(&mut slot.params, params);
        if let Err(err) = self.render_node(id) {
            if let Some(slot) = self.nodes.get_mut(&id) {
                slot.params = previous;
            }
            return Err(err);
        }
        Ok(())
    }

    /// Recompute one node and commit or roll back the result.
    fn render_node(&mut self, id: NodeId) -> Result<()> {
        let slot = self
            .nodes
            .get_mut(&id)
            .ok_or(ReactiveError::NodeGone { node: id })?;
        let component = Rc::clone(&slot.component);
        let params = slot.params.clone_box();
        let category = component.category(&*params)?;
        slot.category.clone_from(&category);
        let scope = slot.scope.clone();
        let old_children = slot.children.clone();
        let old_provides = slot.provides.clone();

        if let Some(pass) = self.pass.as_mut() {
            pass.insert(id);
        }
        self.emit(DiagnosticKind::Recompute, &category, id);
        let span = trace_span!("deeptree.recompute", node = %id, category = %category);
        let _guard = span.enter();

        let mut cx = RenderCx {
            rt: &mut *self,
            node: id,
            scope,
            reads: Vec::new(),
            children: Vec::new(),
            provides: Vec::new(),
            fresh: Vec::new(),
            fresh_channels: Vec::new(),
            old_children,
            old_provides,
        };
        let result = component.render(&*params, &mut cx);
        let RenderCx {
            reads,
            children,
            provides,
            fresh,
            fresh_channels,
            old_children,
            old_provides,
            ..
        } = cx;

        match result {
            Ok(view) => {
                self.commit(id, reads, children, provides, &old_children, &old_provides);
                if let Some(slot) = self.nodes.get_mut(&id) {
                    if let Some(record) = slot.memo.as_mut() {
                        record.store(params, view.clone());
                    }
                    slot.output = view;
                }
                Ok(())
            }
            Err(err) => {
                for child in fresh {
                    self.destroy(child);
                }
                for channel in fresh_channels {
                    self.drop_channel(channel);
                }
                debug!(node = %id, %err, "recompute failed, rolled back");
                Err(err)
            }
        }
    }

    fn commit(
        &mut self,
        id: NodeId,
        reads: Vec<ChannelId>,
        children: Vec<NodeId>,
        provides: Vec<ChannelId>,
        old_children: &[NodeId],
        old_provides: &[ChannelId],
    ) {
        let old_reads = self
            .nodes
            .get(&id)
            .map(|slot| slot.reads.clone())
            .unwrap_or_default();
        for stale in old_reads.iter().filter(|ch| !reads.contains(ch)) {
            if let Some(channel) = self.channels.get_mut(stale) {
                channel.unsubscribe(id);
            }
        }
        for read in &reads {
            if let Some(channel) = self.channels.get_mut(read) {
                channel.subscribe(id);
            }
        }
        for removed in old_children.iter().filter(|child| !children.contains(child)) {
            self.destroy(*removed);
        }
        for removed in old_provides.iter().filter(|ch| !provides.contains(ch)) {
            self.drop_channel(*removed);
        }
        if let Some(slot) = self.nodes.get_mut(&id) {
            slot.reads = reads;
            slot.children = children;
            slot.provides = provides;
        }
    }

    /// Destroy a node, its subtree, its subscriptions and its channels.
    fn destroy(&mut self, id: NodeId) {
        let Some(slot) = self.nodes.remove(&id) else {
            return;
        };
        for child in &slot.children {
            self.destroy(*child);
        }
        for read in &slot.reads {
            if let Some(channel) = self.channels.get_mut(read) {
                channel.unsubscribe(id);
            }
        }
        for channel in &slot.provides {
            self.drop_channel(*channel);
        }
        if self.root == Some(id) {
            self.root = None;
        }
        trace!(node = %id, category = %slot.category, "unmount node");
    }

    fn drop_channel(&mut self, id: ChannelId) {
        let Some(channel) = self.channels.remove(&id) else {
            return;
        };
        for subscriber in channel.subscribers() {
            if let Some(slot) = self.nodes.get_mut(&subscriber) {
                slot.reads.retain(|read| *read != id);
            }
        }
        trace!(channel = %id, name = channel.name(), owner = %channel.owner(), "drop channel");
    }
}

/// Render-time access to channels and children for one node.
pub struct RenderCx<'rt> {
    rt: &'rt mut Runtime,
    node: NodeId,
    scope: ScopeFrame,
    reads: Vec<ChannelId>,
    children: Vec<NodeId>,
    provides: Vec<ChannelId>,
    /// Children mounted by this render; destroyed if it fails.
    fresh: Vec<NodeId>,
    fresh_channels: Vec<ChannelId>,
    old_children: Vec<NodeId>,
    old_provides: Vec<ChannelId>,
}

impl RenderCx<'_> {
    /// The node being rendered.
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Providers visible at the current point of the render.
    #[must_use]
    pub fn scope(&self) -> &ScopeFrame {
        &self.scope
    }

    /// Read the innermost channel named by `key` and subscribe to it.
    pub fn read<V: Clone + 'static>(&mut self, key: &ChannelKey<V>) -> Result<V> {
        let id = self.bound(key.name())?;
        let channel = self
            .rt
            .channels
            .get(&id)
            .ok_or(ReactiveError::ChannelGone { channel: id })?;
        let value = channel.get::<V>().ok_or(ReactiveError::ValueType {
            name: key.name(),
            expected: type_name::<V>(),
        })?;
        if !self.reads.contains(&id) {
            self.reads.push(id);
        }
        Ok(value)
    }

    /// Handle to the innermost channel named by `key`, without subscribing.
    pub fn writer<V: 'static>(&self, key: &ChannelKey<V>) -> Result<ChannelHandle<V>> {
        let id = self.bound(key.name())?;
        self.rt.typed_handle(id, key.name())
    }

    fn bound(&self, name: &'static str) -> Result<ChannelId> {
        self.scope
            .resolve(name)
            .ok_or(ReactiveError::UnboundChannel {
                name,
                node: self.node,
            })
    }

    /// Provide a channel named by `key` to everything `body` mounts.
    ///
    /// `initial` is only used when the channel is created; on later renders
    /// the channel keeps whatever value was last written to it.
    pub fn provide<V, R>(
        &mut self,
        key: &ChannelKey<V>,
        initial: V,
        body: impl FnOnce(&mut Self, ChannelHandle<V>) -> Result<R>,
    ) -> Result<R>
    where
        V: Clone + PartialEq + fmt::Debug + 'static,
    {
        let index = self.provides.len();
        let reuse = self.old_provides.get(index).copied().filter(|id| {
            self.rt
                .channels
                .get(id)
                .is_some_and(|ch| ch.name() == key.name() && ch.holds::<V>())
        });
        let id = match reuse {
            Some(id) => id,
            None => {
                let id = self.rt.create_channel(key.name(), self.node, Box::new(initial));
                self.fresh_channels.push(id);
                id
            }
        };
        self.provides.push(id);

        let outer = self.scope.clone();
        self.scope = outer.enter(key.name(), id);
        let result = body(self, ChannelHandle::new(id, key.name()));
        self.scope = self.scope.exit(key.name()).unwrap_or(outer);
        result
    }

    /// Mount or update a child node.
    pub fn child<C: Component>(&mut self, component: C, params: C::Params) -> Result<View> {
        self.mount_child(Rc::new(Erased(component)), Box::new(params), None, Boundary::Plain)
    }

    /// Mount or update a child whose identity also includes `key`. A key
    /// change destroys the previous child and mounts a fresh one.
    pub fn keyed_child<C: Component>(&mut self, key: u64, component: C, params: C::Params) -> Result<View> {
        self.mount_child(
            Rc::new(Erased(component)),
            Box::new(params),
            Some(key),
            Boundary::Plain,
        )
    }

    /// Mount or update a child behind a memo boundary using `PartialEq`.
    pub fn memo<C: Component>(&mut self, component: C, params: C::Params) -> Result<View> {
        self.mount_child(
            Rc::new(Erased(component)),
            Box::new(params),
            None,
            Boundary::Memo(None),
        )
    }

    /// Mount or update a child behind a memo boundary using `eq`.
    pub fn memo_by<C: Component>(
        &mut self,
        component: C,
        params: C::Params,
        eq: impl Fn(&C::Params, &C::Params) -> bool + 'static,
    ) -> Result<View> {
        self.mount_child(
            Rc::new(Erased(component)),
            Box::new(params),
            None,
            Boundary::Memo(Some(params_eq(eq))),
        )
    }

    /// Queue a write to run after the current trigger completes.
    pub fn schedule<V>(&mut self, handle: ChannelHandle<V>, value: V)
    where
        V: Clone + PartialEq + fmt::Debug + 'static,
    {
        self.rt.queue.push_back(Trigger::Write {
            channel: handle.id(),
            value: Box::new(value),
        });
    }

    fn mount_child(
        &mut self,
        component: Rc<dyn ErasedComponent>,
        params: Box<dyn DynValue>,
        key: Option<u64>,
        boundary: Boundary,
    ) -> Result<View> {
        let index = self.children.len();
        let memoized = matches!(boundary, Boundary::Memo(_));
        let component_type = component.component_type();
        let reuse = self.old_children.get(index).copied().filter(|old| {
            self.rt
                .nodes
                .get(old)
                .is_some_and(|slot| slot.accepts(component_type, key, memoized))
        });

        let id = match reuse {
            Some(id) => {
                self.children.push(id);
                self.rt
                    .update_child(id, component, params, boundary, self.scope.clone())?;
                id
            }
            None => {
                let id = self.rt.create_node(
                    Some(self.node),
                    component,
                    params,
                    key,
                    boundary,
                    self.scope.clone(),
                )?;
                self.children.push(id);
                self.fresh.push(id);
                self.rt.render_node(id)?;
                id
            }
        };
        Ok(View::slot(id))
    }
}
