#![forbid(unsafe_code)]

//! Recomputation counters and diagnostic sinks.
//!
//! Every node records itself at the start of its own recomputation. The
//! counts are never consulted by the runtime; they exist so tests and the
//! demo can observe exactly which nodes a trigger reached.
//!
//! Besides recomputations the runtime reports two memo events:
//!
//! - [`DiagnosticKind::MemoSkip`]: a memo boundary compared equal parameters
//!   on the parent path and skipped its node.
//! - [`DiagnosticKind::MemoBypass`]: a memoized node recomputed from a
//!   channel write, without its parameters being consulted.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use ahash::AHashMap;

use super::node::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DiagnosticKind {
    Recompute,
    MemoSkip,
    MemoBypass,
}

impl DiagnosticKind {
    /// Stable event name used in logs.
    #[must_use]
    pub const fn event_name(self) -> &'static str {
        match self {
            Self::Recompute => "recompute",
            Self::MemoSkip => "memo.skip",
            Self::MemoBypass => "memo.channel_bypass",
        }
    }
}

/// One increment delivered to a [`DiagnosticSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagnosticEvent<'a> {
    pub kind: DiagnosticKind,
    pub category: &'a str,
    pub node: NodeId,
    /// Running total for `(kind, category)` after this increment.
    pub count: u64,
}

/// Receives one event per recomputation or memo decision.
pub trait DiagnosticSink {
    fn record(&mut self, event: &DiagnosticEvent<'_>);
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for Rc<RefCell<S>> {
    fn record(&mut self, event: &DiagnosticEvent<'_>) {
        self.borrow_mut().record(event);
    }
}

/// Counts recomputations per category and per node id.
///
/// Per-node counts survive the node: once a node is destroyed its count
/// simply stops advancing.
#[derive(Debug, Default, Clone)]
pub struct InvocationCounter {
    recomputes: BTreeMap<String, u64>,
    memo_skips: BTreeMap<String, u64>,
    memo_bypasses: BTreeMap<String, u64>,
    nodes: AHashMap<NodeId, u64>,
    total: u64,
}

/// Frozen copy of the per-category counts.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CounterSnapshot {
    pub recomputes: BTreeMap<String, u64>,
    pub memo_skips: BTreeMap<String, u64>,
    pub memo_bypasses: BTreeMap<String, u64>,
    pub total: u64,
}

impl InvocationCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one event and return the running total for its category.
    pub fn record(&mut self, kind: DiagnosticKind, category: &str, node: NodeId) -> u64 {
        let bucket = match kind {
            DiagnosticKind::Recompute => {
                self.total += 1;
                *self.nodes.entry(node).or_insert(0) += 1;
                &mut self.recomputes
            }
            DiagnosticKind::MemoSkip => &mut self.memo_skips,
            DiagnosticKind::MemoBypass => &mut self.memo_bypasses,
        };
        let count = bucket.entry(category.to_owned()).or_insert(0);
        *count += 1;
        *count
    }

    /// Recomputations recorded under `category`.
    #[must_use]
    pub fn category(&self, category: &str) -> u64 {
        self.recomputes.get(category).copied().unwrap_or(0)
    }

    /// Recomputations of a single node.
    #[must_use]
    pub fn node(&self, node: NodeId) -> u64 {
        self.nodes.get(&node).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn memo_skips(&self, category: &str) -> u64 {
        self.memo_skips.get(category).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn memo_bypasses(&self, category: &str) -> u64 {
        self.memo_bypasses.get(category).copied().unwrap_or(0)
    }

    /// Sum of recomputations over every category starting with `prefix`.
    #[must_use]
    pub fn with_prefix(&self, prefix: &str) -> u64 {
        self.recomputes
            .range(prefix.to_owned()..)
            .take_while(|(name, _)| name.starts_with(prefix))
            .map(|(_, count)| count)
            .sum()
    }

    /// Total recomputations across all categories.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }

    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            recomputes: self.recomputes.clone(),
            memo_skips: self.memo_skips.clone(),
            memo_bypasses: self.memo_bypasses.clone(),
            total: self.total,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl CounterSnapshot {
    /// Counts that grew since `earlier`, keyed by category. Unchanged
    /// categories are omitted.
    #[must_use]
    pub fn since(&self, earlier: &CounterSnapshot) -> CounterSnapshot {
        fn delta(now: &BTreeMap<String, u64>, then: &BTreeMap<String, u64>) -> BTreeMap<String, u64> {
            now.iter()
                .filter_map(|(name, count)| {
                    let grown = count.saturating_sub(then.get(name).copied().unwrap_or(0));
                    (grown > 0).then(|| (name.clone(), grown))
                })
                .collect()
        }

        CounterSnapshot {
            recomputes: delta(&self.recomputes, &earlier.recomputes),
            memo_skips: delta(&self.memo_skips, &earlier.memo_skips),
            memo_bypasses: delta(&self.memo_bypasses, &earlier.memo_bypasses),
            total: self.total.saturating_sub(earlier.total),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total == 0 && self.memo_skips.is_empty() && self.memo_bypasses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: NodeId = NodeId::new(1);
    const B: NodeId = NodeId::new(2);

    #[test]
    fn recompute_counts_per_category_and_node() {
        let mut counter = InvocationCounter::new();
        assert_eq!(counter.record(DiagnosticKind::Recompute, "nester level 1 render count", A), 1);
        assert_eq!(counter.record(DiagnosticKind::Recompute, "nester level 1 render count", B), 2);
        assert_eq!(counter.category("nester level 1 render count"), 2);
        assert_eq!(counter.node(A), 1);
        assert_eq!(counter.node(B), 1);
        assert_eq!(counter.total(), 2);
    }

    #[test]
    fn memo_events_do_not_count_as_recomputes() {
        let mut counter = InvocationCounter::new();
        counter.record(DiagnosticKind::MemoSkip, "below toggler render count", A);
        counter.record(DiagnosticKind::MemoBypass, "below toggler render count", A);
        assert_eq!(counter.total(), 0);
        assert_eq!(counter.node(A), 0);
        assert_eq!(counter.memo_skips("below toggler render count"), 1);
        assert_eq!(counter.memo_bypasses("below toggler render count"), 1);
    }

    #[test]
    fn event_names_are_stable() {
        assert_eq!(DiagnosticKind::Recompute.event_name(), "recompute");
        assert_eq!(DiagnosticKind::MemoSkip.event_name(), "memo.skip");
        assert_eq!(DiagnosticKind::MemoBypass.event_name(), "memo.channel_bypass");
    }

    #[test]
    fn prefix_sum_only_covers_matching_categories() {
        let mut counter = InvocationCounter::new();
        counter.record(DiagnosticKind::Recompute, "nester level 1 render count", A);
        counter.record(DiagnosticKind::Recompute, "nester level 2 render count", B);
        counter.record(DiagnosticKind::Recompute, "below render count", A);
        assert_eq!(counter.with_prefix("nester level "), 2);
        assert_eq!(counter.with_prefix("zzz"), 0);
    }

    #[test]
    fn snapshot_delta_omits_unchanged_categories() {
        let mut counter = InvocationCounter::new();
        counter.record(DiagnosticKind::Recompute, "app render count", A);
        counter.record(DiagnosticKind::Recompute, "below render count", B);
        let before = counter.snapshot();
        counter.record(DiagnosticKind::Recompute, "app render count", A);
        counter.record(DiagnosticKind::MemoSkip, "below toggler render count", B);

        let delta = counter.snapshot().since(&before);
        assert_eq!(delta.recomputes.len(), 1);
        assert_eq!(delta.recomputes.get("app render count"), Some(&1));
        assert_eq!(delta.memo_skips.get("below toggler render count"), Some(&1));
        assert_eq!(delta.total, 1);
        assert!(counter.snapshot().since(&counter.snapshot()).is_empty());
    }

    #[test]
    fn reset_clears_everything() {
        let mut counter = InvocationCounter::new();
        counter.record(DiagnosticKind::Recompute, "x", A);
        counter.reset();
        assert_eq!(counter.total(), 0);
        assert_eq!(counter.node(A), 0);
    }

    #[derive(Default)]
    struct Collect(Vec<(DiagnosticKind, String, u64)>);

    impl DiagnosticSink for Collect {
        fn record(&mut self, event: &DiagnosticEvent<'_>) {
            self.0.push((event.kind, event.category.to_owned(), event.count));
        }
    }

    #[test]
    fn shared_sink_forwards_events() {
        let shared = Rc::new(RefCell::new(Collect::default()));
        let mut sink = Rc::clone(&shared);
        sink.record(&DiagnosticEvent {
            kind: DiagnosticKind::Recompute,
            category: "x",
            node: A,
            count: 3,
        });
        assert_eq!(shared.borrow().0, vec![(DiagnosticKind::Recompute, "x".to_owned(), 3)]);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn snapshot_serializes_sorted_categories() {
        let mut counter = InvocationCounter::new();
        counter.record(DiagnosticKind::Recompute, "b", A);
        counter.record(DiagnosticKind::Recompute, "a", B);
        counter.record(DiagnosticKind::MemoSkip, "a", B);
        let json = serde_json::to_string(&counter.snapshot()).expect("serialize");
        assert_eq!(
            json,
            r#"{"recomputes":{"a":1,"b":1},"memo_skips":{"a":1},"memo_bypasses":{},"total":2}"#
        );
    }
}
