#![forbid(unsafe_code)]

//! Property-based invariant tests for deeptree propagation.
//!
//! These tests verify invariants that must hold for **any** chain depth and
//! **any** sequence of triggers:
//!
//! 1. `build(d)` yields exactly `d` level markers plus one leaf, levels
//!    `1..=d` each once.
//! 2. A changed write recomputes every subscriber exactly once and nothing
//!    else.
//! 3. Equal-value writes leave every count unchanged.
//! 4. A memo boundary with unchanged parameters never recomputes from the
//!    parent path, however often the parent re-renders.
//! 5. A depth change replaces every node of the chain; an unchanged depth
//!    keeps every node.

use std::collections::BTreeSet;

use deeptree_core::{
    ChannelHandle, ChannelKey, Chain, Component, DeepTree, DeepTreeParams, MAX_DEPTH, NodeId,
    RenderCx, Result, Runtime, View,
};
use proptest::prelude::*;

const LOADING: ChannelKey<bool> = ChannelKey::new("loading");

// ── Fixture ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
struct Shape {
    watched: u32,
    plain: u32,
    memo: u32,
    tick: u32,
}

/// Provides `loading` above three chains: one watching, one not, and one
/// watching behind a memo boundary.
struct Host;

impl Component for Host {
    type Params = Shape;

    fn category(&self, _: &Shape) -> String {
        "host render count".into()
    }

    fn render(&self, shape: &Shape, cx: &mut RenderCx<'_>) -> Result<View> {
        cx.provide(&LOADING, false, |cx, _| {
            let watched =
                cx.child(DeepTree::watching(LOADING), DeepTreeParams::new("watched", shape.watched))?;
            let plain = cx.child(DeepTree::new(), DeepTreeParams::new("plain", shape.plain))?;
            let memo = cx.memo(DeepTree::watching(LOADING), DeepTreeParams::new("memo", shape.memo))?;
            Ok(View::group([watched, plain, memo, View::text(shape.tick.to_string())]))
        })
    }
}

fn mount(shape: Shape) -> (Runtime, ChannelHandle<bool>) {
    let mut rt = Runtime::new();
    let root = rt.mount(Host, shape).expect("mount");
    let loading = rt.provided(root, &LOADING).expect("loading provided");
    (rt, loading)
}

fn live_nodes(rt: &Runtime) -> Vec<NodeId> {
    let root = rt.root().expect("mounted");
    std::iter::once(root).chain(rt.descendants(root)).collect()
}

fn chain_nodes(rt: &Runtime, label: &str) -> Vec<NodeId> {
    let tree = rt
        .find(&format!("{label} render count"))
        .expect("chain root");
    rt.descendants(tree)
}

// ── Strategies ──────────────────────────────────────────────────────────

fn small_depth() -> impl Strategy<Value = u32> {
    0u32..=24
}

fn shape() -> impl Strategy<Value = Shape> {
    (small_depth(), small_depth(), small_depth()).prop_map(|(watched, plain, memo)| Shape {
        watched,
        plain,
        memo,
        tick: 0,
    })
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Chain shape
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn chain_has_one_marker_per_level_plus_leaf(depth in 0u32..=MAX_DEPTH) {
        let markers = Chain::build(depth, "below").expected_markers();
        prop_assert_eq!(markers.len(), depth as usize + 1);
        prop_assert!(markers.last().is_some_and(|m| m.is_leaf()));
        let levels: BTreeSet<u32> = markers.iter().filter_map(|m| m.level()).collect();
        prop_assert_eq!(levels, (1..=depth).collect::<BTreeSet<_>>());
    }

    #[test]
    fn mounted_output_matches_built_chain(shape in shape()) {
        let (rt, _) = mount(shape.clone());
        let chains = rt.output().chains();
        prop_assert_eq!(chains.len(), 3);
        prop_assert_eq!(&chains[0], &Chain::build(shape.watched, "watched").expected_markers());
        prop_assert_eq!(&chains[1], &Chain::build(shape.plain, "plain").expected_markers());
        prop_assert_eq!(&chains[2], &Chain::build(shape.memo, "memo").expected_markers());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2–3. Writes reach exactly the subscribers
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn writes_recompute_each_subscriber_exactly_once(
        shape in shape(),
        writes in proptest::collection::vec(any::<bool>(), 1..16),
    ) {
        let (mut rt, loading) = mount(shape.clone());
        let mut current = false;

        for value in writes {
            let subscribers: BTreeSet<NodeId> = rt.subscribers(loading.id()).into_iter().collect();
            prop_assert_eq!(
                subscribers.len() as u32,
                shape.watched + shape.memo,
                "every watching nester is subscribed"
            );
            let nodes = live_nodes(&rt);
            let before: Vec<u64> = nodes.iter().map(|id| rt.counter().node(*id)).collect();
            let snapshot = rt.counter().snapshot();

            let report = rt.write(loading, value).expect("write");

            if value == current {
                prop_assert!(!report.changed);
                prop_assert_eq!(rt.counter().snapshot(), snapshot);
                continue;
            }
            current = value;
            prop_assert!(report.changed);
            prop_assert_eq!(
                report.recomputed.iter().copied().collect::<BTreeSet<_>>(),
                subscribers.clone()
            );
            for (id, count) in nodes.iter().zip(before) {
                let expected = count + u64::from(subscribers.contains(id));
                prop_assert_eq!(rt.counter().node(*id), expected, "node {}", id);
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Memo boundary shields the parent path
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn memo_boundary_never_recomputes_from_unchanged_params(
        shape in shape(),
        ticks in 1u32..12,
        toggles in 0u32..6,
    ) {
        let (mut rt, loading) = mount(shape.clone());
        let memo_nodes = chain_nodes(&rt, "memo");

        for tick in 1..=ticks {
            rt.set_root_params(Shape { tick, ..shape.clone() }).expect("rerender");
        }
        for _ in 0..toggles {
            rt.update(loading, |v| !v).expect("toggle");
        }

        let counter = rt.counter();
        prop_assert_eq!(counter.category("memo render count"), 1);
        prop_assert_eq!(counter.memo_skips("memo render count"), u64::from(ticks));
        prop_assert_eq!(counter.category("watched render count"), u64::from(ticks) + 1);
        for id in memo_nodes {
            // Mount, then one recompute per toggle through the channel path.
            prop_assert_eq!(counter.node(id), 1 + u64::from(toggles));
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Depth changes rebuild the chain
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn depth_changes_replace_the_whole_chain(
        shape in shape(),
        depths in proptest::collection::vec(small_depth(), 1..8),
    ) {
        let (mut rt, loading) = mount(shape.clone());
        let mut previous = chain_nodes(&rt, "watched");
        let mut depth = shape.watched;

        for next in depths {
            rt.set_root_params(Shape { watched: next, ..shape.clone() }).expect("set depth");
            let current = chain_nodes(&rt, "watched");
            prop_assert_eq!(current.len(), next as usize);

            if next == depth {
                prop_assert_eq!(&current, &previous);
            } else {
                prop_assert!(previous.iter().all(|id| !rt.contains(*id)));
                prop_assert!(current.iter().all(|id| rt.counter().node(*id) == 1));
            }
            for id in &previous {
                if !current.contains(id) {
                    prop_assert!(!rt.subscribers(loading.id()).contains(id));
                }
            }
            previous = current;
            depth = next;
        }
    }
}
