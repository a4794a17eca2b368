#![forbid(unsafe_code)]

//! End-to-end runs of every demo variant.
//!
//! Each test runs a variant's script through [`runner::run`] and checks the
//! per-trigger counter deltas against what the app structure implies.

use clap::Parser;
use deeptree_demo::app::Variant;
use deeptree_demo::cli::{Cli, Commands, render};
use deeptree_demo::config::DemoConfig;
use deeptree_demo::report::{RunReport, StepReport};
use deeptree_demo::runner::{self, Demo};
use deeptree_demo::script::{Side, Trigger};
use proptest::prelude::*;

fn run(variant: Variant) -> RunReport {
    runner::run(&DemoConfig::for_variant(variant)).expect("run")
}

fn recomputes(step: &StepReport, category: &str) -> u64 {
    step.delta.recomputes.get(category).copied().unwrap_or(0)
}

fn skips(step: &StepReport, category: &str) -> u64 {
    step.delta.memo_skips.get(category).copied().unwrap_or(0)
}

fn bypasses(step: &StepReport, category: &str) -> u64 {
    step.delta.memo_bypasses.get(category).copied().unwrap_or(0)
}

fn nester_total(step: &StepReport) -> u64 {
    step.delta
        .recomputes
        .iter()
        .filter(|(category, _)| category.starts_with("nester level "))
        .map(|(_, count)| count)
        .sum()
}

// ---- Variants ----

#[test]
fn baseline_toggle_only_reaches_the_app() {
    let report = run(Variant::Baseline);
    assert_eq!(report.mount.delta.total, 16);
    assert_eq!(report.steps.len(), 2);

    for step in &report.steps {
        assert!(step.changed);
        assert_eq!(step.delta.total, 1);
        assert_eq!(recomputes(step, "app render count"), 1);
        assert_eq!(skips(step, "above toggler render count"), 1);
        assert_eq!(skips(step, "below toggler render count"), 1);
        assert_eq!(nester_total(step), 0);
        assert!(step.delta.memo_bypasses.is_empty());
    }
    assert_eq!(report.status, "not loading");
    assert_eq!(report.output.len(), 2);
    assert_eq!(report.output[0].depth, 0);
    assert_eq!(report.output[1].depth, 10);
    assert_eq!(report.output[1].markers.first().and_then(|m| m.level()), Some(10));
}

#[test]
fn unmemoized_toggle_rerenders_both_trees() {
    let report = run(Variant::Unmemoized);
    let step = &report.steps[0];
    assert_eq!(step.delta.total, 15);
    assert_eq!(recomputes(step, "above toggler render count"), 1);
    assert_eq!(recomputes(step, "below toggler render count"), 1);
    assert_eq!(recomputes(step, "above render count"), 1);
    assert_eq!(recomputes(step, "below render count"), 1);
    assert_eq!(nester_total(step), 10);
    assert!(step.delta.memo_skips.is_empty());
    assert_eq!(report.status, "loading");
}

#[test]
fn subscribed_nesters_recompute_behind_the_memo() {
    let report = run(Variant::Subscribed);
    let toggle = &report.steps[0];
    assert_eq!(toggle.delta.total, 11);
    assert_eq!(recomputes(toggle, "app render count"), 1);
    assert_eq!(recomputes(toggle, "below toggler render count"), 0);
    assert_eq!(recomputes(toggle, "below render count"), 0);
    assert_eq!(skips(toggle, "below toggler render count"), 1);
    assert_eq!(bypasses(toggle, "below toggler render count"), 1);
    assert_eq!(toggle.delta.memo_bypasses.len(), 1);
    assert_eq!(nester_total(toggle), 10);
    assert_eq!(report.totals.memo_bypasses.get("below toggler render count"), Some(&1));

    let check = &report.steps[1];
    assert!(!check.changed);
    assert!(check.delta.is_empty());
}

#[test]
fn nested_scope_isolates_the_inner_channel() {
    let report = run(Variant::NestedScope);
    assert_eq!((report.above_depth, report.below_depth), (5, 5));

    let inner = &report.steps[0];
    assert_eq!(inner.trigger.as_deref(), Some("toggle:below"));
    assert_eq!(inner.delta.total, 5);
    assert_eq!(recomputes(inner, "app render count"), 0);
    for level in 1..=5 {
        assert_eq!(recomputes(inner, &format!("nester level {level} render count")), 1);
    }
    assert_eq!(bypasses(inner, "below toggler render count"), 1);

    let outer = &report.steps[1];
    assert_eq!(outer.delta.total, 6);
    assert_eq!(recomputes(outer, "app render count"), 1);
    assert_eq!(skips(outer, "below toggler render count"), 1);
    assert_eq!(nester_total(outer), 5);
    assert_eq!(bypasses(outer, "above toggler render count"), 1);
    assert_eq!(bypasses(outer, "below toggler render count"), 0);
    assert_eq!(report.status, "loading");
}

#[test]
fn slider_rebuilds_and_clamps() {
    let report = run(Variant::Slider);
    let [below_five, above_three, toggle, below_huge] = report.steps.as_slice() else {
        panic!("slider script has four steps");
    };

    assert_eq!(below_five.delta.total, 8);
    assert_eq!(recomputes(below_five, "below render count"), 1);
    assert_eq!(skips(below_five, "above toggler render count"), 1);
    assert_eq!(nester_total(below_five), 5);

    assert_eq!(above_three.delta.total, 6);
    assert_eq!(toggle.delta.total, 1);

    assert_eq!(below_huge.trigger.as_deref(), Some("depth:below=150"));
    assert_eq!(below_huge.delta.total, 103);

    assert_eq!(report.output[0].depth, 3);
    assert_eq!(report.output[1].depth, 100);
}

#[test]
fn depth_change_discards_the_old_chain() {
    let mut demo = Demo::mount(Variant::Baseline, 0, 4).expect("mount");
    let rt = demo.runtime();
    let tree = rt.find("below render count").expect("tree");
    let old = rt.descendants(tree);
    assert_eq!(old.len(), 4);

    demo.apply(&Trigger::Depth {
        side: Side::Below,
        raw: 6,
    })
    .expect("depth");
    let rt = demo.runtime();
    let tree = rt.find("below render count").expect("tree");
    let new = rt.descendants(tree);
    assert_eq!(new.len(), 6);
    assert!(old.iter().all(|id| !rt.contains(*id)));
    assert!(new.iter().all(|id| rt.counter().node(*id) == 1));
}

// ---- CLI ----

#[test]
fn cli_json_report_parses() {
    let cli = Cli::try_parse_from([
        "deeptree",
        "run",
        "--variant",
        "nested-scope",
        "--format",
        "json",
    ])
    .expect("args");
    let Commands::Run(args) = cli.command else {
        panic!("expected run");
    };
    let json: serde_json::Value = serde_json::from_str(&render(&args).expect("render")).expect("json");
    assert_eq!(json["variant"], "nested-scope");
    assert_eq!(json["steps"][0]["recomputed"], 5);
    assert_eq!(json["output"][1]["markers"][5]["kind"], "leaf");
}

#[test]
fn cli_text_report_lists_steps() {
    let cli = Cli::try_parse_from([
        "deeptree",
        "run",
        "-t",
        "toggle",
        "-t",
        "depth:above=2",
        "--below-depth",
        "-4",
    ])
    .expect("args");
    let Commands::Run(args) = cli.command else {
        panic!("expected run");
    };
    let text = render(&args).expect("render");
    assert!(text.contains("variant: baseline (above depth 0, below depth 0)"));
    assert!(text.contains("step 1: toggle: 1 recomputed"));
    assert!(text.contains("step 2: depth:above=2"));
    assert!(text.contains("above (depth 2): 2 1 [above]"));
    assert!(text.ends_with("status: loading\n"));
}

#[test]
fn cli_rejects_bad_trigger_with_usage_exit_code() {
    let cli = Cli::try_parse_from(["deeptree", "run", "-t", "shake"]).expect("args");
    let err = deeptree_demo::run(cli).expect_err("bad trigger");
    assert_eq!(err.exit_code(), 2);
}

// ---- Properties ----

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn final_depths_follow_the_last_clamped_slider_value(
        moves in proptest::collection::vec((any::<bool>(), -40i64..160), 1..8),
    ) {
        let mut demo = Demo::mount(Variant::Slider, 0, 10).expect("mount");
        let mut expected = [0usize, 10];
        for (above, raw) in moves {
            let side = if above { Side::Above } else { Side::Below };
            demo.apply(&Trigger::Depth { side, raw }).expect("depth");
            expected[usize::from(!above)] = usize::try_from(raw.clamp(0, 100)).expect("in range");
        }
        let depths: Vec<usize> = demo.chains().iter().map(|chain| chain.depth).collect();
        prop_assert_eq!(depths, expected.to_vec());
    }
}
