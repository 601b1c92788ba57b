//! Engine-level properties: filter composition, count partitioning, and
//! orchestrator halt semantics, exercised through the public API.

use labctl::core::chain::{self, ChainFilter, NoOpObserver};
use labctl::core::check::{Check, CheckStatus, Outcome};
use labctl::core::context::RunContext;
use labctl::core::orchestrator::{self, Chain};

fn passing(id: &str, tags: &[&str]) -> Check {
    Check::new(id, format!("Check {}", id), tags, |_| Ok(Outcome::pass("ok")))
}

fn wide_list() -> Vec<Check> {
    vec![
        passing("a", &["smoke"]),
        passing("b", &["preflight"]),
        passing("c", &["smoke", "preflight"]),
        passing("d", &["network"]),
        passing("e", &["smoke", "network"]),
        passing("f", &["config"]),
    ]
}

#[test]
fn tag_filter_returns_exact_intersecting_sublist_in_order() {
    let checks = wide_list();
    for (tags, expected) in [
        (vec!["smoke"], vec!["a", "c", "e"]),
        (vec!["preflight"], vec!["b", "c"]),
        (vec!["network"], vec!["d", "e"]),
        (vec!["smoke", "config"], vec!["a", "c", "e", "f"]),
        (vec!["nonexistent"], vec![]),
    ] {
        let tags: Vec<String> = tags.into_iter().map(String::from).collect();
        let kept = chain::filter_by_tags(&checks, &tags);
        let ids: Vec<&str> = kept.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, expected, "tags {:?}", tags);
    }
}

#[test]
fn range_filter_every_valid_window_is_contiguous_and_inclusive() {
    let checks = wide_list();
    let ids = ["a", "b", "c", "d", "e", "f"];
    for start in 0..ids.len() {
        for end in start..ids.len() {
            let kept = chain::filter_by_range(
                chain::filter_by_tags(&checks, &[]),
                Some(ids[start]),
                Some(ids[end]),
            )
            .unwrap();
            let got: Vec<&str> = kept.iter().map(|c| c.id.as_str()).collect();
            assert_eq!(got, &ids[start..=end]);
        }
    }
}

#[test]
fn report_counts_always_partition_total() {
    let checks = vec![
        Check::new("p1", "p1", &[], |_| Ok(Outcome::pass("ok"))),
        Check::new("f1", "f1", &[], |_| Ok(Outcome::fail("bad"))),
        Check::new("w1", "w1", &[], |_| Ok(Outcome::warn("eh"))),
        Check::new("s1", "s1", &[], |_| Ok(Outcome::skip("later"))),
        Check::new("p2", "p2", &[], |_| Ok(Outcome::pass("ok"))),
        Check::new("x1", "x1", &[], |_| {
            Err(labctl::core::error::LabError::Validation("boom".into()))
        }),
    ];
    let ctx = RunContext::for_tests();
    let report = chain::run_chain(
        "partition",
        &checks,
        &ChainFilter::default(),
        &ctx,
        &mut NoOpObserver,
    )
    .unwrap();
    assert_eq!(report.total, 6);
    assert_eq!(report.total, report.checks.len());
    assert_eq!(
        report.passed + report.failed + report.warned + report.skipped,
        report.total
    );
    // The Err check counts as a failure.
    assert_eq!(report.failed, 2);
    assert_eq!(
        report.duration_ms,
        report.checks.iter().map(|c| c.duration_ms).sum::<u64>()
    );
}

#[test]
fn exception_downgrade_keeps_chain_running() {
    let checks = vec![
        Check::new("first", "explodes", &[], |_| {
            Err(labctl::core::error::LabError::Parse("bad json".into()))
        }),
        Check::new("second", "survives", &[], |_| Ok(Outcome::pass("ok"))),
    ];
    let ctx = RunContext::for_tests();
    let report = chain::run_chain(
        "resilient",
        &checks,
        &ChainFilter::default(),
        &ctx,
        &mut NoOpObserver,
    )
    .unwrap();
    assert_eq!(report.checks[0].status(), CheckStatus::Fail);
    assert_eq!(report.checks[0].outcome.message.as_deref(), Some("Exception"));
    assert!(
        report.checks[0]
            .outcome
            .detail
            .as_deref()
            .unwrap()
            .contains("bad json")
    );
    assert_eq!(report.checks[1].status(), CheckStatus::Pass);
}

#[test]
fn orchestrator_halts_on_failure_only_outside_dry_run() {
    let build = || {
        vec![
            Chain::new(
                "smoke",
                vec![Check::new("bad", "fails", &[], |_| Ok(Outcome::fail("no")))],
            ),
            Chain::new(
                "preflight",
                vec![Check::new("good", "passes", &[], |_| Ok(Outcome::pass("ok")))],
            ),
        ]
    };

    let mut ctx = RunContext::for_tests();
    ctx.dry_run = false;
    let reports = orchestrator::run_chains(
        &build(),
        &ChainFilter::default(),
        &ctx,
        &mut NoOpObserver,
    )
    .unwrap();
    assert_eq!(reports.len(), 1);

    ctx.dry_run = true;
    let reports = orchestrator::run_chains(
        &build(),
        &ChainFilter::default(),
        &ctx,
        &mut NoOpObserver,
    )
    .unwrap();
    assert_eq!(reports.len(), 2);
}

#[test]
fn tag_filter_repeats_per_chain_while_range_windows_the_whole_run() {
    let chains = vec![
        Chain::new("one", wide_list()),
        Chain::new(
            "two",
            vec![passing("g", &["smoke"]), passing("h", &["preflight"])],
        ),
    ];
    let ctx = RunContext::for_tests();
    let filter = ChainFilter {
        tags: vec!["smoke".to_string()],
        from: Some("c".to_string()),
        to: Some("g".to_string()),
    };
    let reports =
        orchestrator::run_chains(&chains, &filter, &ctx, &mut NoOpObserver).unwrap();
    assert_eq!(reports.len(), 2);
    let ids = |i: usize| -> Vec<&str> {
        reports[i].checks.iter().map(|c| c.id.as_str()).collect()
    };
    // Chain one keeps its smoke checks from "c" on; chain two keeps its
    // smoke checks up to "g". Neither endpoint errors on the other chain.
    assert_eq!(ids(0), ["c", "e"]);
    assert_eq!(ids(1), ["g"]);
}

#[test]
fn run_report_json_shape() {
    let ctx = RunContext::for_tests();
    let report = chain::run_chain(
        "shape",
        &wide_list(),
        &ChainFilter::default(),
        &ctx,
        &mut NoOpObserver,
    )
    .unwrap();
    let run = chain::RunReport::new(vec![report]);
    let value = serde_json::to_value(&run).unwrap();
    assert!(value["chains"].is_array());
    assert_eq!(value["summary"]["total"], 6);
    assert_eq!(value["summary"]["passed"], 6);
    assert_eq!(value["summary"]["failed"], 0);
    let first_check = &value["chains"][0]["checks"][0];
    assert_eq!(first_check["id"], "a");
    assert_eq!(first_check["status"], "pass");
}
