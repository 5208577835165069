//! End-to-end scenario tests against the scripted environment

use std::collections::BTreeMap;

use libgasbench_core::env::{ArtifactScript, EnvironmentScript, OperationScript, Request};
use libgasbench_core::types::{encode_bytes32_string, ParamEncoding};
use libgasbench_core::{
    AssertionSpec, Comparator, FailurePolicy, Harness, RunPolicy, Scenario, ScenarioRunner,
    ScriptedEnvironment, Step, SuiteConfig, Variant, Verdict,
};
use serde_json::json;

fn operation(cost: u64) -> OperationScript {
    OperationScript {
        cost,
        ..Default::default()
    }
}

fn artifact(ops: &[(&str, OperationScript)]) -> ArtifactScript {
    ArtifactScript {
        reject_deploy: None,
        operations: ops
            .iter()
            .map(|(name, op)| (name.to_string(), op.clone()))
            .collect(),
    }
}

/// A -> [100, 50], B -> [80, 50], C rejects "create"
fn script() -> EnvironmentScript {
    let mut artifacts = BTreeMap::new();
    artifacts.insert(
        "A".to_string(),
        artifact(&[("create", operation(100)), ("increment", operation(50))]),
    );
    artifacts.insert(
        "B".to_string(),
        artifact(&[("create", operation(80)), ("increment", operation(50))]),
    );
    artifacts.insert(
        "C".to_string(),
        artifact(&[
            (
                "create",
                OperationScript {
                    reject: Some("precondition failed".to_string()),
                    ..Default::default()
                },
            ),
            ("increment", operation(40)),
        ]),
    );
    EnvironmentScript {
        unreachable: false,
        artifacts,
    }
}

fn scenario() -> Scenario {
    Scenario::new(
        "create-then-increment",
        vec![
            Step::new("create").param("param", json!("X")),
            Step::new("increment"),
        ],
    )
}

fn suite(variants: Vec<Variant>, scenario: Scenario) -> SuiteConfig {
    SuiteConfig {
        run: RunPolicy::default(),
        variants,
        environment: script(),
        scenarios: vec![scenario],
    }
}

#[tokio::test]
async fn two_variant_comparison_reports_pass_and_strict_fail() {
    let scenario = scenario()
        .with_assertion(AssertionSpec::compare("B", Comparator::Lt, "A", "create"))
        .with_assertion(AssertionSpec::compare("B", Comparator::Lt, "A", "increment"));
    let harness = Harness::new(suite(
        vec![Variant::new("A", "A"), Variant::new("B", "B")],
        scenario,
    ))
    .unwrap();

    let report = harness
        .run(None, || ScriptedEnvironment::new(script()))
        .await
        .unwrap();
    let scenario = &report.scenarios[0];

    let costs = scenario.table.costs();
    assert_eq!(costs["A"], vec![Some(100), Some(50)]);
    assert_eq!(costs["B"], vec![Some(80), Some(50)]);

    assert_eq!(scenario.assertions[0].description, "B.create < A.create");
    assert_eq!(scenario.assertions[0].outcome, Verdict::Pass);
    assert_eq!(scenario.assertions[1].description, "B.increment < A.increment");
    assert_eq!(scenario.assertions[1].outcome, Verdict::Fail);
    assert!(!report.passed(false));
}

#[tokio::test]
async fn rejected_step_makes_later_assertions_inconclusive() {
    let scenario = scenario()
        .with_assertion(AssertionSpec::compare("C", Comparator::Lt, "A", "increment"))
        .with_assertion(AssertionSpec::threshold("C", Comparator::Le, 1_000, 1usize))
        .with_assertion(AssertionSpec::compare("B", Comparator::Lt, "A", "create"));
    let harness = Harness::new(suite(
        vec![Variant::new("A", "A"), Variant::new("C", "C"), Variant::new("B", "B")],
        scenario,
    ))
    .unwrap();

    let report = harness
        .run(None, || ScriptedEnvironment::new(script()))
        .await
        .unwrap();
    let scenario = &report.scenarios[0];

    let c_row = scenario
        .table
        .rows
        .iter()
        .find(|row| row.variant == "C")
        .unwrap();
    assert_eq!(c_row.cells.len(), 2);
    assert_eq!(c_row.cells[0].cost, None);
    assert_eq!(c_row.status.as_str(), "halted");

    assert_eq!(scenario.assertions[0].outcome, Verdict::Inconclusive);
    assert_eq!(scenario.assertions[1].outcome, Verdict::Inconclusive);
    assert_eq!(scenario.assertions[2].outcome, Verdict::Pass);

    assert!(report.passed(false));
    assert!(!report.passed(true));
}

#[tokio::test]
async fn fresh_deployments_reproduce_identical_costs() {
    let variants = vec![Variant::new("A", "A"), Variant::new("B", "B"), Variant::new("C", "C")];
    let policy = RunPolicy::default();
    let scenario = scenario();

    let first_env = ScriptedEnvironment::new(script());
    let first = ScenarioRunner::new(&first_env, &policy)
        .run(&variants, &scenario)
        .await
        .unwrap();
    let second_env = ScriptedEnvironment::new(script());
    let second = ScenarioRunner::new(&second_env, &policy)
        .run(&variants, &scenario)
        .await
        .unwrap();

    for variant in ["A", "B", "C"] {
        assert_eq!(first.costs(variant), second.costs(variant), "variant {}", variant);
    }
    assert_eq!(first, second);
}

#[tokio::test]
async fn invocations_follow_step_major_variant_order() {
    let variants = vec![Variant::new("A", "A"), Variant::new("B", "B")];
    let policy = RunPolicy::default();
    let steps = vec![
        Step::new("create"),
        Step::new("increment"),
        Step::new("increment").labeled("again"),
    ];
    let env = ScriptedEnvironment::new(script());
    ScenarioRunner::new(&env, &policy)
        .run(&variants, &Scenario::new("order", steps))
        .await
        .unwrap();

    let journal = env.journal();
    let order: Vec<(String, String)> = journal
        .iter()
        .filter_map(|entry| match &entry.request {
            Request::Invoke { variant, operation } => Some((variant.clone(), operation.clone())),
            Request::Deploy { .. } => None,
        })
        .collect();
    let expected: Vec<(String, String)> = [
        ("A", "create"),
        ("B", "create"),
        ("A", "increment"),
        ("B", "increment"),
        ("A", "increment"),
        ("B", "increment"),
    ]
    .iter()
    .map(|(v, o)| (v.to_string(), o.to_string()))
    .collect();
    assert_eq!(order, expected);

    // Each request finished before the next one was submitted
    for pair in journal.windows(2) {
        assert_eq!(pair[1].seq, pair[0].seq + 1);
        assert!(pair[0].finished.unwrap() <= pair[1].started);
    }
}

#[tokio::test(start_paused = true)]
async fn timeouts_truncate_only_the_slow_variant() {
    let mut script = script();
    script
        .artifacts
        .get_mut("B")
        .unwrap()
        .operations
        .get_mut("create")
        .unwrap()
        .latency_ms = 60_000;

    let policy = RunPolicy {
        invoke_timeout_ms: 1_000,
        ..RunPolicy::default()
    };
    let variants = vec![Variant::new("A", "A"), Variant::new("B", "B")];
    let env = ScriptedEnvironment::new(script);
    let run = ScenarioRunner::new(&env, &policy)
        .run(&variants, &scenario())
        .await
        .unwrap();

    assert_eq!(run.costs("A").unwrap(), vec![Some(100), Some(50)]);
    let b = run.series_for("B").unwrap();
    assert_eq!(b.results.len(), 1);
    assert_eq!(b.results[0].outcome.as_str(), "timed_out");
}

#[tokio::test(start_paused = true)]
async fn timed_out_invocations_keep_their_place_in_the_journal() {
    let mut script = script();
    script
        .artifacts
        .get_mut("A")
        .unwrap()
        .operations
        .get_mut("create")
        .unwrap()
        .latency_ms = 60_000;

    let policy = RunPolicy {
        invoke_timeout_ms: 1_000,
        ..RunPolicy::default()
    };
    let variants = vec![Variant::new("A", "A"), Variant::new("B", "B")];
    let env = ScriptedEnvironment::new(script);
    ScenarioRunner::new(&env, &policy)
        .run(&variants, &Scenario::new("slow", vec![Step::new("create")]))
        .await
        .unwrap();

    let journal = env.journal();
    let invoked: Vec<&str> = journal
        .iter()
        .filter_map(|entry| match &entry.request {
            Request::Invoke { variant, .. } => Some(variant.as_str()),
            Request::Deploy { .. } => None,
        })
        .collect();
    assert_eq!(invoked, vec!["A", "B"]);

    let seqs: Vec<u64> = journal.iter().map(|entry| entry.seq).collect();
    assert_eq!(seqs, (0..journal.len() as u64).collect::<Vec<_>>());

    // A was abandoned at the timeout, B only started afterwards
    let a = &journal[2];
    let b = &journal[3];
    assert!(a.finished.is_none());
    assert!(a.started < b.started);
    assert!(b.finished.is_some());
}

#[tokio::test]
async fn abort_policy_stops_every_variant() {
    let mut config = suite(
        vec![Variant::new("C", "C"), Variant::new("A", "A")],
        scenario().with_assertion(AssertionSpec::compare("A", Comparator::Le, "A", "increment")),
    );
    config.run.failure_policy = FailurePolicy::AbortScenario;
    let harness = Harness::new(config).unwrap();

    let report = harness
        .run(None, || ScriptedEnvironment::new(script()))
        .await
        .unwrap();
    let scenario = &report.scenarios[0];
    assert_eq!(scenario.table.costs()["A"], vec![None, None]);
    assert_eq!(scenario.assertions[0].outcome, Verdict::Inconclusive);
    assert!(scenario.assertions[0].detail.contains("after C failed"));
}

#[tokio::test]
async fn encoding_mismatch_is_caught_per_variant() {
    let mut script = script();
    script
        .artifacts
        .get_mut("B")
        .unwrap()
        .operations
        .get_mut("create")
        .unwrap()
        .params
        .insert("param".to_string(), ParamEncoding::Bytes32);
    let variants = vec![Variant::new("A", "A"), Variant::new("B", "B")];
    let policy = RunPolicy::default();

    // Same text for everyone: B rejects it
    let env = ScriptedEnvironment::new(script.clone());
    let run = ScenarioRunner::new(&env, &policy)
        .run(&variants, &scenario())
        .await
        .unwrap();
    assert_eq!(run.costs("B").unwrap(), vec![None, None]);

    // B gets its own encoding through an override
    let encoded = libgasbench_core::types::encode_bytes32_string("X").unwrap();
    let adapted = Scenario::new(
        "adapted",
        vec![
            Step::new("create")
                .param("param", json!("X"))
                .override_param("B", "param", json!(encoded)),
            Step::new("increment"),
        ],
    );
    let env = ScriptedEnvironment::new(script);
    let run = ScenarioRunner::new(&env, &policy)
        .run(&variants, &adapted)
        .await
        .unwrap();
    assert_eq!(run.costs("B").unwrap(), vec![Some(80), Some(50)]);
}

#[tokio::test]
async fn selecting_an_unknown_scenario_fails() {
    let harness = Harness::new(suite(vec![Variant::new("A", "A")], scenario())).unwrap();
    let err = harness
        .run(Some("missing"), || ScriptedEnvironment::new(script()))
        .await
        .unwrap_err();
    assert_eq!(err.exit_code(), 2);
}

#[tokio::test]
async fn suites_built_in_code_expand_bytes32_directives() {
    let mut script = script();
    script
        .artifacts
        .get_mut("B")
        .unwrap()
        .operations
        .get_mut("create")
        .unwrap()
        .params
        .insert("param".to_string(), ParamEncoding::Bytes32);
    let scenario = Scenario::new(
        "in-code",
        vec![Step::new("create")
            .param("param", json!("X"))
            .override_param("B", "param", json!({ "bytes32": "X" }))],
    )
    .with_assertion(AssertionSpec::compare("B", Comparator::Lt, "A", "create"));
    let mut config = suite(vec![Variant::new("A", "A"), Variant::new("B", "B")], scenario);
    config.environment = script.clone();

    let harness = Harness::new(config).unwrap();
    let step = &harness.config().scenarios[0].steps[0];
    assert_eq!(
        step.params_for("B")["param"],
        json!(encode_bytes32_string("X").unwrap())
    );

    let report = harness
        .run(None, || ScriptedEnvironment::new(script.clone()))
        .await
        .unwrap();
    assert_eq!(report.scenarios[0].table.costs()["B"], vec![Some(80)]);
    assert_eq!(report.scenarios[0].assertions[0].outcome, Verdict::Pass);
}
