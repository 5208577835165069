//! Comparison assertions over collected cost series

use serde::{Deserialize, Serialize};

use crate::error::{BenchError, Result};
use crate::runner::ScenarioRun;
use crate::scenario::Scenario;
use crate::types::{CostSeries, Outcome, SeriesStatus, Variant};

/// Integer comparison used by an assertion. `Lt`/`Gt` are strict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparator {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
}

impl Comparator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparator::Lt => "<",
            Comparator::Le => "<=",
            Comparator::Gt => ">",
            Comparator::Ge => ">=",
            Comparator::Eq => "==",
        }
    }

    pub fn holds(&self, left: u64, right: u64) -> bool {
        match self {
            Comparator::Lt => left < right,
            Comparator::Le => left <= right,
            Comparator::Gt => left > right,
            Comparator::Ge => left >= right,
            Comparator::Eq => left == right,
        }
    }
}

/// Reference to a step by label or zero-based index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepRef {
    Index(usize),
    Label(String),
}

impl From<&str> for StepRef {
    fn from(label: &str) -> Self {
        StepRef::Label(label.to_string())
    }
}

impl From<usize> for StepRef {
    fn from(index: usize) -> Self {
        StepRef::Index(index)
    }
}

/// Assertion as written in a suite file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssertionSpec {
    /// `left <cmp> right` at one step
    Compare {
        left: String,
        right: String,
        step: StepRef,
        cmp: Comparator,
    },
    /// Pairwise compare along an ordered list: v0 <cmp> v1 <cmp> v2 ...
    Chain {
        variants: Vec<String>,
        step: StepRef,
        cmp: Comparator,
    },
    /// `variant <cmp> limit` at one step
    Threshold {
        variant: String,
        step: StepRef,
        cmp: Comparator,
        limit: u64,
    },
}

impl AssertionSpec {
    pub fn compare(left: &str, cmp: Comparator, right: &str, step: impl Into<StepRef>) -> Self {
        AssertionSpec::Compare {
            left: left.to_string(),
            right: right.to_string(),
            step: step.into(),
            cmp,
        }
    }

    pub fn chain(variants: &[&str], cmp: Comparator, step: impl Into<StepRef>) -> Self {
        AssertionSpec::Chain {
            variants: variants.iter().map(|v| v.to_string()).collect(),
            step: step.into(),
            cmp,
        }
    }

    pub fn threshold(variant: &str, cmp: Comparator, limit: u64, step: impl Into<StepRef>) -> Self {
        AssertionSpec::Threshold {
            variant: variant.to_string(),
            step: step.into(),
            cmp,
            limit,
        }
    }
}

/// What an assertion checks, with the step already resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check {
    Pair {
        left: String,
        right: String,
        cmp: Comparator,
    },
    Limit {
        variant: String,
        cmp: Comparator,
        limit: u64,
    },
}

/// A resolved assertion ready for evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assertion {
    pub description: String,
    pub step: usize,
    pub check: Check,
}

/// Verdict of a single assertion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    Fail,
    Inconclusive,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Pass => "PASS",
            Verdict::Fail => "FAIL",
            Verdict::Inconclusive => "INCONCLUSIVE",
        }
    }
}

/// Evaluated assertion, as reported
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionOutcome {
    pub description: String,
    pub step: usize,
    pub outcome: Verdict,
    pub detail: String,
}

/// Resolve step references and variant names for every assertion in a scenario
pub fn resolve_assertions(scenario: &Scenario, variants: &[Variant]) -> Result<Vec<Assertion>> {
    let known = |name: &str| -> Result<String> {
        if variants.iter().any(|v| v.name == name) {
            Ok(name.to_string())
        } else {
            Err(BenchError::config(format!(
                "scenario '{}' asserts on unknown variant '{}'",
                scenario.name, name
            )))
        }
    };

    let mut resolved = Vec::new();
    for spec in &scenario.assertions {
        match spec {
            AssertionSpec::Compare {
                left,
                right,
                step,
                cmp,
            } => {
                let (index, label) = resolve_step(scenario, step)?;
                resolved.push(pair(known(left)?, known(right)?, *cmp, index, label));
            }
            AssertionSpec::Chain { variants: chain, step, cmp } => {
                if chain.len() < 2 {
                    return Err(BenchError::config(format!(
                        "scenario '{}' has a chain assertion with fewer than two variants",
                        scenario.name
                    )));
                }
                let (index, label) = resolve_step(scenario, step)?;
                for window in chain.windows(2) {
                    resolved.push(pair(known(&window[0])?, known(&window[1])?, *cmp, index, label));
                }
            }
            AssertionSpec::Threshold {
                variant,
                step,
                cmp,
                limit,
            } => {
                let (index, label) = resolve_step(scenario, step)?;
                resolved.push(Assertion {
                    description: format!("{}.{} {} {}", variant, label, cmp.symbol(), limit),
                    step: index,
                    check: Check::Limit {
                        variant: known(variant)?,
                        cmp: *cmp,
                        limit: *limit,
                    },
                });
            }
        }
    }
    Ok(resolved)
}

fn pair(left: String, right: String, cmp: Comparator, step: usize, label: &str) -> Assertion {
    Assertion {
        description: format!("{}.{} {} {}.{}", left, label, cmp.symbol(), right, label),
        step,
        check: Check::Pair { left, right, cmp },
    }
}

fn resolve_step<'a>(scenario: &'a Scenario, step: &StepRef) -> Result<(usize, &'a str)> {
    let index = match step {
        StepRef::Index(index) => *index,
        StepRef::Label(label) => scenario.step_index(label).ok_or_else(|| {
            BenchError::config(format!(
                "scenario '{}' has no step labeled '{}'",
                scenario.name, label
            ))
        })?,
    };
    let resolved = scenario.steps.get(index).ok_or_else(|| {
        BenchError::config(format!(
            "scenario '{}' has {} steps, assertion refers to step {}",
            scenario.name,
            scenario.steps.len(),
            index
        ))
    })?;
    Ok((index, resolved.label()))
}

/// Evaluate assertions against a finished scenario run
pub fn evaluate(run: &ScenarioRun, assertions: &[Assertion]) -> Vec<AssertionOutcome> {
    assertions.iter().map(|a| evaluate_one(run, a)).collect()
}

fn evaluate_one(run: &ScenarioRun, assertion: &Assertion) -> AssertionOutcome {
    let step = assertion.step;
    let (outcome, detail) = match &assertion.check {
        Check::Pair { left, right, cmp } => {
            match (cost_or_reason(run, left, step), cost_or_reason(run, right, step)) {
                (Ok(l), Ok(r)) => verdict(cmp.holds(l, r), format!("{} {} {}", l, cmp.symbol(), r)),
                (Err(reason), _) | (_, Err(reason)) => (Verdict::Inconclusive, reason),
            }
        }
        Check::Limit { variant, cmp, limit } => match cost_or_reason(run, variant, step) {
            Ok(cost) => verdict(
                cmp.holds(cost, *limit),
                format!("{} {} {}", cost, cmp.symbol(), limit),
            ),
            Err(reason) => (Verdict::Inconclusive, reason),
        },
    };

    AssertionOutcome {
        description: assertion.description.clone(),
        step,
        outcome,
        detail,
    }
}

fn verdict(holds: bool, comparison: String) -> (Verdict, String) {
    if holds {
        (Verdict::Pass, comparison)
    } else {
        (Verdict::Fail, format!("{} is false", comparison))
    }
}

/// Committed cost of `variant` at `step`, or why there is none
fn cost_or_reason(run: &ScenarioRun, variant: &str, step: usize) -> std::result::Result<u64, String> {
    let series = run
        .series_for(variant)
        .ok_or_else(|| format!("no series collected for '{}'", variant))?;
    series.cost_at(step).ok_or_else(|| missing_reason(run, series, step))
}

fn missing_reason(run: &ScenarioRun, series: &CostSeries, step: usize) -> String {
    let label = |index: usize| {
        run.steps
            .get(index)
            .map(|s| s.label.clone())
            .unwrap_or_else(|| index.to_string())
    };

    if let Some(result) = series.result_at(step) {
        return match &result.outcome {
            Outcome::Rejected { reason } => {
                format!("{} rejected at step '{}': {}", series.variant, label(step), reason)
            }
            Outcome::TimedOut { after_ms } => format!(
                "{} timed out at step '{}' after {}ms",
                series.variant,
                label(step),
                after_ms
            ),
            Outcome::Committed => format!("{} has no cost at step '{}'", series.variant, label(step)),
        };
    }

    match &series.status {
        SeriesStatus::NotDeployed { reason } => {
            format!("{} was not deployed: {}", series.variant, reason)
        }
        SeriesStatus::Halted { step: at } => {
            format!("{} series truncated at step '{}'", series.variant, label(*at))
        }
        SeriesStatus::Aborted { step: at, by } => format!(
            "scenario aborted at step '{}' after {} failed",
            label(*at),
            by
        ),
        SeriesStatus::Complete => format!("{} has no result at step {}", series.variant, step),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{StepInfo, Step};
    use crate::types::InvocationResult;

    fn run(series: Vec<CostSeries>) -> ScenarioRun {
        ScenarioRun {
            scenario: "s".into(),
            steps: vec![
                StepInfo { index: 0, label: "create".into(), operation: "create".into() },
                StepInfo { index: 1, label: "increment".into(), operation: "increment".into() },
            ],
            series,
        }
    }

    fn complete(variant: &str, costs: &[u64]) -> CostSeries {
        let mut series = CostSeries::new(variant);
        let ops = ["create", "increment"];
        for (op, cost) in ops.iter().zip(costs) {
            series.results.push(InvocationResult::committed(*op, *cost));
        }
        series
    }

    fn assertion(left: &str, right: &str, cmp: Comparator, step: usize) -> Assertion {
        pair(left.into(), right.into(), cmp, step, ["create", "increment"][step])
    }

    #[test]
    fn strict_and_non_strict_differ_on_equal_costs() {
        let run = run(vec![complete("a", &[100, 50]), complete("b", &[80, 50])]);
        let outcomes = evaluate(
            &run,
            &[
                assertion("b", "a", Comparator::Lt, 1),
                assertion("b", "a", Comparator::Le, 1),
                assertion("b", "a", Comparator::Eq, 1),
            ],
        );
        assert_eq!(outcomes[0].outcome, Verdict::Fail);
        assert_eq!(outcomes[0].detail, "50 < 50 is false");
        assert_eq!(outcomes[1].outcome, Verdict::Pass);
        assert_eq!(outcomes[2].outcome, Verdict::Pass);
    }

    #[test]
    fn verdict_matches_literal_comparison() {
        for (l, r) in [(0u64, 0u64), (1, 2), (2, 1), (u64::MAX, u64::MAX - 1), (79_999, 80_000)] {
            let run = run(vec![complete("l", &[l, 0]), complete("r", &[r, 0])]);
            for cmp in [Comparator::Lt, Comparator::Le, Comparator::Gt, Comparator::Ge, Comparator::Eq] {
                let outcome = &evaluate(&run, &[assertion("l", "r", cmp, 0)])[0];
                let expected = if cmp.holds(l, r) { Verdict::Pass } else { Verdict::Fail };
                assert_eq!(outcome.outcome, expected, "{} {} {}", l, cmp.symbol(), r);
            }
        }
    }

    #[test]
    fn truncated_series_are_inconclusive() {
        let mut c = CostSeries::new("c");
        c.results.push(InvocationResult::rejected("create", "precondition"));
        c.status = SeriesStatus::Halted { step: 0 };
        let run = run(vec![complete("a", &[100, 50]), c]);

        let outcomes = evaluate(
            &run,
            &[assertion("c", "a", Comparator::Lt, 0), assertion("c", "a", Comparator::Lt, 1)],
        );
        assert_eq!(outcomes[0].outcome, Verdict::Inconclusive);
        assert!(outcomes[0].detail.contains("rejected at step 'create'"));
        assert_eq!(outcomes[1].outcome, Verdict::Inconclusive);
        assert!(outcomes[1].detail.contains("truncated"));
    }

    #[test]
    fn undeployed_variants_are_inconclusive() {
        let run = run(vec![complete("a", &[1, 1]), CostSeries::not_deployed("z", "init reverted")]);
        let outcome = &evaluate(&run, &[assertion("a", "z", Comparator::Lt, 0)])[0];
        assert_eq!(outcome.outcome, Verdict::Inconclusive);
        assert_eq!(outcome.detail, "z was not deployed: init reverted");
    }

    #[test]
    fn threshold_compares_against_limit() {
        let run = run(vec![complete("a", &[100, 50])]);
        let limit = Assertion {
            description: "a.create <= 100".into(),
            step: 0,
            check: Check::Limit { variant: "a".into(), cmp: Comparator::Le, limit: 100 },
        };
        assert_eq!(evaluate(&run, &[limit])[0].outcome, Verdict::Pass);
    }

    #[test]
    fn chains_expand_pairwise() {
        let scenario = Scenario::new("s", vec![Step::new("addUser")]).with_assertion(
            AssertionSpec::chain(&["optimized", "medium", "naive"], Comparator::Lt, "addUser"),
        );
        let variants = vec![
            Variant::new("naive", "N"),
            Variant::new("medium", "M"),
            Variant::new("optimized", "O"),
        ];
        let resolved = resolve_assertions(&scenario, &variants).unwrap();
        let descriptions: Vec<_> = resolved.iter().map(|a| a.description.as_str()).collect();
        assert_eq!(
            descriptions,
            vec!["optimized.addUser < medium.addUser", "medium.addUser < naive.addUser"]
        );
    }

    #[test]
    fn out_of_range_steps_fail_resolution() {
        let scenario = Scenario::new("s", vec![Step::new("addUser")])
            .with_assertion(AssertionSpec::compare("a", Comparator::Lt, "b", 3usize));
        let variants = vec![Variant::new("a", "A"), Variant::new("b", "B")];
        assert!(resolve_assertions(&scenario, &variants).is_err());

        let scenario = Scenario::new("s", vec![Step::new("addUser")])
            .with_assertion(AssertionSpec::compare("a", Comparator::Lt, "b", "missing"));
        assert!(resolve_assertions(&scenario, &variants).is_err());
    }
}
