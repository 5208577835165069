//! Suite-level driver: run, compare, report

use tracing::info;

use crate::compare::{evaluate, resolve_assertions};
use crate::config::SuiteConfig;
use crate::env::ExecutionEnvironment;
use crate::error::Result;
use crate::report::{ScenarioReport, SuiteReport};
use crate::runner::ScenarioRunner;
use crate::scenario::Scenario;

/// Runs the scenarios of a validated suite
pub struct Harness {
    config: SuiteConfig,
}

impl Harness {
    /// Accepts suites parsed from TOML as well as ones built in code
    pub fn new(mut config: SuiteConfig) -> Result<Self> {
        config.expand_directives()?;
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Run one scenario in the given environment context.
    ///
    /// Assertions are evaluated only once every series has been collected.
    pub async fn run_scenario(
        &self,
        env: &dyn ExecutionEnvironment,
        scenario: &Scenario,
    ) -> Result<ScenarioReport> {
        let assertions = resolve_assertions(scenario, &self.config.variants)?;
        let run = ScenarioRunner::new(env, &self.config.run)
            .run(&self.config.variants, scenario)
            .await?;
        let outcomes = evaluate(&run, &assertions);
        let report = ScenarioReport::new(&scenario.description, &run, outcomes);
        info!(
            scenario = %scenario.name,
            pass = report.summary.pass,
            fail = report.summary.fail,
            inconclusive = report.summary.inconclusive,
            "Assertions evaluated"
        );
        Ok(report)
    }

    /// Run every scenario (or only `only`), each in a fresh environment
    /// context from `new_env`. Scenarios run one after another.
    pub async fn run<E, F>(&self, only: Option<&str>, mut new_env: F) -> Result<SuiteReport>
    where
        E: ExecutionEnvironment,
        F: FnMut() -> E,
    {
        let scenarios: Vec<&Scenario> = match only {
            Some(name) => vec![self.config.scenario(name)?],
            None => self.config.scenarios.iter().collect(),
        };

        let mut reports = Vec::with_capacity(scenarios.len());
        for scenario in scenarios {
            let env = new_env();
            reports.push(self.run_scenario(&env, scenario).await?);
        }
        Ok(SuiteReport::new(reports))
    }
}
