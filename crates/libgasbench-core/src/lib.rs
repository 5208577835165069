//! Deploy interchangeable implementations of one component, replay the same
//! operations against each and compare what every operation cost.

pub mod compare;
pub mod config;
pub mod deploy;
pub mod env;
pub mod error;
pub mod harness;
pub mod invoke;
pub mod report;
pub mod runner;
pub mod scenario;
pub mod types;

pub use compare::{AssertionOutcome, AssertionSpec, Comparator, StepRef, Verdict};
pub use config::{DeployPolicy, FailurePolicy, RunPolicy, SuiteConfig};
pub use env::{ExecutionEnvironment, Receipt, ScriptedEnvironment, TxStatus};
pub use error::{BenchError, EnvError, Result};
pub use harness::Harness;
pub use report::{CostTable, ScenarioReport, SuiteReport, VerdictCounts};
pub use runner::{ScenarioRun, ScenarioRunner};
pub use scenario::{Scenario, Step};
pub use types::{CostSeries, Instance, InvocationResult, Outcome, Params, SeriesStatus, Variant};
