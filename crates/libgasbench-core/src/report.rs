//! Cost tables and run reports

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::compare::{AssertionOutcome, Verdict};
use crate::error::Result;
use crate::runner::ScenarioRun;
use crate::scenario::StepInfo;
use crate::types::{CostSeries, Outcome, SeriesStatus};

/// Outcome of one table cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellOutcome {
    Committed,
    Rejected,
    TimedOut,
    NotRun,
    NotDeployed,
}

/// One (variant, step) entry of the cost table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostCell {
    pub variant: String,
    pub step: usize,
    pub operation: String,
    pub cost: Option<u64>,
    pub outcome: CellOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl CostCell {
    fn display(&self) -> String {
        match self.outcome {
            CellOutcome::Committed => self.cost.map(|c| c.to_string()).unwrap_or_default(),
            CellOutcome::Rejected => "REJECTED".to_string(),
            CellOutcome::TimedOut => "TIMEOUT".to_string(),
            CellOutcome::NotRun => "-".to_string(),
            CellOutcome::NotDeployed => "NOT DEPLOYED".to_string(),
        }
    }
}

/// All cells for one variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostRow {
    pub variant: String,
    pub status: SeriesStatus,
    pub cells: Vec<CostCell>,
}

/// Variant x step cost table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostTable {
    pub steps: Vec<StepInfo>,
    pub rows: Vec<CostRow>,
}

impl CostTable {
    pub fn from_run(run: &ScenarioRun) -> Self {
        let rows = run
            .series
            .iter()
            .map(|series| CostRow {
                variant: series.variant.clone(),
                status: series.status.clone(),
                cells: run.steps.iter().map(|step| cell(series, step)).collect(),
            })
            .collect();
        Self {
            steps: run.steps.clone(),
            rows,
        }
    }

    /// Committed costs keyed by variant
    pub fn costs(&self) -> BTreeMap<String, Vec<Option<u64>>> {
        self.rows
            .iter()
            .map(|row| (row.variant.clone(), row.cells.iter().map(|c| c.cost).collect()))
            .collect()
    }

    pub fn render(&self) -> String {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        let mut header = vec!["variant".to_string()];
        header.extend(self.steps.iter().map(|step| {
            if step.label == step.operation {
                step.label.clone()
            } else {
                format!("{} ({})", step.label, step.operation)
            }
        }));
        header.push("series".to_string());
        table.set_header(header);

        for row in &self.rows {
            let mut cells = vec![row.variant.clone()];
            cells.extend(row.cells.iter().map(CostCell::display));
            cells.push(row.status.as_str().to_string());
            table.add_row(cells);
        }
        table.to_string()
    }
}

fn cell(series: &CostSeries, step: &StepInfo) -> CostCell {
    let (cost, outcome, detail) = match series.result_at(step.index) {
        Some(result) => match &result.outcome {
            Outcome::Committed => (Some(result.cost), CellOutcome::Committed, None),
            Outcome::Rejected { reason } => (None, CellOutcome::Rejected, Some(reason.clone())),
            Outcome::TimedOut { after_ms } => (
                None,
                CellOutcome::TimedOut,
                Some(format!("no outcome after {}ms", after_ms)),
            ),
        },
        None => match &series.status {
            SeriesStatus::NotDeployed { reason } => (None, CellOutcome::NotDeployed, Some(reason.clone())),
            _ => (None, CellOutcome::NotRun, None),
        },
    };
    CostCell {
        variant: series.variant.clone(),
        step: step.index,
        operation: step.operation.clone(),
        cost,
        outcome,
        detail,
    }
}

/// Number of assertions per verdict
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictCounts {
    pub pass: usize,
    pub fail: usize,
    pub inconclusive: usize,
}

impl VerdictCounts {
    pub fn tally<'a>(outcomes: impl IntoIterator<Item = &'a AssertionOutcome>) -> Self {
        let mut counts = Self::default();
        for outcome in outcomes {
            match outcome.outcome {
                Verdict::Pass => counts.pass += 1,
                Verdict::Fail => counts.fail += 1,
                Verdict::Inconclusive => counts.inconclusive += 1,
            }
        }
        counts
    }

    fn add(&mut self, other: VerdictCounts) {
        self.pass += other.pass;
        self.fail += other.fail;
        self.inconclusive += other.inconclusive;
    }

    /// Whether these verdicts amount to a successful run
    pub fn passed(&self, inconclusive_fails: bool) -> bool {
        self.fail == 0 && (!inconclusive_fails || self.inconclusive == 0)
    }
}

/// Report for one scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub scenario: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub table: CostTable,
    pub assertions: Vec<AssertionOutcome>,
    pub summary: VerdictCounts,
}

impl ScenarioReport {
    pub fn new(description: &str, run: &ScenarioRun, assertions: Vec<AssertionOutcome>) -> Self {
        Self {
            scenario: run.scenario.clone(),
            description: description.to_string(),
            table: CostTable::from_run(run),
            summary: VerdictCounts::tally(&assertions),
            assertions,
        }
    }

    pub fn render(&self) -> String {
        let mut out = format!("{}\n", self.scenario);
        if !self.description.is_empty() {
            out.push_str(&format!("{}\n", self.description));
        }
        out.push_str(&self.table.render());
        out.push('\n');

        if !self.assertions.is_empty() {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["assertion", "outcome", "detail"]);
            for assertion in &self.assertions {
                table.add_row(vec![
                    assertion.description.clone(),
                    assertion.outcome.as_str().to_string(),
                    assertion.detail.clone(),
                ]);
            }
            out.push_str(&table.to_string());
            out.push('\n');
        }
        out
    }
}

/// Report for a whole suite run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub scenarios: Vec<ScenarioReport>,
    pub summary: VerdictCounts,
}

impl SuiteReport {
    pub fn new(scenarios: Vec<ScenarioReport>) -> Self {
        let mut summary = VerdictCounts::default();
        for scenario in &scenarios {
            summary.add(scenario.summary);
        }
        Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            scenarios,
            summary,
        }
    }

    pub fn passed(&self, inconclusive_fails: bool) -> bool {
        self.summary.passed(inconclusive_fails)
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for scenario in &self.scenarios {
            out.push_str(&scenario.render());
            out.push('\n');
        }
        out.push_str(&format!(
            "{} passed, {} failed, {} inconclusive\n",
            self.summary.pass, self.summary.fail, self.summary.inconclusive
        ));
        out
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
