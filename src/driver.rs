//! Row driver: iterates input names, applies the skip/resume rule, invokes
//! the resolver, and writes one outcome per row.
//!
//! A row failure is recorded as an error outcome and never aborts the run;
//! only a sink write failure (the store itself) is fatal. A prior error
//! outcome has no email and no qualifying score, so failed rows are
//! automatically retried on the next run.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ResolveError;
use crate::resolver::{self, candidates::PhaseResult, score::Confidence, ResolverContext};

/// Minimum stored confidence score for the skip rule.
const SKIP_SCORE_THRESHOLD: f64 = 10.0;

/// Structured result written once per input row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowOutcome {
    pub email: String,
    pub status: String,
    pub alternates: String,
    pub confidence: String,
}

impl RowOutcome {
    pub fn empty_row() -> Self {
        Self {
            status: "Empty row".to_string(),
            ..Default::default()
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: "Not found".to_string(),
            ..Default::default()
        }
    }

    pub fn error(err: &ResolveError) -> Self {
        Self {
            status: format!("Error: {err}"),
            ..Default::default()
        }
    }

    pub fn from_phase(result: &PhaseResult) -> Self {
        let total = result.winner.score();
        let level = Confidence::from_score(total);
        Self {
            email: result.winner.email.clone(),
            status: result.source.found_label().to_string(),
            alternates: result.format_alternates(),
            confidence: format!(
                "{} confidence ({}: {:.1})",
                level.label(),
                result.source.as_str(),
                total
            ),
        }
    }
}

/// Parse the numeric score out of a stored confidence cell, e.g.
/// "High confidence (from: 24.5)" → 24.5.
pub fn parse_confidence_score(confidence: &str) -> Option<f64> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"confidence \([a-z]+: ([0-9]+(?:\.[0-9]+)?)\)").unwrap()
    });
    re.captures(confidence)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Where outcomes go. The SQLite store implements this in production; tests
/// use [`MemorySink`].
pub trait OutcomeSink {
    /// Previously stored outcome for a row, if any.
    fn prior(&self, row: usize) -> Option<RowOutcome>;

    fn write(&mut self, row: usize, name: &str, outcome: &RowOutcome) -> Result<(), String>;
}

/// Counts for one driver run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub resolved: usize,
    pub not_found: usize,
    pub skipped: usize,
    pub errors: usize,
    pub empty: usize,
}

/// Process every input row in order. Rows are independent: a failure in one
/// never stops the next.
pub fn run_rows(
    ctx: &ResolverContext,
    names: &[String],
    sink: &mut dyn OutcomeSink,
    force: bool,
) -> Result<RunSummary, String> {
    let mut summary = RunSummary::default();

    for (row, name) in names.iter().enumerate() {
        if name.trim().is_empty() {
            sink.write(row, name, &RowOutcome::empty_row())?;
            summary.empty += 1;
            continue;
        }

        if !force {
            if let Some(prior) = sink.prior(row) {
                if should_skip(&prior) {
                    log::debug!("row {} ('{}') already resolved, skipping", row, name);
                    summary.skipped += 1;
                    continue;
                }
            }
        }

        match resolver::resolve(ctx, name) {
            Ok(Some(result)) => {
                sink.write(row, name, &RowOutcome::from_phase(&result))?;
                summary.resolved += 1;
            }
            Ok(None) => {
                sink.write(row, name, &RowOutcome::not_found())?;
                summary.not_found += 1;
            }
            Err(ResolveError::EmptyName) => {
                sink.write(row, name, &RowOutcome::empty_row())?;
                summary.empty += 1;
            }
            Err(err) => {
                log::warn!("row {} ('{}') failed: {}", row, name, err);
                sink.write(row, name, &RowOutcome::error(&err))?;
                summary.errors += 1;
            }
        }
    }

    Ok(summary)
}

/// Skip rule: a prior non-empty email with a parseable confidence ≥ 10.
fn should_skip(prior: &RowOutcome) -> bool {
    !prior.email.is_empty()
        && parse_confidence_score(&prior.confidence)
            .map_or(false, |score| score >= SKIP_SCORE_THRESHOLD)
}

/// In-memory sink for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub rows: std::collections::BTreeMap<usize, (String, RowOutcome)>,
}

impl MemorySink {
    /// Seed a prior outcome, as if written by an earlier run.
    pub fn preload(&mut self, row: usize, name: &str, outcome: RowOutcome) {
        self.rows.insert(row, (name.to_string(), outcome));
    }
}

impl OutcomeSink for MemorySink {
    fn prior(&self, row: usize) -> Option<RowOutcome> {
        self.rows.get(&row).map(|(_, outcome)| outcome.clone())
    }

    fn write(&mut self, row: usize, name: &str, outcome: &RowOutcome) -> Result<(), String> {
        self.rows.insert(row, (name.to_string(), outcome.clone()));
        Ok(())
    }
}
