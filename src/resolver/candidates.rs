//! Per-phase candidate aggregation.
//!
//! Accepted evidence is keyed by lowercased address. Merging same-address
//! evidence keeps the best core score seen so far and accumulates a capped
//! recency bump, so a candidate's score is monotonically non-decreasing
//! within a phase.

use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

use chrono::{DateTime, Utc};

/// Maximum cumulative recency bump a single candidate can accumulate.
pub const MAX_RECENCY_BUMP: f64 = 6.0;

/// Runners-up retained alongside the winner.
const MAX_ALTERNATES: usize = 5;

/// Which strategy produced a phase result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseTag {
    From,
    To,
    Cc,
    Bcc,
    Calendar,
    Body,
}

impl PhaseTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseTag::From => "from",
            PhaseTag::To => "to",
            PhaseTag::Cc => "cc",
            PhaseTag::Bcc => "bcc",
            PhaseTag::Calendar => "calendar",
            PhaseTag::Body => "body",
        }
    }

    /// Human-readable status label for the row outcome.
    pub fn found_label(&self) -> &'static str {
        match self {
            PhaseTag::From => "Found in FROM headers",
            PhaseTag::To => "Found in TO headers",
            PhaseTag::Cc => "Found in CC headers",
            PhaseTag::Bcc => "Found in BCC headers",
            PhaseTag::Calendar => "Found in calendar guests",
            PhaseTag::Body => "Found in message bodies",
        }
    }
}

/// One scored candidate address.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Original-case address for display; keying uses the lowercased form.
    pub email: String,
    /// Base + channel bonuses, excluding the recency bump.
    pub core_score: f64,
    /// Accumulated recency bump, capped at [`MAX_RECENCY_BUMP`].
    pub bump: f64,
    pub last_seen: DateTime<Utc>,
}

impl Candidate {
    pub fn score(&self) -> f64 {
        self.core_score + self.bump
    }
}

/// Candidate mapping for a single phase.
#[derive(Debug, Default)]
pub struct CandidateSet {
    by_email: HashMap<String, Candidate>,
}

impl CandidateSet {
    pub fn len(&self) -> usize {
        self.by_email.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_email.is_empty()
    }

    /// Record one piece of accepted evidence. On a repeat sighting only the
    /// bump delta is added (capped); the stored core score is replaced only
    /// when the new one is strictly greater, and the last-seen date keeps
    /// the most recent sighting.
    pub fn observe(&mut self, email: &str, core_score: f64, bump_delta: f64, seen: DateTime<Utc>) {
        match self.by_email.entry(email.to_lowercase()) {
            Entry::Occupied(mut entry) => {
                let candidate = entry.get_mut();
                candidate.bump = (candidate.bump + bump_delta).min(MAX_RECENCY_BUMP);
                if core_score > candidate.core_score {
                    candidate.core_score = core_score;
                }
                if seen > candidate.last_seen {
                    candidate.last_seen = seen;
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(Candidate {
                    email: email.to_string(),
                    core_score,
                    bump: bump_delta.min(MAX_RECENCY_BUMP),
                    last_seen: seen,
                });
            }
        }
    }

    /// Pick the winner (max score, ties broken by the most recent sighting)
    /// and up to five score-descending alternates.
    pub fn into_result(self, source: PhaseTag) -> Option<PhaseResult> {
        let mut all: Vec<Candidate> = self.by_email.into_values().collect();
        if all.is_empty() {
            return None;
        }
        all.sort_by(|a, b| {
            b.score()
                .partial_cmp(&a.score())
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.last_seen.cmp(&a.last_seen))
        });
        let winner = all.remove(0);
        all.truncate(MAX_ALTERNATES);
        Some(PhaseResult {
            winner,
            source,
            alternates: all,
        })
    }
}

/// Outcome of one phase: a winner plus runners-up.
#[derive(Debug, Clone)]
pub struct PhaseResult {
    pub winner: Candidate,
    pub source: PhaseTag,
    pub alternates: Vec<Candidate>,
}

impl PhaseResult {
    /// Alternates formatted as "email [score]", comma-joined.
    pub fn format_alternates(&self) -> String {
        self.alternates
            .iter()
            .map(|c| format!("{} [{:.1}]", c.email, c.score()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
