//! Body-scan phase: last resort, mining message text for addresses.
//!
//! One query for the literal name string; every matched message's text
//! (plain part, else HTML stripped) is scanned for email-shaped substrings.
//! An address found this way is kept only when a surname variant appears in
//! its local part or domain — body text is noisy, hence the fixed penalty.

use chrono::{DateTime, Utc};

use crate::address;
use crate::error::ResolveError;

use super::candidates::{CandidateSet, PhaseResult, PhaseTag};
use super::query::NameQuery;
use super::score;
use super::ResolverContext;

/// Fixed penalty for body-mined evidence.
const BODY_NOISE_PENALTY: f64 = 2.0;

/// Run the body phase. Returns None when nothing was retained.
pub fn run(ctx: &ResolverContext, query: &NameQuery) -> Result<Option<PhaseResult>, ResolveError> {
    let q = build_query(ctx, query);
    ctx.limiter.wait();
    let threads = ctx.mail.search(&q, 0, ctx.page_size)?;

    let mut set = CandidateSet::default();
    for thread in &threads {
        for msg in &thread.messages {
            let Some(text) = msg.text() else { continue };
            for found in address::email_scan().find_iter(&text) {
                score_found(ctx, query, msg.date, found.as_str(), &mut set);
            }
        }
    }
    log::debug!("body phase: {} candidate(s) for '{}'", set.len(), query.raw);
    Ok(set.into_result(PhaseTag::Body))
}

fn build_query(ctx: &ResolverContext, query: &NameQuery) -> String {
    let mut q = format!("\"{}\"", query.raw);
    q.push_str(&format!(" newer_than:{}d", ctx.window_days));
    for noise in &ctx.noise_domains {
        q.push_str(&format!(" -from:{}", noise));
    }
    q
}

fn score_found(
    ctx: &ResolverContext,
    query: &NameQuery,
    date: DateTime<Utc>,
    addr: &str,
    set: &mut CandidateSet,
) {
    if address::is_junk(addr) || !address::is_valid_address(addr) {
        return;
    }

    let local = score::fold(address::local_part(addr));
    let dom = address::domain(addr).to_lowercase();
    let variants = query.surname_variants();
    let retained = variants.iter().any(|v| {
        let folded = score::fold(v);
        !folded.is_empty() && (local.contains(&folded) || dom.contains(&folded))
    });
    if !retained {
        return;
    }

    let mut core = score::best_base_score(addr, &query.first, &variants);
    if let Some(initial) = score::fold(&query.first).chars().next() {
        if local.starts_with(initial) {
            core += 2.0;
        }
    }
    core += score::recency_bonus(date, ctx.now);
    core -= BODY_NOISE_PENALTY;

    set.observe(addr, core, 0.0, date);
}
