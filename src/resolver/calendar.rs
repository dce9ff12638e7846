//! Calendar guest phase.
//!
//! One query over a five-year guest-list window. Guests pass the gate on
//! word-level display-name overlap, or on a strong local-part pattern when
//! the guest has no display name worth matching. Recent co-attendance is
//! strong evidence, so the participant bonus scales with the recency tier;
//! an opaque local part that shares nothing with the name is penalized.

use chrono::Duration;

use crate::address;
use crate::error::ResolveError;
use crate::search::EventGuest;

use super::candidates::{CandidateSet, PhaseResult, PhaseTag};
use super::query::NameQuery;
use super::score;
use super::ResolverContext;

/// Guest-list window, in days (five years).
const CALENDAR_WINDOW_DAYS: i64 = 5 * 365;

/// Run the calendar phase. Returns None when no guest passed the gate.
pub fn run(ctx: &ResolverContext, query: &NameQuery) -> Result<Option<PhaseResult>, ResolveError> {
    ctx.limiter.wait();
    let start = ctx.now - Duration::days(CALENDAR_WINDOW_DAYS);
    let events = ctx.calendar.events_between(start, ctx.now)?;

    let mut set = CandidateSet::default();
    for event in &events {
        for guest in &event.guests {
            score_guest(ctx, query, event, guest, &mut set);
        }
    }
    log::debug!(
        "calendar phase: {} candidate(s) for '{}'",
        set.len(),
        query.raw
    );
    Ok(set.into_result(PhaseTag::Calendar))
}

/// Lowercased alphabetic words of a guest display name.
fn display_words(display: &str) -> Vec<String> {
    display
        .to_lowercase()
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn score_guest(
    ctx: &ResolverContext,
    query: &NameQuery,
    event: &crate::search::CalendarEvent,
    guest: &EventGuest,
    set: &mut CandidateSet,
) {
    let addr = &guest.email;
    if address::is_junk(addr) || !address::is_valid_address(addr) {
        return;
    }

    let words = display_words(&guest.display_name);
    let display_hits = query
        .tokens
        .iter()
        .filter(|t| words.iter().any(|w| w == *t))
        .count();
    let local = address::local_part(addr);
    let variants = query.surname_variants();

    if display_hits == 0 && !score::strong_local_pattern(local, &query.first, &variants) {
        return;
    }

    let mut core = score::best_base_score(addr, &query.first, &variants);

    let rb = score::recency_bonus(event.start, ctx.now);
    core += rb;

    core += match display_hits {
        0 => 0.0,
        1 => 2.0,
        _ => 4.0,
    };

    let local_hits = score::local_token_overlap(local, &query.tokens);
    if display_hits >= 2 && local_hits == 0 {
        core += 4.0;
    }

    // Co-attendance is worth more the fresher it is.
    let mut participant: f64 = if rb >= 6.0 {
        10.0
    } else if rb >= 3.0 {
        5.0
    } else {
        0.0
    };
    if local_hits == 0 {
        core -= 8.0;
        participant = (participant - 5.0).max(0.0);
    }
    core += participant;

    set.observe(addr, core, 0.0, event.start);
}
