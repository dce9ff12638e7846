//! Name-to-email resolution cascade.
//!
//! Phases run in strict priority order — From, To, Cc, Bcc headers, then
//! calendar guests, then message bodies. The first phase producing any
//! accepted candidate wins; later phases never override or enrich it.
//! Everything a phase needs arrives through [`ResolverContext`] — no
//! ambient global state.

pub mod body;
pub mod calendar;
pub mod candidates;
pub mod headers;
pub mod query;
pub mod score;

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::error::ResolveError;
use crate::ratelimit::RateLimiter;
use crate::search::{CalendarSearch, MessageSearch};

use candidates::PhaseResult;
use headers::Channel;
use query::NameQuery;

/// Explicit dependencies for one resolution run.
pub struct ResolverContext<'a> {
    pub mail: &'a dyn MessageSearch,
    pub calendar: &'a dyn CalendarSearch,
    pub limiter: &'a RateLimiter,
    /// The account owner's primary address and aliases, lowercased. Used
    /// only for outbound detection.
    pub self_addresses: HashSet<String>,
    /// Domains excluded from header and body search queries.
    pub noise_domains: Vec<String>,
    /// Header/body search recency window, in days.
    pub window_days: i64,
    /// Injected clock; recency scoring measures against this instant.
    pub now: DateTime<Utc>,
    /// Maximum threads consumed per phase query.
    pub page_size: usize,
}

const HEADER_CHANNELS: [Channel; 4] = [Channel::From, Channel::To, Channel::Cc, Channel::Bcc];

/// Resolve one display name. Returns the winning phase result, or None when
/// every phase came up empty.
pub fn resolve(ctx: &ResolverContext, raw_name: &str) -> Result<Option<PhaseResult>, ResolveError> {
    let query = NameQuery::parse(raw_name)?;
    let result = run_phases(ctx, &query)?;
    match &result {
        Some(r) => log::info!(
            "resolved '{}' via {}: {} ({:.1})",
            query.raw,
            r.source.as_str(),
            r.winner.email,
            r.winner.score()
        ),
        None => log::info!("no match for '{}'", query.raw),
    }
    Ok(result)
}

fn run_phases(ctx: &ResolverContext, query: &NameQuery) -> Result<Option<PhaseResult>, ResolveError> {
    for channel in HEADER_CHANNELS {
        if let Some(result) = headers::run(ctx, query, channel)? {
            return Ok(Some(result));
        }
    }
    if let Some(result) = calendar::run(ctx, query)? {
        return Ok(Some(result));
    }
    body::run(ctx, query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::fixtures::{message, thread, FixtureSearch};
    use crate::search::{CalendarEvent, EventGuest};
    use candidates::PhaseTag;
    use chrono::Duration;
    use std::time::Duration as StdDuration;

    fn context<'a>(fixture: &'a FixtureSearch, limiter: &'a RateLimiter) -> ResolverContext<'a> {
        ResolverContext {
            mail: fixture,
            calendar: fixture,
            limiter,
            self_addresses: HashSet::from(["me@myco.com".to_string()]),
            noise_domains: Vec::new(),
            window_days: 1095,
            now: Utc::now(),
            page_size: 25,
        }
    }

    #[test]
    fn test_phase_priority_cc_beats_calendar() {
        let now = Utc::now();
        // Valid Cc match AND a valid calendar match for the same name.
        let fixture = FixtureSearch::default()
            .with_channel(
                "cc",
                thread(vec![message(
                    "other@x.com",
                    "",
                    "Jane Smith <jane.cc@acme.com>",
                    "",
                    now - Duration::days(5),
                )]),
            )
            .with_events(vec![CalendarEvent {
                start: now - Duration::days(5),
                guests: vec![EventGuest {
                    email: "jane.cal@acme.com".to_string(),
                    display_name: "Jane Smith".to_string(),
                }],
            }]);
        let limiter = RateLimiter::new(StdDuration::ZERO);
        let ctx = context(&fixture, &limiter);

        let result = resolve(&ctx, "Jane Smith").unwrap().unwrap();
        assert_eq!(result.source, PhaseTag::Cc);
        assert_eq!(result.winner.email, "jane.cc@acme.com");
        // From, To, Cc queried; Calendar and Body never reached.
        let queries = fixture.queries.borrow();
        assert_eq!(queries.len(), 3);
        assert!(!queries.iter().any(|q| q == "calendar"));
    }

    #[test]
    fn test_falls_through_to_calendar() {
        let now = Utc::now();
        let fixture = FixtureSearch::default().with_events(vec![CalendarEvent {
            start: now - Duration::days(5),
            guests: vec![EventGuest {
                email: "jane.smith@acme.com".to_string(),
                display_name: "Jane Smith".to_string(),
            }],
        }]);
        let limiter = RateLimiter::new(StdDuration::ZERO);
        let ctx = context(&fixture, &limiter);

        let result = resolve(&ctx, "Jane Smith").unwrap().unwrap();
        assert_eq!(result.source, PhaseTag::Calendar);
        // All four header channels queried first.
        assert_eq!(fixture.query_count(), 5);
    }

    #[test]
    fn test_no_phase_yields_none() {
        let fixture = FixtureSearch::default();
        let limiter = RateLimiter::new(StdDuration::ZERO);
        let ctx = context(&fixture, &limiter);
        assert!(resolve(&ctx, "Jane Smith").unwrap().is_none());
        // Every phase was tried: 4 headers + calendar + body.
        assert_eq!(fixture.query_count(), 6);
    }

    #[test]
    fn test_empty_name_is_invalid_input() {
        let fixture = FixtureSearch::default();
        let limiter = RateLimiter::new(StdDuration::ZERO);
        let ctx = context(&fixture, &limiter);
        assert!(matches!(
            resolve(&ctx, "   "),
            Err(ResolveError::EmptyName)
        ));
        assert_eq!(fixture.query_count(), 0);
    }

    #[test]
    fn test_deterministic_scoring_same_inputs_same_scores() {
        let now = Utc::now();
        let make_fixture = || {
            FixtureSearch::default().with_channel(
                "from",
                thread(vec![message(
                    "Jane Smith <jane.smith@acme.com>",
                    "",
                    "",
                    "",
                    now - Duration::days(5),
                )]),
            )
        };
        let limiter = RateLimiter::new(StdDuration::ZERO);

        let fixture_a = make_fixture();
        let mut ctx = context(&fixture_a, &limiter);
        ctx.now = now;
        let a = resolve(&ctx, "Jane Smith").unwrap().unwrap().winner.score();

        let fixture_b = make_fixture();
        let mut ctx = context(&fixture_b, &limiter);
        ctx.now = now;
        let b = resolve(&ctx, "Jane Smith").unwrap().unwrap().winner.score();

        assert_eq!(a, b);
    }
}
