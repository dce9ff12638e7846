//! Header phase: From / To / Cc / Bcc searches.
//!
//! Each channel issues one rate-limited query combining the full name and
//! its "Last, First" form, then mines the matching messages' recipient
//! headers for (display name, address) pairs. Pairs are junk-filtered and
//! format-validated before the acceptance gate; accepted pairs are scored
//! with channel-specific bonuses on top of the shared base score.

use crate::address;
use crate::error::ResolveError;
use crate::search::MailMessage;

use super::candidates::{CandidateSet, PhaseResult, PhaseTag};
use super::query::NameQuery;
use super::score;
use super::ResolverContext;

/// Recency-bonus multiplier for header evidence.
const HEADER_RECENCY_WEIGHT: f64 = 1.5;

/// One header channel searched by this phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    From,
    To,
    Cc,
    Bcc,
}

impl Channel {
    pub fn operator(&self) -> &'static str {
        match self {
            Channel::From => "from",
            Channel::To => "to",
            Channel::Cc => "cc",
            Channel::Bcc => "bcc",
        }
    }

    pub fn tag(&self) -> PhaseTag {
        match self {
            Channel::From => PhaseTag::From,
            Channel::To => PhaseTag::To,
            Channel::Cc => PhaseTag::Cc,
            Channel::Bcc => PhaseTag::Bcc,
        }
    }

    fn header<'a>(&self, msg: &'a MailMessage) -> &'a str {
        match self {
            Channel::From => &msg.from,
            Channel::To => &msg.to,
            Channel::Cc => &msg.cc,
            Channel::Bcc => &msg.bcc,
        }
    }
}

/// Run one header channel. Returns None when no candidate passed the gate.
pub fn run(
    ctx: &ResolverContext,
    query: &NameQuery,
    channel: Channel,
) -> Result<Option<PhaseResult>, ResolveError> {
    let q = build_query(ctx, query, channel);
    ctx.limiter.wait();
    let threads = ctx.mail.search(&q, 0, ctx.page_size)?;

    let mut set = CandidateSet::default();
    for thread in &threads {
        for msg in &thread.messages {
            let outbound = is_outbound(ctx, msg, channel);
            for mailbox in address::parse_address_list(channel.header(msg)) {
                score_mailbox(ctx, query, channel, msg, outbound, &mailbox, &mut set);
            }
        }
    }
    log::debug!(
        "header phase {}: {} candidate(s) for '{}'",
        channel.operator(),
        set.len(),
        query.raw
    );
    Ok(set.into_result(channel.tag()))
}

fn build_query(ctx: &ResolverContext, query: &NameQuery, channel: Channel) -> String {
    let last_first = query.last_first();
    let mut q = if last_first == query.raw {
        format!("{}:(\"{}\")", channel.operator(), query.raw)
    } else {
        format!(
            "{}:(\"{}\" OR \"{}\")",
            channel.operator(),
            query.raw,
            last_first
        )
    };
    q.push_str(&format!(" newer_than:{}d", ctx.window_days));
    for noise in &ctx.noise_domains {
        q.push_str(&format!(" -{}:{}", channel.operator(), noise));
    }
    q
}

/// A message is outbound when its From header carries one of the owner's
/// addresses. Bcc is trivially outbound — it only appears on sent mail.
fn is_outbound(ctx: &ResolverContext, msg: &MailMessage, channel: Channel) -> bool {
    if channel == Channel::Bcc {
        return true;
    }
    address::parse_address_list(&msg.from)
        .iter()
        .any(|m| ctx.self_addresses.contains(&m.address.to_lowercase()))
}

fn score_mailbox(
    ctx: &ResolverContext,
    query: &NameQuery,
    channel: Channel,
    msg: &MailMessage,
    outbound: bool,
    mailbox: &address::Mailbox,
    set: &mut CandidateSet,
) {
    let addr = &mailbox.address;
    if address::is_junk(addr) || !address::is_valid_address(addr) {
        return;
    }

    let display = mailbox.display.to_lowercase();
    let display_hits = query
        .tokens
        .iter()
        .filter(|t| display.contains(t.as_str()))
        .count();
    let local = address::local_part(addr);
    let variants = query.surname_variants();

    // Acceptance gate: token overlap in the display name, or a strong
    // local-part pattern as fallback.
    if display_hits == 0 && !score::strong_local_pattern(local, &query.first, &variants) {
        return;
    }

    let mut core = score::best_base_score(addr, &query.first, &variants);

    let rb = score::recency_bonus(msg.date, ctx.now);
    core += rb * HEADER_RECENCY_WEIGHT;

    core += match display_hits {
        0 => 0.0,
        1 => 2.0,
        _ => 4.0,
    };

    let local_hits = score::local_token_overlap(local, &query.tokens);
    // Opaque local part behind an exact-looking display name. Outbound mail
    // means the owner chose this address for this person — worth more.
    if display_hits >= 2 && local_hits == 0 {
        core += if outbound { 8.0 } else { 4.0 };
    }

    if outbound && matches!(channel, Channel::To | Channel::Cc) {
        core += 4.0;
    }

    if let Some(missing) = missing_name_token(query, &display, local) {
        if let Some(text) = msg.text() {
            if text.to_lowercase().contains(&missing) {
                core += 4.0;
            }
        }
    }

    let bump_delta = if rb >= 6.0 {
        2.0
    } else if rb >= 3.0 {
        1.0
    } else {
        0.0
    };
    set.observe(addr, core, bump_delta, msg.date);
}

/// When display + local part jointly cover exactly one of {first, last},
/// return the missing token so the message body can corroborate it.
fn missing_name_token(query: &NameQuery, display: &str, local: &str) -> Option<String> {
    let local_folded = score::fold(local);
    let covers = |name: &str| -> bool {
        let folded = score::fold(name);
        display.contains(name) || (!folded.is_empty() && local_folded.contains(&folded))
    };
    let first_covered = covers(&query.first);
    let last_covered = query.surname_variants().iter().any(|v| covers(v));
    match (first_covered, last_covered) {
        (true, false) => Some(query.last_simple.clone()),
        (false, true) => Some(query.first.clone()),
        _ => None,
    }
}
