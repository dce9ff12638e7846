//! Email address parsing and filtering.
//!
//! Recipient headers like `"Smith, Jane" <j@x.com>, Bob <bob@y.com>` are
//! split into (display name, address) pairs. The comma split respects both
//! angle brackets and double quotes, so quoted display names containing
//! commas survive intact.

use std::sync::OnceLock;

use regex::Regex;

/// Local-part substrings that mark automated senders. Addresses matching any
/// of these never become candidates.
pub const JUNK_LOCAL_PATTERNS: &[&str] = &[
    "noreply",
    "no-reply",
    "donotreply",
    "do-not-reply",
    "mailer-daemon",
    "bounce",
];

/// Internal service domains whose addresses are machine artifacts, not
/// people (document shares, calendar resources, bounce relays).
pub const SYSTEM_DOMAINS: &[&str] = &[
    "docs.google.com",
    "drive-shares-noreply.google.com",
    "resource.calendar.google.com",
    "group.calendar.google.com",
    "calendar-server.bounces.google.com",
];

/// One parsed (display name, address) pair from a recipient header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    pub display: String,
    pub address: String,
}

fn address_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~.-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
            .unwrap()
    })
}

/// Email-shaped substrings in free text, for body scanning.
pub fn email_scan() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap())
}

/// Split a recipient header into mailboxes. Commas inside angle brackets or
/// double quotes do not split.
pub fn parse_address_list(header: &str) -> Vec<Mailbox> {
    let mut parts: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_angle = false;
    let mut in_quote = false;

    for c in header.chars() {
        match c {
            '"' => {
                in_quote = !in_quote;
                current.push(c);
            }
            '<' if !in_quote => {
                in_angle = true;
                current.push(c);
            }
            '>' if !in_quote => {
                in_angle = false;
                current.push(c);
            }
            ',' if !in_angle && !in_quote => {
                parts.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        parts.push(current);
    }

    parts.iter().filter_map(|p| parse_single(p)).collect()
}

fn parse_single(part: &str) -> Option<Mailbox> {
    let trimmed = part.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(lt) = trimmed.find('<') {
        let gt = trimmed.rfind('>')?;
        if gt <= lt {
            return None;
        }
        let address = trimmed[lt + 1..gt].trim().to_string();
        if address.is_empty() {
            return None;
        }
        let display = trimmed[..lt].trim().trim_matches('"').trim().to_string();
        Some(Mailbox { display, address })
    } else if trimmed.contains('@') {
        Some(Mailbox {
            display: String::new(),
            address: trimmed.trim_matches('"').to_string(),
        })
    } else {
        None
    }
}

/// Local part of an address ("jane.smith" in "jane.smith@x.com").
pub fn local_part(address: &str) -> &str {
    address.split('@').next().unwrap_or(address)
}

/// Domain of an address, or "" when it has none.
pub fn domain(address: &str) -> &str {
    address.split('@').nth(1).unwrap_or("")
}

/// Basic local@domain.tld shape check.
pub fn is_valid_address(address: &str) -> bool {
    address_shape().is_match(address)
}

/// Junk filter. Runs before acceptance gating in every phase — a junk
/// address never enters a candidate set regardless of display-name overlap.
pub fn is_junk(address: &str) -> bool {
    let lower = address.to_lowercase();
    let local = local_part(&lower);
    if local == "notifications" {
        return true;
    }
    if JUNK_LOCAL_PATTERNS.iter().any(|p| local.contains(p)) {
        return true;
    }
    let dom = domain(&lower);
    SYSTEM_DOMAINS.iter().any(|d| dom == *d)
}
