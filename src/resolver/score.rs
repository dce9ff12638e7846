//! Shared scoring primitives: pattern-based base score, recency bonus, and
//! confidence labels.
//!
//! `base_score` rewards exact and partial name patterns in an address.
//! The two exact-concatenation tests are independent (+20 each); the
//! remaining patterns form one graded chain so a strong match shadows its
//! weaker shapes: both-names-substring (+12), exact single-name local with
//! domain corroboration (+10, else +6), startsWith first/last (+8 each),
//! initial+surname / surname+initial prefix (+8 each), weak substring
//! presence of first and last (+4 each). "jane.smith" for Jane Smith scores
//! 20 + 12 = 32; "jsmith" scores 8.

use chrono::{DateTime, Duration, Utc};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::address;

/// Fold a string for local-part matching: Unicode NFKD with combining marks
/// dropped, lowercased, apostrophes/hyphens/dots removed.
pub fn fold(value: &str) -> String {
    value
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .filter(|c| !matches!(c, '\'' | '\u{2019}' | '-' | '.'))
        .collect()
}

/// Score how well an address's local part matches a (first, last) pair.
/// Pure: independent of recency, channel, and any other evidence.
pub fn base_score(email: &str, first: &str, last: &str) -> f64 {
    let local_raw = address::local_part(email);
    let local = fold(local_raw);
    let dom = fold(address::domain(email));
    let f = fold(first);
    let l = fold(last);
    if local.is_empty() || f.is_empty() || l.is_empty() {
        return 0.0;
    }
    let fi = &f[..f
        .char_indices()
        .nth(1)
        .map(|(i, _)| i)
        .unwrap_or(f.len())];

    let mut score = 0.0;

    // Exact concatenations, each counted on its own.
    if local == format!("{f}{l}") {
        score += 20.0;
    }
    if local == format!("{l}{f}") {
        score += 20.0;
    }

    if local.contains(&f) && local.contains(&l) {
        score += 12.0;
    } else if local == f {
        score += if dom.contains(&l) { 10.0 } else { 6.0 };
    } else if local == l {
        score += if dom.contains(&f) { 10.0 } else { 6.0 };
    } else if local.starts_with(&f) || local.starts_with(&l) {
        if local.starts_with(&f) {
            score += 8.0;
        }
        if local.starts_with(&l) {
            score += 8.0;
        }
    } else if local.starts_with(&format!("{fi}{l}")) || local.starts_with(&format!("{l}{fi}")) {
        if local.starts_with(&format!("{fi}{l}")) {
            score += 8.0;
        }
        if local.starts_with(&format!("{l}{fi}")) {
            score += 8.0;
        }
    } else {
        if local.contains(&f) {
            score += 4.0;
        }
        if local.contains(&l) {
            score += 4.0;
        }
    }

    score + local_penalties(local_raw)
}

/// Best base score across surname variants.
pub fn best_base_score(email: &str, first: &str, variants: &[&str]) -> f64 {
    if variants.is_empty() {
        return 0.0;
    }
    variants
        .iter()
        .map(|v| base_score(email, first, v))
        .fold(f64::NEG_INFINITY, f64::max)
}

fn local_penalties(local_raw: &str) -> f64 {
    let mut penalty = 0.0;
    let mut digit_run = 0usize;
    let mut punct_run = 0usize;
    let mut long_digit_run = false;
    let mut double_punct = false;

    for c in local_raw.chars() {
        if c.is_ascii_digit() {
            digit_run += 1;
            if digit_run >= 3 {
                long_digit_run = true;
            }
        } else {
            digit_run = 0;
        }
        if c.is_ascii_punctuation() {
            punct_run += 1;
            if punct_run >= 2 {
                double_punct = true;
            }
        } else {
            punct_run = 0;
        }
    }

    if long_digit_run {
        penalty -= 3.0;
    }
    if double_punct {
        penalty -= 2.0;
    }
    penalty
}

/// Recency bonus: +6 within a year, +3 within three years, else 0.
pub fn recency_bonus(date: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let age = now.signed_duration_since(date);
    if age <= Duration::days(365) {
        6.0
    } else if age <= Duration::days(3 * 365) {
        3.0
    } else {
        0.0
    }
}

/// Count name tokens appearing (folded) inside an address local part.
pub fn local_token_overlap(local: &str, tokens: &[String]) -> usize {
    let local = fold(local);
    tokens
        .iter()
        .filter(|t| {
            let ft = fold(t);
            !ft.is_empty() && local.contains(&ft)
        })
        .count()
}

/// Strong local-part pattern: the folded local contains both first and a
/// surname variant, or starts with initial+surname / surname+initial.
/// This is the acceptance-gate fallback when the display name is no help.
pub fn strong_local_pattern(local: &str, first: &str, variants: &[&str]) -> bool {
    let local = fold(local);
    let f = fold(first);
    if local.is_empty() || f.is_empty() {
        return false;
    }
    let fi = &f[..f
        .char_indices()
        .nth(1)
        .map(|(i, _)| i)
        .unwrap_or(f.len())];

    for variant in variants {
        let l = fold(variant);
        if l.is_empty() {
            continue;
        }
        if local.contains(&f) && local.contains(&l) {
            return true;
        }
        if local.starts_with(&format!("{fi}{l}")) || local.starts_with(&format!("{l}{fi}")) {
            return true;
        }
    }
    false
}

/// Confidence label, a pure function of the final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn from_score(score: f64) -> Self {
        if score >= 20.0 {
            Confidence::High
        } else if score >= 10.0 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Confidence::High => "High",
            Confidence::Medium => "Medium",
            Confidence::Low => "Low",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_strips_diacritics_and_punctuation() {
        assert_eq!(fold("José"), "jose");
        assert_eq!(fold("O'Brien"), "obrien");
        assert_eq!(fold("jane.smith"), "janesmith");
        assert_eq!(fold("Müller-Lüdenscheidt"), "mullerludenscheidt");
    }

    #[test]
    fn test_base_initial_plus_surname() {
        // "jsmith" → startsWith(first-initial + last) → +8
        assert_eq!(base_score("jsmith@acme.com", "jane", "smith"), 8.0);
    }

    #[test]
    fn test_base_exact_dotted_concatenation() {
        // "jane.smith" → exact concatenation +20, both-names-substring +12
        assert_eq!(base_score("jane.smith@acme.com", "jane", "smith"), 32.0);
        assert_eq!(base_score("janesmith@acme.com", "jane", "smith"), 32.0);
    }

    #[test]
    fn test_base_reversed_concatenation() {
        assert_eq!(base_score("smith.jane@acme.com", "jane", "smith"), 32.0);
    }

    #[test]
    fn test_base_exact_single_with_domain_corroboration() {
        assert_eq!(base_score("jane@smith-consulting.com", "jane", "smith"), 10.0);
        assert_eq!(base_score("jane@acme.com", "jane", "smith"), 6.0);
        assert_eq!(base_score("smith@janedoe.net", "jane", "smith"), 10.0);
    }

    #[test]
    fn test_base_starts_with_first() {
        assert_eq!(base_score("janes@acme.com", "jane", "smith"), 8.0);
    }

    #[test]
    fn test_base_weak_substrings() {
        // Neither prefix nor initial patterns, but last appears inside.
        assert_eq!(base_score("thesmithy@acme.com", "jane", "smith"), 4.0);
    }

    #[test]
    fn test_base_digit_run_penalty() {
        assert_eq!(base_score("jsmith123@acme.com", "jane", "smith"), 8.0 - 3.0);
        // Two digits only: no penalty.
        assert_eq!(base_score("jsmith12@acme.com", "jane", "smith"), 8.0);
    }

    #[test]
    fn test_base_double_punctuation_penalty() {
        // Dots fold away for matching but still count as punctuation runs.
        assert_eq!(base_score("jane..smith@acme.com", "jane", "smith"), 32.0 - 2.0);
    }

    #[test]
    fn test_base_no_match_scores_zero() {
        assert_eq!(base_score("bob@other.org", "jane", "smith"), 0.0);
    }

    #[test]
    fn test_base_diacritic_fold_matches() {
        assert_eq!(base_score("jose.garcia@acme.com", "José", "García"), 32.0);
    }

    #[test]
    fn test_best_base_score_uses_compound_variant() {
        let variants = ["dyk", "vandyk"];
        let score = best_base_score("jvandyk@acme.com", "jane", &variants);
        // "jvandyk" starts with first-initial + compound surname.
        assert_eq!(score, 8.0);
    }

    #[test]
    fn test_recency_bonus_tiers() {
        let now = Utc::now();
        assert_eq!(recency_bonus(now - Duration::days(30), now), 6.0);
        assert_eq!(recency_bonus(now - Duration::days(400), now), 3.0);
        assert_eq!(recency_bonus(now - Duration::days(2000), now), 0.0);
    }

    #[test]
    fn test_local_token_overlap() {
        let tokens = vec!["jane".to_string(), "smith".to_string()];
        assert_eq!(local_token_overlap("jane.smith", &tokens), 2);
        assert_eq!(local_token_overlap("jsmith", &tokens), 1);
        assert_eq!(local_token_overlap("zed99", &tokens), 0);
    }

    #[test]
    fn test_strong_local_pattern() {
        let variants = ["smith"];
        assert!(strong_local_pattern("jane.smith", "jane", &variants));
        assert!(strong_local_pattern("jsmith", "jane", &variants));
        assert!(strong_local_pattern("smithj", "jane", &variants));
        assert!(!strong_local_pattern("jdoe", "jane", &variants));
        assert!(!strong_local_pattern("smith", "jane", &variants));
    }

    #[test]
    fn test_confidence_boundaries() {
        assert_eq!(Confidence::from_score(19.9), Confidence::Medium);
        assert_eq!(Confidence::from_score(20.0), Confidence::High);
        assert_eq!(Confidence::from_score(9.9), Confidence::Low);
        assert_eq!(Confidence::from_score(10.0), Confidence::Medium);
    }
}
