//! Query planning: derive search tokens from a raw display name.

use crate::error::ResolveError;

/// Surname participles treated as part of a compound last name when they
/// appear immediately before the final token ("Jane van Dyk" → "vandyk").
pub const COMPOUND_PARTICLES: &[&str] = &["de", "da", "del", "la", "van", "von"];

/// Tokenized view of one input name. Immutable once derived; the derivation
/// is deterministic and has no side effects.
#[derive(Debug, Clone)]
pub struct NameQuery {
    /// The input name, whitespace-trimmed but otherwise untouched.
    pub raw: String,
    /// Lowercased whitespace-split tokens, empties discarded.
    pub tokens: Vec<String>,
    pub first: String,
    pub last_simple: String,
    /// Participle + final token when a compound participle precedes the
    /// final token; otherwise equals `last_simple`. Concatenated without a
    /// separator because it is matched against local parts and domains.
    pub last_compound: String,
}

impl NameQuery {
    pub fn parse(raw: &str) -> Result<Self, ResolveError> {
        let tokens: Vec<String> = raw
            .split_whitespace()
            .map(|t| t.to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();

        let first = tokens.first().cloned().ok_or(ResolveError::EmptyName)?;
        let last_simple = tokens.last().cloned().unwrap_or_else(|| first.clone());
        let last_compound = if tokens.len() >= 2
            && COMPOUND_PARTICLES.contains(&tokens[tokens.len() - 2].as_str())
        {
            format!("{}{}", tokens[tokens.len() - 2], last_simple)
        } else {
            last_simple.clone()
        };

        Ok(NameQuery {
            raw: raw.trim().to_string(),
            tokens,
            first,
            last_simple,
            last_compound,
        })
    }

    /// Distinct surname variants to try against local parts and domains.
    pub fn surname_variants(&self) -> Vec<&str> {
        if self.last_compound != self.last_simple {
            vec![self.last_simple.as_str(), self.last_compound.as_str()]
        } else {
            vec![self.last_simple.as_str()]
        }
    }

    /// "Last, First" form used in header search queries, preserving the
    /// input's casing.
    pub fn last_first(&self) -> String {
        let words: Vec<&str> = self.raw.split_whitespace().collect();
        match words.as_slice() {
            [] => String::new(),
            [only] => (*only).to_string(),
            [first, .., last] => format!("{}, {}", last, first),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_two_token_name() {
        let q = NameQuery::parse("Jane Smith").unwrap();
        assert_eq!(q.tokens, vec!["jane", "smith"]);
        assert_eq!(q.first, "jane");
        assert_eq!(q.last_simple, "smith");
        assert_eq!(q.last_compound, "smith");
        assert_eq!(q.surname_variants(), vec!["smith"]);
    }

    #[test]
    fn test_parse_compound_surname() {
        let q = NameQuery::parse("Jane van Dyk").unwrap();
        assert_eq!(q.tokens, vec!["jane", "van", "dyk"]);
        assert_eq!(q.last_simple, "dyk");
        assert_eq!(q.last_compound, "vandyk");
        assert_eq!(q.surname_variants(), vec!["dyk", "vandyk"]);
    }

    #[test]
    fn test_parse_participle_not_second_to_last() {
        // "van" only forms a compound when immediately before the last token.
        let q = NameQuery::parse("Van Jones Smith").unwrap();
        assert_eq!(q.last_compound, "smith");
    }

    #[test]
    fn test_parse_single_token() {
        let q = NameQuery::parse("Cher").unwrap();
        assert_eq!(q.first, "cher");
        assert_eq!(q.last_simple, "cher");
        assert_eq!(q.last_first(), "Cher");
    }

    #[test]
    fn test_parse_empty_is_invalid_input() {
        assert!(matches!(NameQuery::parse(""), Err(ResolveError::EmptyName)));
        assert!(matches!(
            NameQuery::parse("   \t "),
            Err(ResolveError::EmptyName)
        ));
    }

    #[test]
    fn test_last_first_variant() {
        let q = NameQuery::parse("Jane Smith").unwrap();
        assert_eq!(q.last_first(), "Smith, Jane");
        let q = NameQuery::parse("Jane van Dyk").unwrap();
        assert_eq!(q.last_first(), "Dyk, Jane");
    }
}
