//! Identifier and location validation for dynamically built SQL.
//!
//! Table and column names cannot be bound as statement parameters, so every
//! name that enters statement text passes through [`safe_identifier`] first.
//! Scalar values (dates, limits) are always bound, never formatted in.

use crate::domain::error::RebalanceError;

/// Sequences that would end a statement or open a comment, plus quote
/// characters that could break out of the location literal.
const FORBIDDEN_LOCATION_SEQUENCES: &[&str] = &[";", "--", "/*", "*/", "'", "\""];

/// True when `identifier` matches `^[A-Za-z_][A-Za-z0-9_]*$`.
pub fn is_valid_identifier(identifier: &str) -> bool {
    let mut chars = identifier.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub fn safe_identifier(identifier: &str) -> Result<&str, RebalanceError> {
    if is_valid_identifier(identifier) {
        Ok(identifier)
    } else {
        Err(RebalanceError::InvalidIdentifier(identifier.to_string()))
    }
}

/// Double-quote a validated identifier for use in statement text.
pub fn quoted(identifier: &str) -> Result<String, RebalanceError> {
    safe_identifier(identifier).map(|id| format!("\"{id}\""))
}

pub fn validate_location(location: &str) -> Result<&str, RebalanceError> {
    if location.trim().is_empty()
        || FORBIDDEN_LOCATION_SEQUENCES
            .iter()
            .any(|seq| location.contains(seq))
    {
        return Err(RebalanceError::InvalidLocation(location.to_string()));
    }
    Ok(location)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_identifiers() {
        for id in ["date", "data_market_capitalization", "_hidden", "T1", "__index_level_0__"] {
            assert!(is_valid_identifier(id), "{id} should be valid");
        }
    }

    #[test]
    fn rejects_bad_leading_characters() {
        for id in ["1abc", "", "-x", " date", "$col"] {
            assert!(!is_valid_identifier(id), "{id:?} should be invalid");
        }
    }

    #[test]
    fn rejects_injection_attempts() {
        for id in [
            "prices; DROP TABLE x",
            "prices--",
            "a b",
            "name'",
            "col\"",
            "tbl/*x*/",
            "naïve",
        ] {
            assert!(
                matches!(safe_identifier(id), Err(RebalanceError::InvalidIdentifier(_))),
                "{id:?} should be rejected"
            );
        }
    }

    #[test]
    fn quoted_wraps_valid_identifier() {
        assert_eq!(quoted("date").unwrap(), "\"date\"");
        assert!(quoted("da\"te").is_err());
    }

    #[test]
    fn location_rejects_delimiters_and_comments() {
        for loc in [
            "",
            "   ",
            "/data/x.csv; DROP TABLE t",
            "/data/x.csv--",
            "/data/*.csv",
            "/data/x.csv*/",
            "/data/o'brien.csv",
            "/data/\"x\".csv",
        ] {
            assert!(
                matches!(validate_location(loc), Err(RebalanceError::InvalidLocation(_))),
                "{loc:?} should be rejected"
            );
        }
    }

    #[test]
    fn location_accepts_ordinary_paths() {
        assert_eq!(
            validate_location("/tmp/data/market_capitalization.csv").unwrap(),
            "/tmp/data/market_capitalization.csv"
        );
        assert!(validate_location("relative/dir-1/prices.csv").is_ok());
    }
}
