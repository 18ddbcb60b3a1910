//! Environment variable helpers shared by the `from_env()` constructors.

use std::str::FromStr;

use crate::error::CoreError;

/// Read `key` and parse it, falling back to `default` when unset.
///
/// A set-but-unparsable value is a configuration error rather than a silent
/// fallback.
pub fn parse_or<T>(key: &str, default: T) -> Result<T, CoreError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| CoreError::Config(format!("{key} has invalid value '{raw}': {e}"))),
        Err(_) => Ok(default),
    }
}

/// Read `key` as a comma-separated list, trimming entries and dropping blanks.
///
/// Returns `default` (converted to owned strings) when the variable is unset.
pub fn list_or(key: &str, default: &[&str]) -> Vec<String> {
    match std::env::var(key) {
        Ok(raw) => split_list(&raw),
        Err(_) => default.iter().map(|s| s.to_string()).collect(),
    }
}

/// Split a comma-separated value into trimmed, non-empty entries.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_list_trims_and_drops_blanks() {
        assert_eq!(split_list(" a, b ,,c "), vec!["a", "b", "c"]);
    }

    #[test]
    fn split_list_of_empty_string_is_empty() {
        assert!(split_list("").is_empty());
    }

    #[test]
    fn parse_or_uses_default_when_unset() {
        let value: u64 = parse_or("REELQ_TEST_SURELY_UNSET_VAR", 7).unwrap();
        assert_eq!(value, 7);
    }
}
