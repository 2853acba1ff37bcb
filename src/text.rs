// text.rs
//
// Field splitting and strict numeric coercion shared by every file reader.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseNumberError {
    #[error("string {0} not representable as an unsigned integer")]
    NotUnsigned(String),

    #[error("string {0} not representable as a floating point value")]
    NotFloat(String),
}

/// Split `text` into fields by an exact-match delimiter.
///
/// The delimiter may be more than one character and is never treated as a
/// character class. An empty input yields an empty vector, not a one-element
/// vector containing an empty string.
pub fn split_by_delimiter(text: &str, delimiter: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    text.split(delimiter).map(str::to_owned).collect()
}

/// Strip trailing `'\n'`, `'\r'`, `'\t'` and `' '` characters.
pub fn strip_back(s: &str) -> &str {
    s.trim_end_matches(['\n', ' ', '\t', '\r'])
}

/// Parse a string that must be exactly representable as an unsigned integer.
///
/// Fractional strings such as `"1.23"` are rejected even though a prefix
/// parse would silently truncate them to `1`; negative and non-numeric
/// strings are rejected as well. The error carries the offending literal.
pub fn parse_unsigned(s: &str) -> Result<u64, ParseNumberError> {
    if s.parse::<f64>().is_err() {
        return Err(ParseNumberError::NotUnsigned(s.to_owned()));
    }
    s.parse::<u64>()
        .map_err(|_| ParseNumberError::NotUnsigned(s.to_owned()))
}

/// Parse a string as a floating point value, rejecting anything that is not
/// fully numeric.
pub fn parse_float(s: &str) -> Result<f64, ParseNumberError> {
    s.parse::<f64>()
        .map_err(|_| ParseNumberError::NotFloat(s.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_space_delimited() {
        assert_eq!(split_by_delimiter("a b c def", " "), vec!["a", "b", "c", "def"]);
    }

    #[test]
    fn split_comma_delimited() {
        assert_eq!(split_by_delimiter("a b c, def", ","), vec!["a b c", " def"]);
    }

    #[test]
    fn split_multi_character_delimiter() {
        assert_eq!(split_by_delimiter("abc>=def>=ghi", ">="), vec!["abc", "def", "ghi"]);
    }

    #[test]
    fn split_empty_input_yields_empty_vector() {
        assert!(split_by_delimiter("", " ").is_empty());
    }

    #[test]
    fn split_preserves_empty_fields_between_delimiters() {
        assert_eq!(split_by_delimiter("a\t\tb", "\t"), vec!["a", "", "b"]);
    }

    #[test]
    fn strip_back_cases() {
        assert_eq!(strip_back("abc"), "abc");
        assert_eq!(strip_back("\t\n\r "), "");
        assert_eq!(strip_back("abc\t\n\r "), "abc");
    }

    #[test]
    fn parse_unsigned_accepts_integers() {
        assert_eq!(parse_unsigned("1"), Ok(1));
        assert_eq!(parse_unsigned("12345"), Ok(12345));

        let max = u64::MAX.to_string();
        assert_eq!(parse_unsigned(&max), Ok(u64::MAX));
    }

    #[test]
    fn parse_unsigned_rejects_inexact_inputs() {
        for bad in ["1.23", "-7", "notanumber", ""] {
            let err = parse_unsigned(bad).unwrap_err();
            assert_eq!(err, ParseNumberError::NotUnsigned(bad.to_owned()));
            assert!(err.to_string().contains("not representable as an unsigned integer"));
        }
    }

    #[test]
    fn parse_float_cases() {
        assert_eq!(parse_float("1.23"), Ok(1.23));
        assert_eq!(parse_float("-1234"), Ok(-1234.0));
        assert!(parse_float("notanumber")
            .unwrap_err()
            .to_string()
            .contains("not representable as a floating point value"));
    }
}
