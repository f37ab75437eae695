//! Token grammar: `"[" PREFIX ("_" SUFFIX)? "]"`.
//!
//! `PREFIX` is an uppercase normalized entity name (may contain underscores,
//! e.g. `SECRET_KEY`); `SUFFIX` is a bijective base-26 letter counter
//! (`A` .. `Z`, `AA` .. `ZZ`, `AAA` ..). Stored mappings from earlier sessions
//! depend on this exact format.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ContractViolation;

lazy_static! {
    static ref TOKEN_REGEX: Regex = Regex::new(r"^\[[A-Z0-9]+(?:_[A-Z0-9]+)*\]$").unwrap();
}

/// Convert a 0-based counter into a bijective base-26 suffix.
///
/// There is no zero digit: after each non-terminal division the quotient is
/// decremented, so `25 -> "Z"` is followed by `26 -> "AA"`, not `"BA"`.
///
/// ```
/// use aegis::token::suffix;
///
/// assert_eq!(suffix(0).unwrap(), "A");
/// assert_eq!(suffix(26).unwrap(), "AA");
/// assert_eq!(suffix(701).unwrap(), "ZZ");
/// assert!(suffix(-1).is_err());
/// ```
pub fn suffix(index: i64) -> Result<String, ContractViolation> {
    if index < 0 {
        return Err(ContractViolation::NegativeSuffixIndex(index));
    }

    let mut n = index as u64;
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (n % 26) as u8);
        n /= 26;
        if n == 0 {
            break;
        }
        n -= 1;
    }
    letters.reverse();

    // Only ASCII uppercase bytes were pushed
    Ok(letters.into_iter().map(char::from).collect())
}

/// Bracketed token without a suffix, as produced by MASK mode: `[PATIENT]`.
pub fn bare(prefix: &str) -> String {
    format!("[{}]", prefix)
}

/// Bracketed token with a suffix, as produced by REPLACE mode: `[PATIENT_A]`.
pub fn numbered(prefix: &str, suffix: &str) -> String {
    format!("[{}_{}]", prefix, suffix)
}

/// Namespace shared by all numbered tokens of one prefix: `[PATIENT_`.
pub fn namespace(prefix: &str) -> String {
    format!("[{}_", prefix)
}

/// Whether `candidate` matches the token grammar.
pub fn is_token(candidate: &str) -> bool {
    TOKEN_REGEX.is_match(candidate)
}

/// Reject anything that does not match the token grammar.
pub fn validate(candidate: &str) -> Result<(), ContractViolation> {
    if is_token(candidate) {
        Ok(())
    } else {
        Err(ContractViolation::MalformedToken(candidate.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_suffix_single_letters() {
        assert_eq!(suffix(0).unwrap(), "A");
        assert_eq!(suffix(1).unwrap(), "B");
        assert_eq!(suffix(25).unwrap(), "Z");
    }

    #[test]
    fn test_suffix_rolls_over_without_zero_digit() {
        assert_eq!(suffix(26).unwrap(), "AA");
        assert_eq!(suffix(27).unwrap(), "AB");
        assert_eq!(suffix(51).unwrap(), "AZ");
        assert_eq!(suffix(52).unwrap(), "BA");
        assert_eq!(suffix(701).unwrap(), "ZZ");
        assert_eq!(suffix(702).unwrap(), "AAA");
    }

    #[test]
    fn test_suffix_rejects_negative_index() {
        assert_eq!(suffix(-1), Err(ContractViolation::NegativeSuffixIndex(-1)));
    }

    #[test]
    fn test_token_shapes() {
        assert_eq!(bare("PATIENT"), "[PATIENT]");
        assert_eq!(numbered("SECRET_KEY", "B"), "[SECRET_KEY_B]");
        assert_eq!(namespace("DATE"), "[DATE_");
    }

    #[test]
    fn test_grammar() {
        assert!(is_token("[PATIENT_A]"));
        assert!(is_token("[SECRET_KEY_AA]"));
        assert!(is_token("[EMAIL]"));
        assert!(is_token("[A]"));
        assert!(!is_token("PATIENT_A"));
        assert!(!is_token("[patient_a]"));
        assert!(!is_token("[PATIENT_]"));
        assert!(!is_token("[]"));
        assert!(validate("[Organization_A]").is_err());
    }

    /// Reference decoder: A=1 .. Z=26 positional, minus one.
    fn decode(suffix: &str) -> i64 {
        suffix
            .bytes()
            .fold(0i64, |acc, b| acc * 26 + i64::from(b - b'A' + 1))
            - 1
    }

    proptest! {
        #[test]
        fn prop_suffix_is_bijective(index in 0i64..1_000_000) {
            let s = suffix(index).unwrap();
            prop_assert!(s.bytes().all(|b| b.is_ascii_uppercase()));
            prop_assert_eq!(decode(&s), index);
        }

        #[test]
        fn prop_suffix_preserves_order(a in 0i64..100_000, b in 0i64..100_000) {
            let (sa, sb) = (suffix(a).unwrap(), suffix(b).unwrap());
            // Shorter first, then lexicographic
            let key = |s: &String| (s.len(), s.clone());
            prop_assert_eq!(a.cmp(&b), key(&sa).cmp(&key(&sb)));
        }
    }
}
