//! Revision hint values.
//!
//! A hint is the last known backend revision, or wall-clock milliseconds when
//! the backend did not provide one. It only tells readers to re-fetch.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Storage key of the shared hint.
pub const POLICY_REV_HINT_KEY: &str = "policy_rev_hint";

/// Best-effort cache invalidation signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionHint(i64);

impl RevisionHint {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    /// Server revision when present, otherwise the current time in ms.
    #[must_use]
    pub fn from_rev_or_now(rev: Option<u64>) -> Self {
        match rev {
            Some(rev) => Self(i64::try_from(rev).unwrap_or(i64::MAX)),
            None => Self(Utc::now().timestamp_millis()),
        }
    }
}

impl std::fmt::Display for RevisionHint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RevisionHint {
    type Err = std::num::ParseIntError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        raw.trim().parse().map(Self)
    }
}

impl From<u64> for RevisionHint {
    fn from(rev: u64) -> Self {
        Self::from_rev_or_now(Some(rev))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rev() {
        assert_eq!(RevisionHint::from_rev_or_now(Some(7)).value(), 7);
    }

    #[test]
    fn test_without_rev_uses_clock() {
        let before = Utc::now().timestamp_millis();
        let hint = RevisionHint::from_rev_or_now(None);
        assert!(hint.value() >= before);
    }

    #[test]
    fn test_string_encoding() {
        let hint: RevisionHint = " 42\n".parse().unwrap();
        assert_eq!(hint, RevisionHint::new(42));
        assert_eq!(hint.to_string(), "42");
        assert!("abc".parse::<RevisionHint>().is_err());
    }
}
