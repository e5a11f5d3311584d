use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;

/// The point a previous run synchronized up to.
///
/// Derived from git history on every run rather than stored anywhere.
/// `Never` orders before every `At`, so it can be compared directly against
/// activity timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LastSynced {
    Never,
    At(DateTime<Utc>),
}

impl LastSynced {
    /// Whether `ts` is strictly newer than this cursor.
    pub fn is_before(&self, ts: &DateTime<Utc>) -> bool {
        match self {
            LastSynced::Never => true,
            LastSynced::At(t) => t < ts,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            LastSynced::Never => None,
            LastSynced::At(t) => Some(*t),
        }
    }
}

impl fmt::Display for LastSynced {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LastSynced::Never => f.write_str("never"),
            LastSynced::At(t) => f.write_str(&t.to_rfc3339_opts(SecondsFormat::Secs, true)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn never_orders_before_any_timestamp() {
        assert!(LastSynced::Never < LastSynced::At(at(i64::from(i32::MIN))));
        assert!(LastSynced::Never < LastSynced::At(at(0)));
        assert!(LastSynced::At(at(1)) < LastSynced::At(at(2)));
    }

    #[test]
    fn is_before_is_strict() {
        let cursor = LastSynced::At(at(100));
        assert!(!cursor.is_before(&at(99)));
        assert!(!cursor.is_before(&at(100)));
        assert!(cursor.is_before(&at(101)));
        assert!(LastSynced::Never.is_before(&at(-5)));
    }

    #[test]
    fn display_formats() {
        assert_eq!(LastSynced::Never.to_string(), "never");
        assert_eq!(
            LastSynced::At(at(1_700_000_000)).to_string(),
            "2023-11-14T22:13:20Z"
        );
    }
}
