//! Process-wide sentinel errors.
//!
//! Each sentinel is built once on first use and lives until the process
//! exits. Compare against them with [`Error::is`]; a freshly built error with
//! the same text is a different instance and never matches.

use crate::chain::WalkLimits;
use crate::error::Error;
use lazy_static::lazy_static;

lazy_static! {
    pub static ref NOT_FOUND: Error = Error::plain("not found");
    pub static ref UNAUTHORIZED: Error = Error::plain("unauthorized");
    pub static ref INVALID_INPUT: Error = Error::plain("invalid input");
    pub static ref DIVISION_BY_ZERO: Error = Error::plain("division by zero");
    pub static ref TIMEOUT: Error = Error::plain("operation timed out");
}

/// Every registered sentinel with a stable name.
pub fn all() -> [(&'static str, &'static Error); 5] {
    [
        ("not_found", &*NOT_FOUND),
        ("unauthorized", &*UNAUTHORIZED),
        ("invalid_input", &*INVALID_INPUT),
        ("division_by_zero", &*DIVISION_BY_ZERO),
        ("timeout", &*TIMEOUT),
    ]
}

/// Name of the first sentinel found in `err`'s chain.
pub fn matching(err: &Error) -> Option<&'static str> {
    matching_within(err, WalkLimits::default())
}

/// [`matching`] with a caller-chosen depth limit.
pub fn matching_within(err: &Error, limits: WalkLimits) -> Option<&'static str> {
    all()
        .into_iter()
        .find(|(_, sentinel)| err.is_within(sentinel, limits))
        .map(|(name, _)| name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wrap::wrap;

    #[test]
    fn test_sentinel_is_stable_across_accesses() {
        let first: &Error = &NOT_FOUND;
        let second: &Error = &NOT_FOUND;
        assert!(first.same_instance(second));
        assert!(NOT_FOUND.clone().same_instance(&NOT_FOUND));
    }

    #[test]
    fn test_lookalike_is_not_sentinel() {
        let lookalike = Error::plain("not found");
        assert_eq!(lookalike.message(), NOT_FOUND.message());
        assert!(!lookalike.is(&NOT_FOUND));
        assert_eq!(matching(&lookalike), None);
    }

    #[test]
    fn test_wrapped_sentinel_matches() {
        let err = wrap("loading user 7", Error::database("SELECT", "users", NOT_FOUND.clone()));
        assert!(err.is(&NOT_FOUND));
        assert!(!err.is(&UNAUTHORIZED));
        assert_eq!(matching(&err), Some("not_found"));
    }

    #[test]
    fn test_matching_within_honors_limits() {
        let mut err = TIMEOUT.clone();
        for i in 0..5 {
            err = wrap(format!("retry {i}"), err);
        }
        assert_eq!(matching_within(&err, WalkLimits { max_depth: 2 }), None);
        assert_eq!(matching_within(&err, WalkLimits { max_depth: 5 }), Some("timeout"));
        assert_eq!(matching(&err), Some("timeout"));
    }

    #[test]
    fn test_sentinels_are_distinct() {
        let sentinels = all();
        for (i, (_, a)) in sentinels.iter().enumerate() {
            for (j, (_, b)) in sentinels.iter().enumerate() {
                assert_eq!(a.same_instance(b), i == j);
            }
        }
    }

    #[test]
    fn test_sentinel_shared_across_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| std::thread::spawn(|| wrap("worker", TIMEOUT.clone())))
            .collect();
        for handle in handles {
            let err = handle.join().unwrap();
            assert!(err.is(&TIMEOUT));
        }
    }
}
