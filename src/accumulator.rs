//! Collecting independent failures instead of stopping at the first one.

use crate::error::Error;
use itertools::Itertools;
use log::debug;
use thiserror::Error;

fn numbered(errors: &[Error]) -> String {
    let header = format!("{} error(s) occurred", errors.len());
    if errors.is_empty() {
        return header;
    }
    let lines = errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {}", i + 1, err))
        .join("\n");
    format!("{header}:\n{lines}")
}

/// Ordered list of failures from checks that do not depend on each other.
///
/// Insertion order is kept and nothing is deduplicated. `add` takes
/// `&mut self`; callers sharing one accumulator across threads must wrap it
/// in their own lock.
#[derive(Error, Debug, Default, Clone)]
#[error("{}", numbered(.errors))]
pub struct ErrorAccumulator {
    errors: Vec<Error>,
}

impl ErrorAccumulator {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn add(&mut self, error: impl Into<Error>) {
        let error = error.into();
        debug!("recorded failure #{}: {}", self.errors.len() + 1, error);
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Error> {
        self.errors.iter()
    }

    pub fn into_ordered_list(self) -> Vec<Error> {
        self.errors
    }

    /// `Ok(value)` when nothing was recorded, otherwise the accumulator itself.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl Extend<Error> for ErrorAccumulator {
    fn extend<I: IntoIterator<Item = Error>>(&mut self, iter: I) {
        for err in iter {
            self.add(err);
        }
    }
}

impl FromIterator<Error> for ErrorAccumulator {
    fn from_iter<I: IntoIterator<Item = Error>>(iter: I) -> Self {
        let mut acc = Self::new();
        acc.extend(iter);
        acc
    }
}

impl IntoIterator for ErrorAccumulator {
    type Item = Error;
    type IntoIter = std::vec::IntoIter<Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ErrorAccumulator {
    type Item = &'a Error;
    type IntoIter = std::slice::Iter<'a, Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use proptest::prelude::*;

    #[test]
    fn test_empty_means_success() {
        let acc = ErrorAccumulator::new();
        assert!(acc.is_empty());
        assert_eq!(acc.len(), 0);
        assert_eq!(acc.into_result(7).unwrap(), 7);
    }

    #[test]
    fn test_preserves_insertion_order() {
        let e1 = Error::plain("first");
        let e2 = Error::validation("email", "second");
        let e3 = Error::api(500, "third");

        let mut acc = ErrorAccumulator::new();
        acc.add(e1.clone());
        acc.add(e2.clone());
        acc.add(e3.clone());

        let list = acc.into_ordered_list();
        assert_eq!(list.len(), 3);
        assert!(list[0].same_instance(&e1));
        assert!(list[1].same_instance(&e2));
        assert!(list[2].same_instance(&e3));
    }

    #[test]
    fn test_no_deduplication() {
        let e = Error::plain("same");
        let mut acc = ErrorAccumulator::new();
        acc.add(e.clone());
        acc.add(e.clone());
        acc.add(ValidationError::new("name", "empty"));
        assert_eq!(acc.len(), 3);
    }

    #[test]
    fn test_display_numbers_entries() {
        let acc: ErrorAccumulator = vec![Error::plain("a"), Error::plain("b")]
            .into_iter()
            .collect();
        let shown = acc.to_string();
        assert!(shown.starts_with("2 error(s) occurred:"));
        assert!(shown.contains("  1. a"));
        assert!(shown.contains("  2. b"));
        assert_eq!(ErrorAccumulator::new().to_string(), "0 error(s) occurred");
    }

    #[test]
    fn test_accumulator_is_std_error() {
        let mut acc = ErrorAccumulator::new();
        acc.add(Error::plain("broken"));
        let boxed: Box<dyn std::error::Error> = Box::new(acc);
        assert!(boxed.source().is_none());
        assert_eq!(boxed.to_string(), "1 error(s) occurred:\n  1. broken");
    }

    #[test]
    fn test_into_result_returns_accumulator() {
        let mut acc = ErrorAccumulator::new();
        acc.add(Error::plain("broken"));
        let err = acc.into_result(()).unwrap_err();
        assert_eq!(err.len(), 1);
        assert_eq!(err.iter().next().map(Error::message).as_deref(), Some("broken"));
    }

    proptest! {
        #[test]
        fn test_order_matches_input(messages in prop::collection::vec(".*", 0..32)) {
            let errors: Vec<Error> = messages.iter().map(|m| Error::plain(m.clone())).collect();
            let acc: ErrorAccumulator = errors.iter().cloned().collect();
            let out = acc.into_ordered_list();
            prop_assert_eq!(out.len(), errors.len());
            for (a, b) in out.iter().zip(&errors) {
                prop_assert!(a.same_instance(b));
            }
        }
    }
}
