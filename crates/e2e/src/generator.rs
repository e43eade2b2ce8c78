//! Data-driven test generation.
//!
//! Expands a statically-known fixture array into one record per row at
//! suite-construction time, before any browser session opens. Records are
//! immutable once built, carry a deterministic name derived from their
//! fixture content, and are never merged: duplicate fixture rows yield
//! duplicate records on purpose, so a triaged failure always points at
//! one concrete row.

use serde::Serialize;

/// One generated pairing of a test name and its fixture row.
#[derive(Debug, Clone, PartialEq)]
pub struct TestRecord<T> {
    pub description: String,
    pub fixture: T,
}

/// Expand `fixtures` into one record each. An empty input yields zero
/// records, not an error.
pub fn expand<T, D>(title: &str, fixtures: Vec<T>, describe: D) -> Vec<TestRecord<T>>
where
    D: Fn(&T) -> String,
{
    fixtures
        .into_iter()
        .map(|fixture| TestRecord {
            description: format!("{title}: {}", describe(&fixture)),
            fixture,
        })
        .collect()
}

/// Default fixture description: its compact JSON rendering, which is
/// deterministic for a given row.
pub fn describe_json<T: Serialize>(fixture: &T) -> String {
    serde_json::to_string(fixture).unwrap_or_else(|_| "<unprintable fixture>".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{invalid_checkout_info, CheckoutInfo};

    #[test]
    fn one_record_per_fixture_row() {
        let fixtures = invalid_checkout_info();
        let expected = fixtures.len();
        let records = expand("should show error for invalid checkout info", fixtures, describe_json);
        assert_eq!(records.len(), expected);
    }

    #[test]
    fn empty_fixture_array_yields_zero_records() {
        let records = expand("anything", Vec::<CheckoutInfo>::new(), describe_json);
        assert!(records.is_empty());
    }

    #[test]
    fn duplicate_rows_are_never_merged() {
        let row = CheckoutInfo::new("", "", "");
        let records = expand(
            "dup",
            vec![row.clone(), row.clone(), row],
            describe_json,
        );
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].description, records[1].description);
        assert_eq!(records[1], records[2]);
    }

    #[test]
    fn names_are_deterministic_and_human_readable() {
        let records = expand(
            "should show error for invalid data set",
            vec![CheckoutInfo::new("John", "", "12345")],
            describe_json,
        );
        assert_eq!(
            records[0].description,
            "should show error for invalid data set: \
             {\"first_name\":\"John\",\"last_name\":\"\",\"postal_code\":\"12345\"}"
        );

        // Same row, same name, every time.
        let again = expand(
            "should show error for invalid data set",
            vec![CheckoutInfo::new("John", "", "12345")],
            describe_json,
        );
        assert_eq!(records[0].description, again[0].description);
    }
}
