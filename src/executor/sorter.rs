//! Result sorting for query execution
//!
//! Composite, stable sort over selected columns.

use std::cmp::Ordering;

use super::result::ResultRow;
use crate::planner::{Key, SortDirection, SortSpec};
use crate::storage::FieldValue;

/// Sorts result rows
pub struct ResultSorter;

impl ResultSorter {
    /// Sorts rows according to a sort specification.
    ///
    /// Keys are compared in order, falling through on ties. `DOWN` reverses
    /// the composite result, so rows tied on every key keep input order.
    pub fn sort(rows: &mut [ResultRow], spec: &SortSpec) {
        let names: Vec<String> = spec.keys.iter().map(Key::output_name).collect();

        rows.sort_by(|a, b| {
            let ordering = names.iter().fold(Ordering::Equal, |acc, name| {
                acc.then_with(|| Self::compare_values(a.get(name), b.get(name)))
            });

            match spec.direction {
                SortDirection::Up => ordering,
                SortDirection::Down => ordering.reverse(),
            }
        });
    }

    /// Missing values sort before present ones
    fn compare_values(a: Option<&FieldValue>, b: Option<&FieldValue>) -> Ordering {
        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => a.compare(b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(direction: SortDirection, names: &[&str]) -> SortSpec {
        SortSpec {
            direction,
            keys: names.iter().map(|n| Key::Aggregate(n.to_string())).collect(),
        }
    }

    fn row(a: f64, b: &str, tag: f64) -> ResultRow {
        ResultRow::new().with("a", a).with("b", b).with("tag", tag)
    }

    fn tags(rows: &[ResultRow]) -> Vec<f64> {
        rows.iter()
            .map(|r| r.get("tag").and_then(FieldValue::as_number).unwrap())
            .collect()
    }

    #[test]
    fn test_single_key_ascending() {
        let mut rows = vec![row(3.0, "x", 1.0), row(1.0, "x", 2.0), row(2.0, "x", 3.0)];
        ResultSorter::sort(&mut rows, &spec(SortDirection::Up, &["a"]));
        assert_eq!(tags(&rows), vec![2.0, 3.0, 1.0]);
    }

    #[test]
    fn test_numeric_not_lexical() {
        let mut rows = vec![row(10.0, "x", 1.0), row(9.0, "x", 2.0)];
        ResultSorter::sort(&mut rows, &spec(SortDirection::Up, &["a"]));
        assert_eq!(tags(&rows), vec![2.0, 1.0]);
    }

    #[test]
    fn test_composite_tie_break() {
        let mut rows = vec![
            row(1.0, "b", 1.0),
            row(2.0, "a", 2.0),
            row(1.0, "a", 3.0),
        ];
        ResultSorter::sort(&mut rows, &spec(SortDirection::Up, &["a", "b"]));
        assert_eq!(tags(&rows), vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn test_down_reverses_composite_order() {
        let mut rows = vec![
            row(1.0, "b", 1.0),
            row(2.0, "a", 2.0),
            row(1.0, "a", 3.0),
        ];
        ResultSorter::sort(&mut rows, &spec(SortDirection::Down, &["a", "b"]));
        assert_eq!(tags(&rows), vec![2.0, 1.0, 3.0]);
    }

    #[test]
    fn test_full_ties_keep_input_order() {
        let mut rows = vec![row(1.0, "a", 1.0), row(1.0, "a", 2.0), row(0.0, "a", 3.0)];
        ResultSorter::sort(&mut rows, &spec(SortDirection::Down, &["a", "b"]));
        assert_eq!(tags(&rows), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_missing_values_first() {
        let mut rows = vec![row(1.0, "a", 1.0), ResultRow::new().with("tag", 2.0)];
        ResultSorter::sort(&mut rows, &spec(SortDirection::Up, &["a"]));
        assert_eq!(tags(&rows), vec![2.0, 1.0]);
    }
}
