//! GROUP/APPLY evaluation
//!
//! Groups are keyed by the tuple of GROUP values and emitted in first-seen
//! order. Each output row holds the GROUP fields under their qualified
//! names followed by one column per APPLY rule.
//!
//! Numeric rules:
//! - MAX/MIN: extremum of the group's values
//! - SUM: floating-point addition, rounded to 2 places
//! - AVG: exact decimal accumulation, divided by the value count, rounded
//!   half away from zero to 2 places. Groups whose values or total exceed
//!   the decimal range fall back to a floating-point mean.
//! - COUNT: number of distinct values (strict kind-and-value equality)
//!
//! Records missing the aggregated field are skipped for that rule. A rule
//! with no values left yields no column for MAX/MIN/AVG and `0` for
//! SUM/COUNT.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use super::errors::{ExecutorError, ExecutorResult};
use super::result::ResultRow;
use crate::planner::{ApplyRule, ApplyToken, Transformations};
use crate::storage::{FieldValue, Record};

type GroupKey = Vec<Option<FieldValue>>;

/// Applies TRANSFORMATIONS to filtered records
pub struct Aggregator;

impl Aggregator {
    /// Groups `records` and computes every APPLY rule per group
    pub fn aggregate(records: &[&Record], transformations: &Transformations) -> ExecutorResult<Vec<ResultRow>> {
        let groups = Self::partition(records, transformations);

        let mut rows = Vec::with_capacity(groups.len());
        for (key, members) in groups {
            let mut row = ResultRow::new();
            for (field, value) in transformations.group.iter().zip(key) {
                if let Some(value) = value {
                    row.push(field.qualified(), value);
                }
            }
            for rule in &transformations.apply {
                if let Some(value) = Self::apply_rule(rule, &members)? {
                    row.push(rule.name.clone(), value);
                }
            }
            rows.push(row);
        }
        Ok(rows)
    }

    fn partition<'r>(
        records: &[&'r Record],
        transformations: &Transformations,
    ) -> Vec<(GroupKey, Vec<&'r Record>)> {
        let mut index: HashMap<GroupKey, usize> = HashMap::new();
        let mut groups: Vec<(GroupKey, Vec<&'r Record>)> = Vec::new();

        for &record in records {
            let key: GroupKey = transformations
                .group
                .iter()
                .map(|field| record.get(field.field()).cloned())
                .collect();

            match index.get(&key) {
                Some(&slot) => groups[slot].1.push(record),
                None => {
                    index.insert(key.clone(), groups.len());
                    groups.push((key, vec![record]));
                }
            }
        }
        groups
    }

    fn apply_rule(rule: &ApplyRule, members: &[&Record]) -> ExecutorResult<Option<FieldValue>> {
        let field = rule.key.field();

        if rule.token == ApplyToken::Count {
            let distinct: HashSet<&FieldValue> =
                members.iter().filter_map(|r| r.get(field)).collect();
            return Ok(Some(FieldValue::Number(distinct.len() as f64)));
        }

        let values: Vec<f64> = members.iter().filter_map(|r| r.number(field)).collect();
        let result = match rule.token {
            ApplyToken::Max => values.iter().copied().reduce(f64::max),
            ApplyToken::Min => values.iter().copied().reduce(f64::min),
            ApplyToken::Sum => Some(round2(values.iter().sum())),
            ApplyToken::Avg => average(&values)?,
            ApplyToken::Count => None,
        };
        Ok(result.map(FieldValue::Number))
    }
}

/// Rounds half away from zero to 2 places, using the exact binary value
pub fn round2(value: f64) -> f64 {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        .and_then(decimal_to_f64)
        .unwrap_or_else(|| (value * 100.0).round() / 100.0)
}

// Parsing the decimal text yields the nearest f64 to the rounded value
fn decimal_to_f64(value: Decimal) -> Option<f64> {
    value.to_string().parse().ok()
}

fn to_decimal(value: f64) -> Option<Decimal> {
    Decimal::from_str(&value.to_string())
        .ok()
        .or_else(|| Decimal::from_f64(value))
}

fn average(values: &[f64]) -> ExecutorResult<Option<f64>> {
    if values.is_empty() {
        return Ok(None);
    }

    let exact = values
        .iter()
        .try_fold(Decimal::ZERO, |total, value| total.checked_add(to_decimal(*value)?))
        .and_then(|total| total.checked_div(Decimal::from(values.len())));
    let Some(avg) = exact else {
        // Beyond the decimal range
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        return Ok(Some(round2(mean)));
    };

    let avg = avg.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    decimal_to_f64(avg)
        .map(Some)
        .ok_or_else(|| ExecutorError::execution_failed(format!("AVG result {} is not representable", avg)))
}
