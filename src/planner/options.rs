//! OPTIONS compilation: output columns and ordering

use std::fmt;

use serde_json::Value;

use super::errors::{QueryError, QueryResult};
use super::key::{Key, KeyResolver};
use super::transform::Transformations;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Up,
    Down,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Up => "UP",
            SortDirection::Down => "DOWN",
        }
    }
}

/// Composite sort over selected columns.
///
/// `Down` reverses the composite ordering as a whole; it does not flip each
/// key independently.
#[derive(Debug, Clone, PartialEq)]
pub struct SortSpec {
    pub direction: SortDirection,
    pub keys: Vec<Key>,
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<String> = self.keys.iter().map(Key::output_name).collect();
        write!(f, "[{}] {}", keys.join(", "), self.direction.as_str())
    }
}

/// Compiled OPTIONS block
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    /// Output columns in request order, duplicates collapsed
    pub columns: Vec<Key>,
    pub sort: Option<SortSpec>,
}

impl Options {
    /// Compiles `{"COLUMNS": [...], "ORDER"?: ...}`.
    ///
    /// Columns may name aggregate keys here; whether those are declared is
    /// settled by [`Options::check_scope`] once TRANSFORMATIONS is compiled.
    pub fn compile(raw: &Value, resolver: &mut KeyResolver<'_>) -> QueryResult<Options> {
        let object = raw
            .as_object()
            .ok_or_else(|| QueryError::malformed(format!("OPTIONS must be an object, got {}", raw)))?;

        if let Some(extra) = object.keys().find(|k| *k != "COLUMNS" && *k != "ORDER") {
            return Err(QueryError::malformed(format!(
                "OPTIONS may only contain COLUMNS and ORDER, found '{}'",
                extra
            )));
        }

        let raw_columns = object
            .get("COLUMNS")
            .ok_or_else(|| QueryError::malformed("OPTIONS must contain COLUMNS"))?;
        let columns = Self::compile_columns(raw_columns, resolver)?;

        let sort = match object.get("ORDER") {
            Some(raw_order) => Some(Self::compile_order(raw_order, &columns, resolver)?),
            None => None,
        };

        Ok(Options { columns, sort })
    }

    fn compile_columns(raw: &Value, resolver: &mut KeyResolver<'_>) -> QueryResult<Vec<Key>> {
        let entries = raw
            .as_array()
            .ok_or_else(|| QueryError::malformed(format!("COLUMNS must be a list, got {}", raw)))?;
        if entries.is_empty() {
            return Err(QueryError::malformed("COLUMNS must have at least one key"));
        }

        let mut columns: Vec<Key> = Vec::with_capacity(entries.len());
        for entry in entries {
            let name = entry
                .as_str()
                .ok_or_else(|| QueryError::invalid_column(entry.to_string(), "column names must be strings"))?;
            let key = resolver.resolve(name)?;
            if !columns.contains(&key) {
                columns.push(key);
            }
        }
        Ok(columns)
    }

    fn compile_order(
        raw: &Value,
        columns: &[Key],
        resolver: &mut KeyResolver<'_>,
    ) -> QueryResult<SortSpec> {
        let (direction, raw_keys): (SortDirection, Vec<&str>) = match raw {
            Value::String(key) => (SortDirection::Up, vec![key.as_str()]),
            Value::Object(object) => {
                if object.len() != 2 || !object.contains_key("dir") || !object.contains_key("keys") {
                    return Err(QueryError::malformed(
                        "ORDER object must contain exactly 'dir' and 'keys'",
                    ));
                }
                let direction = match object.get("dir").and_then(Value::as_str) {
                    Some("UP") => SortDirection::Up,
                    Some("DOWN") => SortDirection::Down,
                    _ => {
                        return Err(QueryError::malformed("ORDER dir must be 'UP' or 'DOWN'"));
                    }
                };
                let keys = object
                    .get("keys")
                    .and_then(Value::as_array)
                    .ok_or_else(|| QueryError::malformed("ORDER keys must be a list"))?;
                if keys.is_empty() {
                    return Err(QueryError::malformed("ORDER keys must not be empty"));
                }
                let keys = keys
                    .iter()
                    .map(|k| {
                        k.as_str()
                            .ok_or_else(|| QueryError::malformed(format!("ORDER keys must be strings, got {}", k)))
                    })
                    .collect::<QueryResult<Vec<_>>>()?;
                (direction, keys)
            }
            other => {
                return Err(QueryError::malformed(format!(
                    "ORDER must be a key or an object, got {}",
                    other
                )));
            }
        };

        let mut keys = Vec::with_capacity(raw_keys.len());
        for raw_key in raw_keys {
            let key = resolver.resolve(raw_key)?;
            if !columns.contains(&key) {
                return Err(QueryError::sort_key_not_selected(raw_key));
            }
            keys.push(key);
        }
        Ok(SortSpec { direction, keys })
    }

    /// Checks every column against the keys in scope.
    ///
    /// With TRANSFORMATIONS, a column must be a GROUP key or a declared
    /// APPLY name. Without, only field keys are in scope.
    pub fn check_scope(&self, transformations: Option<&Transformations>) -> QueryResult<()> {
        for column in &self.columns {
            match (column, transformations) {
                (Key::Field(key), Some(t)) if !t.groups_by(key) => {
                    return Err(QueryError::invalid_column(
                        key.qualified(),
                        "grouped queries may only select GROUP keys and APPLY names",
                    ));
                }
                (Key::Aggregate(name), Some(t)) if !t.declares(name) => {
                    return Err(QueryError::invalid_column(
                        name.as_str(),
                        "no APPLY rule declares this name",
                    ));
                }
                (Key::Aggregate(name), None) => {
                    return Err(QueryError::invalid_column(
                        name.as_str(),
                        "aggregate names require TRANSFORMATIONS",
                    ));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Output names of the selected columns, in order
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(Key::output_name).collect()
    }
}
