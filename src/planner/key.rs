//! Key resolution
//!
//! A raw key is either `<datasetId>_<field>` (a field key) or a bare name
//! with no underscore (an aggregate key). The first field key resolved in a
//! query binds the query to that dataset id; every later field key must
//! agree with it.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use super::errors::{QueryError, QueryResult};
use crate::catalog::{FieldCatalog, FieldKind};

static FIELD_KEY_RE: OnceLock<Option<Regex>> = OnceLock::new();

fn field_key_re() -> Option<&'static Regex> {
    FIELD_KEY_RE
        .get_or_init(|| Regex::new(r"^([^_]+)_([^_]+)$").ok())
        .as_ref()
}

/// A resolved reference to one field of one dataset
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldKey {
    dataset_id: String,
    field: String,
    kind: FieldKind,
}

impl FieldKey {
    pub fn new(dataset_id: impl Into<String>, field: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            field: field.into(),
            kind,
        }
    }

    pub fn dataset_id(&self) -> &str {
        &self.dataset_id
    }

    /// Bare field name, as stored in records
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// `<datasetId>_<field>`, as written in queries and results
    pub fn qualified(&self) -> String {
        format!("{}_{}", self.dataset_id, self.field)
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.dataset_id, self.field)
    }
}

/// A column or sort key: a dataset field or an aggregate result name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Field(FieldKey),
    Aggregate(String),
}

impl Key {
    /// Name of this key in result rows
    pub fn output_name(&self) -> String {
        match self {
            Key::Field(key) => key.qualified(),
            Key::Aggregate(name) => name.clone(),
        }
    }

    pub fn as_field(&self) -> Option<&FieldKey> {
        match self {
            Key::Field(key) => Some(key),
            Key::Aggregate(_) => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Field(key) => write!(f, "{}", key),
            Key::Aggregate(name) => write!(f, "{}", name),
        }
    }
}

/// Per-query key resolver.
///
/// Owns every field key resolved during compilation; resolving the same
/// raw string twice returns equal keys.
#[derive(Debug)]
pub struct KeyResolver<'a> {
    catalog: &'a FieldCatalog,
    dataset_id: Option<String>,
    resolved: HashMap<String, FieldKey>,
}

impl<'a> KeyResolver<'a> {
    pub fn new(catalog: &'a FieldCatalog) -> Self {
        Self {
            catalog,
            dataset_id: None,
            resolved: HashMap::new(),
        }
    }

    /// The dataset id this query is bound to, once any field key resolved
    pub fn dataset_id(&self) -> Option<&str> {
        self.dataset_id.as_deref()
    }

    /// Resolves a raw `<datasetId>_<field>` key
    pub fn resolve_field(&mut self, raw: &str) -> QueryResult<FieldKey> {
        if let Some(key) = self.resolved.get(raw) {
            return Ok(key.clone());
        }

        let captures = field_key_re()
            .and_then(|re| re.captures(raw))
            .ok_or_else(|| QueryError::invalid_key(raw, "expected <datasetId>_<field>"))?;
        let (dataset_id, field) = match (captures.get(1), captures.get(2)) {
            (Some(d), Some(f)) => (d.as_str(), f.as_str()),
            _ => return Err(QueryError::invalid_key(raw, "expected <datasetId>_<field>")),
        };

        let kind = self
            .catalog
            .field_kind(field)
            .ok_or_else(|| QueryError::invalid_key(raw, format!("unknown field '{}'", field)))?;

        match &self.dataset_id {
            Some(bound) if bound != dataset_id => {
                return Err(QueryError::cross_dataset(bound, raw));
            }
            Some(_) => {}
            None => self.dataset_id = Some(dataset_id.to_string()),
        }

        let key = FieldKey::new(dataset_id, field, kind);
        self.resolved.insert(raw.to_string(), key.clone());
        Ok(key)
    }

    /// Resolves a field key that must be numeric
    pub fn resolve_numeric(&mut self, raw: &str) -> QueryResult<FieldKey> {
        self.resolve_of_kind(raw, FieldKind::Numeric)
    }

    /// Resolves a field key that must be textual
    pub fn resolve_textual(&mut self, raw: &str) -> QueryResult<FieldKey> {
        self.resolve_of_kind(raw, FieldKind::Textual)
    }

    /// Resolves a field key, or a bare name as an aggregate key
    pub fn resolve(&mut self, raw: &str) -> QueryResult<Key> {
        if raw.contains('_') {
            self.resolve_field(raw).map(Key::Field)
        } else {
            Ok(Key::Aggregate(raw.to_string()))
        }
    }

    fn resolve_of_kind(&mut self, raw: &str, expected: FieldKind) -> QueryResult<FieldKey> {
        let key = self.resolve_field(raw)?;
        if key.kind() != expected {
            return Err(QueryError::invalid_key(
                raw,
                format!("expected a {} field, '{}' is {}", expected, key.field(), key.kind()),
            ));
        }
        Ok(key)
    }
}
