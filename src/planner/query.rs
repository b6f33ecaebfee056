//! Whole-query compilation
//!
//! Components are compiled in a fixed order (WHERE, OPTIONS,
//! TRANSFORMATIONS) through a single key resolver, so the dataset id bound
//! by the first field key constrains everything after it. Column scope is
//! checked last, once the declared APPLY names are known.

use serde_json::Value;

use super::errors::{QueryError, QueryResult};
use super::filter::Filter;
use super::key::KeyResolver;
use super::options::Options;
use super::transform::Transformations;
use crate::catalog::FieldCatalog;

const WHERE: &str = "WHERE";
const OPTIONS: &str = "OPTIONS";
const TRANSFORMATIONS: &str = "TRANSFORMATIONS";

/// A fully validated query, ready to execute
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub dataset_id: String,
    pub filter: Filter,
    pub options: Options,
    pub transformations: Option<Transformations>,
}

impl CompiledQuery {
    pub fn is_grouped(&self) -> bool {
        self.transformations.is_some()
    }
}

/// Compiles raw query documents against a field catalog
#[derive(Debug, Clone, Copy)]
pub struct QueryCompiler<'a> {
    catalog: &'a FieldCatalog,
}

impl<'a> QueryCompiler<'a> {
    pub fn new(catalog: &'a FieldCatalog) -> Self {
        Self { catalog }
    }

    /// Compiles a query document.
    ///
    /// The document must have exactly the keys WHERE and OPTIONS, plus
    /// TRANSFORMATIONS optionally. No record is touched.
    pub fn compile(&self, raw: &Value) -> QueryResult<CompiledQuery> {
        let object = raw
            .as_object()
            .ok_or_else(|| QueryError::malformed(format!("query must be an object, got {}", raw)))?;

        let has_transformations = object.contains_key(TRANSFORMATIONS);
        let expected_len = if has_transformations { 3 } else { 2 };
        if object.len() != expected_len || !object.contains_key(WHERE) || !object.contains_key(OPTIONS) {
            let mut found: Vec<&str> = object.keys().map(String::as_str).collect();
            found.sort_unstable();
            return Err(QueryError::malformed(format!(
                "query must contain WHERE and OPTIONS, and optionally TRANSFORMATIONS; found [{}]",
                found.join(", ")
            )));
        }

        let mut resolver = KeyResolver::new(self.catalog);
        let filter = Filter::compile(&object[WHERE], &mut resolver)?;
        let options = Options::compile(&object[OPTIONS], &mut resolver)?;
        let transformations = match object.get(TRANSFORMATIONS) {
            Some(raw_t) => Some(Transformations::compile(raw_t, &mut resolver)?),
            None => None,
        };
        options.check_scope(transformations.as_ref())?;

        let dataset_id = resolver
            .dataset_id()
            .map(str::to_string)
            .ok_or_else(|| QueryError::malformed("query does not reference any dataset field"))?;

        Ok(CompiledQuery {
            dataset_id,
            filter,
            options,
            transformations,
        })
    }
}
