//! Explain output
//!
//! Describes what a query compiles to without loading any records.

use std::fmt;

use serde::Serialize;

use super::errors::QueryError;
use super::query::CompiledQuery;

/// Explain plan output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExplainPlan {
    /// Whether compilation succeeded
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset_id: Option<String>,
    /// Filter tree rendered as text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub group: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub apply: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

impl ExplainPlan {
    /// Creates an explain plan from a compiled query
    pub fn from_query(query: &CompiledQuery) -> Self {
        let (group, apply) = match &query.transformations {
            Some(t) => (
                t.group.iter().map(|k| k.qualified()).collect(),
                t.apply.iter().map(|r| r.to_string()).collect(),
            ),
            None => (Vec::new(), Vec::new()),
        };

        Self {
            accepted: true,
            dataset_id: Some(query.dataset_id.clone()),
            filter: Some(query.filter.to_string()),
            columns: query.options.column_names(),
            sort: query.options.sort.as_ref().map(|s| s.to_string()),
            group,
            apply,
            rejection_code: None,
            rejection_reason: None,
        }
    }

    /// Creates an explain plan from a compilation error
    pub fn from_error(err: &QueryError) -> Self {
        Self {
            accepted: false,
            dataset_id: None,
            filter: None,
            columns: Vec::new(),
            sort: None,
            group: Vec::new(),
            apply: Vec::new(),
            rejection_code: Some(err.code().code().to_string()),
            rejection_reason: Some(err.message().to_string()),
        }
    }
}

impl fmt::Display for ExplainPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== EXPLAIN PLAN ===")?;

        if !self.accepted {
            writeln!(f, "Status: REJECTED")?;
            if let Some(code) = &self.rejection_code {
                writeln!(f, "Error Code: {}", code)?;
            }
            if let Some(reason) = &self.rejection_reason {
                writeln!(f, "Reason: {}", reason)?;
            }
            return Ok(());
        }

        writeln!(f, "Status: ACCEPTED")?;
        if let Some(id) = &self.dataset_id {
            writeln!(f, "Dataset: {}", id)?;
        }
        if let Some(filter) = &self.filter {
            writeln!(f, "Filter: {}", filter)?;
        }
        if !self.group.is_empty() {
            writeln!(f, "Group: {}", self.group.join(", "))?;
        }
        if !self.apply.is_empty() {
            writeln!(f, "Apply:")?;
            for rule in &self.apply {
                writeln!(f, "  - {}", rule)?;
            }
        }
        writeln!(f, "Columns: {}", self.columns.join(", "))?;
        if let Some(sort) = &self.sort {
            writeln!(f, "Sort: {}", sort)?;
        }
        Ok(())
    }
}
