//! TRANSFORMATIONS compilation: GROUP keys and APPLY rules

use std::fmt;

use serde_json::Value;

use super::errors::{QueryError, QueryResult};
use super::key::{FieldKey, KeyResolver};

/// Aggregation applied to one field within a group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyToken {
    Max,
    Min,
    Avg,
    Sum,
    /// Number of distinct values
    Count,
}

impl ApplyToken {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "MAX" => Some(ApplyToken::Max),
            "MIN" => Some(ApplyToken::Min),
            "AVG" => Some(ApplyToken::Avg),
            "SUM" => Some(ApplyToken::Sum),
            "COUNT" => Some(ApplyToken::Count),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplyToken::Max => "MAX",
            ApplyToken::Min => "MIN",
            ApplyToken::Avg => "AVG",
            ApplyToken::Sum => "SUM",
            ApplyToken::Count => "COUNT",
        }
    }

    pub fn requires_numeric(&self) -> bool {
        !matches!(self, ApplyToken::Count)
    }
}

/// `{ name: { TOKEN: key } }`
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyRule {
    pub name: String,
    pub token: ApplyToken,
    pub key: FieldKey,
}

impl fmt::Display for ApplyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}({})", self.name, self.token.as_str(), self.key)
    }
}

/// Compiled TRANSFORMATIONS block
#[derive(Debug, Clone, PartialEq)]
pub struct Transformations {
    pub group: Vec<FieldKey>,
    pub apply: Vec<ApplyRule>,
}

impl Transformations {
    /// Compiles `{"GROUP": [...], "APPLY": [...]}`
    pub fn compile(raw: &Value, resolver: &mut KeyResolver<'_>) -> QueryResult<Transformations> {
        let object = raw.as_object().ok_or_else(|| {
            QueryError::malformed(format!("TRANSFORMATIONS must be an object, got {}", raw))
        })?;
        if object.len() != 2 || !object.contains_key("GROUP") || !object.contains_key("APPLY") {
            return Err(QueryError::malformed(
                "TRANSFORMATIONS must contain exactly GROUP and APPLY",
            ));
        }

        let group = Self::compile_group(&object["GROUP"], resolver)?;
        let apply = Self::compile_apply(&object["APPLY"], resolver)?;
        Ok(Transformations { group, apply })
    }

    fn compile_group(raw: &Value, resolver: &mut KeyResolver<'_>) -> QueryResult<Vec<FieldKey>> {
        let entries = raw
            .as_array()
            .ok_or_else(|| QueryError::malformed(format!("GROUP must be a list, got {}", raw)))?;
        if entries.is_empty() {
            return Err(QueryError::malformed("GROUP must have at least one key"));
        }

        let mut group: Vec<FieldKey> = Vec::with_capacity(entries.len());
        for entry in entries {
            let raw_key = entry
                .as_str()
                .ok_or_else(|| QueryError::malformed(format!("GROUP keys must be strings, got {}", entry)))?;
            let key = resolver.resolve_field(raw_key)?;
            if !group.contains(&key) {
                group.push(key);
            }
        }
        Ok(group)
    }

    fn compile_apply(raw: &Value, resolver: &mut KeyResolver<'_>) -> QueryResult<Vec<ApplyRule>> {
        let entries = raw
            .as_array()
            .ok_or_else(|| QueryError::malformed(format!("APPLY must be a list, got {}", raw)))?;

        let mut rules: Vec<ApplyRule> = Vec::with_capacity(entries.len());
        for entry in entries {
            let rule = Self::compile_rule(entry, resolver)?;
            if rules.iter().any(|r| r.name == rule.name) {
                return Err(QueryError::duplicate_apply_key(rule.name));
            }
            rules.push(rule);
        }
        Ok(rules)
    }

    fn compile_rule(raw: &Value, resolver: &mut KeyResolver<'_>) -> QueryResult<ApplyRule> {
        let (name, body) = raw
            .as_object()
            .filter(|o| o.len() == 1)
            .and_then(|o| o.iter().next())
            .ok_or_else(|| QueryError::malformed(format!("APPLY rule must have exactly one key, got {}", raw)))?;

        if name.is_empty() || name.contains('_') {
            return Err(QueryError::invalid_key(
                name.as_str(),
                "APPLY names must be non-empty and contain no underscore",
            ));
        }

        let (raw_token, raw_key) = body
            .as_object()
            .filter(|o| o.len() == 1)
            .and_then(|o| o.iter().next())
            .ok_or_else(|| {
                QueryError::malformed(format!("APPLY rule '{}' must map one token to one key", name))
            })?;
        let token = ApplyToken::from_token(raw_token).ok_or_else(|| {
            QueryError::malformed(format!(
                "'{}' is not one of MAX, MIN, AVG, SUM, COUNT",
                raw_token
            ))
        })?;
        let raw_key = raw_key.as_str().ok_or_else(|| {
            QueryError::malformed(format!("APPLY rule '{}' key must be a string", name))
        })?;

        let key = resolver.resolve_field(raw_key)?;
        if token.requires_numeric() && !key.kind().is_numeric() {
            return Err(QueryError::non_numeric_aggregate(token.as_str(), raw_key));
        }

        Ok(ApplyRule {
            name: name.clone(),
            token,
            key,
        })
    }

    /// True if an APPLY rule declares `name`
    pub fn declares(&self, name: &str) -> bool {
        self.apply.iter().any(|rule| rule.name == name)
    }

    /// True if `key` is one of the GROUP keys
    pub fn groups_by(&self, key: &FieldKey) -> bool {
        self.group.contains(key)
    }
}
