//! WHERE clause compilation
//!
//! Compiles a filter document into a `Filter` tree:
//!
//! ```text
//! {}                         -> All
//! {"AND": [f, ...]}          -> And (at least one child)
//! {"OR":  [f, ...]}          -> Or  (at least one child)
//! {"LT"|"GT"|"EQ": {k: n}}   -> Compare on a numeric key
//! {"IS": {k: "pattern"}}     -> Is on a textual key
//! {"NOT": f}                 -> Not
//! ```
//!
//! Only the top-level WHERE document may be empty.

use std::fmt;

use serde_json::{Map, Value};

use super::errors::{QueryError, QueryResult};
use super::key::{FieldKey, KeyResolver};

/// Numeric comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Lt,
    Gt,
    Eq,
}

impl ComparisonOp {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "LT" => Some(ComparisonOp::Lt),
            "GT" => Some(ComparisonOp::Gt),
            "EQ" => Some(ComparisonOp::Eq),
            _ => None,
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            ComparisonOp::Lt => "LT",
            ComparisonOp::Gt => "GT",
            ComparisonOp::Eq => "EQ",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOp::Lt => "<",
            ComparisonOp::Gt => ">",
            ComparisonOp::Eq => "=",
        }
    }

    /// Strict comparison of a record value against the query operand
    pub fn apply(&self, actual: f64, operand: f64) -> bool {
        match self {
            ComparisonOp::Lt => actual < operand,
            ComparisonOp::Gt => actual > operand,
            ComparisonOp::Eq => actual == operand,
        }
    }
}

/// IS pattern with optional leading and trailing wildcards
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// `x`
    Exact(String),
    /// `x*`
    Prefix(String),
    /// `*x`
    Suffix(String),
    /// `*x*`; an empty body matches everything
    Contains(String),
}

impl Pattern {
    /// Parses a pattern; `*` is only allowed as the first or last character
    pub fn parse(raw: &str) -> QueryResult<Pattern> {
        let leading = raw.starts_with('*');
        let rest = if leading { &raw[1..] } else { raw };
        let trailing = rest.ends_with('*');
        let body = if trailing {
            &rest[..rest.len() - 1]
        } else {
            rest
        };

        if body.contains('*') {
            return Err(QueryError::invalid_pattern(raw));
        }

        let body = body.to_string();
        Ok(match (leading, trailing) {
            (true, true) => Pattern::Contains(body),
            // a lone "*" strips to an empty suffix, which matches everything
            (true, false) if body.is_empty() => Pattern::Contains(body),
            (true, false) => Pattern::Suffix(body),
            (false, true) => Pattern::Prefix(body),
            (false, false) => Pattern::Exact(body),
        })
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            Pattern::Exact(s) => value == s,
            Pattern::Prefix(s) => value.starts_with(s.as_str()),
            Pattern::Suffix(s) => value.ends_with(s.as_str()),
            Pattern::Contains(s) => value.contains(s.as_str()),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Exact(s) => write!(f, "{}", s),
            Pattern::Prefix(s) => write!(f, "{}*", s),
            Pattern::Suffix(s) => write!(f, "*{}", s),
            Pattern::Contains(s) => write!(f, "*{}*", s),
        }
    }
}

/// Compiled filter tree
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Empty WHERE; every record matches
    All,
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Compare {
        op: ComparisonOp,
        key: FieldKey,
        value: f64,
    },
    Is {
        key: FieldKey,
        pattern: Pattern,
    },
    Not(Box<Filter>),
}

impl Filter {
    /// Compiles a top-level WHERE document
    pub fn compile(raw: &Value, resolver: &mut KeyResolver<'_>) -> QueryResult<Filter> {
        let object = raw
            .as_object()
            .ok_or_else(|| QueryError::invalid_filter(format!("WHERE must be an object, got {}", raw)))?;
        if object.is_empty() {
            return Ok(Filter::All);
        }
        Self::compile_node(object, resolver)
    }

    fn compile_node(object: &Map<String, Value>, resolver: &mut KeyResolver<'_>) -> QueryResult<Filter> {
        if object.len() != 1 {
            return Err(QueryError::invalid_filter(format!(
                "filter must have exactly one key, has {}",
                object.len()
            )));
        }
        let (token, body) = match object.iter().next() {
            Some(entry) => entry,
            None => return Err(QueryError::invalid_filter("filter must not be empty")),
        };

        match token.as_str() {
            "AND" => Ok(Filter::And(Self::compile_children(token, body, resolver)?)),
            "OR" => Ok(Filter::Or(Self::compile_children(token, body, resolver)?)),
            "NOT" => {
                let child = body.as_object().ok_or_else(|| {
                    QueryError::invalid_filter(format!("NOT must wrap a filter object, got {}", body))
                })?;
                Ok(Filter::Not(Box::new(Self::compile_node(child, resolver)?)))
            }
            "IS" => {
                let (raw_key, operand) = single_entry(token, body)?;
                let key = resolver.resolve_textual(raw_key)?;
                let pattern = operand.as_str().ok_or_else(|| {
                    QueryError::invalid_filter(format!("IS operand for '{}' must be a string, got {}", raw_key, operand))
                })?;
                Ok(Filter::Is {
                    key,
                    pattern: Pattern::parse(pattern)?,
                })
            }
            other => {
                let op = ComparisonOp::from_token(other).ok_or_else(|| {
                    QueryError::invalid_filter(format!("unknown filter '{}'", other))
                })?;
                let (raw_key, operand) = single_entry(token, body)?;
                let key = resolver.resolve_numeric(raw_key)?;
                let value = operand.as_f64().ok_or_else(|| {
                    QueryError::invalid_filter(format!(
                        "{} operand for '{}' must be a number, got {}",
                        op.token(),
                        raw_key,
                        operand
                    ))
                })?;
                Ok(Filter::Compare { op, key, value })
            }
        }
    }

    fn compile_children(
        token: &str,
        body: &Value,
        resolver: &mut KeyResolver<'_>,
    ) -> QueryResult<Vec<Filter>> {
        let children = body
            .as_array()
            .ok_or_else(|| QueryError::invalid_filter(format!("{} must be a list, got {}", token, body)))?;
        if children.is_empty() {
            return Err(QueryError::invalid_filter(format!(
                "{} must have at least one filter",
                token
            )));
        }

        children
            .iter()
            .map(|child| {
                let object = child.as_object().ok_or_else(|| {
                    QueryError::invalid_filter(format!("{} entries must be objects, got {}", token, child))
                })?;
                Self::compile_node(object, resolver)
            })
            .collect()
    }
}

fn single_entry<'v>(token: &str, body: &'v Value) -> QueryResult<(&'v str, &'v Value)> {
    let object = body
        .as_object()
        .ok_or_else(|| QueryError::invalid_filter(format!("{} must be an object, got {}", token, body)))?;
    if object.len() != 1 {
        return Err(QueryError::invalid_filter(format!(
            "{} must have exactly one key, has {}",
            token,
            object.len()
        )));
    }
    object
        .iter()
        .next()
        .map(|(k, v)| (k.as_str(), v))
        .ok_or_else(|| QueryError::invalid_filter(format!("{} must not be empty", token)))
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::All => write!(f, "TRUE"),
            Filter::And(children) | Filter::Or(children) => {
                let joiner = if matches!(self, Filter::And(_)) { " AND " } else { " OR " };
                write!(f, "(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, "{}", joiner)?;
                    }
                    write!(f, "{}", child)?;
                }
                write!(f, ")")
            }
            Filter::Compare { op, key, value } => write!(f, "{} {} {}", key, op.symbol(), value),
            Filter::Is { key, pattern } => write!(f, "{} IS \"{}\"", key, pattern),
            Filter::Not(child) => write!(f, "NOT {}", child),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FieldCatalog;
    use crate::planner::errors::QueryErrorCode;
    use serde_json::json;

    fn compile(raw: Value) -> QueryResult<Filter> {
        let catalog = FieldCatalog::new();
        let mut resolver = KeyResolver::new(&catalog);
        Filter::compile(&raw, &mut resolver)
    }

    fn code_of(raw: Value) -> QueryErrorCode {
        compile(raw).unwrap_err().code()
    }

    #[test]
    fn test_empty_where_is_all() {
        assert_eq!(compile(json!({})).unwrap(), Filter::All);
    }

    #[test]
    fn test_comparison() {
        let filter = compile(json!({"GT": {"rooms_seats": 50}})).unwrap();
        match filter {
            Filter::Compare { op, key, value } => {
                assert_eq!(op, ComparisonOp::Gt);
                assert_eq!(key.field(), "seats");
                assert_eq!(value, 50.0);
            }
            other => panic!("unexpected filter {:?}", other),
        }
    }

    #[test]
    fn test_nested_logic() {
        let filter = compile(json!({
            "OR": [
                {"AND": [{"IS": {"courses_dept": "cpsc"}}, {"GT": {"courses_avg": 90}}]},
                {"NOT": {"EQ": {"courses_year": 1900}}}
            ]
        }))
        .unwrap();

        assert_eq!(
            filter.to_string(),
            "((courses_dept IS \"cpsc\" AND courses_avg > 90) OR NOT courses_year = 1900)"
        );
    }

    #[test]
    fn test_shape_errors() {
        assert_eq!(code_of(json!([])), QueryErrorCode::InsightInvalidFilter);
        assert_eq!(code_of(json!({"AND": []})), QueryErrorCode::InsightInvalidFilter);
        assert_eq!(code_of(json!({"AND": [{}]})), QueryErrorCode::InsightInvalidFilter);
        assert_eq!(
            code_of(json!({"GT": {"rooms_seats": 1}, "LT": {"rooms_seats": 9}})),
            QueryErrorCode::InsightInvalidFilter
        );
        assert_eq!(code_of(json!({"XOR": []})), QueryErrorCode::InsightInvalidFilter);
        assert_eq!(
            code_of(json!({"GT": {"rooms_seats": "50"}})),
            QueryErrorCode::InsightInvalidFilter
        );
        assert_eq!(
            code_of(json!({"GT": {"rooms_seats": 1, "rooms_lat": 2}})),
            QueryErrorCode::InsightInvalidFilter
        );
        assert_eq!(
            code_of(json!({"IS": {"rooms_name": 5}})),
            QueryErrorCode::InsightInvalidFilter
        );
        assert_eq!(code_of(json!({"NOT": []})), QueryErrorCode::InsightInvalidFilter);
    }

    #[test]
    fn test_kind_mismatch_is_invalid_key() {
        assert_eq!(
            code_of(json!({"GT": {"courses_dept": 1}})),
            QueryErrorCode::InsightInvalidKey
        );
        assert_eq!(
            code_of(json!({"IS": {"courses_avg": "9*"}})),
            QueryErrorCode::InsightInvalidKey
        );
    }

    #[test]
    fn test_cross_dataset_in_filter() {
        assert_eq!(
            code_of(json!({"AND": [
                {"GT": {"courses_avg": 90}},
                {"GT": {"rooms_seats": 10}}
            ]})),
            QueryErrorCode::InsightCrossDataset
        );
    }

    #[test]
    fn test_pattern_parsing() {
        assert_eq!(Pattern::parse("cpsc").unwrap(), Pattern::Exact("cpsc".into()));
        assert_eq!(Pattern::parse("CS*").unwrap(), Pattern::Prefix("CS".into()));
        assert_eq!(Pattern::parse("*310").unwrap(), Pattern::Suffix("310".into()));
        assert_eq!(Pattern::parse("*CS*").unwrap(), Pattern::Contains("CS".into()));
        assert_eq!(Pattern::parse("**").unwrap(), Pattern::Contains(String::new()));
        assert_eq!(Pattern::parse("*").unwrap(), Pattern::Contains(String::new()));

        for bad in ["C*S*", "a*b", "***", "*a*b"] {
            assert_eq!(
                Pattern::parse(bad).unwrap_err().code(),
                QueryErrorCode::InsightInvalidPattern,
                "pattern {}",
                bad
            );
        }
    }

    #[test]
    fn test_pattern_matching() {
        let contains = Pattern::parse("*CS*").unwrap();
        assert!(contains.matches("ECS"));
        assert!(contains.matches("CS"));
        assert!(!contains.matches("C S"));

        let prefix = Pattern::parse("CS*").unwrap();
        assert!(prefix.matches("CSE"));
        assert!(!prefix.matches("ECS"));

        let suffix = Pattern::parse("*310").unwrap();
        assert!(suffix.matches("310"));
        assert!(suffix.matches("A310"));
        assert!(!suffix.matches("3100"));

        assert!(Pattern::parse("**").unwrap().matches(""));
        assert!(Pattern::parse("").unwrap().matches(""));
        assert!(!Pattern::parse("").unwrap().matches("x"));
    }

    #[test]
    fn test_comparison_ops_are_strict() {
        assert!(ComparisonOp::Lt.apply(1.0, 2.0));
        assert!(!ComparisonOp::Lt.apply(2.0, 2.0));
        assert!(!ComparisonOp::Gt.apply(2.0, 2.0));
        assert!(ComparisonOp::Eq.apply(2.0, 2.0));
    }
}
