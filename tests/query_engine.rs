//! End-to-end query tests
//!
//! Queries are run through `QueryEngine::perform_query` against in-memory
//! course and room datasets, and checked against hand-computed results.

use std::sync::Arc;

use insightdb::api::{EngineError, QueryEngine};
use insightdb::executor::ResultRow;
use insightdb::observability::{Logger, Severity};
use insightdb::planner::QueryErrorCode;
use insightdb::storage::{MemorySource, Record};
use serde_json::{json, Value};

// =============================================================================
// Test Utilities
// =============================================================================

fn courses() -> Vec<Value> {
    vec![
        json!({"courses_dept": "cpsc", "courses_id": "310", "courses_avg": 78.5, "courses_instructor": "holmes", "courses_year": 2015, "courses_pass": 100, "courses_fail": 3}),
        json!({"courses_dept": "cpsc", "courses_id": "310", "courses_avg": 81.5, "courses_instructor": "holmes", "courses_year": 2016, "courses_pass": 90, "courses_fail": 5}),
        json!({"courses_dept": "cpsc", "courses_id": "310", "courses_avg": 90.0, "courses_instructor": "baniassad", "courses_year": 2016, "courses_pass": 80, "courses_fail": 0}),
        json!({"courses_dept": "cpsc", "courses_id": "110", "courses_avg": 72.25, "courses_instructor": "kiczales", "courses_year": 2014, "courses_pass": 300, "courses_fail": 40}),
        json!({"courses_dept": "math", "courses_id": "100", "courses_avg": 65.0, "courses_instructor": "", "courses_year": 1900, "courses_pass": 500, "courses_fail": 60}),
        json!({"courses_dept": "math", "courses_id": "200", "courses_avg": 95.5, "courses_instructor": "zhao", "courses_year": 2015, "courses_pass": 20, "courses_fail": 1}),
        json!({"courses_dept": "epse", "courses_id": "421", "courses_avg": 98.75, "courses_instructor": "lee", "courses_year": 2012, "courses_pass": 12, "courses_fail": 0}),
    ]
}

fn rooms() -> Vec<Value> {
    vec![
        json!({"rooms_shortname": "DMP", "rooms_number": "110", "rooms_seats": 120, "rooms_furniture": "Classroom-Fixed Tables/Movable Chairs", "rooms_type": "Tiered Large Group"}),
        json!({"rooms_shortname": "DMP", "rooms_number": "301", "rooms_seats": 80, "rooms_furniture": "Classroom-Fixed Tables/Movable Chairs", "rooms_type": "Tiered Large Group"}),
        json!({"rooms_shortname": "DMP", "rooms_number": "101", "rooms_seats": 40, "rooms_furniture": "Classroom-Movable Tables & Chairs", "rooms_type": "Small Group"}),
        json!({"rooms_shortname": "ANGU", "rooms_number": "098", "rooms_seats": 260, "rooms_furniture": "Classroom-Fixed Tables/Fixed Chairs", "rooms_type": "Tiered Large Group"}),
        json!({"rooms_shortname": "ANGU", "rooms_number": "232", "rooms_seats": 16, "rooms_furniture": "Classroom-Moveable Tables & Chairs", "rooms_type": "Small Group"}),
        json!({"rooms_shortname": "WOOD", "rooms_number": "2", "rooms_seats": 503, "rooms_furniture": "Classroom-Fixed Tablets", "rooms_type": "Tiered Large Group"}),
    ]
}

fn engine() -> QueryEngine<MemorySource> {
    Logger::set_min_severity(Severity::Fatal);
    let source = MemorySource::new();
    source.insert_json("courses", &courses()).unwrap();
    source.insert_json("rooms", &rooms()).unwrap();
    QueryEngine::new(Arc::new(source))
}

async fn run(query: Value) -> Vec<Value> {
    let rows = engine().perform_query(&query).await.unwrap();
    rows.iter().map(to_json).collect()
}

async fn reject(query: Value) -> EngineError {
    engine().perform_query(&query).await.unwrap_err()
}

fn to_json(row: &ResultRow) -> Value {
    serde_json::to_value(row).unwrap()
}

fn query_code(err: &EngineError) -> QueryErrorCode {
    match err {
        EngineError::Query(e) => e.code(),
        other => panic!("expected a compile error, got {}", other),
    }
}

// =============================================================================
// Filtering and projection
// =============================================================================

#[tokio::test]
async fn test_empty_where_selects_everything() {
    let rows = run(json!({
        "WHERE": {},
        "OPTIONS": {"COLUMNS": ["rooms_shortname", "rooms_number"]}
    }))
    .await;

    assert_eq!(rows.len(), 6);
    assert_eq!(rows[0], json!({"rooms_shortname": "DMP", "rooms_number": "110"}));
}

#[tokio::test]
async fn test_nested_logic() {
    let rows = run(json!({
        "WHERE": {
            "AND": [
                {"OR": [{"IS": {"courses_dept": "cpsc"}}, {"IS": {"courses_dept": "math"}}]},
                {"NOT": {"LT": {"courses_avg": 75}}},
                {"GT": {"courses_year": 1900}}
            ]
        },
        "OPTIONS": {"COLUMNS": ["courses_dept", "courses_avg"], "ORDER": "courses_avg"}
    }))
    .await;

    assert_eq!(
        rows,
        vec![
            json!({"courses_dept": "cpsc", "courses_avg": 78.5}),
            json!({"courses_dept": "cpsc", "courses_avg": 81.5}),
            json!({"courses_dept": "cpsc", "courses_avg": 90}),
            json!({"courses_dept": "math", "courses_avg": 95.5}),
        ]
    );
}

#[tokio::test]
async fn test_equality_is_exact() {
    let rows = run(json!({
        "WHERE": {"EQ": {"courses_avg": 72.25}},
        "OPTIONS": {"COLUMNS": ["courses_instructor"]}
    }))
    .await;
    assert_eq!(rows, vec![json!({"courses_instructor": "kiczales"})]);
}

#[tokio::test]
async fn test_wildcards() {
    let count = |pattern: &str| {
        let pattern = pattern.to_string();
        async move {
            run(json!({
                "WHERE": {"IS": {"rooms_furniture": pattern}},
                "OPTIONS": {"COLUMNS": ["rooms_number"]}
            }))
            .await
            .len()
        }
    };

    assert_eq!(count("*Tables*").await, 5);
    assert_eq!(count("Classroom-Fixed*").await, 4);
    assert_eq!(count("*Chairs").await, 5);
    assert_eq!(count("Classroom-Fixed Tablets").await, 1);
    assert_eq!(count("Classroom-Fixed").await, 0);
    assert_eq!(count("**").await, 6);
}

#[tokio::test]
async fn test_empty_string_matches_only_empty() {
    let rows = run(json!({
        "WHERE": {"IS": {"courses_instructor": ""}},
        "OPTIONS": {"COLUMNS": ["courses_dept", "courses_id"]}
    }))
    .await;
    assert_eq!(rows, vec![json!({"courses_dept": "math", "courses_id": "100"})]);
}

// =============================================================================
// Ordering
// =============================================================================

#[tokio::test]
async fn test_down_reverses_composite_order() {
    let rows = run(json!({
        "WHERE": {"GT": {"rooms_seats": 30}},
        "OPTIONS": {
            "COLUMNS": ["rooms_shortname", "rooms_seats"],
            "ORDER": {"dir": "DOWN", "keys": ["rooms_shortname", "rooms_seats"]}
        }
    }))
    .await;

    let names: Vec<(String, i64)> = rows
        .iter()
        .map(|r| {
            (
                r["rooms_shortname"].as_str().unwrap().to_string(),
                r["rooms_seats"].as_i64().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        names,
        vec![
            ("WOOD".to_string(), 503),
            ("DMP".to_string(), 120),
            ("DMP".to_string(), 80),
            ("DMP".to_string(), 40),
            ("ANGU".to_string(), 260),
        ]
    );
}

#[tokio::test]
async fn test_up_sort_is_stable_for_ties() {
    let rows = run(json!({
        "WHERE": {},
        "OPTIONS": {"COLUMNS": ["rooms_shortname", "rooms_number"], "ORDER": "rooms_shortname"}
    }))
    .await;

    let numbers: Vec<&str> = rows.iter().map(|r| r["rooms_number"].as_str().unwrap()).collect();
    assert_eq!(numbers, vec!["098", "232", "110", "301", "101", "2"]);
}

// =============================================================================
// Grouping and aggregation
// =============================================================================

#[tokio::test]
async fn test_group_with_every_token() {
    let rows = run(json!({
        "WHERE": {"IS": {"courses_dept": "cpsc"}},
        "OPTIONS": {
            "COLUMNS": ["courses_id", "avgGrade", "best", "worst", "passed", "profs"],
            "ORDER": {"dir": "DOWN", "keys": ["avgGrade"]}
        },
        "TRANSFORMATIONS": {
            "GROUP": ["courses_id"],
            "APPLY": [
                {"avgGrade": {"AVG": "courses_avg"}},
                {"best": {"MAX": "courses_avg"}},
                {"worst": {"MIN": "courses_avg"}},
                {"passed": {"SUM": "courses_pass"}},
                {"profs": {"COUNT": "courses_instructor"}}
            ]
        }
    }))
    .await;

    assert_eq!(
        rows,
        vec![
            json!({"courses_id": "310", "avgGrade": 83.33, "best": 90, "worst": 78.5, "passed": 270, "profs": 2}),
            json!({"courses_id": "110", "avgGrade": 72.25, "best": 72.25, "worst": 72.25, "passed": 300, "profs": 1}),
        ]
    );
}

#[tokio::test]
async fn test_grouped_columns_use_qualified_names() {
    let rows = run(json!({
        "WHERE": {},
        "OPTIONS": {"COLUMNS": ["rooms_type", "rooms_shortname"]},
        "TRANSFORMATIONS": {"GROUP": ["rooms_shortname", "rooms_type"], "APPLY": []}
    }))
    .await;

    // First-seen group order, columns in COLUMNS order
    assert_eq!(
        rows,
        vec![
            json!({"rooms_type": "Tiered Large Group", "rooms_shortname": "DMP"}),
            json!({"rooms_type": "Small Group", "rooms_shortname": "DMP"}),
            json!({"rooms_type": "Tiered Large Group", "rooms_shortname": "ANGU"}),
            json!({"rooms_type": "Small Group", "rooms_shortname": "ANGU"}),
            json!({"rooms_type": "Tiered Large Group", "rooms_shortname": "WOOD"}),
        ]
    );
}

#[tokio::test]
async fn test_count_is_distinct_not_group_size() {
    let rows = run(json!({
        "WHERE": {"IS": {"courses_id": "310"}},
        "OPTIONS": {"COLUMNS": ["courses_id", "years", "profs"]},
        "TRANSFORMATIONS": {
            "GROUP": ["courses_id"],
            "APPLY": [
                {"years": {"COUNT": "courses_year"}},
                {"profs": {"COUNT": "courses_instructor"}}
            ]
        }
    }))
    .await;
    assert_eq!(rows, vec![json!({"courses_id": "310", "years": 2, "profs": 2})]);
}

#[tokio::test]
async fn test_sum_and_avg_precision() {
    let source = MemorySource::new();
    source
        .insert_json(
            "courses",
            &[
                json!({"courses_dept": "a", "courses_avg": 1.005}),
                json!({"courses_dept": "a", "courses_avg": 1.005}),
                json!({"courses_dept": "b", "courses_avg": 10}),
                json!({"courses_dept": "b", "courses_avg": 10}),
                json!({"courses_dept": "b", "courses_avg": 10}),
            ],
        )
        .unwrap();
    let engine = QueryEngine::new(Arc::new(source));

    let rows = engine
        .perform_query(&json!({
            "WHERE": {},
            "OPTIONS": {"COLUMNS": ["courses_dept", "total", "mean"]},
            "TRANSFORMATIONS": {
                "GROUP": ["courses_dept"],
                "APPLY": [{"total": {"SUM": "courses_avg"}}, {"mean": {"AVG": "courses_avg"}}]
            }
        }))
        .await
        .unwrap();
    let rows: Vec<Value> = rows.iter().map(to_json).collect();

    assert_eq!(
        rows,
        vec![
            json!({"courses_dept": "a", "total": 2.01, "mean": 1.01}),
            json!({"courses_dept": "b", "total": 30, "mean": 10}),
        ]
    );
}

// =============================================================================
// Row cap
// =============================================================================

fn wide_engine(rows: usize) -> QueryEngine<MemorySource> {
    Logger::set_min_severity(Severity::Fatal);
    let records: Vec<Record> = (0..rows)
        .map(|i| {
            Record::new()
                .with("number", i.to_string())
                .with("shortname", if i % 2 == 0 { "EVEN" } else { "ODD" })
                .with("seats", i as f64)
        })
        .collect();
    QueryEngine::new(Arc::new(MemorySource::new().with_dataset("rooms", records)))
}

#[tokio::test]
async fn test_exactly_5000_rows_succeeds() {
    let rows = wide_engine(5000)
        .perform_query(&json!({"WHERE": {}, "OPTIONS": {"COLUMNS": ["rooms_number"]}}))
        .await
        .unwrap();
    assert_eq!(rows.len(), 5000);
}

#[tokio::test]
async fn test_5001_rows_is_too_large() {
    let engine = wide_engine(5001);
    let err = engine
        .perform_query(&json!({"WHERE": {}, "OPTIONS": {"COLUMNS": ["rooms_number"]}}))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "INSIGHT_RESULT_TOO_LARGE");

    // A filter or a grouping that shrinks the terminal set passes
    let rows = engine
        .perform_query(&json!({
            "WHERE": {"LT": {"rooms_seats": 5000}},
            "OPTIONS": {"COLUMNS": ["rooms_number"]}
        }))
        .await
        .unwrap();
    assert_eq!(rows.len(), 5000);

    let rows = engine
        .perform_query(&json!({
            "WHERE": {},
            "OPTIONS": {"COLUMNS": ["rooms_shortname", "n"]},
            "TRANSFORMATIONS": {"GROUP": ["rooms_shortname"], "APPLY": [{"n": {"COUNT": "rooms_number"}}]}
        }))
        .await
        .unwrap();
    let rows: Vec<Value> = rows.iter().map(to_json).collect();
    assert_eq!(
        rows,
        vec![
            json!({"rooms_shortname": "EVEN", "n": 2501}),
            json!({"rooms_shortname": "ODD", "n": 2500}),
        ]
    );
}

// =============================================================================
// Rejections
// =============================================================================

#[tokio::test]
async fn test_compile_rejections() {
    let cases = [
        (
            json!({"WHERE": {"GT": {"courses_avg": 90}}, "OPTIONS": {"COLUMNS": ["rooms_seats"]}}),
            QueryErrorCode::InsightCrossDataset,
        ),
        (
            json!({"WHERE": {}, "OPTIONS": {"COLUMNS": ["courses_grade"]}}),
            QueryErrorCode::InsightInvalidKey,
        ),
        (
            json!({"WHERE": {"GT": {"courses_dept": 3}}, "OPTIONS": {"COLUMNS": ["courses_dept"]}}),
            QueryErrorCode::InsightInvalidKey,
        ),
        (
            json!({"WHERE": {"AND": []}, "OPTIONS": {"COLUMNS": ["courses_dept"]}}),
            QueryErrorCode::InsightInvalidFilter,
        ),
        (
            json!({"WHERE": {"IS": {"courses_dept": "c*sc"}}, "OPTIONS": {"COLUMNS": ["courses_dept"]}}),
            QueryErrorCode::InsightInvalidPattern,
        ),
        (
            json!({"WHERE": {}, "OPTIONS": {"COLUMNS": ["courses_dept"], "ORDER": "courses_avg"}}),
            QueryErrorCode::InsightSortKeyNotSelected,
        ),
        (
            json!({
                "WHERE": {},
                "OPTIONS": {"COLUMNS": ["courses_dept", "courses_avg"]},
                "TRANSFORMATIONS": {"GROUP": ["courses_dept"], "APPLY": []}
            }),
            QueryErrorCode::InsightInvalidColumn,
        ),
        (
            json!({
                "WHERE": {},
                "OPTIONS": {"COLUMNS": ["courses_dept"]},
                "TRANSFORMATIONS": {
                    "GROUP": ["courses_dept"],
                    "APPLY": [{"x": {"MAX": "courses_avg"}}, {"x": {"MIN": "courses_avg"}}]
                }
            }),
            QueryErrorCode::InsightDuplicateApplyKey,
        ),
        (
            json!({
                "WHERE": {},
                "OPTIONS": {"COLUMNS": ["courses_dept"]},
                "TRANSFORMATIONS": {"GROUP": ["courses_dept"], "APPLY": [{"x": {"AVG": "courses_title"}}]}
            }),
            QueryErrorCode::InsightNonNumericAggregate,
        ),
        (json!({"OPTIONS": {"COLUMNS": ["courses_dept"]}}), QueryErrorCode::InsightMalformedQuery),
    ];

    for (query, expected) in cases {
        let err = reject(query.clone()).await;
        assert_eq!(query_code(&err), expected, "query {}", query);
        assert!(!err.is_not_found());
    }
}

#[tokio::test]
async fn test_unknown_dataset() {
    let err = reject(json!({
        "WHERE": {},
        "OPTIONS": {"COLUMNS": ["sections_dept"]}
    }))
    .await;
    assert!(err.is_not_found());
    assert_eq!(err.code(), "INSIGHT_DATASET_NOT_FOUND");
}

#[tokio::test]
async fn test_metrics_track_outcomes() {
    let engine = engine();
    engine
        .perform_query(&json!({"WHERE": {}, "OPTIONS": {"COLUMNS": ["rooms_seats"]}}))
        .await
        .unwrap();
    engine
        .perform_query(&json!({"WHERE": {}, "OPTIONS": {"COLUMNS": []}}))
        .await
        .unwrap_err();

    let snap = engine.metrics().snapshot();
    assert_eq!(snap.queries_executed, 1);
    assert_eq!(snap.queries_rejected, 1);
    assert_eq!(snap.rows_returned, 6);
}

#[tokio::test]
async fn test_queries_are_deterministic() {
    let engine = engine();
    let query = json!({
        "WHERE": {"NOT": {"IS": {"rooms_type": "Small*"}}},
        "OPTIONS": {"COLUMNS": ["rooms_shortname", "cap"], "ORDER": "cap"},
        "TRANSFORMATIONS": {"GROUP": ["rooms_shortname"], "APPLY": [{"cap": {"SUM": "rooms_seats"}}]}
    });

    let first = engine.perform_query(&query).await.unwrap();
    let second = engine.perform_query(&query).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
}
