use table_like_core::{
    ConstraintKind, DistributionKind, Feature, LikeOption, MergeStrategy, ValidationError,
};
use table_like_parser::{ParseError, TableBody, parse_script, parse_statement};

fn like_statement(options: &str) -> String {
    format!("CREATE TABLE t (\n   a STRING\n)\nLIKE b (\n   {options}\n)")
}

fn validation_error(sql: &str) -> ValidationError {
    parse_statement(sql)
        .expect("statement should parse")
        .validate()
        .expect_err("validation should fail")
}

#[test]
fn test_no_options() {
    let statement = parse_statement("CREATE TABLE t (\n   a STRING\n)\nLIKE b").unwrap();
    let clause = statement.like_clause().unwrap();

    assert_eq!(clause.source_table().names(), ["b"]);
    assert!(clause.options().is_empty());
    assert_eq!(clause.local().column_names(), vec!["a"]);
}

#[test]
fn test_create_table_like() {
    let sql = like_statement(
        "EXCLUDING PARTITIONS\n   EXCLUDING CONSTRAINTS\n   EXCLUDING DISTRIBUTION\n   \
         EXCLUDING WATERMARKS\n   OVERWRITING GENERATED\n   OVERWRITING OPTIONS",
    );
    let statement = parse_statement(&sql).unwrap();
    let clause = statement.like_clause().unwrap();

    assert_eq!(clause.source_table().names(), ["b"]);
    assert_eq!(
        clause.options(),
        [
            LikeOption::excluding(Feature::Partitions),
            LikeOption::excluding(Feature::Constraints),
            LikeOption::excluding(Feature::Distribution),
            LikeOption::excluding(Feature::Watermarks),
            LikeOption::overwriting(Feature::Generated),
            LikeOption::overwriting(Feature::Options),
        ]
    );
    assert!(statement.validate().is_ok());
}

#[test]
fn test_keywords_are_case_insensitive() {
    let statement = parse_statement(
        "create table t (a string) like b (excluding partitions Overwriting Options)",
    )
    .unwrap();
    let clause = statement.like_clause().unwrap();
    assert_eq!(
        clause.options(),
        [
            LikeOption::new(MergeStrategy::Excluding, Feature::Partitions),
            LikeOption::new(MergeStrategy::Overwriting, Feature::Options),
        ]
    );
    assert!(statement.validate().is_ok());
}

#[test]
fn test_cannot_duplicate_options() {
    let err = validation_error(&like_statement("EXCLUDING PARTITIONS\n   INCLUDING PARTITIONS"));
    assert_eq!(err.to_string(), "Each like option feature can be declared only once.");
}

#[test]
fn test_invalid_overwriting() {
    for feature in ["PARTITIONS", "ALL", "DISTRIBUTION", "CONSTRAINTS"] {
        let err = validation_error(&like_statement(&format!("OVERWRITING {feature}")));
        assert_eq!(
            err.to_string(),
            format!("Illegal merging strategy 'OVERWRITING' for '{feature}' option.")
        );
    }
}

#[test]
fn test_invalid_no_options() {
    let err = parse_statement("CREATE TABLE t (\n   a STRING\n)\nLIKE b ()").unwrap_err();
    assert!(err.to_string().starts_with(
        "Encountered \")\" at line 4, column 9.\n\
         Was expecting one of:\n    \
         \"EXCLUDING\" ...\n    \
         \"INCLUDING\" ...\n    \
         \"OVERWRITING\" ..."
    ));
}

#[test]
fn test_invalid_no_source_table() {
    let err = parse_statement("CREATE TABLE t (\n   a STRING\n)\nLIKE (   INCLUDING ALL)")
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Encountered \"(\" at line 4, column 6.\n\
         Was expecting one of:\n    \
         <BACK_QUOTED_IDENTIFIER> ...\n    \
         <IDENTIFIER> ..."
    );
}

#[test]
fn test_unknown_feature() {
    let err = parse_statement("CREATE TABLE t LIKE b (EXCLUDING COLUMNS)").unwrap_err();
    match err {
        ParseError::Unexpected {
            found, expected, ..
        } => {
            assert_eq!(found, "COLUMNS");
            assert!(expected.contains(&"\"WATERMARKS\"".to_string()));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_full_table_body() {
    let sql = "\
CREATE TABLE IF NOT EXISTS cat.db.orders (
  id BIGINT NOT NULL COMMENT 'order id',
  amount DECIMAL(10, 2),
  ts TIMESTAMP(3),
  total AS amount * 2,
  WATERMARK FOR ts AS ts - INTERVAL '5' SECOND,
  CONSTRAINT pk PRIMARY KEY (id) NOT ENFORCED,
  UNIQUE (amount, ts)
)
DISTRIBUTED BY HASH(id) INTO 8 BUCKETS
PARTITIONED BY (ts)
WITH (
  'connector' = 'kafka',
  'topic' = 'orders'
);";
    let statement = parse_statement(sql).unwrap();
    assert!(statement.if_not_exists);
    assert_eq!(statement.name.key(), "cat.db.orders");
    assert!(matches!(statement.body, TableBody::Plain(_)));

    let schema = statement.local_schema();
    assert_eq!(schema.column_names(), vec!["id", "amount", "ts"]);
    assert!(!schema.columns[0].nullable);
    assert_eq!(schema.columns[0].comment.as_deref(), Some("order id"));
    assert_eq!(schema.columns[1].data_type, "DECIMAL(10, 2)");
    assert_eq!(schema.generated[0].expression, "amount * 2");
    assert_eq!(schema.watermarks[0].expression, "ts - INTERVAL '5' SECOND");

    let pk = schema.primary_key().unwrap();
    assert_eq!(pk.name.as_deref(), Some("pk"));
    assert_eq!(pk.columns, vec!["id"]);
    assert_eq!(schema.constraints[1].kind, ConstraintKind::Unique);

    let distribution = schema.distribution.as_ref().unwrap();
    assert_eq!(distribution.kind, DistributionKind::Hash);
    assert_eq!(distribution.buckets, Some(8));
    assert_eq!(schema.partition_keys, vec!["ts"]);
    assert_eq!(schema.options["topic"], "orders");
}

#[test]
fn test_inline_primary_key() {
    let statement = parse_statement("CREATE TABLE t (id INT PRIMARY KEY NOT ENFORCED)").unwrap();
    let schema = statement.local_schema();
    assert_eq!(schema.primary_key().unwrap().columns, vec!["id"]);
    assert!(!schema.columns[0].nullable);
}

#[test]
fn test_duplicate_primary_key() {
    let err =
        parse_statement("CREATE TABLE t (id INT PRIMARY KEY NOT ENFORCED, PRIMARY KEY (id))")
            .unwrap_err();
    assert!(matches!(
        err,
        ParseError::Invalid { ref message, .. } if message == "Duplicate primary key definition"
    ));
}

#[test]
fn test_duplicate_column_and_option_key() {
    let err = parse_statement("CREATE TABLE t (a INT, a STRING)").unwrap_err();
    assert_eq!(err.position(), (1, 24));

    let err = parse_statement("CREATE TABLE t WITH ('k' = '1', 'k' = '2')").unwrap_err();
    assert!(err.to_string().starts_with("Duplicate option key 'k'"));
}

#[test]
fn test_distributed_into_buckets_only() {
    let statement = parse_statement("CREATE TABLE t (a INT) DISTRIBUTED INTO 4 BUCKETS").unwrap();
    let distribution = statement.local_schema().distribution.as_ref().unwrap();
    assert_eq!(distribution.kind, DistributionKind::Unspecified);
    assert!(distribution.keys.is_empty());
    assert_eq!(distribution.buckets, Some(4));
}

#[test]
fn test_clause_order_is_enforced() {
    let err = parse_statement("CREATE TABLE t (a INT) WITH ('k' = 'v') PARTITIONED BY (a)")
        .unwrap_err();
    match err {
        ParseError::Unexpected {
            found, expected, ..
        } => {
            assert_eq!(found, "PARTITIONED");
            assert_eq!(expected, vec!["\"LIKE\"", "\";\"", "<EOF>"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_parse_script_with_comments() {
    let script = "\
-- source table
CREATE TABLE base (id BIGINT) WITH ('connector' = 'kafka');
/* derived */
CREATE TABLE copy LIKE base (EXCLUDING OPTIONS);
;";
    let statements = parse_script(script).unwrap();
    assert_eq!(statements.len(), 2);
    assert_eq!(statements[0].name.key(), "base");
    assert_eq!(
        statements[1].like_clause().unwrap().options(),
        [LikeOption::excluding(Feature::Options)]
    );
}

#[test]
fn test_parse_script_requires_separator() {
    let err = parse_script("CREATE TABLE a (x INT) CREATE TABLE b (y INT)").unwrap_err();
    assert_eq!(err.position(), (1, 24));
}

#[test]
fn test_statement_serializes_to_json() {
    let statement = parse_statement("CREATE TABLE t (a INT) LIKE b (EXCLUDING ALL)").unwrap();
    let value = serde_json::to_value(&statement).unwrap();
    assert_eq!(value["name"], serde_json::json!(["t"]));
    assert_eq!(value["body"]["like"]["source_table"], serde_json::json!(["b"]));
    assert_eq!(
        value["body"]["like"]["options"][0],
        serde_json::json!({"strategy": "EXCLUDING", "feature": "ALL"})
    );
}
