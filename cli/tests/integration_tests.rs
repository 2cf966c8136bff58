use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const BASE_SQL: &str = "\
CREATE TABLE base (
  id BIGINT NOT NULL,
  ts TIMESTAMP(3),
  WATERMARK FOR ts AS ts - INTERVAL '5' SECOND,
  PRIMARY KEY (id) NOT ENFORCED
)
PARTITIONED BY (ts)
WITH ('connector' = 'kafka', 'topic' = 'orders');
";

fn table_like() -> Command {
    Command::new(env!("CARGO_BIN_EXE_table-like"))
}

fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("failed to write test file");
    path
}

fn run(args: &[&str]) -> Output {
    table_like().args(args).output().expect("failed to run table-like")
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("temp paths are UTF-8")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

#[test]
fn validate_counts_statements_and_files() {
    let dir = TempDir::new().unwrap();
    write_file(&dir, "base.sql", BASE_SQL);
    write_file(
        &dir,
        "derived.sql",
        "CREATE TABLE a LIKE base (EXCLUDING ALL);\nCREATE TABLE b LIKE base;",
    );

    let output = run(&["validate", path_str(dir.path())]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "Validated 3 statement(s) in 2 file(s).\n");
}

#[test]
fn validate_rejects_duplicate_feature() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "dup.sql",
        "CREATE TABLE t (\n   a STRING\n)\nLIKE b (\n   EXCLUDING PARTITIONS\n   INCLUDING PARTITIONS\n)",
    );

    let output = run(&["validate", path_str(&path)]);
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.starts_with("error: "));
    assert!(err.contains("Each like option feature can be declared only once."));
}

#[test]
fn validate_reports_syntax_error_position() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "bad.sql", "CREATE TABLE t (\n   a STRING\n)\nLIKE b ()");

    let output = run(&["validate", path_str(&path)]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Encountered \")\" at line 4, column 9."));
}

// ---------------------------------------------------------------------------
// merge
// ---------------------------------------------------------------------------

#[test]
fn merge_prints_last_table_as_json() {
    let dir = TempDir::new().unwrap();
    let script = format!(
        "{BASE_SQL}CREATE TABLE copy (note STRING) WITH ('topic' = 'copy')\n\
         LIKE base (EXCLUDING PARTITIONS OVERWRITING OPTIONS);"
    );
    let path = write_file(&dir, "script.sql", &script);

    let output = run(&["merge", "--input", path_str(&path)]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["name"], serde_json::json!(["copy"]));
    let columns: Vec<&str> = value["columns"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(columns, vec!["id", "ts", "note"]);
    assert!(value.get("partition_keys").is_none());
    assert_eq!(value["options"]["topic"], "copy");
    assert_eq!(value["options"]["connector"], "kafka");
    assert_eq!(value["watermarks"][0]["rowtime_column"], "ts");
}

#[test]
fn merge_uses_catalog_and_writes_ddl() {
    let catalog = TempDir::new().unwrap();
    write_file(
        &catalog,
        "db.orders.json",
        r#"{"columns": [{"name": "id", "data_type": "BIGINT", "nullable": false}],
            "options": {"connector": "kafka"}}"#,
    );
    let dir = TempDir::new().unwrap();
    let script = write_file(
        &dir,
        "script.sql",
        "CREATE TABLE archive (note STRING) LIKE db.orders (EXCLUDING OPTIONS);",
    );
    let out_path = dir.path().join("archive.sql");

    let output = run(&[
        "merge",
        "--input",
        path_str(&script),
        "--catalog",
        path_str(catalog.path()),
        "--format",
        "ddl",
        "--output",
        path_str(&out_path),
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).starts_with("Wrote table archive to "));

    let ddl = fs::read_to_string(&out_path).unwrap();
    assert_eq!(
        ddl,
        "CREATE TABLE archive (\n  id BIGINT NOT NULL,\n  note STRING\n)\n"
    );
}

#[test]
fn merge_selects_table_and_honors_config_defaults() {
    let dir = TempDir::new().unwrap();
    let script = format!("{BASE_SQL}CREATE TABLE a LIKE base;\nCREATE TABLE b (x INT);");
    let path = write_file(&dir, "script.sql", &script);
    let config = write_file(
        &dir,
        "config.yaml",
        "version: \"1.0\"\ndefaults:\n  constraints: EXCLUDING\noutput:\n  format: yaml\n",
    );

    let output = run(&[
        "merge",
        "--input",
        path_str(&path),
        "--config",
        path_str(&config),
        "--table",
        "a",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.starts_with("name:\n- a\n"));
    assert!(!text.contains("constraints:"));
    assert!(text.contains("partition_keys:\n- ts\n"));
}

#[test]
fn merge_unknown_source_fails() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "script.sql", "CREATE TABLE t LIKE missing;");

    let output = run(&["merge", "--input", path_str(&path)]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("error: Source table 'missing' does not exist"));
}

#[test]
fn merge_column_conflict_fails() {
    let dir = TempDir::new().unwrap();
    let script = format!("{BASE_SQL}CREATE TABLE t (id INT) LIKE base;");
    let path = write_file(&dir, "script.sql", &script);

    let output = run(&["merge", "--input", path_str(&path)]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("A column named 'id' already exists in the base table."));
}

#[test]
fn merge_rejects_illegal_config_default() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "script.sql", BASE_SQL);
    let config = write_file(
        &dir,
        "config.yaml",
        "version: \"1.0\"\ndefaults:\n  distribution: OVERWRITING\n",
    );

    let output = run(&[
        "merge",
        "--input",
        path_str(&path),
        "--config",
        path_str(&config),
    ]);
    assert!(!output.status.success());
    assert!(
        stderr(&output)
            .contains("Illegal merging strategy 'OVERWRITING' for 'DISTRIBUTION' option.")
    );
}

// ---------------------------------------------------------------------------
// explain
// ---------------------------------------------------------------------------

#[test]
fn explain_lists_effective_strategies() {
    let dir = TempDir::new().unwrap();
    let script = format!(
        "{BASE_SQL}CREATE TABLE t LIKE base (EXCLUDING PARTITIONS OVERWRITING OPTIONS);"
    );
    let path = write_file(&dir, "script.sql", &script);

    let output = run(&["explain", "--input", path_str(&path)]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.starts_with(
        "t: LIKE base (\n  EXCLUDING PARTITIONS\n  OVERWRITING OPTIONS\n)\n"
    ));
    assert!(text.contains("PARTITIONS    EXCLUDING (explicit)"));
    assert!(text.contains("OPTIONS       OVERWRITING (explicit)"));
    assert!(text.contains("CONSTRAINTS   INCLUDING (default)"));
}

#[test]
fn explain_excluding_all_marks_every_feature() {
    let dir = TempDir::new().unwrap();
    let script = format!("{BASE_SQL}CREATE TABLE t LIKE base (EXCLUDING ALL);");
    let path = write_file(&dir, "script.sql", &script);

    let output = run(&["explain", "--input", path_str(&path)]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("PARTITIONS    EXCLUDING (ALL)"));
    assert!(text.contains("OPTIONS       EXCLUDING (ALL)"));
    assert!(!text.contains("(default)"));
}

#[test]
fn explain_rejects_all_with_concrete_feature() {
    let dir = TempDir::new().unwrap();
    let script =
        format!("{BASE_SQL}CREATE TABLE t LIKE base (EXCLUDING ALL OVERWRITING OPTIONS);");
    let path = write_file(&dir, "script.sql", &script);

    let output = run(&["explain", "--input", path_str(&path)]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Each like option feature can be declared only once."));
}

#[test]
fn explain_without_like_clauses() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "script.sql", BASE_SQL);

    let output = run(&["explain", "--input", path_str(&path)]);
    assert!(output.status.success());
    assert!(stdout(&output).starts_with("No LIKE clauses in "));
}

// ---------------------------------------------------------------------------
// init-config
// ---------------------------------------------------------------------------

#[test]
fn init_config_writes_loadable_file() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("table-like.yaml");

    let output = run(&[
        "init-config",
        "--output",
        path_str(&config),
        "--format",
        "ddl",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).starts_with("Wrote config to "));
    let yaml = fs::read_to_string(&config).unwrap();
    assert!(yaml.contains("format: ddl"));

    let script = write_file(&dir, "script.sql", "CREATE TABLE t (a INT);");
    let output = run(&[
        "merge",
        "--input",
        path_str(&script),
        "--config",
        path_str(&config),
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "CREATE TABLE t (\n  a INT\n)\n");
}

#[test]
fn init_config_requires_force_to_replace() {
    let dir = TempDir::new().unwrap();
    let config = write_file(&dir, "table-like.yaml", "version: \"1.0\"\n");

    let output = run(&["init-config", "--output", path_str(&config)]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("already exists"));

    let output = run(&["init-config", "--output", path_str(&config), "--force"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(fs::read_to_string(&config).unwrap().contains("format: json"));
}
