//! DDL front-end for `CREATE TABLE ... LIKE` statements.
//!
//! This crate turns SQL text into the descriptors consumed by
//! `table_like_core`:
//!
//! - [`parse_statement`] / [`parse_script`]: tokenize and parse
//!   `CREATE TABLE` statements into [`CreateTableStatement`]s.
//! - [`resolve::TableRegistry`]: apply statements in order, resolving LIKE
//!   sources and merging schemas.
//! - [`output::format_table`]: render a schema as JSON, YAML or DDL.
//!
//! # Example
//!
//! ```
//! use table_like_parser::parse_statement;
//!
//! let sql = "\
//! CREATE TABLE derived (
//!   note STRING
//! )
//! WITH ('connector' = 'filesystem')
//! LIKE base (
//!   EXCLUDING PARTITIONS
//!   OVERWRITING OPTIONS
//! )";
//!
//! let statement = parse_statement(sql).unwrap();
//! let clause = statement.like_clause().unwrap();
//! assert_eq!(clause.source_table().to_string(), "base");
//! assert_eq!(clause.options().len(), 2);
//! assert_eq!(clause.local().column_names(), vec!["note"]);
//! assert!(statement.validate().is_ok());
//! ```
//!
//! Syntax errors carry the offending token and what the grammar expected:
//!
//! ```
//! use table_like_parser::parse_statement;
//!
//! let err = parse_statement("CREATE TABLE t (a STRING) LIKE b ()").unwrap_err();
//! assert_eq!(
//!     err.to_string(),
//!     "Encountered \")\" at line 1, column 35.\nWas expecting one of:\n    \
//!      \"EXCLUDING\" ...\n    \"INCLUDING\" ...\n    \"OVERWRITING\" ..."
//! );
//! ```

pub mod ast;
mod error;
pub mod lexer;
pub mod output;
pub mod parser;
pub mod resolve;

pub use ast::{CreateTableStatement, TableBody};
pub use error::ParseError;
pub use parser::{parse_script, parse_statement};
