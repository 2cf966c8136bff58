//! Resolution engine for `CREATE TABLE ... LIKE <source> (<options>)`.
//!
//! This crate derives a new table schema from an existing one:
//!
//! - [`Feature`] and [`MergeStrategy`]: the closed vocabulary of a LIKE
//!   option list, with the legality relation [`is_legal`].
//! - [`LikeOption`]: one `(strategy, feature)` directive.
//! - [`LikeClause`]: the source table reference, the ordered directives and
//!   the locally declared [`TableSchema`] fragment.
//! - [`validate_like_options`]: rejects illegal pairings and features
//!   declared more than once.
//! - [`merge_tables`]: merges a resolved source schema with the local
//!   fragment, feature by feature.
//!
//! The crate does not parse SQL; a front-end builds the [`LikeClause`].
//! Every operation is a pure function of its inputs.
//!
//! # Example
//!
//! ```
//! use table_like_core::*;
//!
//! let source = TableSchema::new()
//!     .with_column(ColumnDefinition::new("id", "BIGINT").not_null())
//!     .with_constraint(TableConstraint::primary_key(["id"]))
//!     .with_option("connector", "kafka");
//!
//! let clause = LikeClause::new(
//!     ObjectIdentifier::new(["orders"]),
//!     vec![
//!         LikeOption::excluding(Feature::Constraints),
//!         LikeOption::overwriting(Feature::Options),
//!     ],
//!     TableSchema::new()
//!         .with_column(ColumnDefinition::new("note", "STRING"))
//!         .with_option("connector", "filesystem"),
//! )
//! .unwrap();
//!
//! clause.validate().unwrap();
//! let merged = clause.merge(&source).unwrap();
//!
//! assert_eq!(merged.column_names(), vec!["id", "note"]);
//! assert!(merged.primary_key().is_none());
//! assert_eq!(merged.options["connector"], "filesystem");
//! ```

mod clause;
mod feature;
mod merge;
mod schema;
mod validate;

pub use clause::{ClauseError, LikeClause, ObjectIdentifier};
pub use feature::{Feature, KeywordError, LikeOption, MergeStrategy, is_legal};
pub use merge::{
    MergeDefaults, MergeError, ResolvedStrategies, merge_tables, merge_tables_with_defaults,
    resolve_strategies,
};
pub use schema::*;
pub use validate::{ValidationError, validate_like_options};
