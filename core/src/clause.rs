//! The LIKE clause descriptor handed over by the DDL front-end.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::merge::{MergeError, merge_tables};
use crate::validate::{ValidationError, validate_like_options};
use crate::{LikeOption, TableSchema};

/// Structural errors rejected when building a [`LikeClause`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClauseError {
    /// The source table identifier has no name parts.
    #[error("source table identifier cannot be empty")]
    EmptyIdentifier,
    /// A part of the source table identifier is empty or whitespace-only.
    #[error("source table identifier contains a blank name part: {0}")]
    BlankIdentifierPart(String),
}

/// A possibly qualified object name such as `catalog.db.table`.
///
/// # Examples
///
/// ```
/// use table_like_core::ObjectIdentifier;
///
/// let name = ObjectIdentifier::new(["db", "orders"]);
/// assert_eq!(name.object_name(), Some("orders"));
/// assert_eq!(name.to_string(), "db.orders");
///
/// let quoted = ObjectIdentifier::new(["my table"]);
/// assert_eq!(quoted.to_string(), "`my table`");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectIdentifier {
    names: Vec<String>,
}

impl ObjectIdentifier {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the name parts in order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Returns the last name part (the unqualified object name).
    pub fn object_name(&self) -> Option<&str> {
        self.names.last().map(String::as_str)
    }

    /// Dot-joined form without quoting, used as a lookup key.
    pub fn key(&self) -> String {
        self.names.join(".")
    }

    fn check(&self) -> Result<(), ClauseError> {
        if self.names.is_empty() {
            return Err(ClauseError::EmptyIdentifier);
        }
        if let Some(blank) = self.names.iter().find(|n| n.trim().is_empty()) {
            return Err(ClauseError::BlankIdentifierPart(format!("{blank:?}")));
        }
        Ok(())
    }
}

impl fmt::Display for ObjectIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, name) in self.names.iter().enumerate() {
            if idx > 0 {
                f.write_str(".")?;
            }
            if is_plain_identifier(name) {
                f.write_str(name)?;
            } else {
                write!(f, "`{}`", name.replace('`', "``"))?;
            }
        }
        Ok(())
    }
}

fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// `LIKE <source> [(<options>)]` together with the schema fragment declared
/// in the body of the new table.
///
/// The clause is immutable once built. [`LikeClause::merge`] consumes it,
/// so a clause is resolved at most once.
///
/// # Examples
///
/// ```
/// use table_like_core::*;
///
/// let clause = LikeClause::new(
///     ObjectIdentifier::new(["b"]),
///     vec![
///         LikeOption::excluding(Feature::All),
///     ],
///     TableSchema::new().with_column(ColumnDefinition::new("a", "STRING")),
/// )
/// .unwrap();
///
/// assert!(clause.validate().is_ok());
/// assert_eq!(clause.to_string(), "LIKE b (\n  EXCLUDING ALL\n)");
///
/// let source = TableSchema::new()
///     .with_column(ColumnDefinition::new("id", "BIGINT"))
///     .with_option("connector", "kafka");
/// let merged = clause.merge(&source).unwrap();
/// assert_eq!(merged.column_names(), vec!["id", "a"]);
/// assert!(merged.options.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeClause {
    source_table: ObjectIdentifier,
    #[serde(default)]
    options: Vec<LikeOption>,
    #[serde(default)]
    local: TableSchema,
}

impl LikeClause {
    /// Builds a clause descriptor.
    ///
    /// Only the structure is checked here; directive legality and
    /// uniqueness are checked by [`LikeClause::validate`].
    ///
    /// # Errors
    ///
    /// Returns [`ClauseError`] if the source identifier is empty or has a
    /// blank name part.
    pub fn new(
        source_table: ObjectIdentifier,
        options: Vec<LikeOption>,
        local: TableSchema,
    ) -> Result<Self, ClauseError> {
        source_table.check()?;
        Ok(Self {
            source_table,
            options,
            local,
        })
    }

    pub fn source_table(&self) -> &ObjectIdentifier {
        &self.source_table
    }

    /// Directives in declaration order; empty when the clause declared no
    /// option list.
    pub fn options(&self) -> &[LikeOption] {
        &self.options
    }

    /// The schema fragment declared in the body of the new table.
    pub fn local(&self) -> &TableSchema {
        &self.local
    }

    /// Checks the directive list; see [`validate_like_options`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_like_options(&self.options)
    }

    /// Merges this clause against the resolved source schema using the
    /// default strategies.
    pub fn merge(self, source: &TableSchema) -> Result<TableSchema, MergeError> {
        merge_tables(source, &self.local, &self.options)
    }
}

impl fmt::Display for LikeClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LIKE {}", self.source_table)?;
        if !self.options.is_empty() {
            f.write_str(" (")?;
            for option in &self.options {
                write!(f, "\n  {option}")?;
            }
            f.write_str("\n)")?;
        }
        Ok(())
    }
}
