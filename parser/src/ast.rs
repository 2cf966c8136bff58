//! Parsed statement model.

use serde::{Deserialize, Serialize};
use table_like_core::{LikeClause, ObjectIdentifier, TableSchema, ValidationError};

/// Body of a `CREATE TABLE` statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableBody {
    /// A table declared without a LIKE clause.
    Plain(TableSchema),
    /// A table derived from another one; the clause owns the local fragment.
    Like(LikeClause),
}

/// A parsed `CREATE TABLE` statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTableStatement {
    pub name: ObjectIdentifier,
    pub if_not_exists: bool,
    pub body: TableBody,
}

impl CreateTableStatement {
    /// The schema declared in the statement itself.
    pub fn local_schema(&self) -> &TableSchema {
        match &self.body {
            TableBody::Plain(schema) => schema,
            TableBody::Like(clause) => clause.local(),
        }
    }

    pub fn like_clause(&self) -> Option<&LikeClause> {
        match &self.body {
            TableBody::Plain(_) => None,
            TableBody::Like(clause) => Some(clause),
        }
    }

    /// Validates the LIKE options, if the statement has a LIKE clause.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.like_clause().map_or(Ok(()), LikeClause::validate)
    }
}
