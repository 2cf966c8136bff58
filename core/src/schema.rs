//! Table schema model shared by source tables, local declarations and merge
//! results.
//!
//! The types mirror the parts of a `CREATE TABLE` statement that a LIKE
//! clause can inherit: physical columns, computed columns, constraints,
//! distribution, watermarks, partition keys and connector options. They
//! round-trip through JSON and YAML via [`serde`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A physical column.
///
/// # Examples
///
/// ```
/// use table_like_core::ColumnDefinition;
///
/// let id = ColumnDefinition::new("id", "BIGINT").not_null();
/// assert!(!id.nullable);
/// assert_eq!(id.data_type, "BIGINT");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    /// Data type as written in the DDL (e.g. `DECIMAL(10, 2)`).
    pub data_type: String,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

fn default_nullable() -> bool {
    true
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
            comment: None,
        }
    }

    /// Marks the column `NOT NULL`.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// A computed column (`name AS expression`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedColumn {
    pub name: String,
    pub expression: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl GeneratedColumn {
    pub fn new(name: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expression: expression.into(),
            comment: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    PrimaryKey,
    Unique,
}

/// A table-level constraint.
///
/// # Examples
///
/// ```
/// use table_like_core::{ConstraintKind, TableConstraint};
///
/// let pk = TableConstraint::primary_key(["id"]).named("pk_orders");
/// assert_eq!(pk.kind, ConstraintKind::PrimaryKey);
/// assert_eq!(pk.name.as_deref(), Some("pk_orders"));
/// assert!(!pk.enforced);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConstraint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub kind: ConstraintKind,
    pub columns: Vec<String>,
    #[serde(default)]
    pub enforced: bool,
}

impl TableConstraint {
    /// Creates a `PRIMARY KEY (...) NOT ENFORCED` constraint.
    pub fn primary_key<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: None,
            kind: ConstraintKind::PrimaryKey,
            columns: columns.into_iter().map(Into::into).collect(),
            enforced: false,
        }
    }

    /// Creates a `UNIQUE (...) NOT ENFORCED` constraint.
    pub fn unique<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: ConstraintKind::Unique,
            ..Self::primary_key(columns)
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DistributionKind {
    Hash,
    Range,
    /// `DISTRIBUTED BY (...)` or `DISTRIBUTED INTO n BUCKETS` without an
    /// explicit algorithm.
    #[default]
    Unspecified,
}

/// `DISTRIBUTED BY` specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionSpec {
    #[serde(default)]
    pub kind: DistributionKind,
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buckets: Option<u32>,
}

impl DistributionSpec {
    pub fn hash<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: DistributionKind::Hash,
            keys: keys.into_iter().map(Into::into).collect(),
            buckets: None,
        }
    }

    pub fn with_buckets(mut self, buckets: u32) -> Self {
        self.buckets = Some(buckets);
        self
    }
}

/// `WATERMARK FOR rowtime_column AS expression`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatermarkSpec {
    pub rowtime_column: String,
    pub expression: String,
}

impl WatermarkSpec {
    pub fn new(rowtime_column: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            rowtime_column: rowtime_column.into(),
            expression: expression.into(),
        }
    }
}

/// A table schema: the source of a LIKE clause, the locally declared
/// fragment, or the merged result.
///
/// # Examples
///
/// ```
/// use table_like_core::{ColumnDefinition, TableSchema, WatermarkSpec};
///
/// let schema = TableSchema::new()
///     .with_column(ColumnDefinition::new("id", "BIGINT"))
///     .with_column(ColumnDefinition::new("ts", "TIMESTAMP(3)"))
///     .with_watermark(WatermarkSpec::new("ts", "ts - INTERVAL '5' SECOND"))
///     .with_option("connector", "kafka");
///
/// assert!(schema.find_column("ts").is_some());
/// assert_eq!(schema.column_names(), vec!["id", "ts"]);
/// assert_eq!(schema.options.get("connector").map(String::as_str), Some("kafka"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableSchema {
    #[serde(default)]
    pub columns: Vec<ColumnDefinition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub generated: Vec<GeneratedColumn>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<TableConstraint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution: Option<DistributionSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub watermarks: Vec<WatermarkSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub partition_keys: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,
}

impl TableSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_column(mut self, column: ColumnDefinition) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_generated(mut self, column: GeneratedColumn) -> Self {
        self.generated.push(column);
        self
    }

    pub fn with_constraint(mut self, constraint: TableConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn with_distribution(mut self, distribution: DistributionSpec) -> Self {
        self.distribution = Some(distribution);
        self
    }

    pub fn with_watermark(mut self, watermark: WatermarkSpec) -> Self {
        self.watermarks.push(watermark);
        self
    }

    pub fn with_partition_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.partition_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Finds a physical column by name.
    pub fn find_column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Finds a computed column by name.
    pub fn find_generated(&self, name: &str) -> Option<&GeneratedColumn> {
        self.generated.iter().find(|column| column.name == name)
    }

    /// Returns physical column names in declaration order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Returns the primary key constraint, if any.
    pub fn primary_key(&self) -> Option<&TableConstraint> {
        self.constraints
            .iter()
            .find(|c| c.kind == ConstraintKind::PrimaryKey)
    }

    /// Returns `true` if nothing at all is declared.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
