//! Output formatting for resolved tables and LIKE explanations.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use table_like_core::{
    ConstraintKind, DistributionKind, LikeClause, ObjectIdentifier, ResolvedStrategies,
    TableSchema,
};

use crate::parser::is_reserved_word;

static PLAIN_IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static regex must compile")
});

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    /// A `CREATE TABLE` statement.
    Ddl,
}

#[derive(Serialize)]
struct NamedTable<'a> {
    name: &'a ObjectIdentifier,
    #[serde(flatten)]
    schema: &'a TableSchema,
}

/// Formats a table schema in the requested output format.
///
/// # Examples
///
/// ```
/// use table_like_core::{ColumnDefinition, ObjectIdentifier, TableSchema};
/// use table_like_parser::output::{OutputFormat, format_table};
///
/// let schema = TableSchema::new()
///     .with_column(ColumnDefinition::new("id", "BIGINT").not_null())
///     .with_option("connector", "kafka");
/// let ddl = format_table(&ObjectIdentifier::new(["orders"]), &schema, OutputFormat::Ddl).unwrap();
///
/// assert_eq!(
///     ddl,
///     "CREATE TABLE orders (\n  id BIGINT NOT NULL\n)\nWITH (\n  'connector' = 'kafka'\n)\n"
/// );
/// ```
pub fn format_table(
    name: &ObjectIdentifier,
    schema: &TableSchema,
    format: OutputFormat,
) -> Result<String, String> {
    let table = NamedTable { name, schema };
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(&table)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(&table).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Ddl => Ok(table_to_ddl(name, schema)),
    }
}

/// Describes a LIKE clause and the strategy each feature resolves to.
pub fn explain_like(
    table: &ObjectIdentifier,
    clause: &LikeClause,
    strategies: &ResolvedStrategies,
) -> String {
    let mut out = String::new();

    out.push_str(&format!("{table}: {clause}\n"));
    let width = strategies
        .iter()
        .map(|(feature, _)| feature.keyword().len())
        .max()
        .unwrap_or(0);
    for (feature, strategy) in strategies.iter() {
        let source = if clause.options().iter().any(|o| o.feature == feature) {
            "explicit"
        } else if clause.options().iter().any(|o| o.feature.is_wildcard()) {
            "ALL"
        } else {
            "default"
        };
        out.push_str(&format!(
            "  {:<width$}  {strategy} ({source})\n",
            feature.keyword()
        ));
    }

    out
}

/// Quotes an identifier with backticks unless it is plain and unreserved.
pub fn quote_identifier(name: &str) -> String {
    if PLAIN_IDENTIFIER.is_match(name) && !is_reserved_word(name) {
        name.to_string()
    } else {
        format!("`{}`", name.replace('`', "``"))
    }
}

fn quote_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn column_list(columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| quote_identifier(c))
        .collect::<Vec<_>>()
        .join(", ")
}

fn table_to_ddl(name: &ObjectIdentifier, schema: &TableSchema) -> String {
    let mut elements = Vec::new();

    for column in &schema.columns {
        let mut line = format!("{} {}", quote_identifier(&column.name), column.data_type);
        if !column.nullable {
            line.push_str(" NOT NULL");
        }
        if let Some(ref comment) = column.comment {
            line.push_str(&format!(" COMMENT {}", quote_string(comment)));
        }
        elements.push(line);
    }
    for column in &schema.generated {
        let mut line = format!("{} AS {}", quote_identifier(&column.name), column.expression);
        if let Some(ref comment) = column.comment {
            line.push_str(&format!(" COMMENT {}", quote_string(comment)));
        }
        elements.push(line);
    }
    for watermark in &schema.watermarks {
        elements.push(format!(
            "WATERMARK FOR {} AS {}",
            quote_identifier(&watermark.rowtime_column),
            watermark.expression
        ));
    }
    for constraint in &schema.constraints {
        let mut line = String::new();
        if let Some(ref name) = constraint.name {
            line.push_str(&format!("CONSTRAINT {} ", quote_identifier(name)));
        }
        let kind = match constraint.kind {
            ConstraintKind::PrimaryKey => "PRIMARY KEY",
            ConstraintKind::Unique => "UNIQUE",
        };
        line.push_str(&format!("{kind} ({})", column_list(&constraint.columns)));
        line.push_str(if constraint.enforced {
            " ENFORCED"
        } else {
            " NOT ENFORCED"
        });
        elements.push(line);
    }

    let qualified = name
        .names()
        .iter()
        .map(|part| quote_identifier(part))
        .collect::<Vec<_>>()
        .join(".");
    let mut out = format!("CREATE TABLE {qualified}");
    if !elements.is_empty() {
        out.push_str(" (\n");
        out.push_str(
            &elements
                .iter()
                .map(|e| format!("  {e}"))
                .collect::<Vec<_>>()
                .join(",\n"),
        );
        out.push_str("\n)");
    }
    out.push('\n');

    if let Some(ref distribution) = schema.distribution {
        out.push_str("DISTRIBUTED");
        if !distribution.keys.is_empty() {
            out.push_str(" BY ");
            match distribution.kind {
                DistributionKind::Hash => out.push_str("HASH"),
                DistributionKind::Range => out.push_str("RANGE"),
                DistributionKind::Unspecified => {}
            }
            out.push_str(&format!("({})", column_list(&distribution.keys)));
        }
        if let Some(buckets) = distribution.buckets {
            out.push_str(&format!(" INTO {buckets} BUCKETS"));
        }
        out.push('\n');
    }

    if !schema.partition_keys.is_empty() {
        out.push_str(&format!(
            "PARTITIONED BY ({})\n",
            column_list(&schema.partition_keys)
        ));
    }

    if !schema.options.is_empty() {
        out.push_str("WITH (\n");
        let options = schema
            .options
            .iter()
            .map(|(k, v)| format!("  {} = {}", quote_string(k), quote_string(v)))
            .collect::<Vec<_>>();
        out.push_str(&options.join(",\n"));
        out.push_str("\n)\n");
    }

    out
}
