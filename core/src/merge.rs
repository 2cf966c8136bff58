//! Schema merging for LIKE clauses.
//!
//! [`merge_tables`] combines the schema of the source table with the
//! fragment declared in the body of the new table. Each [`Feature`] is
//! resolved independently under its effective [`MergeStrategy`]: the
//! directive naming it, else the `ALL` directive, else the configured
//! [`MergeDefaults`].
//!
//! # Example
//!
//! ```
//! use table_like_core::*;
//!
//! let source = TableSchema::new()
//!     .with_column(ColumnDefinition::new("id", "BIGINT"))
//!     .with_partition_keys(["id"])
//!     .with_option("connector", "kafka")
//!     .with_option("topic", "orders");
//!
//! let local = TableSchema::new()
//!     .with_column(ColumnDefinition::new("note", "STRING"))
//!     .with_option("topic", "orders_copy");
//!
//! let merged = merge_tables(
//!     &source,
//!     &local,
//!     &[
//!         LikeOption::excluding(Feature::Partitions),
//!         LikeOption::overwriting(Feature::Options),
//!     ],
//! )
//! .unwrap();
//!
//! assert_eq!(merged.column_names(), vec!["id", "note"]);
//! assert!(merged.partition_keys.is_empty());
//! assert_eq!(merged.options["topic"], "orders_copy");
//! assert_eq!(merged.options["connector"], "kafka");
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::validate::{ValidationError, validate_like_options};
use crate::{ColumnDefinition, Feature, LikeOption, MergeStrategy, TableSchema};

/// Errors produced while merging a LIKE clause.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    /// The option list or the configured defaults failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// A column name is declared by both sides of the merge.
    #[error(
        "A column named '{column}' already exists in the base table. \
         Column names must be unique across the source and derived tables."
    )]
    ColumnConflict { column: String },
}

/// Strategy applied to each concrete feature when no directive names it.
///
/// Every field defaults to `INCLUDING`, so a clause without options copies
/// every feature of the source table.
///
/// # Examples
///
/// ```
/// use table_like_core::{Feature, MergeDefaults, MergeStrategy};
///
/// let defaults = MergeDefaults::default().with(Feature::Options, MergeStrategy::Overwriting);
/// assert_eq!(defaults.get(Feature::Options), Some(MergeStrategy::Overwriting));
/// assert_eq!(defaults.get(Feature::Partitions), Some(MergeStrategy::Including));
/// assert_eq!(defaults.get(Feature::All), None);
/// assert!(defaults.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MergeDefaults {
    pub partitions: MergeStrategy,
    pub constraints: MergeStrategy,
    pub distribution: MergeStrategy,
    pub watermarks: MergeStrategy,
    pub generated: MergeStrategy,
    pub options: MergeStrategy,
}

impl MergeDefaults {
    /// Returns the default for a concrete feature; `None` for `ALL`.
    pub fn get(&self, feature: Feature) -> Option<MergeStrategy> {
        match feature {
            Feature::Partitions => Some(self.partitions),
            Feature::Constraints => Some(self.constraints),
            Feature::Distribution => Some(self.distribution),
            Feature::Watermarks => Some(self.watermarks),
            Feature::Generated => Some(self.generated),
            Feature::Options => Some(self.options),
            Feature::All => None,
        }
    }

    /// Sets the default for `feature`. Setting `ALL` sets every feature.
    pub fn with(mut self, feature: Feature, strategy: MergeStrategy) -> Self {
        for concrete in feature.expand() {
            let slot = match concrete {
                Feature::Partitions => &mut self.partitions,
                Feature::Constraints => &mut self.constraints,
                Feature::Distribution => &mut self.distribution,
                Feature::Watermarks => &mut self.watermarks,
                Feature::Generated => &mut self.generated,
                Feature::Options => &mut self.options,
                Feature::All => continue,
            };
            *slot = strategy;
        }
        self
    }

    /// Rejects defaults that pair a feature with an illegal strategy.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for feature in Feature::CONCRETE {
            let strategy = self.get(feature).unwrap_or_default();
            if !strategy.is_legal_for(feature) {
                return Err(ValidationError::IllegalMerge { strategy, feature });
            }
        }
        Ok(())
    }
}

/// Effective strategy for every concrete feature of one merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedStrategies {
    entries: [(Feature, MergeStrategy); 6],
}

impl ResolvedStrategies {
    /// Returns the strategy for a concrete feature. `ALL` is not resolved
    /// on its own and reports `INCLUDING`.
    pub fn get(&self, feature: Feature) -> MergeStrategy {
        self.entries
            .iter()
            .find(|(f, _)| *f == feature)
            .map(|(_, strategy)| *strategy)
            .unwrap_or_default()
    }

    /// Iterates `(feature, strategy)` pairs in [`Feature::CONCRETE`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Feature, MergeStrategy)> + '_ {
        self.entries.iter().copied()
    }
}

/// Computes the effective strategy of every concrete feature.
///
/// A directive naming the feature wins over an `ALL` directive, which wins
/// over `defaults`. The options are not validated here.
///
/// # Examples
///
/// ```
/// use table_like_core::*;
///
/// let strategies = resolve_strategies(
///     &[LikeOption::excluding(Feature::All)],
///     &MergeDefaults::default(),
/// );
/// assert!(strategies.iter().all(|(_, s)| s == MergeStrategy::Excluding));
/// ```
pub fn resolve_strategies(options: &[LikeOption], defaults: &MergeDefaults) -> ResolvedStrategies {
    let wildcard = options
        .iter()
        .find(|option| option.feature.is_wildcard())
        .map(|option| option.strategy);

    let entries = Feature::CONCRETE.map(|feature| {
        let explicit = options
            .iter()
            .find(|option| option.feature == feature)
            .map(|option| option.strategy);
        let strategy = explicit
            .or(wildcard)
            .or_else(|| defaults.get(feature))
            .unwrap_or_default();
        (feature, strategy)
    });

    ResolvedStrategies { entries }
}

/// Merges `local` onto `source` under `options` with default strategies.
///
/// See [`merge_tables_with_defaults`].
pub fn merge_tables(
    source: &TableSchema,
    local: &TableSchema,
    options: &[LikeOption],
) -> Result<TableSchema, MergeError> {
    merge_tables_with_defaults(source, local, options, &MergeDefaults::default())
}

/// Merges `local` onto `source` under `options`, falling back to
/// `defaults` for features no directive names.
///
/// The option list and the defaults are validated first, so a failure never
/// leaves a partially merged schema. Physical columns are always the source
/// columns in order followed by the local columns; a name present on both
/// sides is a [`MergeError::ColumnConflict`].
///
/// # Errors
///
/// Returns [`MergeError::Validation`] for an invalid option list or invalid
/// defaults, and [`MergeError::ColumnConflict`] when a column name is
/// declared twice.
pub fn merge_tables_with_defaults(
    source: &TableSchema,
    local: &TableSchema,
    options: &[LikeOption],
    defaults: &MergeDefaults,
) -> Result<TableSchema, MergeError> {
    validate_like_options(options)?;
    defaults.validate()?;

    let strategies = resolve_strategies(options, defaults);
    debug!(strategies = ?strategies.entries, "Resolved like option strategies");

    let columns = merge_columns(&source.columns, &local.columns)?;

    let partitions = strategies.get(Feature::Partitions);
    report_discarded(Feature::Partitions, partitions, !local.partition_keys.is_empty());
    let partition_keys = match partitions {
        MergeStrategy::Including => source.partition_keys.clone(),
        MergeStrategy::Excluding => Vec::new(),
        // rejected by validation
        MergeStrategy::Overwriting => local.partition_keys.clone(),
    };

    let constraints_strategy = strategies.get(Feature::Constraints);
    report_discarded(
        Feature::Constraints,
        constraints_strategy,
        !local.constraints.is_empty(),
    );
    let constraints = match constraints_strategy {
        MergeStrategy::Including => source.constraints.clone(),
        MergeStrategy::Excluding => Vec::new(),
        MergeStrategy::Overwriting => local.constraints.clone(),
    };

    let distribution_strategy = strategies.get(Feature::Distribution);
    report_discarded(
        Feature::Distribution,
        distribution_strategy,
        local.distribution.is_some(),
    );
    let distribution = match distribution_strategy {
        MergeStrategy::Including => source.distribution.clone(),
        MergeStrategy::Excluding => None,
        MergeStrategy::Overwriting => local.distribution.clone(),
    };

    let watermarks_strategy = strategies.get(Feature::Watermarks);
    report_discarded(
        Feature::Watermarks,
        watermarks_strategy,
        !local.watermarks.is_empty(),
    );
    let watermarks = match watermarks_strategy {
        MergeStrategy::Including => source.watermarks.clone(),
        MergeStrategy::Excluding => Vec::new(),
        MergeStrategy::Overwriting => overlay_by_key(&source.watermarks, &local.watermarks, |w| {
            w.rowtime_column.as_str()
        }),
    };

    let generated_strategy = strategies.get(Feature::Generated);
    report_discarded(
        Feature::Generated,
        generated_strategy,
        !local.generated.is_empty(),
    );
    let generated = match generated_strategy {
        MergeStrategy::Including => source.generated.clone(),
        MergeStrategy::Excluding => Vec::new(),
        MergeStrategy::Overwriting => {
            overlay_by_key(&source.generated, &local.generated, |g| g.name.as_str())
        }
    };

    let physical: HashSet<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    if let Some(clash) = generated.iter().find(|g| physical.contains(g.name.as_str())) {
        return Err(MergeError::ColumnConflict {
            column: clash.name.clone(),
        });
    }

    let options_strategy = strategies.get(Feature::Options);
    report_discarded(Feature::Options, options_strategy, !local.options.is_empty());
    let table_options = match options_strategy {
        MergeStrategy::Including => source.options.clone(),
        MergeStrategy::Excluding => Default::default(),
        MergeStrategy::Overwriting => {
            let mut merged = source.options.clone();
            merged.extend(local.options.iter().map(|(k, v)| (k.clone(), v.clone())));
            merged
        }
    };

    Ok(TableSchema {
        columns,
        generated,
        constraints,
        distribution,
        watermarks,
        partition_keys,
        options: table_options,
    })
}

fn merge_columns(
    source: &[ColumnDefinition],
    local: &[ColumnDefinition],
) -> Result<Vec<ColumnDefinition>, MergeError> {
    let names: HashSet<&str> = source.iter().map(|c| c.name.as_str()).collect();
    let mut merged = source.to_vec();

    for column in local {
        if names.contains(column.name.as_str()) {
            return Err(MergeError::ColumnConflict {
                column: column.name.clone(),
            });
        }
        merged.push(column.clone());
    }

    Ok(merged)
}

/// Source entries in order with same-key local entries replacing them in
/// place, followed by local-only entries.
fn overlay_by_key<T, F>(source: &[T], local: &[T], key: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> &str,
{
    let mut merged: Vec<T> = source.to_vec();
    for entry in local {
        match merged.iter_mut().find(|existing| key(existing) == key(entry)) {
            Some(existing) => *existing = entry.clone(),
            None => merged.push(entry.clone()),
        }
    }
    merged
}

fn report_discarded(feature: Feature, strategy: MergeStrategy, declared_locally: bool) {
    if !declared_locally {
        return;
    }
    match strategy {
        MergeStrategy::Including => {
            warn!(%feature, "Local declaration replaced by the source table under INCLUDING");
        }
        MergeStrategy::Excluding => {
            debug!(%feature, "Local declaration dropped under EXCLUDING");
        }
        MergeStrategy::Overwriting => {}
    }
}
