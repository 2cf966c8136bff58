//! LIKE option validation.
//!
//! Checks an ordered directive list for illegal strategy/feature pairings
//! and for features declared more than once, before any merge work starts.
//! The check depends only on the directives, never on the source table.
//!
//! # Examples
//!
//! ```
//! use table_like_core::*;
//!
//! let options = [
//!     LikeOption::excluding(Feature::Partitions),
//!     LikeOption::overwriting(Feature::Options),
//! ];
//! assert!(validate_like_options(&options).is_ok());
//!
//! // OVERWRITING has no field-level meaning for partitions
//! let bad = [LikeOption::overwriting(Feature::Partitions)];
//! assert_eq!(
//!     validate_like_options(&bad).unwrap_err().to_string(),
//!     "Illegal merging strategy 'OVERWRITING' for 'PARTITIONS' option."
//! );
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::{Feature, LikeOption, MergeStrategy, is_legal};

/// LIKE option validation errors.
///
/// The `Display` impl produces the user-facing diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The strategy cannot be applied to the feature.
    #[error("Illegal merging strategy '{strategy}' for '{feature}' option.")]
    IllegalMerge {
        strategy: MergeStrategy,
        feature: Feature,
    },
    /// The feature (directly or through `ALL`) was already declared.
    #[error("Each like option feature can be declared only once.")]
    DuplicateFeature { feature: Feature },
}

/// Validates a LIKE option list.
///
/// Directives are checked left to right and the first failure is returned.
/// For each directive, legality is checked before uniqueness. `ALL` counts
/// as a declaration of every concrete feature, so it cannot be combined
/// with any other directive.
///
/// An empty list is valid: it is what a clause without an option list
/// carries.
///
/// # Examples
///
/// ```
/// use table_like_core::*;
///
/// let options = [
///     LikeOption::excluding(Feature::All),
///     LikeOption::including(Feature::Generated),
/// ];
/// let err = validate_like_options(&options).unwrap_err();
/// assert_eq!(err, ValidationError::DuplicateFeature { feature: Feature::Generated });
/// ```
pub fn validate_like_options(options: &[LikeOption]) -> Result<(), ValidationError> {
    let mut seen: HashSet<Feature> = HashSet::new();

    for option in options {
        if !is_legal(option.strategy, option.feature) {
            return Err(ValidationError::IllegalMerge {
                strategy: option.strategy,
                feature: option.feature,
            });
        }

        let covered = option.feature.expand();
        if covered.iter().any(|feature| seen.contains(feature)) {
            return Err(ValidationError::DuplicateFeature {
                feature: option.feature,
            });
        }
        seen.extend(covered.iter().copied());
    }

    Ok(())
}
