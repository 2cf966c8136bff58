//! Mergeable table features and the strategies that combine them.
//!
//! A LIKE clause carries an ordered list of [`LikeOption`] directives, each
//! pairing a [`MergeStrategy`] with a [`Feature`]. Not every pairing is
//! meaningful: structural features such as partitioning can only be copied
//! or dropped wholesale, so [`is_legal`] rejects `OVERWRITING` for them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A mergeable facet of a table schema.
///
/// `All` is a wildcard standing for every concrete feature that is not
/// otherwise mentioned. Use [`Feature::expand`] to turn a feature into the
/// concrete features it covers.
///
/// # Examples
///
/// ```
/// use table_like_core::Feature;
///
/// assert_eq!(Feature::Options.to_string(), "OPTIONS");
/// assert_eq!("watermarks".parse::<Feature>().unwrap(), Feature::Watermarks);
/// assert_eq!(Feature::All.expand().len(), 6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Feature {
    /// `PARTITIONED BY` keys.
    Partitions,
    /// Primary key and unique constraints.
    Constraints,
    /// `DISTRIBUTED BY` specification.
    Distribution,
    /// Watermark definitions.
    Watermarks,
    /// Computed (generated) columns.
    Generated,
    /// Connector options from the `WITH` clause.
    Options,
    /// Every concrete feature. Cannot be combined with a concrete feature
    /// in the same option list.
    All,
}

impl Feature {
    /// The concrete features, in declaration order.
    pub const CONCRETE: [Feature; 6] = [
        Feature::Partitions,
        Feature::Constraints,
        Feature::Distribution,
        Feature::Watermarks,
        Feature::Generated,
        Feature::Options,
    ];

    /// Returns the concrete features this feature covers.
    ///
    /// A concrete feature covers only itself; `All` covers every concrete
    /// feature.
    pub fn expand(self) -> &'static [Feature] {
        match self {
            Feature::All => &Self::CONCRETE,
            Feature::Partitions => &[Feature::Partitions],
            Feature::Constraints => &[Feature::Constraints],
            Feature::Distribution => &[Feature::Distribution],
            Feature::Watermarks => &[Feature::Watermarks],
            Feature::Generated => &[Feature::Generated],
            Feature::Options => &[Feature::Options],
        }
    }

    /// Returns the upper-case SQL keyword for this feature.
    pub fn keyword(self) -> &'static str {
        match self {
            Feature::Partitions => "PARTITIONS",
            Feature::Constraints => "CONSTRAINTS",
            Feature::Distribution => "DISTRIBUTION",
            Feature::Watermarks => "WATERMARKS",
            Feature::Generated => "GENERATED",
            Feature::Options => "OPTIONS",
            Feature::All => "ALL",
        }
    }

    /// Returns `true` for the `ALL` wildcard.
    pub fn is_wildcard(self) -> bool {
        self == Feature::All
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for Feature {
    type Err = KeywordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let all = Feature::CONCRETE.iter().copied().chain([Feature::All]);
        for feature in all {
            if feature.keyword().eq_ignore_ascii_case(s) {
                return Ok(feature);
            }
        }
        Err(KeywordError::UnknownFeature(s.to_string()))
    }
}

/// Policy governing how a feature is combined between the source table and
/// the local declaration.
///
/// # Examples
///
/// ```
/// use table_like_core::{Feature, MergeStrategy};
///
/// assert_eq!("Overwriting".parse::<MergeStrategy>().unwrap(), MergeStrategy::Overwriting);
/// assert!(MergeStrategy::Overwriting.is_legal_for(Feature::Options));
/// assert!(!MergeStrategy::Overwriting.is_legal_for(Feature::Partitions));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum MergeStrategy {
    /// Copy the feature from the source; drop the local declaration.
    #[default]
    Including,
    /// Drop the feature from both source and local declaration.
    Excluding,
    /// Start from the source and overlay the local declaration entry by entry.
    Overwriting,
}

impl MergeStrategy {
    /// All strategies, in keyword order used by diagnostics.
    pub const ALL: [MergeStrategy; 3] = [
        MergeStrategy::Excluding,
        MergeStrategy::Including,
        MergeStrategy::Overwriting,
    ];

    /// Returns the upper-case SQL keyword for this strategy.
    pub fn keyword(self) -> &'static str {
        match self {
            MergeStrategy::Including => "INCLUDING",
            MergeStrategy::Excluding => "EXCLUDING",
            MergeStrategy::Overwriting => "OVERWRITING",
        }
    }

    /// Shorthand for [`is_legal`]`(self, feature)`.
    pub fn is_legal_for(self, feature: Feature) -> bool {
        is_legal(self, feature)
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for MergeStrategy {
    type Err = KeywordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MergeStrategy::ALL
            .into_iter()
            .find(|strategy| strategy.keyword().eq_ignore_ascii_case(s))
            .ok_or_else(|| KeywordError::UnknownStrategy(s.to_string()))
    }
}

/// Returns `true` if `strategy` may be applied to `feature`.
///
/// `OVERWRITING` has no field-level meaning for partitions, distribution,
/// constraints or the `ALL` wildcard; every other pairing is legal.
///
/// # Examples
///
/// ```
/// use table_like_core::{Feature, MergeStrategy, is_legal};
///
/// assert!(is_legal(MergeStrategy::Excluding, Feature::All));
/// assert!(is_legal(MergeStrategy::Overwriting, Feature::Generated));
/// assert!(!is_legal(MergeStrategy::Overwriting, Feature::All));
/// ```
pub fn is_legal(strategy: MergeStrategy, feature: Feature) -> bool {
    match (strategy, feature) {
        (MergeStrategy::Including | MergeStrategy::Excluding, _) => true,
        (
            MergeStrategy::Overwriting,
            Feature::Watermarks | Feature::Generated | Feature::Options,
        ) => true,
        (
            MergeStrategy::Overwriting,
            Feature::Partitions | Feature::Distribution | Feature::Constraints | Feature::All,
        ) => false,
    }
}

/// A single `(strategy, feature)` directive of a LIKE clause.
///
/// # Examples
///
/// ```
/// use table_like_core::{Feature, LikeOption, MergeStrategy};
///
/// let option = LikeOption::new(MergeStrategy::Excluding, Feature::Partitions);
/// assert_eq!(option.to_string(), "EXCLUDING PARTITIONS");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LikeOption {
    pub strategy: MergeStrategy,
    pub feature: Feature,
}

impl LikeOption {
    pub fn new(strategy: MergeStrategy, feature: Feature) -> Self {
        Self { strategy, feature }
    }

    pub fn including(feature: Feature) -> Self {
        Self::new(MergeStrategy::Including, feature)
    }

    pub fn excluding(feature: Feature) -> Self {
        Self::new(MergeStrategy::Excluding, feature)
    }

    pub fn overwriting(feature: Feature) -> Self {
        Self::new(MergeStrategy::Overwriting, feature)
    }
}

impl fmt::Display for LikeOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.strategy, self.feature)
    }
}

/// Unknown keyword passed to a [`FromStr`] impl in this module.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeywordError {
    #[error("unknown like option feature: {0}")]
    UnknownFeature(String),
    #[error("unknown merging strategy: {0}")]
    UnknownStrategy(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overwriting_only_legal_for_keyed_features() {
        let legal: Vec<Feature> = Feature::CONCRETE
            .into_iter()
            .chain([Feature::All])
            .filter(|f| is_legal(MergeStrategy::Overwriting, *f))
            .collect();
        assert_eq!(
            legal,
            vec![Feature::Watermarks, Feature::Generated, Feature::Options]
        );
    }

    #[test]
    fn test_including_and_excluding_legal_everywhere() {
        for feature in Feature::CONCRETE.into_iter().chain([Feature::All]) {
            assert!(is_legal(MergeStrategy::Including, feature));
            assert!(is_legal(MergeStrategy::Excluding, feature));
        }
    }

    #[test]
    fn test_keywords_parse_case_insensitively() {
        assert_eq!("including".parse::<MergeStrategy>(), Ok(MergeStrategy::Including));
        assert_eq!("EXCLUDING".parse::<MergeStrategy>(), Ok(MergeStrategy::Excluding));
        assert_eq!("all".parse::<Feature>(), Ok(Feature::All));
        assert_eq!("Distribution".parse::<Feature>(), Ok(Feature::Distribution));
        assert_eq!(
            "METADATA".parse::<Feature>(),
            Err(KeywordError::UnknownFeature("METADATA".to_string()))
        );
        assert_eq!(
            "MERGING".parse::<MergeStrategy>(),
            Err(KeywordError::UnknownStrategy("MERGING".to_string()))
        );
    }

    #[test]
    fn test_expand_wildcard_covers_every_concrete_feature() {
        assert_eq!(Feature::All.expand(), &Feature::CONCRETE);
        assert_eq!(Feature::Options.expand(), &[Feature::Options]);
        assert!(Feature::CONCRETE.iter().all(|f| !f.is_wildcard()));
    }

    #[test]
    fn test_serde_uses_upper_case_keywords() {
        let option = LikeOption::overwriting(Feature::Generated);
        let json = serde_json::to_string(&option).unwrap();
        assert_eq!(json, r#"{"strategy":"OVERWRITING","feature":"GENERATED"}"#);
        let back: LikeOption = serde_json::from_str(&json).unwrap();
        assert_eq!(back, option);
    }
}
