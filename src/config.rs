//! # Report Configuration
//!
//! Compile-time defaults for the report engine and the immutable [`Config`]
//! value that carries them into the [`Analyzer`](crate::engine::Analyzer).
//! Every table function starts from [`Config::default`] and applies its named
//! parameters on top, so swapping the catalog or the threshold never touches
//! the matching or statistics code.
use crate::engine::station::normalize_name;
use thiserror::Error;

/// Capability index below which a CPK cell is flagged.
pub const CPK_THRESHOLD: f64 = 1.33;

/// Canonical station names in display order.
pub const STATION_CATALOG: [&str; 19] = [
    "MLA assy installation",
    "Mirror attachment",
    "Barrel attachment",
    "Condenser lens attach",
    "LED Module  attachment",
    "ILLU Module cover attachment",
    "Relay lens attachment",
    "LED FLEX GRAPHITE-1",
    "reflector attach",
    "singlet attach",
    "HWP Mylar attach",
    "PBS attachment",
    "Doublet attachment",
    "Top cover installation",
    "PANEL PRECISION AA（LAA）",
    "POST DAA INSPECTION",
    "PANEL FLEX ASSY",
    "LCOS GRAPHITE ATTACH",
    "DE OQC",
];

/// Alias rules applied after generic matching, first match wins.
///
/// Post-DAA sheets are usually named without the `INSPECTION` suffix, which
/// the full catalog name never matches.
pub const STATION_ALIASES: [(&str, &str); 1] = [("postdaa", "POST DAA INSPECTION")];

/// Keywords marking the dimension header row.
pub const DIMENSION_KEYWORDS: [&str; 3] = ["dim. no", "dim no", "dim"];

/// Header labels that never denote a dimension column.
pub const IGNORED_HEADERS: [&str; 12] = [
    "", "nan", "date", "time", "no.", "remark", "judge", "note", "dim", "dim no", "dim. no",
    "dimension",
];

/// Rows scanned for the dimension, USL and LSL rows.
pub const ROW_SCAN_LIMIT: usize = 80;

/// Columns scanned for the OK/NG verdict column.
pub const VERDICT_COLUMN_LIMIT: usize = 30;

/// Columns scanned for the date column.
pub const DATE_COLUMN_LIMIT: usize = 20;

/// Valid numeric samples a group needs before a CPK record is emitted.
pub const MIN_SAMPLE_SIZE: usize = 2;

/// Errors raised while building a [`Config`].
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Station catalog is empty")]
    EmptyCatalog,

    #[error("Station '{0}' appears more than once in the catalog")]
    DuplicateStation(String),

    #[error("Alias '{pattern}' targets '{station}' which is not in the station catalog")]
    UnknownAliasTarget { pattern: String, station: String },

    #[error("Alias pattern for '{0}' is empty after normalization")]
    EmptyAliasPattern(String),

    #[error("Capability threshold must be finite, got {0}")]
    InvalidThreshold(f64),

    #[error("Minimum sample size must be at least 1")]
    InvalidSampleSize,
}

/// An alias rule forcing a station when its pattern occurs in a sheet name.
#[derive(Clone, Debug, PartialEq)]
pub struct AliasRule {
    /// Normalized pattern searched in the normalized sheet name
    pub pattern: String,
    /// Canonical station forced by the rule
    pub station: String,
}

/// Ordered station catalog plus the alias rules that refine it.
#[derive(Clone, Debug)]
pub struct Catalog {
    stations: Vec<String>,
    normalized: Vec<String>,
    aliases: Vec<AliasRule>,
}

impl Catalog {
    /// Builds a catalog without alias rules.
    pub fn new<I, S>(stations: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let stations: Vec<String> = stations.into_iter().map(Into::into).collect();
        if stations.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }
        for (index, station) in stations.iter().enumerate() {
            if stations[..index].contains(station) {
                return Err(ConfigError::DuplicateStation(station.to_owned()));
            }
        }
        let normalized = stations.iter().map(|station| normalize_name(station)).collect();
        Ok(Catalog {
            stations,
            normalized,
            aliases: Vec::new(),
        })
    }

    /// Replaces the alias rules, validating every target against the catalog.
    pub fn with_aliases<I, P, S>(mut self, aliases: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (P, S)>,
        P: AsRef<str>,
        S: Into<String>,
    {
        let mut rules = Vec::new();
        for (pattern, station) in aliases {
            let station = station.into();
            let normalized = normalize_name(pattern.as_ref());
            if normalized.is_empty() {
                return Err(ConfigError::EmptyAliasPattern(station));
            }
            if self.position(&station).is_none() {
                return Err(ConfigError::UnknownAliasTarget {
                    pattern: pattern.as_ref().to_owned(),
                    station,
                });
            }
            rules.push(AliasRule {
                pattern: normalized,
                station,
            });
        }
        self.aliases = rules;
        Ok(self)
    }

    /// Canonical station names in catalog order.
    pub fn stations(&self) -> &[String] {
        &self.stations
    }

    /// Pairs of (normalized name, canonical name) in catalog order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.normalized
            .iter()
            .map(String::as_str)
            .zip(self.stations.iter().map(String::as_str))
    }

    pub fn aliases(&self) -> &[AliasRule] {
        &self.aliases
    }

    /// Catalog position of a canonical station name.
    pub fn position(&self, station: &str) -> Option<usize> {
        self.stations.iter().position(|name| name == station)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog::new(STATION_CATALOG)
            .and_then(|catalog| catalog.with_aliases(STATION_ALIASES))
            .expect("Hardcode station catalog")
    }
}

/// Immutable engine configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Recognized stations, their order and alias rules
    pub catalog: Catalog,
    /// CPK values strictly below this are flagged
    pub threshold: f64,
    /// Minimum valid samples for a CPK record
    pub min_sample_size: usize,
    /// Whether rows are grouped by date and config token instead of date alone
    pub group_by_config: bool,
    /// Keywords identifying the dimension header row
    pub dimension_keywords: Vec<String>,
    /// Header labels excluded from the dimension columns
    pub ignored_headers: Vec<String>,
    pub row_scan_limit: usize,
    pub verdict_column_limit: usize,
    pub date_column_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            catalog: Catalog::default(),
            threshold: CPK_THRESHOLD,
            min_sample_size: MIN_SAMPLE_SIZE,
            group_by_config: true,
            dimension_keywords: DIMENSION_KEYWORDS.iter().map(|it| it.to_string()).collect(),
            ignored_headers: IGNORED_HEADERS.iter().map(|it| it.to_string()).collect(),
            row_scan_limit: ROW_SCAN_LIMIT,
            verdict_column_limit: VERDICT_COLUMN_LIMIT,
            date_column_limit: DATE_COLUMN_LIMIT,
        }
    }
}

impl Config {
    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Result<Self, ConfigError> {
        if !threshold.is_finite() {
            return Err(ConfigError::InvalidThreshold(threshold));
        }
        self.threshold = threshold;
        Ok(self)
    }

    pub fn with_min_sample_size(mut self, min_sample_size: usize) -> Result<Self, ConfigError> {
        if min_sample_size == 0 {
            return Err(ConfigError::InvalidSampleSize);
        }
        self.min_sample_size = min_sample_size;
        Ok(self)
    }

    pub fn with_group_by_config(mut self, group_by_config: bool) -> Self {
        self.group_by_config = group_by_config;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_keeps_order() {
        let catalog = Catalog::default();
        assert_eq!(catalog.stations().len(), STATION_CATALOG.len());
        assert_eq!(catalog.position("MLA assy installation"), Some(0));
        assert_eq!(catalog.position("DE OQC"), Some(18));
        assert_eq!(catalog.position("unknown"), None);
    }

    #[test]
    fn default_aliases_are_normalized() {
        let catalog = Catalog::default();
        assert_eq!(
            catalog.aliases(),
            &[AliasRule {
                pattern: "postdaa".to_string(),
                station: "POST DAA INSPECTION".to_string(),
            }]
        );
    }

    #[test]
    fn alias_must_target_catalog_station() {
        let result = Catalog::new(["A", "B"]).unwrap().with_aliases([("x", "C")]);
        assert!(matches!(result, Err(ConfigError::UnknownAliasTarget { .. })));
    }

    #[test]
    fn alias_pattern_must_survive_normalization() {
        let result = Catalog::new(["A"]).unwrap().with_aliases([(" - ", "A")]);
        assert!(matches!(result, Err(ConfigError::EmptyAliasPattern(_))));
    }

    #[test]
    fn catalog_rejects_empty_and_duplicates() {
        assert!(matches!(Catalog::new(Vec::<String>::new()), Err(ConfigError::EmptyCatalog)));
        assert!(matches!(Catalog::new(["A", "A"]), Err(ConfigError::DuplicateStation(_))));
    }

    #[test]
    fn config_validates_overrides() {
        assert!(Config::default().with_threshold(f64::NAN).is_err());
        assert!(Config::default().with_min_sample_size(0).is_err());
        let config = Config::default()
            .with_threshold(1.0)
            .unwrap()
            .with_min_sample_size(1)
            .unwrap()
            .with_group_by_config(false);
        assert_eq!(config.threshold, 1.0);
        assert_eq!(config.min_sample_size, 1);
        assert!(!config.group_by_config);
    }
}
