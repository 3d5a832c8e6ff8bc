//! # Extension Core Module
//!
//! Named parameters shared by the `ipqc_*` table functions, their decoding
//! into a [`Config`], and the bind-time report run.
use crate::bridge::ValueBridge;
use crate::config::{Catalog, Config, STATION_ALIASES, STATION_CATALOG};
use crate::engine::{Analyzer, Report};
use crate::error::{IpqcError, ResultMessage};
use crate::spreadsheet::Spreadsheet;
use duckdb::core::{FlatVector, Inserter, LogicalTypeHandle, LogicalTypeId};
use duckdb::vtab::BindInfo;
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tracing::debug;

pub(crate) mod cpk_table_function;
pub(crate) mod report_table_function;
pub(crate) mod yield_table_function;

/// Rows emitted per output chunk.
pub(crate) const CHUNK_SIZE: usize = 1024;

#[derive(Error, Debug)]
pub enum ExtensionError {
    /// Invalid parameter provided to a table function
    #[error("Invalid parameter '{name}': {message}")]
    InvalidParameter { name: String, message: String },
}

/// Trait for handling named parameters in DuckDB table functions.
///
/// # Type Parameters
///
/// * `T` - The type of the parameter value
pub trait NamedParam<T> {
    /// Returns the parameter name as used in SQL
    fn name() -> &'static str;

    /// Returns the DuckDB logical type for this parameter
    fn kind() -> LogicalTypeHandle;

    /// Returns the complete parameter definition (name and type)
    fn definition() -> (String, LogicalTypeHandle) {
        (Self::name().to_string(), Self::kind())
    }

    /// Extracts the parameter value, `None` when the caller did not pass it
    fn read(bind: &BindInfo) -> Option<T>;
}

/// Station catalog override
struct StationsParam;

/// Alias rules override
struct AliasesParam;

/// CPK flagging threshold
struct ThresholdParam;

/// Minimum sample size of a CPK record
struct MinSampleSizeParam;

/// Date + config grouping switch
struct GroupByConfigParam;

impl NamedParam<Vec<String>> for StationsParam {
    fn name() -> &'static str {
        "stations"
    }

    fn kind() -> LogicalTypeHandle {
        LogicalTypeHandle::list(&LogicalTypeHandle::from(LogicalTypeId::Varchar))
    }

    fn read(bind: &BindInfo) -> Option<Vec<String>> {
        Some(
            ValueBridge::to_list(&bind.get_named_parameter(Self::name())?)
                .iter()
                .map(|station| station.to_varchar())
                .collect(),
        )
    }
}

impl NamedParam<Vec<(String, String)>> for AliasesParam {
    fn name() -> &'static str {
        "aliases"
    }

    fn kind() -> LogicalTypeHandle {
        LogicalTypeHandle::map(
            &LogicalTypeHandle::from(LogicalTypeId::Varchar),
            &LogicalTypeHandle::from(LogicalTypeId::Varchar),
        )
    }

    fn read(bind: &BindInfo) -> Option<Vec<(String, String)>> {
        Some(
            ValueBridge::to_map_entries(&bind.get_named_parameter(Self::name())?)
                .iter()
                .map(|(pattern, station)| (pattern.to_varchar(), station.to_varchar()))
                .collect(),
        )
    }
}

impl NamedParam<f64> for ThresholdParam {
    fn name() -> &'static str {
        "threshold"
    }

    fn kind() -> LogicalTypeHandle {
        LogicalTypeHandle::from(LogicalTypeId::Double)
    }

    fn read(bind: &BindInfo) -> Option<f64> {
        Some(bind.get_named_parameter(Self::name())?.to_double())
    }
}

impl NamedParam<usize> for MinSampleSizeParam {
    fn name() -> &'static str {
        "min_sample_size"
    }

    fn kind() -> LogicalTypeHandle {
        LogicalTypeHandle::from(LogicalTypeId::UInteger)
    }

    fn read(bind: &BindInfo) -> Option<usize> {
        Some(bind.get_named_parameter(Self::name())?.to_uint32() as usize)
    }
}

impl NamedParam<bool> for GroupByConfigParam {
    fn name() -> &'static str {
        "group_by_config"
    }

    fn kind() -> LogicalTypeHandle {
        LogicalTypeHandle::from(LogicalTypeId::Boolean)
    }

    fn read(bind: &BindInfo) -> Option<bool> {
        Some(bind.get_named_parameter(Self::name())?.to_bool())
    }
}

/// Parameters common to every `ipqc_*` table function.
#[derive(Debug, Default)]
pub(crate) struct ReportParameters {
    /// Path to the IPQC workbook
    pub(crate) file_name: String,
    stations: Option<Vec<String>>,
    aliases: Option<Vec<(String, String)>>,
    threshold: Option<f64>,
    min_sample_size: Option<usize>,
    group_by_config: Option<bool>,
}

impl From<&BindInfo> for ReportParameters {
    fn from(bind: &BindInfo) -> Self {
        ReportParameters {
            file_name: bind.get_parameter(0).to_string(),
            stations: StationsParam::read(bind),
            aliases: AliasesParam::read(bind),
            threshold: ThresholdParam::read(bind),
            min_sample_size: MinSampleSizeParam::read(bind),
            group_by_config: GroupByConfigParam::read(bind),
        }
    }
}

impl ReportParameters {
    /// Named parameter definitions accepted by every `ipqc_*` function.
    pub(crate) fn definitions() -> Vec<(String, LogicalTypeHandle)> {
        vec![
            StationsParam::definition(),
            AliasesParam::definition(),
            ThresholdParam::definition(),
            MinSampleSizeParam::definition(),
            GroupByConfigParam::definition(),
        ]
    }

    /// Builds the engine configuration from the defaults and the overrides.
    ///
    /// A replaced catalog without explicit aliases keeps the built-in alias
    /// rules whose target station it still contains.
    pub(crate) fn config(&self) -> Result<Config, IpqcError> {
        let catalog = match &self.stations {
            Some(stations) => Catalog::new(stations.iter().map(|station| station.trim().to_owned()))?,
            None => Catalog::new(STATION_CATALOG)?,
        };
        let catalog = match &self.aliases {
            Some(aliases) => catalog.with_aliases(aliases.iter().map(|(pattern, station)| (pattern, station.trim())))?,
            None => {
                let defaults: Vec<(&str, &str)> = STATION_ALIASES
                    .into_iter()
                    .filter(|(_, station)| catalog.position(station).is_some())
                    .collect();
                catalog.with_aliases(defaults)?
            }
        };

        let mut config = Config::default().with_catalog(catalog);
        if let Some(threshold) = self.threshold {
            config = config.with_threshold(threshold)?;
        }
        if let Some(min_sample_size) = self.min_sample_size {
            config = config.with_min_sample_size(min_sample_size)?;
        }
        if let Some(group_by_config) = self.group_by_config {
            config = config.with_group_by_config(group_by_config);
        }
        Ok(config)
    }

    /// Reads the workbook and builds the report. Any failure is reported
    /// once, prefixed with the workbook path.
    pub(crate) fn analyze(&self) -> Result<(Config, Report), IpqcError> {
        let run = || -> Result<(Config, Report), IpqcError> {
            let config = self.config()?;
            let mut spreadsheet = Spreadsheet::open(&self.file_name)?;
            let analyzer = Analyzer::new(config);
            let report = analyzer.analyze_with_progress(&mut spreadsheet, |processed, total| {
                debug!(file = %self.file_name, processed, total, "sheet progress");
            })?;
            Ok((analyzer.config().clone(), report))
        };
        run().with_prefix(&self.file_name)
    }
}

/// Claims the next chunk of row indexes from `cursor`, empty once all
/// `total` rows have been handed out.
pub(crate) fn next_chunk(cursor: &AtomicUsize, total: usize) -> Range<usize> {
    let lower = cursor.fetch_add(CHUNK_SIZE, Ordering::Relaxed).min(total);
    lower..(lower + CHUNK_SIZE).min(total)
}

/// Writes a primitive at `index`, or NULL when the value is absent.
pub(crate) fn set_primitive<T: Copy>(vector: &mut FlatVector, index: usize, value: Option<T>) {
    match value {
        Some(value) => unsafe {
            vector.as_mut_slice::<T>()[index] = value;
        },
        None => vector.set_null(index),
    }
}

/// Writes a VARCHAR at `index`, or NULL when the value is absent.
pub(crate) fn set_varchar(vector: &mut FlatVector, index: usize, value: Option<&str>) {
    match value {
        Some(value) => vector.insert(index, value),
        None => vector.set_null(index),
    }
}
