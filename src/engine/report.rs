//! The two report tables and their ordering.
use crate::config::Catalog;
use crate::engine::verdict::YieldRecord;
use std::cmp::Ordering;

/// Capability of one dimension within one measurement group.
#[derive(Clone, Debug, PartialEq)]
pub struct CpkRecord {
    pub station: String,
    pub dimension: String,
    /// Grouping token, present only when grouping by config
    pub config: Option<String>,
    pub date: String,
    pub sample_size: usize,
    pub usl: Option<f64>,
    pub lsl: Option<f64>,
    pub cpk: Option<f64>,
}

impl CpkRecord {
    /// Whether the index is defined and below `threshold`.
    pub fn is_flagged(&self, threshold: f64) -> bool {
        self.cpk.is_some_and(|cpk| cpk < threshold)
    }
}

/// Yield and CPK tables of one workbook.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Report {
    pub yields: Vec<YieldRecord>,
    pub cpks: Vec<CpkRecord>,
}

impl Report {
    /// Sorts both tables by catalog position of the station. CPK rows are
    /// further ordered by dimension label, date, and config token.
    pub fn assemble(mut yields: Vec<YieldRecord>, mut cpks: Vec<CpkRecord>, catalog: &Catalog) -> Self {
        let rank = |station: &str| catalog.position(station).unwrap_or(usize::MAX);
        yields.sort_by_key(|record| rank(&record.station));
        cpks.sort_by(|left, right| {
            rank(&left.station)
                .cmp(&rank(&right.station))
                .then_with(|| left.dimension.cmp(&right.dimension))
                .then_with(|| left.date.cmp(&right.date))
                .then_with(|| compare_config(&left.config, &right.config))
        });
        Report { yields, cpks }
    }

    /// Number of CPK rows below `threshold`.
    pub fn flagged(&self, threshold: f64) -> usize {
        self.cpks.iter().filter(|record| record.is_flagged(threshold)).count()
    }
}

fn compare_config(left: &Option<String>, right: &Option<String>) -> Ordering {
    left.as_deref().unwrap_or_default().cmp(right.as_deref().unwrap_or_default())
}
