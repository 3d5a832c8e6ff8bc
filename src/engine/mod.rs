//! # Report Engine
//!
//! Turns the sheets of an IPQC workbook into a yield table and a CPK table.
//!
//! Each sheet goes through the same steps:
//!
//! 1. its name is resolved to a catalog station, otherwise it is skipped;
//! 2. the OK/NG verdict column, if any, produces one [`YieldRecord`];
//! 3. the layout locator finds the dimension, USL and LSL rows and the date column;
//! 4. data rows are grouped by date (and config token);
//! 5. every group × dimension pair with enough numeric samples yields a [`CpkRecord`].
//!
//! Data-shape irregularities inside a sheet never fail the run. Only
//! workbook-level read failures are returned as errors.
pub mod capability;
pub mod grouping;
pub mod layout;
pub mod report;
pub(crate) mod scan;
pub mod station;
pub mod verdict;

use crate::config::Config;
use crate::spreadsheet::{Sheet, Spreadsheet, SpreadsheetError};
use capability::capability;
use grouping::group_rows;
use layout::{LayoutLocator, DATE_PATTERN};
use regex::Regex;
use station::StationResolver;
use tracing::{debug, info};
use verdict::tally_yield;

pub use report::{CpkRecord, Report};
pub use verdict::YieldRecord;

/// Records contributed by a single sheet.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SheetAnalysis {
    pub station: Option<String>,
    pub yield_record: Option<YieldRecord>,
    pub cpks: Vec<CpkRecord>,
}

/// Runs the report pipeline with an injected configuration.
pub struct Analyzer {
    config: Config,
    date_pattern: Regex,
}

impl Analyzer {
    pub fn new(config: Config) -> Self {
        Analyzer {
            config,
            date_pattern: Regex::new(DATE_PATTERN).expect("Hardcode regex pattern"),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Analyzes one sheet in isolation.
    pub fn analyze_sheet(&self, sheet: &Sheet) -> SheetAnalysis {
        let Some(station) = StationResolver::new(&self.config.catalog).resolve(&sheet.name) else {
            debug!(sheet = %sheet.name, "skipped unrecognized sheet");
            return SheetAnalysis::default();
        };
        let yield_record = tally_yield(station, sheet, self.config.verdict_column_limit);
        let cpks = self.capability_records(station, sheet);
        debug!(
            sheet = %sheet.name,
            station,
            has_yield = yield_record.is_some(),
            cpk_records = cpks.len(),
            "analyzed sheet"
        );
        SheetAnalysis {
            station: Some(station.to_owned()),
            yield_record,
            cpks,
        }
    }

    fn capability_records(&self, station: &str, sheet: &Sheet) -> Vec<CpkRecord> {
        let locator = LayoutLocator::new(&self.config, &self.date_pattern);
        let Some(layout) = locator.locate(sheet) else {
            return Vec::new();
        };
        let groups = group_rows(sheet, &layout, &self.date_pattern, self.config.group_by_config);

        let mut records = Vec::new();
        for (key, rows) in &groups {
            for dimension in &layout.dimensions {
                let usl = layout.limits.usl(dimension.column);
                let lsl = layout.limits.lsl(dimension.column);
                let values = rows
                    .iter()
                    .filter_map(|row| sheet.get(*row, dimension.column))
                    .filter_map(|cell| cell.to_number());
                let result = capability(values, usl, lsl);
                if result.sample_size < self.config.min_sample_size {
                    continue;
                }
                records.push(CpkRecord {
                    station: station.to_owned(),
                    dimension: dimension.label.clone(),
                    config: key.config.clone(),
                    date: key.date.clone(),
                    sample_size: result.sample_size,
                    usl,
                    lsl,
                    cpk: result.cpk,
                });
            }
        }
        records
    }

    /// Analyzes every sheet of a workbook in workbook order, calling
    /// `progress(processed, total)` once per sheet.
    pub fn analyze_with_progress<F>(&self, spreadsheet: &mut Spreadsheet, mut progress: F) -> Result<Report, SpreadsheetError>
    where
        F: FnMut(usize, usize),
    {
        let names = spreadsheet.sheet_names();
        let total = names.len();
        let resolver = StationResolver::new(&self.config.catalog);

        let mut yields = Vec::new();
        let mut cpks = Vec::new();
        for (index, name) in names.iter().enumerate() {
            if resolver.resolve(name).is_some() {
                let sheet = spreadsheet.read_sheet(name)?;
                let analysis = self.analyze_sheet(&sheet);
                yields.extend(analysis.yield_record);
                cpks.extend(analysis.cpks);
            } else {
                debug!(sheet = %name, "skipped unrecognized sheet");
            }
            progress(index + 1, total);
        }

        let report = Report::assemble(yields, cpks, &self.config.catalog);
        info!(
            sheets = total,
            yield_rows = report.yields.len(),
            cpk_rows = report.cpks.len(),
            flagged_rows = report.flagged(self.config.threshold),
            "built IPQC report"
        );
        Ok(report)
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Analyzer::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Catalog;
    use calamine::Data;
    use rust_xlsxwriter::Workbook;

    fn text(value: &str) -> Data {
        Data::String(value.to_string())
    }

    fn mirror_sheet(name: &str) -> Sheet {
        Sheet::from_rows(
            name,
            vec![
                vec![text("Mirror attachment IPQC")],
                vec![text("Config"), text("Date"), text("Dim No"), text("A1"), text("A2"), text("Judge")],
                vec![Data::Empty, Data::Empty, text("USL"), Data::Float(1.40), Data::Float(0.8)],
                vec![Data::Empty, Data::Empty, text("LSL"), Data::Float(1.20)],
                vec![text("SH2"), text("2024-01-05 08:00"), Data::Empty, Data::Float(1.30), Data::Float(0.70), text("OK")],
                vec![text("SH2"), text("2024-01-05 10:00"), Data::Empty, Data::Float(1.32), Data::Float(0.64), text("OK")],
                vec![text("SH2"), text("2024-01-05 12:00"), Data::Empty, Data::Float(1.28), Data::Float(0.76), text("NG")],
                vec![text("SH2"), text("2024-01-05 14:00"), Data::Empty, Data::Float(1.31), text("-"), text("OK")],
                vec![text("SH2"), text("2024-01-05 16:00"), Data::Empty, text("1.29"), Data::Empty, text("OK")],
                vec![text("SH3"), text("2024-01-05 09:00"), Data::Empty, Data::Float(1.30), Data::Float(0.70), text("OK")],
            ],
        )
    }

    #[test]
    fn unrecognized_sheet_contributes_nothing() {
        let analysis = Analyzer::default().analyze_sheet(&mirror_sheet("Summary"));
        assert_eq!(analysis, SheetAnalysis::default());
    }

    #[test]
    fn sheet_yields_and_capabilities() {
        let analysis = Analyzer::default().analyze_sheet(&mirror_sheet("Mirror attachment"));
        assert_eq!(analysis.station.as_deref(), Some("Mirror attachment"));
        assert_eq!(analysis.yield_record, Some(YieldRecord::new("Mirror attachment", 5, 1)));

        // The SH3 group has a single row, below the minimum sample size.
        assert_eq!(analysis.cpks.len(), 2);
        let a1 = analysis.cpks.iter().find(|it| it.dimension == "A1").unwrap();
        assert_eq!(a1.config.as_deref(), Some("SH2"));
        assert_eq!(a1.date, "2024-01-05");
        assert_eq!(a1.sample_size, 5);
        assert_eq!((a1.usl, a1.lsl), (Some(1.40), Some(1.20)));
        assert!((a1.cpk.unwrap() - 2.108).abs() < 1e-3);

        let a2 = analysis.cpks.iter().find(|it| it.dimension == "A2").unwrap();
        assert_eq!(a2.sample_size, 3);
        assert_eq!((a2.usl, a2.lsl), (Some(0.8), None));
        assert!((a2.cpk.unwrap() - 0.10 / 0.18).abs() < 1e-9);
    }

    #[test]
    fn repeated_readings_have_no_capability() {
        let mut rows = vec![
            vec![text("Dim No"), text("A1")],
            vec![text("USL"), Data::Float(1.2)],
            vec![text("LSL"), Data::Float(1.0)],
        ];
        rows.extend((0..6).map(|_| vec![text("2024-01-05"), Data::Float(1.1)]));
        let analysis = Analyzer::default().analyze_sheet(&Sheet::from_rows("Mirror attachment", rows));

        assert_eq!(analysis.cpks.len(), 1);
        assert_eq!(analysis.cpks[0].sample_size, 6);
        assert_eq!(analysis.cpks[0].cpk, None);
    }

    #[test]
    fn date_only_grouping_merges_tokens() {
        let config = Config::default().with_group_by_config(false);
        let analysis = Analyzer::new(config).analyze_sheet(&mirror_sheet("Mirror attachment"));
        let a1 = analysis.cpks.iter().find(|it| it.dimension == "A1").unwrap();
        assert_eq!(a1.config, None);
        assert_eq!(a1.sample_size, 6);
    }

    #[test]
    fn minimum_sample_size_gates_records() {
        let config = Config::default().with_min_sample_size(1).unwrap();
        let analysis = Analyzer::new(config).analyze_sheet(&mirror_sheet("Mirror attachment"));
        let single = analysis
            .cpks
            .iter()
            .find(|it| it.config.as_deref() == Some("SH3") && it.dimension == "A1")
            .unwrap();
        assert_eq!(single.sample_size, 1);
        assert_eq!(single.cpk, None);
    }

    #[test]
    fn missing_dimension_row_keeps_yield() {
        let sheet = Sheet::from_rows("DE OQC", vec![vec![text("Result")], vec![text("OK")], vec![text("NG")]]);
        let analysis = Analyzer::default().analyze_sheet(&sheet);
        assert_eq!(analysis.yield_record, Some(YieldRecord::new("DE OQC", 1, 1)));
        assert!(analysis.cpks.is_empty());
    }

    fn write_rows(worksheet: &mut rust_xlsxwriter::Worksheet, rows: &[Vec<Data>]) {
        for (row, values) in rows.iter().enumerate() {
            for (column, value) in values.iter().enumerate() {
                let (row, column) = (row as u32, column as u16);
                match value {
                    Data::String(text) => {
                        worksheet.write_string(row, column, text).unwrap();
                    }
                    Data::Float(number) => {
                        worksheet.write_number(row, column, *number).unwrap();
                    }
                    _ => {}
                }
            }
        }
    }

    #[test]
    fn analyzes_workbook_in_catalog_order() {
        let rows = |verdict: &str| {
            vec![
                vec![text("Config"), text("Date"), text("Dim No"), text("A1"), text("Judge")],
                vec![Data::Empty, Data::Empty, text("USL"), Data::Float(1.40)],
                vec![text("SH2"), text("2024-01-05"), Data::Empty, Data::Float(1.30), text("OK")],
                vec![text("SH2"), text("2024-01-05"), Data::Empty, Data::Float(1.36), text("OK")],
                vec![text("SH2"), text("2024-01-05"), Data::Empty, Data::Float(1.24), text(verdict)],
            ]
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ipqc.xlsx");
        let mut workbook = Workbook::new();
        for (name, verdict) in [("Notes", "OK"), ("Top cover installation", "NG"), ("Mirror attachment", "OK")] {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(name).unwrap();
            write_rows(worksheet, &rows(verdict));
        }
        workbook.save(&path).unwrap();

        let mut spreadsheet = Spreadsheet::open(&path).unwrap();
        let mut ticks = Vec::new();
        let report = Analyzer::default()
            .analyze_with_progress(&mut spreadsheet, |done, total| ticks.push((done, total)))
            .unwrap();

        assert_eq!(ticks, vec![(1, 3), (2, 3), (3, 3)]);
        let stations: Vec<&str> = report.yields.iter().map(|it| it.station.as_str()).collect();
        assert_eq!(stations, vec!["Mirror attachment", "Top cover installation"]);
        assert_eq!(report.yields[1], YieldRecord::new("Top cover installation", 2, 1));
        assert_eq!(report.cpks.len(), 2);
        assert_eq!(report.cpks[0].station, "Mirror attachment");
        assert!((report.cpks[0].cpk.unwrap() - 0.10 / 0.18).abs() < 1e-9);
        assert_eq!(report.flagged(1.33), 2);
    }

    #[test]
    fn custom_catalog_is_honored() {
        let catalog = Catalog::new(["Line A"]).unwrap();
        let analyzer = Analyzer::new(Config::default().with_catalog(catalog));
        let sheet = Sheet::from_rows("line-a day shift", vec![vec![text("OK")]]);
        assert_eq!(analyzer.analyze_sheet(&sheet).yield_record, Some(YieldRecord::new("Line A", 1, 0)));
        assert_eq!(analyzer.analyze_sheet(&mirror_sheet("Mirror attachment")), SheetAnalysis::default());
    }
}
