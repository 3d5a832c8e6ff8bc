//! Structural inference for inspection log sheets.
//!
//! A log sheet has a dimension header row somewhere near the top, optional
//! USL and LSL rows, and date-stamped measurement rows below them. The
//! locator finds each piece with bounded keyword and pattern scans.
use crate::config::Config;
use crate::engine::scan::first_match;
use crate::spreadsheet::Sheet;
use regex::Regex;
use std::collections::BTreeMap;
use tracing::debug;

/// Four-digit-year date stamp, e.g. `2024-01-05`.
pub const DATE_PATTERN: &str = r"202\d-\d{2}-\d{2}";

/// A measured dimension column.
#[derive(Clone, Debug, PartialEq)]
pub struct Dimension {
    pub column: usize,
    pub label: String,
}

/// Upper and lower bounds keyed by column index.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpecLimits {
    pub upper: BTreeMap<usize, f64>,
    pub lower: BTreeMap<usize, f64>,
}

impl SpecLimits {
    pub fn usl(&self, column: usize) -> Option<f64> {
        self.upper.get(&column).copied()
    }

    pub fn lsl(&self, column: usize) -> Option<f64> {
        self.lower.get(&column).copied()
    }
}

/// Everything the grouper and the calculator need to know about a sheet.
#[derive(Clone, Debug, PartialEq)]
pub struct Layout {
    pub dimension_row: usize,
    pub usl_row: Option<usize>,
    pub lsl_row: Option<usize>,
    pub dimensions: Vec<Dimension>,
    pub limits: SpecLimits,
    /// First row of measurement data
    pub data_row: usize,
    pub date_column: usize,
    /// Column holding the config token (e.g. `SH2`)
    pub config_column: usize,
}

/// Finds the structural rows and columns of a sheet.
pub struct LayoutLocator<'a> {
    config: &'a Config,
    date_pattern: &'a Regex,
}

impl<'a> LayoutLocator<'a> {
    pub fn new(config: &'a Config, date_pattern: &'a Regex) -> Self {
        LayoutLocator {
            config,
            date_pattern,
        }
    }

    /// Returns the first row, within the scan cap, whose text contains any
    /// of the keywords.
    pub fn find_row<S: AsRef<str>>(&self, sheet: &Sheet, keywords: &[S]) -> Option<usize> {
        first_match(0, sheet.height, self.config.row_scan_limit, |row| {
            let text = sheet.row_text(row);
            keywords.iter().any(|keyword| text.contains(keyword.as_ref()))
        })
    }

    /// Header cells that name a measured dimension.
    pub fn dimensions(&self, sheet: &Sheet, row: usize) -> Vec<Dimension> {
        sheet
            .row(row)
            .iter()
            .enumerate()
            .filter(|(_, cell)| !cell.is_empty())
            .filter_map(|(column, cell)| {
                let label = cell.to_string().trim().to_owned();
                let ignored = self
                    .config
                    .ignored_headers
                    .iter()
                    .any(|header| *header == label.to_lowercase());
                if ignored || label.chars().count() <= 1 {
                    None
                } else {
                    Some(Dimension { column, label })
                }
            })
            .collect()
    }

    /// Numeric cells of a limit row keyed by column; other cells are skipped.
    pub fn limits(sheet: &Sheet, row: Option<usize>) -> BTreeMap<usize, f64> {
        row.map(|row| {
            sheet
                .row(row)
                .iter()
                .enumerate()
                .filter_map(|(column, cell)| cell.to_number().map(|value| (column, value)))
                .collect()
        })
        .unwrap_or_default()
    }

    /// First column, within the scan cap, holding a date stamp at or below
    /// `data_row`.
    pub fn find_date_column(&self, sheet: &Sheet, data_row: usize) -> Option<usize> {
        first_match(0, sheet.width, self.config.date_column_limit, |column| {
            sheet
                .column(column, data_row)
                .any(|cell| self.date_pattern.is_match(&cell.to_string()))
        })
    }

    /// Infers the layout of a sheet. `None` means the sheet carries no
    /// capability data: no dimension header row or no date column.
    pub fn locate(&self, sheet: &Sheet) -> Option<Layout> {
        let Some(dimension_row) = self.find_row(sheet, self.config.dimension_keywords.as_slice()) else {
            debug!(sheet = %sheet.name, "no dimension header row");
            return None;
        };
        let usl_row = self.find_row(sheet, &["usl"]);
        let lsl_row = self.find_row(sheet, &["lsl"]);
        let data_row = [Some(dimension_row), usl_row, lsl_row]
            .into_iter()
            .flatten()
            .max()
            .map_or(0, |row| row + 1);

        let Some(date_column) = self.find_date_column(sheet, data_row) else {
            debug!(sheet = %sheet.name, data_row, "no date column");
            return None;
        };
        let config_column = if date_column != 0 { 0 } else { 1 };

        Some(Layout {
            dimension_row,
            usl_row,
            lsl_row,
            dimensions: self.dimensions(sheet, dimension_row),
            limits: SpecLimits {
                upper: Self::limits(sheet, usl_row),
                lower: Self::limits(sheet, lsl_row),
            },
            data_row,
            date_column,
            config_column,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::Data;

    fn text(value: &str) -> Data {
        Data::String(value.to_string())
    }

    fn pattern() -> Regex {
        Regex::new(DATE_PATTERN).unwrap()
    }

    fn log_sheet() -> Sheet {
        Sheet::from_rows(
            "Mirror attachment",
            vec![
                vec![text("IPQC record")],
                vec![text("Config"), text("Date"), text("Dim. No"), text("A1"), text("A2"), text("Remark"), text("x")],
                vec![Data::Empty, Data::Empty, text("USL"), Data::Float(1.4), text("n/a"), Data::Empty],
                vec![Data::Empty, Data::Empty, text("LSL"), Data::Float(1.2), Data::Float(0.5)],
                vec![text("SH2"), text("2024-01-05 08:00"), Data::Empty, Data::Float(1.3), Data::Float(0.7)],
            ],
        )
    }

    #[test]
    fn locates_rows_and_columns() {
        let config = Config::default();
        let pattern = pattern();
        let locator = LayoutLocator::new(&config, &pattern);
        let layout = locator.locate(&log_sheet()).unwrap();

        assert_eq!(layout.dimension_row, 1);
        assert_eq!(layout.usl_row, Some(2));
        assert_eq!(layout.lsl_row, Some(3));
        assert_eq!(layout.data_row, 4);
        assert_eq!(layout.date_column, 1);
        assert_eq!(layout.config_column, 0);
        let labels: Vec<&str> = layout.dimensions.iter().map(|it| it.label.as_str()).collect();
        assert_eq!(labels, vec!["Config", "A1", "A2"]);
        assert_eq!(layout.dimensions[1].column, 3);
    }

    #[test]
    fn non_numeric_limits_are_skipped() {
        let config = Config::default();
        let pattern = pattern();
        let locator = LayoutLocator::new(&config, &pattern);
        let layout = locator.locate(&log_sheet()).unwrap();

        assert_eq!(layout.limits.usl(3), Some(1.4));
        assert_eq!(layout.limits.usl(4), None);
        assert_eq!(layout.limits.lsl(4), Some(0.5));
        assert_eq!(layout.limits.usl(2), None);
    }

    #[test]
    fn missing_limit_rows_are_optional() {
        let sheet = Sheet::from_rows(
            "s",
            vec![
                vec![text("2024-02-01"), text("Dim No"), text("H1")],
                vec![text("2024-02-01"), Data::Empty, Data::Float(3.0)],
            ],
        );
        let config = Config::default();
        let pattern = pattern();
        let layout = LayoutLocator::new(&config, &pattern).locate(&sheet).unwrap();
        assert_eq!(layout.usl_row, None);
        assert_eq!(layout.lsl_row, None);
        assert_eq!(layout.data_row, 1);
        assert_eq!(layout.date_column, 0);
        assert_eq!(layout.config_column, 1);
        assert_eq!(layout.limits, SpecLimits::default());
    }

    #[test]
    fn missing_dimension_row_aborts() {
        let sheet = Sheet::from_rows("s", vec![vec![text("USL"), text("2024-01-01")]]);
        let config = Config::default();
        let pattern = pattern();
        assert_eq!(LayoutLocator::new(&config, &pattern).locate(&sheet), None);
    }

    #[test]
    fn missing_date_column_aborts() {
        let sheet = Sheet::from_rows(
            "s",
            vec![vec![text("Dim No"), text("H1")], vec![text("2019-01-01"), Data::Float(1.0)]],
        );
        let config = Config::default();
        let pattern = pattern();
        assert_eq!(LayoutLocator::new(&config, &pattern).locate(&sheet), None);
    }

    #[test]
    fn dimension_row_beyond_cap_is_not_found() {
        let mut rows = vec![vec![text("filler")]; 85];
        rows.push(vec![text("Dim No")]);
        let sheet = Sheet::from_rows("s", rows);
        let config = Config::default();
        let pattern = pattern();
        let locator = LayoutLocator::new(&config, &pattern);
        assert_eq!(locator.find_row(&sheet, config.dimension_keywords.as_slice()), None);
    }

    #[test]
    fn dates_above_data_region_are_ignored() {
        let sheet = Sheet::from_rows(
            "s",
            vec![
                vec![text("2024-01-01"), text("Dim No"), text("H1"), Data::Empty],
                vec![Data::Empty, Data::Empty, Data::Float(1.0), text("2024-01-02")],
            ],
        );
        let config = Config::default();
        let pattern = pattern();
        let layout = LayoutLocator::new(&config, &pattern).locate(&sheet).unwrap();
        assert_eq!(layout.date_column, 3);
    }
}
