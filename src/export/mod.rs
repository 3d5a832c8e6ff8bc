//! # Report Export
//!
//! Writes a [`Report`] to an xlsx workbook with a `Yield Summary` and a
//! `CPK Detail` sheet. Capability cells below the threshold are highlighted
//! by a formula-based conditional format attached to the CPK column, so the
//! highlight follows the values if they are edited later.
use crate::config::Config;
use crate::engine::{CpkRecord, Report, YieldRecord};
use rust_xlsxwriter::utility::row_col_to_cell;
use rust_xlsxwriter::{Color, ConditionalFormatFormula, Format, Workbook, Worksheet, XlsxError};
use std::path::Path;
use thiserror::Error;
use tracing::info;

pub const YIELD_SHEET: &str = "Yield Summary";
pub const CPK_SHEET: &str = "CPK Detail";

const YIELD_HEADERS: [(&str, f64); 5] = [
    ("Station", 30.0),
    ("Total Qty", 11.0),
    ("OK Qty", 11.0),
    ("NG Qty", 11.0),
    ("Yield%", 11.0),
];

/// Errors raised while writing the report workbook.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to write xlsx report: {0}")]
    Xlsx(#[from] XlsxError),

    #[error("Report has {0} rows, more than a worksheet can hold")]
    TooManyRows(usize),
}

/// Row counts of a written report.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ExportSummary {
    pub yield_rows: usize,
    pub cpk_rows: usize,
    pub flagged_rows: usize,
}

struct Formats {
    header: Format,
    percent: Format,
    cpk: Format,
    flagged: Format,
}

impl Formats {
    fn new() -> Self {
        Formats {
            header: Format::new().set_bold(),
            percent: Format::new().set_num_format("0.00%"),
            cpk: Format::new().set_num_format("0.000"),
            flagged: Format::new()
                .set_bold()
                .set_background_color(Color::RGB(0xFFC7CE))
                .set_font_color(Color::RGB(0x9C0006)),
        }
    }
}

fn excel_row(index: usize) -> Result<u32, ExportError> {
    // One header row, Excel's limit is 1_048_576 rows.
    u32::try_from(index + 1)
        .ok()
        .filter(|row| *row < 1_048_576)
        .ok_or(ExportError::TooManyRows(index))
}

fn write_header(worksheet: &mut Worksheet, headers: &[(&str, f64)], format: &Format) -> Result<(), ExportError> {
    for (column, (title, width)) in headers.iter().enumerate() {
        let column = column as u16;
        worksheet.write_string_with_format(0, column, *title, format)?;
        worksheet.set_column_width(column, *width)?;
    }
    worksheet.set_freeze_panes(1, 0)?;
    Ok(())
}

fn write_yield_sheet(worksheet: &mut Worksheet, records: &[YieldRecord], formats: &Formats) -> Result<(), ExportError> {
    worksheet.set_name(YIELD_SHEET)?;
    write_header(worksheet, &YIELD_HEADERS, &formats.header)?;
    for (index, record) in records.iter().enumerate() {
        let row = excel_row(index)?;
        worksheet.write_string(row, 0, &record.station)?;
        worksheet.write_number(row, 1, record.total as f64)?;
        worksheet.write_number(row, 2, record.ok as f64)?;
        worksheet.write_number(row, 3, record.ng as f64)?;
        worksheet.write_number_with_format(row, 4, record.ratio, &formats.percent)?;
    }
    Ok(())
}

fn cpk_headers(with_config: bool) -> Vec<(&'static str, f64)> {
    let mut headers = vec![("Station", 30.0), ("Dim No", 14.0)];
    if with_config {
        headers.push(("Config", 10.0));
    }
    headers.extend([
        ("Date", 12.0),
        ("Sample Size", 12.0),
        ("USL", 10.0),
        ("LSL", 10.0),
        ("CPK", 10.0),
    ]);
    headers
}

fn write_cpk_sheet(
    worksheet: &mut Worksheet,
    records: &[CpkRecord],
    config: &Config,
    formats: &Formats,
) -> Result<(), ExportError> {
    worksheet.set_name(CPK_SHEET)?;
    let headers = cpk_headers(config.group_by_config);
    write_header(worksheet, &headers, &formats.header)?;

    let offset = u16::from(config.group_by_config);
    let cpk_column = 6 + offset;
    for (index, record) in records.iter().enumerate() {
        let row = excel_row(index)?;
        worksheet.write_string(row, 0, &record.station)?;
        worksheet.write_string(row, 1, &record.dimension)?;
        if config.group_by_config {
            worksheet.write_string(row, 2, record.config.as_deref().unwrap_or_default())?;
        }
        worksheet.write_string(row, 2 + offset, &record.date)?;
        worksheet.write_number(row, 3 + offset, record.sample_size as f64)?;
        if let Some(value) = record.usl {
            worksheet.write_number(row, 4 + offset, value)?;
        }
        if let Some(value) = record.lsl {
            worksheet.write_number(row, 5 + offset, value)?;
        }
        if let Some(value) = record.cpk {
            worksheet.write_number_with_format(row, cpk_column, value, &formats.cpk)?;
        }
    }

    if !records.is_empty() {
        let last_row = excel_row(records.len() - 1)?;
        let anchor = row_col_to_cell(1, cpk_column);
        let rule = ConditionalFormatFormula::new()
            .set_rule(format!("=AND(ISNUMBER({anchor}),{anchor}<{})", config.threshold).as_str())
            .set_format(&formats.flagged);
        worksheet.add_conditional_format(1, cpk_column, last_row, cpk_column, &rule)?;
    }
    Ok(())
}

/// Writes the report to `path`, replacing any existing file.
pub fn write_report<P: AsRef<Path>>(report: &Report, path: P, config: &Config) -> Result<ExportSummary, ExportError> {
    let formats = Formats::new();
    let mut workbook = Workbook::new();
    write_yield_sheet(workbook.add_worksheet(), &report.yields, &formats)?;
    write_cpk_sheet(workbook.add_worksheet(), &report.cpks, config, &formats)?;
    workbook.save(path.as_ref())?;

    let summary = ExportSummary {
        yield_rows: report.yields.len(),
        cpk_rows: report.cpks.len(),
        flagged_rows: report.flagged(config.threshold),
    };
    info!(
        path = %path.as_ref().display(),
        yield_rows = summary.yield_rows,
        cpk_rows = summary.cpk_rows,
        flagged_rows = summary.flagged_rows,
        "exported IPQC report"
    );
    Ok(summary)
}
