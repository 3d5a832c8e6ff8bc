//! # Spreadsheet Reading Module
//!
//! Opens Excel (.xlsx, .xlsm, .xlam, .xlsb, .xls, .xla) and OpenDocument
//! (.ods) workbooks through calamine and materializes worksheets as dense
//! [`Sheet`] grids for the layout heuristics.
use crate::spreadsheet::SpreadsheetError::InvalidFileFormat;
use calamine::{
    open_workbook, Data, Ods, OdsError, Range, Reader, Xls, XlsError, Xlsb, XlsbError, Xlsx,
    XlsxError,
};
use std::ffi::OsStr;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;

pub mod cell;
pub mod sheet;

pub use cell::Cell;
pub use sheet::Sheet;

/// Errors raised while opening a workbook or reading one of its sheets.
#[derive(Error, Debug)]
pub enum SpreadsheetError {
    /// Error in Excel 2007+ format (.xlsx, .xlsm, .xlam)
    #[error("Invalid xlsx file format: {0}")]
    InvalidXlsxFileFormat(#[from] XlsxError),

    /// Error in Excel Binary format (.xlsb)
    #[error("Invalid xlsb file format: {0}")]
    InvalidXlsbFileFormat(#[from] XlsbError),

    /// Error in legacy Excel format (.xls, .xla)
    #[error("Invalid xls file format: {0}")]
    InvalidXlsFileFormat(#[from] XlsError),

    /// Error in OpenDocument format (.ods)
    #[error("Invalid ods file format: {0}")]
    InvalidOdsFileFormat(#[from] OdsError),

    /// Unsupported or unrecognized file format
    #[error("Cannot detect file format for '{name}'")]
    InvalidFileFormat { name: String },

    /// The workbook contains no worksheet at all
    #[error("Spreadsheet contains no sheets")]
    NoSheets,
}

/// Type alias for buffered file reader
pub type FileReader = BufReader<File>;

/// Wrapper over the calamine readers of every supported format.
pub enum Spreadsheet {
    /// Excel 2007+ format reader (.xlsx, .xlsm, .xlam)
    Xlsx(Xlsx<FileReader>),
    /// Excel Binary format reader (.xlsb)
    Xlsb(Xlsb<FileReader>),
    /// Legacy Excel format reader (.xls, .xla)
    Xls(Xls<FileReader>),
    /// OpenDocument format reader (.ods)
    Ods(Ods<FileReader>),
}

impl Spreadsheet {
    /// Opens a spreadsheet file, choosing the reader from the file extension.
    pub fn open<P>(path: P) -> Result<Spreadsheet, SpreadsheetError>
    where
        P: AsRef<Path>,
    {
        let extension = path
            .as_ref()
            .extension()
            .and_then(OsStr::to_str)
            .map(str::to_ascii_lowercase);
        let spreadsheet = match extension.as_deref() {
            Some("xlsx") | Some("xlsm") | Some("xlam") => Self::Xlsx(open_workbook(path)?),
            Some("xlsb") => Self::Xlsb(open_workbook(path)?),
            Some("xls") | Some("xla") => Self::Xls(open_workbook(path)?),
            Some("ods") => Self::Ods(open_workbook(path)?),
            _ => {
                return Err(InvalidFileFormat {
                    name: path.as_ref().to_string_lossy().to_string(),
                })
            }
        };
        if spreadsheet.sheet_names().is_empty() {
            return Err(SpreadsheetError::NoSheets);
        }
        Ok(spreadsheet)
    }

    /// Returns the names of all sheets in workbook order.
    pub fn sheet_names(&self) -> Vec<String> {
        match self {
            Self::Xlsx(xlsx) => xlsx.sheet_names(),
            Self::Xlsb(xlsb) => xlsb.sheet_names(),
            Self::Xls(xls) => xls.sheet_names(),
            Self::Ods(ods) => ods.sheet_names(),
        }
    }

    /// Reads a whole worksheet into a [`Sheet`].
    pub fn read_sheet(&mut self, sheet_name: &str) -> Result<Sheet, SpreadsheetError> {
        let range: Range<Data> = match self {
            Self::Xlsx(xlsx) => xlsx.worksheet_range(sheet_name)?,
            Self::Xlsb(xlsb) => xlsb.worksheet_range(sheet_name)?,
            Self::Xls(xls) => xls.worksheet_range(sheet_name)?,
            Self::Ods(ods) => ods.worksheet_range(sheet_name)?,
        };
        Ok(Sheet::from_range(sheet_name, &range))
    }
}
