//! # DuckDB IPQC Report Extension
//!
//! A DuckDB extension that turns In-Process Quality Control (IPQC) inspection
//! workbooks into yield and process capability (CPK) reports directly in SQL.
//!
//! ## Features
//!
//! - **Multi-format input**: Excel (`.xls`, `.xlsx`, `.xlsm`, `.xlsb`, `.xla`, `.xlam`)
//!   and OpenDocument (`.ods`) workbooks with one sheet per station
//! - **Fuzzy station matching**: sheet names are matched against an ordered station
//!   catalog, with alias rules for names the catalog cannot match
//! - **Layout inference**: dimension, USL and LSL rows and the date column are
//!   located heuristically in every sheet
//! - **Capability analysis**: one- and two-sided CPK per dimension and per
//!   date (and config) group
//! - **xlsx export**: a two-sheet report with conditional highlighting of low CPK values
//!
//! ## Table Functions
//!
//! - `ipqc_yield`: OK/NG yield per station
//! - `ipqc_cpk`: capability index per station, dimension and measurement group
//! - `ipqc_report`: writes both tables to an xlsx workbook
extern crate duckdb;
extern crate duckdb_loadable_macros;
extern crate libduckdb_sys;

mod bridge;
pub mod config;
pub mod engine;
mod error;
pub mod export;
mod extension;
pub mod spreadsheet;

use crate::extension::cpk_table_function::CpkTableFunction;
use crate::extension::report_table_function::ReportTableFunction;
use crate::extension::yield_table_function::YieldTableFunction;
use anyhow::{Context, Result};
use duckdb::Connection;
use duckdb_loadable_macros::duckdb_entrypoint_c_api;

/// Extension entry point for DuckDB.
///
/// Registers `ipqc_yield`, `ipqc_cpk` and `ipqc_report` on the connection.
///
/// # Errors
///
/// Returns an error if any table function fails to register with DuckDB.
#[duckdb_entrypoint_c_api()]
pub unsafe fn extension_entrypoint(connection: Connection) -> Result<()> {
    connection
        .register_table_function::<YieldTableFunction>("ipqc_yield")
        .context("Failed to register ipqc_yield table function")?;
    connection
        .register_table_function::<CpkTableFunction>("ipqc_cpk")
        .context("Failed to register ipqc_cpk table function")?;
    connection
        .register_table_function::<ReportTableFunction>("ipqc_report")
        .context("Failed to register ipqc_report table function")?;
    Ok(())
}
