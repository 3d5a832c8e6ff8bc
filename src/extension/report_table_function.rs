//! # Report Export Table Function
//!
//! `ipqc_report(file, output)` builds the report and writes it to the
//! `output` xlsx workbook, returning a single summary row.
extern crate duckdb;
extern crate duckdb_loadable_macros;
extern crate libduckdb_sys;

use crate::error::{IpqcError, ResultMessage};
use crate::export::{write_report, ExportSummary};
use crate::extension::ExtensionError::InvalidParameter;
use crate::extension::{set_primitive, set_varchar, ReportParameters};
use anyhow::Result;
use duckdb::{
    core::{DataChunkHandle, LogicalTypeHandle, LogicalTypeId},
    vtab::{BindInfo, InitInfo, TableFunctionInfo, VTab},
};
use std::{
    error::Error,
    path::Path,
    sync::atomic::{AtomicBool, Ordering},
};

/// Accepts only paths the xlsx writer can produce.
fn validate_output(output: &str) -> Result<(), IpqcError> {
    let is_xlsx = Path::new(output)
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case("xlsx"));
    if !is_xlsx {
        return Err(InvalidParameter {
            name: "output".to_string(),
            message: format!("'{output}' is not an .xlsx path"),
        }
        .into());
    }
    Ok(())
}

#[repr(C)]
pub(crate) struct ReportBindData {
    output: String,
    summary: ExportSummary,
}

#[repr(C)]
pub(crate) struct ReportInitData {
    /// Whether the summary row has been returned
    done: AtomicBool,
}

pub(crate) struct ReportTableFunction;

impl VTab for ReportTableFunction {
    type InitData = ReportInitData;
    type BindData = ReportBindData;

    /// Builds and exports the report; nothing is written when the analysis fails.
    fn bind(bind: &BindInfo) -> Result<Self::BindData, Box<dyn Error>> {
        let parameters = ReportParameters::from(bind);
        let output = bind.get_parameter(1).to_string();
        validate_output(&output)?;
        let (config, report) = parameters.analyze()?;
        let summary = write_report(&report, &output, &config)
            .map_err(IpqcError::from)
            .with_prefix(&output)?;

        bind.add_result_column("output", LogicalTypeHandle::from(LogicalTypeId::Varchar));
        bind.add_result_column("yield_rows", LogicalTypeHandle::from(LogicalTypeId::Bigint));
        bind.add_result_column("cpk_rows", LogicalTypeHandle::from(LogicalTypeId::Bigint));
        bind.add_result_column("flagged_rows", LogicalTypeHandle::from(LogicalTypeId::Bigint));
        Ok(ReportBindData { output, summary })
    }

    fn init(_: &InitInfo) -> Result<Self::InitData, Box<dyn Error>> {
        Ok(ReportInitData {
            done: AtomicBool::new(false),
        })
    }

    fn func(func: &TableFunctionInfo<Self>, output: &mut DataChunkHandle) -> Result<(), Box<dyn Error>> {
        let init = func.get_init_data();
        let bind = func.get_bind_data();

        // Single row function
        if init.done.swap(true, Ordering::Relaxed) {
            output.set_len(0);
        } else {
            set_varchar(&mut output.flat_vector(0), 0, Some(&bind.output));
            set_primitive(&mut output.flat_vector(1), 0, Some(bind.summary.yield_rows as i64));
            set_primitive(&mut output.flat_vector(2), 0, Some(bind.summary.cpk_rows as i64));
            set_primitive(&mut output.flat_vector(3), 0, Some(bind.summary.flagged_rows as i64));
            output.set_len(1);
        }
        Ok(())
    }

    /// Workbook path and output xlsx path
    fn parameters() -> Option<Vec<LogicalTypeHandle>> {
        Some(vec![
            LogicalTypeHandle::from(LogicalTypeId::Varchar),
            LogicalTypeHandle::from(LogicalTypeId::Varchar),
        ])
    }

    fn named_parameters() -> Option<Vec<(String, LogicalTypeHandle)>> {
        Some(ReportParameters::definitions())
    }
}
