//! # Yield Table Function
//!
//! `ipqc_yield(file)` returns one row per station with an OK/NG verdict
//! column, in station catalog order.
extern crate duckdb;
extern crate duckdb_loadable_macros;
extern crate libduckdb_sys;

use crate::engine::YieldRecord;
use crate::extension::{next_chunk, set_primitive, set_varchar, ReportParameters};
use anyhow::Result;
use duckdb::{
    core::{DataChunkHandle, LogicalTypeHandle, LogicalTypeId},
    vtab::{BindInfo, InitInfo, TableFunctionInfo, VTab},
};
use std::{error::Error, sync::atomic::AtomicUsize};

#[repr(C)]
pub(crate) struct YieldBindData {
    records: Vec<YieldRecord>,
}

#[repr(C)]
pub(crate) struct YieldInitData {
    /// Index of the next record to emit
    row: AtomicUsize,
}

pub(crate) struct YieldTableFunction;

impl VTab for YieldTableFunction {
    type InitData = YieldInitData;
    type BindData = YieldBindData;

    /// Runs the whole report and registers the yield columns.
    fn bind(bind: &BindInfo) -> Result<Self::BindData, Box<dyn Error>> {
        let parameters = ReportParameters::from(bind);
        let (_, report) = parameters.analyze()?;

        bind.add_result_column("Station", LogicalTypeHandle::from(LogicalTypeId::Varchar));
        bind.add_result_column("Total Qty", LogicalTypeHandle::from(LogicalTypeId::Bigint));
        bind.add_result_column("OK Qty", LogicalTypeHandle::from(LogicalTypeId::Bigint));
        bind.add_result_column("NG Qty", LogicalTypeHandle::from(LogicalTypeId::Bigint));
        bind.add_result_column("Yield", LogicalTypeHandle::from(LogicalTypeId::Double));
        bind.add_result_column("Yield%", LogicalTypeHandle::from(LogicalTypeId::Varchar));
        Ok(YieldBindData {
            records: report.yields,
        })
    }

    fn init(_: &InitInfo) -> Result<Self::InitData, Box<dyn Error>> {
        Ok(YieldInitData {
            row: AtomicUsize::new(0),
        })
    }

    fn func(func: &TableFunctionInfo<Self>, output: &mut DataChunkHandle) -> Result<(), Box<dyn Error>> {
        let bind = func.get_bind_data();
        let init = func.get_init_data();
        let chunk = next_chunk(&init.row, bind.records.len());
        let records = &bind.records[chunk.clone()];

        let mut station = output.flat_vector(0);
        let mut total = output.flat_vector(1);
        let mut ok = output.flat_vector(2);
        let mut ng = output.flat_vector(3);
        let mut ratio = output.flat_vector(4);
        let mut percent = output.flat_vector(5);
        for (index, record) in records.iter().enumerate() {
            set_varchar(&mut station, index, Some(&record.station));
            set_primitive(&mut total, index, Some(record.total as i64));
            set_primitive(&mut ok, index, Some(record.ok as i64));
            set_primitive(&mut ng, index, Some(record.ng as i64));
            set_primitive(&mut ratio, index, Some(record.ratio));
            set_varchar(&mut percent, index, Some(&record.percent()));
        }
        output.set_len(chunk.len());
        Ok(())
    }

    /// Single VARCHAR parameter for the workbook path
    fn parameters() -> Option<Vec<LogicalTypeHandle>> {
        Some(vec![LogicalTypeHandle::from(LogicalTypeId::Varchar)])
    }

    fn named_parameters() -> Option<Vec<(String, LogicalTypeHandle)>> {
        Some(ReportParameters::definitions())
    }
}
