//! # CPK Table Function
//!
//! `ipqc_cpk(file)` returns one row per station, dimension and measurement
//! group. `CPK` is NULL when the index is undefined, and so is
//! `Below Threshold`.
extern crate duckdb;
extern crate duckdb_loadable_macros;
extern crate libduckdb_sys;

use crate::engine::CpkRecord;
use crate::extension::{next_chunk, set_primitive, set_varchar, ReportParameters};
use anyhow::Result;
use duckdb::{
    core::{DataChunkHandle, LogicalTypeHandle, LogicalTypeId},
    vtab::{BindInfo, InitInfo, TableFunctionInfo, VTab},
};
use std::{error::Error, sync::atomic::AtomicUsize};

const COLUMNS: [(&str, LogicalTypeId); 9] = [
    ("Station", LogicalTypeId::Varchar),
    ("Dim No", LogicalTypeId::Varchar),
    ("Config", LogicalTypeId::Varchar),
    ("Date", LogicalTypeId::Varchar),
    ("Sample Size", LogicalTypeId::Bigint),
    ("USL", LogicalTypeId::Double),
    ("LSL", LogicalTypeId::Double),
    ("CPK", LogicalTypeId::Double),
    ("Below Threshold", LogicalTypeId::Boolean),
];

#[repr(C)]
pub(crate) struct CpkBindData {
    records: Vec<CpkRecord>,
    threshold: f64,
}

#[repr(C)]
pub(crate) struct CpkInitData {
    /// Index of the next record to emit
    row: AtomicUsize,
}

pub(crate) struct CpkTableFunction;

impl VTab for CpkTableFunction {
    type InitData = CpkInitData;
    type BindData = CpkBindData;

    fn bind(bind: &BindInfo) -> Result<Self::BindData, Box<dyn Error>> {
        let parameters = ReportParameters::from(bind);
        let (config, report) = parameters.analyze()?;
        for (name, kind) in COLUMNS {
            bind.add_result_column(name, LogicalTypeHandle::from(kind));
        }
        Ok(CpkBindData {
            records: report.cpks,
            threshold: config.threshold,
        })
    }

    fn init(_: &InitInfo) -> Result<Self::InitData, Box<dyn Error>> {
        Ok(CpkInitData {
            row: AtomicUsize::new(0),
        })
    }

    fn func(func: &TableFunctionInfo<Self>, output: &mut DataChunkHandle) -> Result<(), Box<dyn Error>> {
        let bind = func.get_bind_data();
        let init = func.get_init_data();
        let chunk = next_chunk(&init.row, bind.records.len());

        let mut vectors: Vec<_> = (0..COLUMNS.len()).map(|index| output.flat_vector(index)).collect();
        for (index, record) in bind.records[chunk.clone()].iter().enumerate() {
            set_varchar(&mut vectors[0], index, Some(&record.station));
            set_varchar(&mut vectors[1], index, Some(&record.dimension));
            set_varchar(&mut vectors[2], index, record.config.as_deref());
            set_varchar(&mut vectors[3], index, Some(&record.date));
            set_primitive(&mut vectors[4], index, Some(record.sample_size as i64));
            set_primitive(&mut vectors[5], index, record.usl);
            set_primitive(&mut vectors[6], index, record.lsl);
            set_primitive(&mut vectors[7], index, record.cpk);
            let flagged = record.cpk.map(|_| record.is_flagged(bind.threshold));
            set_primitive(&mut vectors[8], index, flagged);
        }
        output.set_len(chunk.len());
        Ok(())
    }

    fn parameters() -> Option<Vec<LogicalTypeHandle>> {
        Some(vec![LogicalTypeHandle::from(LogicalTypeId::Varchar)])
    }

    fn named_parameters() -> Option<Vec<(String, LogicalTypeHandle)>> {
        Some(ReportParameters::definitions())
    }
}
