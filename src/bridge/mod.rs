use duckdb::vtab::Value;
use libduckdb_sys::{
    duckdb_free, duckdb_get_bool, duckdb_get_double, duckdb_get_list_child, duckdb_get_list_size,
    duckdb_get_map_key, duckdb_get_map_size, duckdb_get_map_value, duckdb_get_uint32,
    duckdb_get_varchar, duckdb_value,
};
use std::{ffi::CStr, os::raw::c_void};

/// Typed accessors for named-parameter values that `duckdb::vtab::Value`
/// does not expose: lists, maps and the scalar getters.
///
/// # Safety Warning
///
/// Every accessor goes through [`get_value_ptr`](ValueBridge::get_value_ptr),
/// which reinterprets the `Value` wrapper as the raw `duckdb_value` it holds.
pub(crate) trait ValueBridge {
    /// Extracts the raw `duckdb_value` pointer from the `Value` struct.
    ///
    /// # Safety
    ///
    /// Relies on `Value` being a plain wrapper around a single `duckdb_value`
    /// field. Any change to that layout in duckdb-rs makes this undefined
    /// behavior, so the duckdb crate version is pinned in `Cargo.toml`.
    unsafe fn get_value_ptr(&self) -> duckdb_value;

    /// Returns the value as a boolean
    fn to_bool(&self) -> bool {
        unsafe { duckdb_get_bool(self.get_value_ptr()) }
    }

    /// Returns the value as an u32
    fn to_uint32(&self) -> u32 {
        unsafe { duckdb_get_uint32(self.get_value_ptr()) }
    }

    /// Returns the value as a double
    fn to_double(&self) -> f64 {
        unsafe { duckdb_get_double(self.get_value_ptr()) }
    }

    /// Returns the value as a String
    fn to_varchar(&self) -> String {
        unsafe {
            let varchar = duckdb_get_varchar(self.get_value_ptr());
            let string = CStr::from_ptr(varchar).to_string_lossy().into_owned();
            duckdb_free(varchar as *mut c_void);
            string
        }
    }

    /// Returns the children of a LIST value
    fn to_list(&self) -> Vec<Value> {
        unsafe {
            let size = duckdb_get_list_size(self.get_value_ptr());
            (0..size)
                .map(|index| Value::from(duckdb_get_list_child(self.get_value_ptr(), index)))
                .collect()
        }
    }

    /// Returns the key & value entries of a MAP value in declaration order
    fn to_map_entries(&self) -> Vec<(Value, Value)> {
        unsafe {
            let size = duckdb_get_map_size(self.get_value_ptr());
            (0..size)
                .map(|index| {
                    (
                        Value::from(duckdb_get_map_key(self.get_value_ptr(), index)),
                        Value::from(duckdb_get_map_value(self.get_value_ptr(), index)),
                    )
                })
                .collect()
        }
    }
}

impl ValueBridge for Value {
    /// Reinterprets `&Value` as the `duckdb_value` it wraps.
    unsafe fn get_value_ptr(&self) -> duckdb_value {
        *(self as *const Value as *const duckdb_value)
    }
}
