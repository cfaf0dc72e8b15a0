use crate::{CBox, error_message_from_ptr};
use dray_core::{
    AsValue, DriverError, DriverResult, Prepared, Value, date_format, date_time_format,
    time_format, truncate_long,
};
use libsqlite3_sys::*;
use std::{
    ffi::{CStr, c_char, c_int, c_void},
    fmt::{self, Display},
};

pub struct SqlitePrepared {
    pub(crate) statement: CBox<sqlite3_stmt>,
    pub(crate) index: u64,
}

impl SqlitePrepared {
    pub(crate) fn new(statement: CBox<sqlite3_stmt>) -> Self {
        Self {
            statement,
            index: 1,
        }
    }

    fn bind_text(&mut self, index: c_int, value: &str) -> c_int {
        unsafe {
            sqlite3_bind_text(
                *self.statement,
                index,
                value.as_ptr() as *const c_char,
                value.len() as c_int,
                SQLITE_TRANSIENT(),
            )
        }
    }
}

impl Prepared for SqlitePrepared {
    fn bind<V: AsValue>(&mut self, value: V) -> DriverResult<&mut Self> {
        let index = self.index;
        self.bind_index(value, index)
    }

    fn bind_index<V: AsValue>(&mut self, v: V, index: u64) -> DriverResult<&mut Self> {
        let value = v.as_value();
        let index = c_int::try_from(index)
            .map_err(|_| DriverError::msg(format!("Parameter index {} is too large", index)))?;
        let statement = *self.statement;
        let rc = if value.is_null() {
            unsafe { sqlite3_bind_null(statement, index) }
        } else {
            match value {
                Value::Boolean(Some(v)) => unsafe { sqlite3_bind_int(statement, index, v as c_int) },
                Value::Int8(Some(v)) => unsafe { sqlite3_bind_int(statement, index, v as c_int) },
                Value::Int16(Some(v)) => unsafe { sqlite3_bind_int(statement, index, v as c_int) },
                Value::Int32(Some(v)) => unsafe { sqlite3_bind_int(statement, index, v) },
                Value::Int64(Some(v)) => unsafe { sqlite3_bind_int64(statement, index, v) },
                Value::UInt8(Some(v)) => unsafe { sqlite3_bind_int(statement, index, v as c_int) },
                Value::UInt16(Some(v)) => unsafe { sqlite3_bind_int(statement, index, v as c_int) },
                Value::UInt32(Some(v)) => unsafe { sqlite3_bind_int64(statement, index, v as i64) },
                Value::UInt64(Some(v)) => {
                    let Ok(v) = i64::try_from(v) else {
                        let error = DriverError::msg(format!(
                            "Cannot bind u64 value `{}` into a sqlite integer because it's out of bounds",
                            v
                        ));
                        log::error!("{:#}", error);
                        return Err(error);
                    };
                    unsafe { sqlite3_bind_int64(statement, index, v) }
                }
                Value::Float32(Some(v)) => unsafe { sqlite3_bind_double(statement, index, v as f64) },
                Value::Float64(Some(v)) => unsafe { sqlite3_bind_double(statement, index, v) },
                // Text keeps the exact digits
                Value::Decimal(Some(v)) => self.bind_text(index, &v.to_string()),
                Value::Varchar(Some(ref v)) => self.bind_text(index, v),
                Value::Blob(Some(ref v)) => unsafe {
                    sqlite3_bind_blob(
                        statement,
                        index,
                        v.as_ptr() as *const c_void,
                        v.len() as c_int,
                        SQLITE_TRANSIENT(),
                    )
                },
                Value::Date(Some(v)) => self.bind_text(index, &date_format(&v)),
                Value::Time(Some(v)) => self.bind_text(index, &time_format(&v)),
                Value::Timestamp(Some(v)) => self.bind_text(index, &date_time_format(&v)),
                Value::Uuid(Some(v)) => self.bind_text(index, &v.to_string()),
                _ => {
                    let error =
                        DriverError::msg(format!("Cannot use a {:?} as a query parameter", value));
                    log::error!("{:#}", error);
                    return Err(error);
                }
            }
        };
        if rc != SQLITE_OK {
            let error = unsafe {
                let db = sqlite3_db_handle(statement);
                let query = sqlite3_sql(statement);
                DriverError::msg(error_message_from_ptr(&sqlite3_errmsg(db)).to_string()).context(
                    format!(
                        "Cannot bind parameter {} to query:\n{}",
                        index,
                        truncate_long!(CStr::from_ptr(query).to_string_lossy())
                    ),
                )
            };
            log::error!("{:#}", error);
            return Err(error);
        }
        self.index = index as u64 + 1;
        Ok(self)
    }
}

impl Display for SqlitePrepared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sql = unsafe { sqlite3_sql(*self.statement) };
        if sql.is_null() {
            write!(f, "{:p}", *self.statement)
        } else {
            write!(
                f,
                "{}",
                truncate_long!(unsafe { CStr::from_ptr(sql) }.to_string_lossy())
            )
        }
    }
}
