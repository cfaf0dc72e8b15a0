use crate::{
    CBox, SqliteDriver, SqlitePrepared, error_message_from_ptr,
    extract::{extract_name, extract_value},
};
use async_stream::try_stream;
use dray_core::{
    Connection, Context, Driver, DriverError, DriverResult, Error, Executor, Prepared, Query,
    QueryResult, Row, RowLabeled, RowNames, RowsAffected, stream::Stream, truncate_long,
};
use libsqlite3_sys::{
    SQLITE_BUSY, SQLITE_CONSTRAINT, SQLITE_DONE, SQLITE_OK, SQLITE_OPEN_CREATE,
    SQLITE_OPEN_READWRITE, SQLITE_OPEN_URI, SQLITE_ROW, sqlite3, sqlite3_busy_timeout,
    sqlite3_close, sqlite3_column_count, sqlite3_errmsg, sqlite3_finalize,
    sqlite3_last_insert_rowid, sqlite3_open_v2, sqlite3_prepare_v2, sqlite3_step,
    sqlite3_stmt_readonly, sqlite3_total_changes64,
};
use std::{
    ffi::{CStr, CString},
    ptr,
    sync::atomic::{AtomicPtr, Ordering},
};
use tokio::task::{spawn_blocking, yield_now};

/// Milliseconds a statement waits on a locked database before failing.
const BUSY_TIMEOUT: i32 = 5_000;

pub struct SqliteConnection {
    pub(crate) connection: CBox<sqlite3>,
}

impl SqliteConnection {
    /// Compile a single statement on the blocking pool.
    pub async fn prepare(&mut self, sql: String) -> DriverResult<SqlitePrepared> {
        let connection = AtomicPtr::new(*self.connection);
        let context = format!("While preparing the query:\n{}", truncate_long!(sql));
        let statement = spawn_blocking(move || unsafe {
            let connection = connection.load(Ordering::Relaxed);
            let sql = CString::new(sql).context("Could not create a CString from the query")?;
            let mut statement = CBox::new(ptr::null_mut(), |p| {
                sqlite3_finalize(p);
            });
            let mut tail = ptr::null();
            let rc = sqlite3_prepare_v2(connection, sql.as_ptr(), -1, &mut *statement, &mut tail);
            if rc != SQLITE_OK {
                return Err(DriverError::msg(
                    error_message_from_ptr(&sqlite3_errmsg(connection)).to_string(),
                ));
            }
            if statement.is_null() {
                return Err(DriverError::msg("The query does not contain any statement"));
            }
            if !tail.is_null()
                && !CStr::from_ptr(tail)
                    .to_bytes()
                    .iter()
                    .all(u8::is_ascii_whitespace)
            {
                return Err(DriverError::msg(
                    "Cannot prepare more than one statement at a time",
                ));
            }
            Ok(statement)
        })
        .await
        .context("The prepare task did not complete")?
        .context(context)?;
        Ok(SqlitePrepared::new(statement))
    }

    fn step_error(&self, rc: i32) -> DriverError {
        let message =
            error_message_from_ptr(&unsafe { sqlite3_errmsg(*self.connection) }).to_string();
        if rc & 0xff == SQLITE_CONSTRAINT {
            DriverError::new(Error::ConstraintViolation(message))
        } else {
            DriverError::msg(message)
        }
    }
}

impl Executor for SqliteConnection {
    type Driver = SqliteDriver;

    fn driver(&self) -> &Self::Driver {
        &SqliteDriver {}
    }

    fn run(&mut self, query: Query) -> impl Stream<Item = DriverResult<QueryResult>> + Send {
        try_stream! {
            let Query { sql, bindings } = query;
            let mut prepared = self.prepare(sql).await?;
            for value in bindings {
                prepared.bind(value)?;
            }
            let count = unsafe { sqlite3_column_count(*prepared.statement) };
            let labels = (0..count)
                .map(|i| extract_name(*prepared.statement, i))
                .collect::<DriverResult<RowNames>>()?;
            let before = unsafe { sqlite3_total_changes64(*self.connection) };
            loop {
                let rc = unsafe { sqlite3_step(*prepared.statement) };
                match rc {
                    SQLITE_ROW => {
                        let values = (0..count)
                            .map(|i| extract_value(*prepared.statement, i))
                            .collect::<DriverResult<Row>>()?;
                        yield QueryResult::Row(RowLabeled::new(labels.clone(), values));
                    }
                    SQLITE_DONE => break,
                    SQLITE_BUSY => yield_now().await,
                    _ => Err::<(), DriverError>(self.step_error(rc))?,
                }
            }
            let rows_affected = if unsafe { sqlite3_stmt_readonly(*prepared.statement) } != 0 {
                0
            } else {
                let after = unsafe { sqlite3_total_changes64(*self.connection) };
                (after - before).max(0) as u64
            };
            let last_affected_id = (rows_affected > 0)
                .then(|| unsafe { sqlite3_last_insert_rowid(*self.connection) });
            yield QueryResult::Affected(RowsAffected {
                rows_affected,
                last_affected_id,
                columns: count.max(0) as usize,
            });
        }
    }
}

impl Connection for SqliteConnection {
    /// Opens `sqlite://<path>`, where the path is a SQLite URI filename:
    /// `:memory:` and query parameters like `?mode=ro` are supported.
    async fn connect(url: &str) -> DriverResult<SqliteConnection> {
        let prefix = format!("{}://", <Self::Driver as Driver>::NAME);
        let Some(location) = url.strip_prefix(&prefix) else {
            return Err(DriverError::msg(format!(
                "Expected sqlite connection url to start with `{}`",
                prefix
            )));
        };
        let filename = CString::new(format!("file:{}", location))
            .with_context(|| format!("Error while decoding connection URL: `{}`", url))?;
        let mut connection = CBox::new(ptr::null_mut(), |p| unsafe {
            sqlite3_close(p);
        });
        let rc = unsafe {
            sqlite3_open_v2(
                filename.as_ptr(),
                &mut *connection,
                SQLITE_OPEN_READWRITE | SQLITE_OPEN_CREATE | SQLITE_OPEN_URI,
                ptr::null(),
            )
        };
        if rc != SQLITE_OK {
            let message = if connection.is_null() {
                "Could not allocate the connection".to_string()
            } else {
                error_message_from_ptr(&unsafe { sqlite3_errmsg(*connection) }).to_string()
            };
            return Err(DriverError::msg(message).context(format!("Cannot open `{}`", url)));
        }
        unsafe {
            sqlite3_busy_timeout(*connection, BUSY_TIMEOUT);
        }
        log::debug!("Connected to {}", url);
        Ok(Self { connection })
    }
}
