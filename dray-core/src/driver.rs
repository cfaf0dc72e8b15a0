use crate::{Connection, SqlWriter};

/// A backend: the connection type it opens and the SQL dialect it speaks.
pub trait Driver: Send + Sync {
    type Connection: Connection<Driver = Self>;
    type SqlWriter: SqlWriter;

    /// Scheme expected at the start of connection URLs (`<NAME>://...`).
    const NAME: &'static str;

    fn sql_writer(&self) -> Self::SqlWriter;
}
