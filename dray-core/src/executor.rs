use crate::{Driver, DriverResult, Query, QueryResult, SqlWriter, Value, stream::Stream};

/// The capability the execution layer consumes from a live connection.
pub trait Executor: Send + Sized {
    type Driver: Driver;

    fn driver(&self) -> &Self::Driver;

    /// Send one statement, binding `query.bindings` to its placeholders in
    /// order. Emits every returned row, then one `Affected` item carrying the
    /// affected row count, the last generated identity and the result width.
    fn run(&mut self, query: Query) -> impl Stream<Item = DriverResult<QueryResult>> + Send;

    /// Render a scalar as a literal that is safe to splice into SQL text.
    fn escape(&self, value: &Value) -> String {
        let mut out = String::new();
        self.driver().sql_writer().write_value(&mut out, value);
        out
    }
}
