mod as_value;
mod config;
mod connection;
mod database;
mod decode_type;
mod driver;
mod error;
mod executor;
mod model;
mod prepared;
mod query;
mod response;
mod sql_writer;
mod temporal;
mod util;
mod value;

pub use ::anyhow::{self, Context};
pub use as_value::*;
pub use config::*;
pub use connection::*;
pub use database::{DEBUG_EXIT_CODE, Database};
pub use decode_type::*;
pub use driver::*;
pub use error::*;
pub use executor::*;
pub use model::*;
pub use prepared::*;
pub use query::*;
pub use response::*;
pub use sql_writer::*;
pub use temporal::{
    date_format, date_time_format, parse_date, parse_date_time, parse_time, time_format,
};
pub use util::*;
pub use value::*;
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;

/// Result of the driver facing traits. Drivers attach context freely, the
/// execution layer turns failures into a [`QueryResponse`].
pub type DriverResult<T> = anyhow::Result<T>;
pub type DriverError = anyhow::Error;
