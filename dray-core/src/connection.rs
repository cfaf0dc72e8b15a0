use crate::{DriverResult, Executor};
use std::future::Future;

pub trait Connection: Executor {
    /// Open a connection to the given URL. The URL scheme must match `Driver::NAME`.
    fn connect(url: &str) -> impl Future<Output = DriverResult<Self>> + Send;
}
