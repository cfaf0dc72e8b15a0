use crate::{AsValue, DriverResult};
use std::fmt::Display;

/// A backend-prepared statement accepting positional parameters.
///
/// * `bind` appends a value (the driver chooses the actual placeholder numbering).
/// * `bind_index` sets the parameter at `index` (from 1, like the `?` placeholders).
///
/// Methods return `&mut Self` for fluent chaining:
/// ```rust,ignore
/// prepared.bind(42)?.bind("hello")?;
/// ```
pub trait Prepared: Send + Display {
    fn bind<V: AsValue>(&mut self, value: V) -> DriverResult<&mut Self>;
    fn bind_index<V: AsValue>(&mut self, value: V, index: u64) -> DriverResult<&mut Self>;
}
