/// Error returned by the execution and model layers.
///
/// A lookup that matches nothing is not an error: it returns `Ok(None)`.
/// `NotFound` is reserved to the helpers that require a row to exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A row that had to exist was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// The driver rejected the statement because of a unique, primary key or
    /// other constraint.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
    /// Any other statement failure, carries the driver message.
    #[error("query error: {0}")]
    Query(String),
    /// The call itself was malformed (missing identity, empty arguments,
    /// unknown field).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// A value could not be converted into the requested Rust type.
    #[error("decode error: {0}")]
    Decode(String),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(..))
    }
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Error::ConstraintViolation(..))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
