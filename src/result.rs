//! Error classification shared by every module error.
//!
//! Each module owns its own error enum carrying the offending values. A sweep
//! driver that only needs to decide between skipping, retrying with other
//! hyperparameters, or aborting can ask any of them for its [`ErrorKind`].

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ErrorKind {
    /// One or more of the supplied parameters is outside its domain
    InvalidParameter,
    /// A non-finite value appeared during a computation
    NumericalInstability,
    /// Shapes of the inputs are inconsistent with one another
    DimensionMismatch,
    /// The requested model or algorithm is not supported
    NotImplemented,
}

impl ErrorKind {
    pub fn as_str(&self) -> &str {
        match self {
            ErrorKind::InvalidParameter => "invalid parameter",
            ErrorKind::NumericalInstability => "numerical instability",
            ErrorKind::DimensionMismatch => "dimension mismatch",
            ErrorKind::NotImplemented => "not implemented",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that can report which [`ErrorKind`] they belong to
pub trait Classify: std::error::Error {
    fn kind(&self) -> ErrorKind;
}
