use thiserror::Error;

/// Errors returned by the cookie store.
///
/// Each variant maps to a stable integer code ([`NetError::as_i32`]) so
/// callers can pass errors across boundaries that only carry an `i32`.
/// Codes without a variant round-trip through [`NetError::Unknown`].
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum NetError {
    // Argument Errors
    #[error("Invalid argument")]
    InvalidArgument,

    // URL Errors
    #[error("Invalid URL")]
    InvalidUrl,

    #[error("Unknown error: {0}")]
    Unknown(i32),
}

impl NetError {
    pub fn as_i32(&self) -> i32 {
        match self {
            NetError::InvalidArgument => -4,
            NetError::InvalidUrl => -300,
            NetError::Unknown(code) => *code,
        }
    }
}

impl From<i32> for NetError {
    fn from(code: i32) -> Self {
        match code {
            -4 => NetError::InvalidArgument,
            -300 => NetError::InvalidUrl,
            _ => NetError::Unknown(code),
        }
    }
}

impl From<url::ParseError> for NetError {
    fn from(_: url::ParseError) -> Self {
        NetError::InvalidUrl
    }
}
