//! Error type for lazily evaluated computations.
//!
//! [`EvalError`] is the error channel of [`Eval`](super::Eval). It covers
//! errors raised on purpose, panics captured while a thunk was being
//! evaluated, and reentrant forcing of a memoized value.

use std::any::Any;
use std::fmt;

/// Represents a failure observed while forcing an `Eval`.
///
/// # Examples
///
/// ```rust
/// use suspension::control::EvalError;
///
/// let error = EvalError::raised("disk full");
/// assert_eq!(error.message(), "disk full");
/// assert!(!error.is_panic());
/// assert_eq!(format!("{error}"), "disk full");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// An error raised explicitly through `raise_error`.
    Raised(String),
    /// A thunk, continuation or handler panicked while being evaluated.
    Panicked(String),
    /// A memoized value was forced again while its thunk was still running.
    Reentrant,
}

impl EvalError {
    /// Creates a declared error with the given message.
    pub fn raised(message: impl Into<String>) -> Self {
        Self::Raised(message.into())
    }

    /// Creates a declared error from any error value, keeping its message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use suspension::control::EvalError;
    ///
    /// let parse_error = "x".parse::<i32>().unwrap_err();
    /// let error = EvalError::from_error(&parse_error);
    /// assert_eq!(error.message(), "invalid digit found in string");
    /// ```
    pub fn from_error(error: &dyn std::error::Error) -> Self {
        Self::Raised(error.to_string())
    }

    /// Converts a panic payload into an error value.
    pub(crate) fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|message| (*message).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        Self::Panicked(message)
    }

    /// Returns the message carried by this error.
    pub fn message(&self) -> &str {
        match self {
            Self::Raised(message) | Self::Panicked(message) => message.as_str(),
            Self::Reentrant => "memoized value forced during its own evaluation",
        }
    }

    /// Returns `true` if this error was captured from a panic.
    #[inline]
    pub const fn is_panic(&self) -> bool {
        matches!(self, Self::Panicked(_))
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raised(message) => write!(formatter, "{message}"),
            Self::Panicked(message) => write!(formatter, "evaluation panicked: {message}"),
            Self::Reentrant => write!(formatter, "{}", self.message()),
        }
    }
}

impl std::error::Error for EvalError {}
