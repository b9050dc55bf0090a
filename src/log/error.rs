//! Errors produced by [`Logger::log_error`](super::Logger::log_error) and
//! [`Logger::log_errorf`](super::Logger::log_errorf).

use std::error::Error as StdError;

use thiserror::Error;

pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// An error that has already been logged.
#[derive(Debug, Error)]
pub enum Error {
    /// Built from the log message alone.
    #[error("{0}")]
    Message(String),

    /// A combined message that still links back to the error it wraps.
    #[error("{message}")]
    Wrapped {
        message: String,
        #[source]
        source: BoxError,
    },

    /// A caller-supplied error handed back unchanged.
    #[error(transparent)]
    Other(BoxError),
}

impl Error {
    /// The caller's original error, for [`Error::Other`] and
    /// [`Error::Wrapped`].
    pub fn into_inner(self) -> Option<BoxError> {
        match self {
            Error::Message(_) => None,
            Error::Wrapped { source, .. } | Error::Other(source) => Some(source),
        }
    }

    /// Downcasts the inner error of [`Error::Other`] or [`Error::Wrapped`].
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        match self {
            Error::Message(_) => None,
            Error::Wrapped { source, .. } | Error::Other(source) => source.downcast_ref::<E>(),
        }
    }
}

/// Substitutes the error text into the first `{}` of `template`, or
/// appends it as `template: err` when there is no placeholder.
pub fn wrap_message(template: &str, err: &dyn StdError) -> String {
    match template.find("{}") {
        Some(at) => format!("{}{}{}", &template[..at], err, &template[at + 2..]),
        None if template.is_empty() => err.to_string(),
        None => format!("{template}: {err}"),
    }
}
