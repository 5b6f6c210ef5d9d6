//! Error types.
//!
//! Only configuration and initialization can fail. Once an instance is running,
//! the control layer degrades to inert controls instead of returning errors.

use thiserror::Error;

use crate::types::ElementId;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A role or slide selector could not be parsed.
    #[error("invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },

    /// An option value could not be interpreted.
    #[error("invalid value `{value}` for option `{option}`")]
    InvalidOption { option: String, value: String },

    #[error("invalid options json: {0}")]
    Json(#[from] serde_json::Error),

    /// The element handle does not refer to a live element.
    #[error("element {0} is not in the document")]
    UnknownElement(ElementId),

    /// The container already owns a running slideshow.
    #[error("element {0} already hosts a slideshow")]
    AlreadyInitialized(ElementId),
}

impl Error {
    pub(crate) fn selector(selector: &str, reason: impl Into<String>) -> Self {
        Self::Selector {
            selector: selector.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_option(option: &str, value: &str) -> Self {
        Self::InvalidOption {
            option: option.to_string(),
            value: value.to_string(),
        }
    }
}
