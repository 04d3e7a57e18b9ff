//! Query error taxonomy.

use std::fmt::Display;

use thiserror::Error;
use violence_map_geography::GeoError;
use violence_map_query_models::InvalidPeriodError;

/// Message returned to callers in place of an internal fault's details.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal error while processing the request.";

/// Errors returned by the query operations.
#[derive(Debug, Error)]
pub enum QueryError {
    /// A required input file is absent.
    #[error("Not found: {message}")]
    NotFound {
        /// What is missing.
        message: String,
    },

    /// The year, month or municipality name is malformed.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// What is wrong with the argument.
        message: String,
    },

    /// A processing fault with no safe default.
    #[error("Internal error: {message}")]
    Internal {
        /// Underlying cause. Logged, never returned to callers.
        message: String,
    },
}

impl QueryError {
    /// Builds an [`QueryError::Internal`] and logs its cause.
    pub fn internal(cause: impl Display) -> Self {
        let message = cause.to_string();
        log::error!("Internal query error: {message}");
        Self::Internal { message }
    }

    /// Builds an [`QueryError::InvalidArgument`].
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Message safe to show to an external caller.
    #[must_use]
    pub fn public_message(&self) -> &str {
        match self {
            Self::NotFound { message } | Self::InvalidArgument { message } => message,
            Self::Internal { .. } => INTERNAL_ERROR_MESSAGE,
        }
    }
}

impl From<GeoError> for QueryError {
    fn from(value: GeoError) -> Self {
        match value {
            GeoError::MapDataUnavailable { .. } => {
                log::error!("{value}");
                Self::NotFound {
                    message: "Municipal boundary file not found.".to_string(),
                }
            }
            other => Self::internal(other),
        }
    }
}

impl From<InvalidPeriodError> for QueryError {
    fn from(value: InvalidPeriodError) -> Self {
        Self::invalid_argument(value.to_string())
    }
}
