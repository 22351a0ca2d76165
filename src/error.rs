use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::error;
use thiserror::Error;

#[derive(Debug)]
pub struct InternalError {
    pub message: String,
}

impl InternalError {
    pub fn new(message: String) -> InternalError {
        InternalError { message }
    }
}

impl IntoResponse for InternalError {
    fn into_response(self) -> Response {
        error!(
            "Error encountered while processing request: {}",
            self.message
        );
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}

/// Failure of one load sequence. The `Display` text is what the dashboard
/// shows; the reason fields only end up in the log.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    #[error("Failed to fetch coordinates")]
    CoordinatesRequestFailed { reason: String },
    #[error("City not found")]
    CityNotFound { city: String },
    #[error("Failed to fetch current weather")]
    WeatherRequestFailed { reason: String },
}

impl LoadError {
    pub fn coordinates<E: ToString>(reason: E) -> LoadError {
        LoadError::CoordinatesRequestFailed {
            reason: reason.to_string(),
        }
    }

    pub fn weather<E: ToString>(reason: E) -> LoadError {
        LoadError::WeatherRequestFailed {
            reason: reason.to_string(),
        }
    }

    pub fn reason(&self) -> String {
        match self {
            LoadError::CoordinatesRequestFailed { reason } => reason.clone(),
            LoadError::CityNotFound { city } => format!("no geocoding match for '{city}'"),
            LoadError::WeatherRequestFailed { reason } => reason.clone(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            LoadError::CityNotFound { .. } => StatusCode::NOT_FOUND,
            LoadError::CoordinatesRequestFailed { .. } | LoadError::WeatherRequestFailed { .. } => {
                StatusCode::BAD_GATEWAY
            }
        }
    }
}
