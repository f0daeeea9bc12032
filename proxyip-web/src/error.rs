//! HTTP-facing error type.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use proxyip_checker::CheckerError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Missing 'proxyip' parameter")]
    MissingParameter,

    #[error(transparent)]
    Checker(#[from] CheckerError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingParameter | Self::Checker(CheckerError::ValidationError(_)) => {
                StatusCode::BAD_REQUEST
            }
            Self::Checker(CheckerError::ResolutionError(_)) | Self::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            success: false,
            error: self.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::MissingParameter.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(CheckerError::ValidationError("empty".to_string())).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(CheckerError::ResolutionError("down".to_string())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_message_passthrough() {
        let err = ApiError::from(CheckerError::ResolutionError("DoH down".to_string()));
        assert_eq!(err.to_string(), "Resolution error: DoH down");
    }
}
