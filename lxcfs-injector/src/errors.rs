use std::fmt::Display;

use http::StatusCode;
use lxcfs_common::errors::InjectorError;

/// Failures that end an admission exchange before a review can be returned.
#[derive(Debug)]
pub enum AdmissionError {
    EmptyBody,
    InvalidContentType(String),
    Encode(InjectorError),
}

impl AdmissionError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AdmissionError::EmptyBody => StatusCode::BAD_REQUEST,
            AdmissionError::InvalidContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AdmissionError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl Display for AdmissionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdmissionError::EmptyBody => write!(f, "empty body"),
            AdmissionError::InvalidContentType(content_type) => write!(
                f,
                "invalid Content-Type {}, expect `application/json`",
                content_type
            ),
            AdmissionError::Encode(e) => write!(f, "could not encode response: {}", e),
        }
    }
}

impl From<InjectorError> for AdmissionError {
    fn from(e: InjectorError) -> Self {
        AdmissionError::Encode(e)
    }
}
