use reqwest::StatusCode;
use thiserror::Error;

use crate::response::ErrorBody;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Structured validation failure reported by the server, carrying the
    /// names of the offending fields.
    #[error("data validation failed server-side ({})", keys.join(", "))]
    Validation { keys: Vec<String> },
    #[error("server replied with status {0}")]
    Status(StatusCode),
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// A 400 whose body parses to the error shape with a `validation` object is
/// a structured validation failure; everything else stays generic.
pub(super) fn classify(status: StatusCode, body: &str) -> ApiError {
    if status == StatusCode::BAD_REQUEST {
        if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
            if let Some(validation) = parsed.validation {
                return ApiError::Validation {
                    keys: validation.keys,
                };
            }
        }
    }
    ApiError::Status(status)
}

pub(super) async fn check(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(classify(status, &body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_validation_failures_are_classified() {
        let body = r#"{"statusCode":400,"error":"Bad Request","message":"title must be between 1 and 255 characters","validation":{"source":"payload","keys":["title"]}}"#;
        match classify(StatusCode::BAD_REQUEST, body) {
            ApiError::Validation { keys } => assert_eq!(keys, vec!["title".to_string()]),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn semantic_bad_requests_stay_generic() {
        let body = r#"{"statusCode":400,"error":"Bad Request","message":"tag name already in use"}"#;
        match classify(StatusCode::BAD_REQUEST, body) {
            ApiError::Status(status) => assert_eq!(status, StatusCode::BAD_REQUEST),
            other => panic!("expected generic status error, got {:?}", other),
        }
    }

    #[test]
    fn non_400_responses_stay_generic() {
        let body = r#"{"statusCode":404,"error":"Not Found","message":"todo not found"}"#;
        match classify(StatusCode::NOT_FOUND, body) {
            ApiError::Status(status) => assert_eq!(status, StatusCode::NOT_FOUND),
            other => panic!("expected generic status error, got {:?}", other),
        }
    }

    #[test]
    fn unparseable_bodies_stay_generic() {
        match classify(StatusCode::BAD_REQUEST, "<html>") {
            ApiError::Status(_) => {}
            other => panic!("expected generic status error, got {:?}", other),
        }
    }
}
