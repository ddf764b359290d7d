use actix_web::{error::JsonPayloadError, HttpRequest, HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Wire shape of every non-2xx response. The `validation` object is present
/// only for field-validation failures; clients key on it to tell those apart
/// from semantic 400s.
#[derive(Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationDetail>,
}

#[derive(Serialize, Deserialize)]
pub struct ValidationDetail {
    pub source: String,
    pub keys: Vec<String>,
}

pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let app_err = match err {
        JsonPayloadError::Deserialize(_) => {
            AppError::validation(Vec::new(), "Invalid request payload input")
        }
        _ => AppError::bad_request("Invalid request payload JSON format"),
    };
    app_err.into()
}

pub fn response_from_error(err: &AppError) -> HttpResponse {
    let status = err.status_code();
    let body = ErrorBody {
        status_code: status.as_u16(),
        error: status
            .canonical_reason()
            .unwrap_or("Unknown")
            .to_string(),
        message: err.to_string(),
        validation: err.validation_keys().map(|keys| ValidationDetail {
            source: "payload".to_string(),
            keys: keys.to_vec(),
        }),
    };
    HttpResponse::build(status).json(body)
}
