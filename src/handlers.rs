// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the CPF validation service.
//!
//! The validation endpoint runs a strictly ordered pipeline per request:
//! caller-key extraction, admission check, body parse, schema check,
//! check-digit validation. The first terminal outcome short-circuits the
//! rest and maps to exactly one response.

use crate::config::Config;
use crate::limiter::{RateLimitResult, RateLimiter};
use crate::metrics::{Metrics, Outcome};
use crate::validator::CheckDigitValidator;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Caller key used when no forwarded address is present.
const UNKNOWN_CALLER: &str = "unknown";

/// Shared application state.
pub struct AppState {
    pub limiter: RateLimiter,
    pub validator: Box<dyn CheckDigitValidator>,
    pub metrics: Metrics,
    pub config: Config,
}

/// Request body for the validation endpoint.
#[derive(Debug, Deserialize)]
pub struct ValidationRequest {
    /// The identifier to validate, unconstrained before check-digit
    /// validation
    pub id: String,
}

/// Success-path response body, echoing the identifier.
#[derive(Debug, Serialize, Deserialize)]
pub struct ValidationResponse {
    pub id: String,
    pub is_valid: bool,
    pub message: String,
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Client-caused and server-caused request failures.
///
/// The `Display` impls are the client-visible messages; anything richer is
/// logged server-side only.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Invalid JSON format in request body.")]
    MalformedJson,

    #[error("Invalid request body. Ensure you provide a JSON with an identifier field.")]
    SchemaViolation,

    #[error("An internal server error occurred.")]
    Internal,
}

impl RequestError {
    fn status(&self) -> StatusCode {
        match self {
            Self::MalformedJson | Self::SchemaViolation => StatusCode::BAD_REQUEST,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn outcome(&self) -> Outcome {
        match self {
            Self::MalformedJson => Outcome::MalformedJson,
            Self::SchemaViolation => Outcome::SchemaViolation,
            Self::Internal => Outcome::InternalError,
        }
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(ErrorResponse {
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Extract the caller key from the forwarded-address header.
///
/// Takes the first comma-separated value of `X-Forwarded-For`, trimmed.
/// Absent or empty values fall back to the `"unknown"` sentinel. The key is
/// not validated as a real network address.
pub fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(UNKNOWN_CALLER)
        .to_string()
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Prometheus metrics endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.encode() {
        Ok(text) => text.into_response(),
        Err(err) => {
            error!(error = %err, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Validate a CPF.
///
/// Stages run in order and the first terminal outcome wins: rate limiting
/// precedes parsing, parsing precedes schema checks, and only well-formed
/// requests reach check-digit validation.
pub async fn validate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    state.metrics.record_request();
    let key = client_key(&headers);

    if let RateLimitResult::Limited { retry_after } = state.limiter.check_and_record(&key).await {
        warn!(client = %key, retry_after_secs = retry_after.as_secs(), "Rate limit exceeded");
        state.metrics.record_outcome(Outcome::RateLimited);
        return (
            StatusCode::TOO_MANY_REQUESTS,
            [(header::RETRY_AFTER, retry_after.as_secs().to_string())],
            Json(ErrorResponse {
                message: "Too many requests. Please try again later.".to_string(),
            }),
        )
            .into_response();
    }

    info!(client = %key, "CPF validation request received");

    match evaluate(state.validator.as_ref(), &body) {
        Ok((status, response)) => {
            state.metrics.record_outcome(if response.is_valid {
                Outcome::Valid
            } else {
                Outcome::Invalid
            });
            (status, Json(response)).into_response()
        }
        Err(err) => {
            state.metrics.record_outcome(err.outcome());
            err.into_response()
        }
    }
}

/// Run the parse, schema, and check-digit stages.
///
/// Returns the success-path status and body, or the request error that
/// terminated the pipeline. Errors are logged here with server-side detail;
/// only the generic message reaches the client.
fn evaluate(
    validator: &dyn CheckDigitValidator,
    body: &str,
) -> Result<(StatusCode, ValidationResponse), RequestError> {
    let value: serde_json::Value = serde_json::from_str(body).map_err(|err| {
        error!(error = %err, "Invalid JSON format in request body");
        RequestError::MalformedJson
    })?;

    let request: ValidationRequest = serde_json::from_value(value).map_err(|err| {
        error!(error = %err, "Request body failed schema validation");
        RequestError::SchemaViolation
    })?;

    // The validator is assumed total for string input, but a misbehaving
    // implementation must not take the service down with it
    let is_valid = catch_unwind(AssertUnwindSafe(|| validator.validate(&request.id)))
        .map_err(|payload| {
            error!(detail = panic_detail(payload.as_ref()), "Check-digit validation panicked");
            RequestError::Internal
        })?;

    Ok(if is_valid {
        (
            StatusCode::OK,
            ValidationResponse {
                id: request.id,
                is_valid: true,
                message: "The provided identifier is valid.".to_string(),
            },
        )
    } else {
        (
            StatusCode::BAD_REQUEST,
            ValidationResponse {
                id: request.id,
                is_valid: false,
                message: "The provided identifier is invalid.".to_string(),
            },
        )
    })
}

fn panic_detail(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/validate", post(validate));

    if state.config.metrics.enabled {
        app = app.route(&state.config.metrics.path, get(metrics));
    }

    app.layer(TraceLayer::new_for_http()).with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", value.parse().expect("header value"));
        headers
    }

    #[test]
    fn test_client_key_takes_first_forwarded_value() {
        let headers = headers_with("203.0.113.7, 10.0.0.1, 10.0.0.2");
        assert_eq!(client_key(&headers), "203.0.113.7");
    }

    #[test]
    fn test_client_key_trims_whitespace() {
        let headers = headers_with("  203.0.113.7  ");
        assert_eq!(client_key(&headers), "203.0.113.7");
    }

    #[test]
    fn test_client_key_missing_header_falls_back() {
        assert_eq!(client_key(&HeaderMap::new()), "unknown");
    }

    #[test]
    fn test_client_key_empty_header_falls_back() {
        let headers = headers_with("   ");
        assert_eq!(client_key(&headers), "unknown");
    }

    #[test]
    fn test_error_messages_match_contract() {
        assert_eq!(
            RequestError::MalformedJson.to_string(),
            "Invalid JSON format in request body."
        );
        assert_eq!(
            RequestError::SchemaViolation.to_string(),
            "Invalid request body. Ensure you provide a JSON with an identifier field."
        );
        assert_eq!(
            RequestError::Internal.to_string(),
            "An internal server error occurred."
        );
    }

    #[test]
    fn test_schema_rejects_non_string_id() {
        let result = serde_json::from_value::<ValidationRequest>(serde_json::json!({ "id": 42 }));
        assert!(result.is_err());
    }
}
