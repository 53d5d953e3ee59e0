use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use returnflow_infra::{GatewayError, LookupError, SubmitError};

pub fn submit_error_to_response(err: SubmitError) -> axum::response::Response {
    match err {
        SubmitError::Validation(e) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string())
        }
        SubmitError::Domain(e) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", e.to_string())
        }
        SubmitError::Gateway(e) => gateway_error_to_response(e),
    }
}

pub fn gateway_error_to_response(err: GatewayError) -> axum::response::Response {
    match err {
        GatewayError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        // "state changed, please refresh" for the dashboard.
        GatewayError::InvalidTransition(e) => {
            json_error(StatusCode::CONFLICT, "invalid_transition", e.to_string())
        }
        GatewayError::Storage(msg) => {
            tracing::error!(%msg, "storage failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", msg)
        }
    }
}

pub fn lookup_error_to_response(err: LookupError) -> axum::response::Response {
    match err {
        LookupError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "order not found"),
        LookupError::CollaboratorUnavailable(msg) => {
            tracing::warn!(%msg, "order catalog unavailable");
            json_error(
                StatusCode::BAD_GATEWAY,
                "catalog_unavailable",
                "order lookup is temporarily unavailable, try again later",
            )
        }
        LookupError::Gateway(e) => gateway_error_to_response(e),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
