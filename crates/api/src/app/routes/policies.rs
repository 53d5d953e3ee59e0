//! Return-policy management.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use returnflow_core::EntityId;
use returnflow_policy::{PolicyId, ReturnPolicy};

use crate::app::{dto, errors};
use crate::app::services::AppServices;
use crate::context::TenantContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_policy).get(list_policies))
        .route("/default", get(get_default_policy))
        .route("/:id", get(get_policy).put(update_policy).delete(delete_policy))
        .route("/:id/default", post(set_default_policy))
}

pub async fn create_policy(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Json(body): Json<dto::PolicyRequest>,
) -> axum::response::Response {
    let policy = policy_from_request(PolicyId::new(EntityId::new()), tenant, body);
    let id = policy.id;

    match services.store.insert_policy(policy).await {
        Ok(()) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "id": id.to_string() })),
        )
            .into_response(),
        Err(e) => errors::gateway_error_to_response(e),
    }
}

pub async fn list_policies(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
) -> axum::response::Response {
    match services.store.list_policies(tenant.tenant_id()).await {
        Ok(policies) => {
            let items: Vec<_> = policies.iter().map(dto::policy_to_json).collect();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::gateway_error_to_response(e),
    }
}

pub async fn get_default_policy(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
) -> axum::response::Response {
    match services.store.default_policy(tenant.tenant_id()).await {
        Ok(policy) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "policy": policy.as_ref().map(dto::policy_to_json),
            })),
        )
            .into_response(),
        Err(e) => errors::gateway_error_to_response(e),
    }
}

pub async fn get_policy(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_policy_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.store.get_policy(tenant.tenant_id(), id).await {
        Ok(Some(policy)) => (StatusCode::OK, Json(dto::policy_to_json(&policy))).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "policy not found"),
        Err(e) => errors::gateway_error_to_response(e),
    }
}

pub async fn update_policy(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::PolicyRequest>,
) -> axum::response::Response {
    let id = match parse_policy_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let policy = policy_from_request(id, tenant, body);
    match services.store.update_policy(policy).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::gateway_error_to_response(e),
    }
}

pub async fn delete_policy(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_policy_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.store.delete_policy(tenant.tenant_id(), id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::gateway_error_to_response(e),
    }
}

pub async fn set_default_policy(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_policy_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.store.set_default_policy(tenant.tenant_id(), id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::gateway_error_to_response(e),
    }
}

fn policy_from_request(
    id: PolicyId,
    tenant: TenantContext,
    body: dto::PolicyRequest,
) -> ReturnPolicy {
    ReturnPolicy {
        id,
        tenant_id: tenant.tenant_id(),
        name: body.name,
        return_window_days: body.return_window_days,
        return_window_start: body.return_window_start,
        allow_refunds: body.allow_refunds,
        allow_exchanges: body.allow_exchanges,
        allow_store_credit: body.allow_store_credit,
        store_credit_bonus_percent: body.store_credit_bonus_percent,
        restocking_fee_percent: body.restocking_fee_percent,
        requires_receipt: body.requires_receipt,
        requires_original_packaging: body.requires_original_packaging,
        is_default: body.is_default,
        is_active: body.is_active,
    }
}

fn parse_policy_id(raw: &str) -> Result<PolicyId, axum::response::Response> {
    raw.parse::<PolicyId>().map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid policy id")
    })
}
