//! Merchant dashboard: listing, inspection, and lifecycle transitions.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use returnflow_eligibility::ReturnCategory;
use returnflow_infra::RequestFilter;
use returnflow_policy::{remaining, RemainingWindow, ReturnPolicy};
use returnflow_requests::{RequestId, RequestStatus, ReturnRequest};

use crate::app::{dto, errors};
use crate::app::services::AppServices;
use crate::context::{ActorContext, TenantContext};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_returns))
        .route("/:id", get(get_return))
        .route("/:id/approve", post(approve))
        .route("/:id/reject", post(reject))
        .route("/:id/cancel", post(cancel))
        .route("/:id/process", post(mark_processing))
        .route("/:id/ship", post(mark_shipped))
        .route("/:id/receive", post(mark_received))
        .route("/:id/complete", post(complete))
}

pub async fn list_returns(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Query(query): Query<dto::ListRequestsQuery>,
) -> axum::response::Response {
    let mut filter = RequestFilter::default();
    if let Some(status) = query.status.as_deref() {
        match RequestStatus::parse(status) {
            Some(s) => filter.status = Some(s),
            None => {
                return errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "invalid_status",
                    format!("unknown status {status:?}"),
                )
            }
        }
    }
    if let Some(category) = query.category.as_deref() {
        match ReturnCategory::parse(category) {
            Some(c) => filter.category = Some(c),
            None => {
                return errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "invalid_category",
                    format!("unknown category {category:?}"),
                )
            }
        }
    }

    let requests = match services.store.list_requests(tenant.tenant_id(), filter).await {
        Ok(r) => r,
        Err(e) => return errors::gateway_error_to_response(e),
    };
    let policies = match services.store.list_policies(tenant.tenant_id()).await {
        Ok(p) => p,
        Err(e) => return errors::gateway_error_to_response(e),
    };

    let by_id: HashMap<_, _> = policies.iter().map(|p| (p.id, p)).collect();
    let default = policies.iter().find(|p| p.is_default && p.is_active);

    let now = Utc::now();
    let items: Vec<_> = requests
        .iter()
        .map(|request| {
            let window = request_window(request, &by_id, default, now);
            dto::request_to_json(request, window.as_ref())
        })
        .collect();

    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}

pub async fn get_return(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_request_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let request = match services.store.get_request(tenant.tenant_id(), id).await {
        Ok(Some(r)) => r,
        Ok(None) => {
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "return not found")
        }
        Err(e) => return errors::gateway_error_to_response(e),
    };
    let items = match services.store.request_items(tenant.tenant_id(), id).await {
        Ok(i) => i,
        Err(e) => return errors::gateway_error_to_response(e),
    };

    let policies = match services.store.list_policies(tenant.tenant_id()).await {
        Ok(p) => p,
        Err(e) => return errors::gateway_error_to_response(e),
    };
    let by_id: HashMap<_, _> = policies.iter().map(|p| (p.id, p)).collect();
    let default = policies.iter().find(|p| p.is_default && p.is_active);
    let window = request_window(&request, &by_id, default, Utc::now());

    let mut body = dto::request_to_json(&request, window.as_ref());
    body["items"] = serde_json::Value::Array(items.iter().map(dto::item_to_json).collect());
    (StatusCode::OK, Json(body)).into_response()
}

pub async fn approve(
    services: Extension<Arc<AppServices>>,
    tenant: Extension<TenantContext>,
    actor: Extension<ActorContext>,
    id: Path<String>,
) -> axum::response::Response {
    transition(services, tenant, actor, id, RequestStatus::Approved).await
}

pub async fn reject(
    services: Extension<Arc<AppServices>>,
    tenant: Extension<TenantContext>,
    actor: Extension<ActorContext>,
    id: Path<String>,
) -> axum::response::Response {
    transition(services, tenant, actor, id, RequestStatus::Rejected).await
}

pub async fn cancel(
    services: Extension<Arc<AppServices>>,
    tenant: Extension<TenantContext>,
    actor: Extension<ActorContext>,
    id: Path<String>,
) -> axum::response::Response {
    transition(services, tenant, actor, id, RequestStatus::Cancelled).await
}

pub async fn mark_processing(
    services: Extension<Arc<AppServices>>,
    tenant: Extension<TenantContext>,
    actor: Extension<ActorContext>,
    id: Path<String>,
) -> axum::response::Response {
    transition(services, tenant, actor, id, RequestStatus::Processing).await
}

pub async fn mark_shipped(
    services: Extension<Arc<AppServices>>,
    tenant: Extension<TenantContext>,
    actor: Extension<ActorContext>,
    id: Path<String>,
) -> axum::response::Response {
    transition(services, tenant, actor, id, RequestStatus::Shipped).await
}

pub async fn mark_received(
    services: Extension<Arc<AppServices>>,
    tenant: Extension<TenantContext>,
    actor: Extension<ActorContext>,
    id: Path<String>,
) -> axum::response::Response {
    transition(services, tenant, actor, id, RequestStatus::Received).await
}

pub async fn complete(
    services: Extension<Arc<AppServices>>,
    tenant: Extension<TenantContext>,
    actor: Extension<ActorContext>,
    id: Path<String>,
) -> axum::response::Response {
    transition(services, tenant, actor, id, RequestStatus::Completed).await
}

async fn transition(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
    to: RequestStatus,
) -> axum::response::Response {
    let id = match parse_request_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services
        .store
        .transition_request(tenant.tenant_id(), id, to, Utc::now(), actor.user_id())
        .await
    {
        Ok(updated) => (StatusCode::OK, Json(dto::request_to_json(&updated, None))).into_response(),
        Err(e) => errors::gateway_error_to_response(e),
    }
}

/// The request's window, from its pinned policy when it still exists, else
/// the current default, anchored at submission time.
fn request_window(
    request: &ReturnRequest,
    policies: &HashMap<returnflow_policy::PolicyId, &ReturnPolicy>,
    default: Option<&ReturnPolicy>,
    now: chrono::DateTime<Utc>,
) -> Option<RemainingWindow> {
    let policy = request
        .policy_id
        .and_then(|id| policies.get(&id).copied())
        .or(default)?;
    Some(remaining(policy, request.created_at, now))
}

fn parse_request_id(raw: &str) -> Result<RequestId, axum::response::Response> {
    raw.parse::<RequestId>().map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid return id")
    })
}
