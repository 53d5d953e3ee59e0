//! Merchant settings: reason catalog, return-type options, shipping fees.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};

use returnflow_core::EntityId;
use returnflow_eligibility::{
    default_reasons, default_type_options, ReasonId, ReturnReason, ReturnTypeOption, TypeOptionId,
};
use returnflow_fees::ShippingFeeSettings;

use crate::app::{dto, errors};
use crate::app::services::AppServices;
use crate::context::TenantContext;

pub fn router() -> Router {
    Router::new()
        .route("/reasons", get(list_reasons).post(create_reason))
        .route("/reasons/seed-defaults", post(seed_default_reasons))
        .route("/reasons/:id", put(update_reason).delete(delete_reason))
        .route("/type-options", get(list_type_options).post(create_type_option))
        .route("/type-options/seed-defaults", post(seed_default_type_options))
        .route(
            "/type-options/:id",
            put(update_type_option).delete(delete_type_option),
        )
        .route("/shipping", get(get_shipping).put(put_shipping))
}

// Reasons.

pub async fn list_reasons(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
) -> axum::response::Response {
    match services.store.list_reasons(tenant.tenant_id(), false).await {
        Ok(reasons) => {
            (StatusCode::OK, Json(serde_json::json!({ "items": reasons }))).into_response()
        }
        Err(e) => errors::gateway_error_to_response(e),
    }
}

pub async fn create_reason(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Json(body): Json<dto::ReasonRequest>,
) -> axum::response::Response {
    let reason = ReturnReason {
        id: ReasonId::new(EntityId::new()),
        tenant_id: tenant.tenant_id(),
        reason: body.reason,
        is_active: body.is_active,
        sort_order: body.sort_order,
    };
    let id = reason.id;

    match services.store.upsert_reason(reason).await {
        Ok(()) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "id": id.to_string() })),
        )
            .into_response(),
        Err(e) => errors::gateway_error_to_response(e),
    }
}

pub async fn update_reason(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::ReasonRequest>,
) -> axum::response::Response {
    let id = match id.parse::<ReasonId>() {
        Ok(id) => id,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid reason id")
        }
    };

    let reason = ReturnReason {
        id,
        tenant_id: tenant.tenant_id(),
        reason: body.reason,
        is_active: body.is_active,
        sort_order: body.sort_order,
    };
    match services.store.upsert_reason(reason).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::gateway_error_to_response(e),
    }
}

pub async fn delete_reason(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match id.parse::<ReasonId>() {
        Ok(id) => id,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid reason id")
        }
    };

    match services.store.delete_reason(tenant.tenant_id(), id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::gateway_error_to_response(e),
    }
}

pub async fn seed_default_reasons(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
) -> axum::response::Response {
    let reasons = default_reasons(tenant.tenant_id());
    for reason in reasons {
        if let Err(e) = services.store.upsert_reason(reason).await {
            return errors::gateway_error_to_response(e);
        }
    }
    StatusCode::NO_CONTENT.into_response()
}

// Type options.

pub async fn list_type_options(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
) -> axum::response::Response {
    match services.store.list_type_options(tenant.tenant_id(), false).await {
        Ok(options) => {
            (StatusCode::OK, Json(serde_json::json!({ "items": options }))).into_response()
        }
        Err(e) => errors::gateway_error_to_response(e),
    }
}

pub async fn create_type_option(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Json(body): Json<dto::TypeOptionRequest>,
) -> axum::response::Response {
    let option = ReturnTypeOption {
        id: TypeOptionId::new(EntityId::new()),
        tenant_id: tenant.tenant_id(),
        label: body.label,
        description: body.description,
        category: body.category,
        is_active: body.is_active,
        sort_order: body.sort_order,
    };
    let id = option.id;

    match services.store.upsert_type_option(option).await {
        Ok(()) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "id": id.to_string() })),
        )
            .into_response(),
        Err(e) => errors::gateway_error_to_response(e),
    }
}

pub async fn update_type_option(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::TypeOptionRequest>,
) -> axum::response::Response {
    let id = match id.parse::<TypeOptionId>() {
        Ok(id) => id,
        Err(_) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_id",
                "invalid type option id",
            )
        }
    };

    let option = ReturnTypeOption {
        id,
        tenant_id: tenant.tenant_id(),
        label: body.label,
        description: body.description,
        category: body.category,
        is_active: body.is_active,
        sort_order: body.sort_order,
    };
    match services.store.upsert_type_option(option).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::gateway_error_to_response(e),
    }
}

pub async fn delete_type_option(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match id.parse::<TypeOptionId>() {
        Ok(id) => id,
        Err(_) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_id",
                "invalid type option id",
            )
        }
    };

    match services.store.delete_type_option(tenant.tenant_id(), id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::gateway_error_to_response(e),
    }
}

pub async fn seed_default_type_options(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
) -> axum::response::Response {
    let options = default_type_options(tenant.tenant_id());
    for option in options {
        if let Err(e) = services.store.upsert_type_option(option).await {
            return errors::gateway_error_to_response(e);
        }
    }
    StatusCode::NO_CONTENT.into_response()
}

// Shipping fees.

pub async fn get_shipping(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
) -> axum::response::Response {
    match services.store.shipping_settings(tenant.tenant_id()).await {
        Ok(settings) => {
            (StatusCode::OK, Json(serde_json::json!({ "settings": settings }))).into_response()
        }
        Err(e) => errors::gateway_error_to_response(e),
    }
}

pub async fn put_shipping(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Json(body): Json<dto::ShippingSettingsRequest>,
) -> axum::response::Response {
    let settings = ShippingFeeSettings {
        tenant_id: tenant.tenant_id(),
        return_shipping_fee: body.return_shipping_fee,
        new_product_shipping_fee: body.new_product_shipping_fee,
        currency: body.currency,
    };

    match services.store.upsert_shipping_settings(settings).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::gateway_error_to_response(e),
    }
}
