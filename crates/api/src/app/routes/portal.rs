//! Customer-facing portal: order lookup and return submission.
//!
//! No tenant header here; the merchant is resolved from the order itself.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};

use returnflow_infra::{SubmitItem, SubmitReturn};

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/lookup", post(lookup_order))
        .route("/submit", post(submit_return))
}

pub async fn lookup_order(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::LookupOrderRequest>,
) -> axum::response::Response {
    let lookup = match services.lookup.lookup(&body.order_number).await {
        Ok(l) => l,
        Err(e) => return errors::lookup_error_to_response(e),
    };

    let config = match services
        .lookup
        .storefront_config(lookup.order.merchant_id)
        .await
    {
        Ok(c) => c,
        Err(e) => return errors::gateway_error_to_response(e),
    };

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "order": lookup.order,
            "policy": lookup.policy,
            "deadline": lookup.deadline,
            "window": lookup.window,
            "reasons": config.reasons,
            "type_options": config.type_options,
            "shipping": config.shipping,
        })),
    )
        .into_response()
}

pub async fn submit_return(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::SubmitReturnRequest>,
) -> axum::response::Response {
    // The order snapshot is the source of truth for merchant and customer
    // identity; the form payload only carries the customer's choices.
    let lookup = match services.lookup.lookup(&body.order_number).await {
        Ok(l) => l,
        Err(e) => return errors::lookup_error_to_response(e),
    };
    let order = lookup.order;

    let input = SubmitReturn {
        tenant_id: order.merchant_id,
        order_id: order.order_id,
        order_number: order.order_number,
        customer_name: order.customer_name,
        customer_email: order.customer_email,
        reason: body.reason,
        other_reason_description: body.other_reason_description,
        customer_notes: body.customer_notes,
        category: body.category,
        type_option_id: body.type_option_id,
        items: body
            .items
            .into_iter()
            .map(|item| SubmitItem {
                product_id: item.product_id,
                product_name: item.product_name,
                variant_id: item.variant_id,
                variant_name: item.variant_name,
                quantity: item.quantity,
                unit_price: item.unit_price,
                product_image_url: item.product_image_url,
                exchange_product_id: item.exchange_product_id,
                exchange_product_name: item.exchange_product_name,
                exchange_variant_name: item.exchange_variant_name,
            })
            .collect(),
        evidence_image_urls: body.evidence_image_urls,
    };

    match services.submit.submit(input).await {
        Ok(receipt) => (StatusCode::CREATED, Json(receipt)).into_response(),
        Err(e) => errors::submit_error_to_response(e),
    }
}
