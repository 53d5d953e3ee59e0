use serde::Deserialize;

use returnflow_core::Money;
use returnflow_eligibility::{ReturnCategory, TypeOptionId};
use returnflow_policy::{RemainingWindow, ReturnPolicy, WindowStart};
use returnflow_requests::{ReturnItem, ReturnRequest};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct LookupOrderRequest {
    pub order_number: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitItemRequest {
    pub product_id: String,
    pub product_name: String,
    pub variant_id: Option<String>,
    pub variant_name: Option<String>,
    pub quantity: u32,
    /// Minor units (cents).
    pub unit_price: Money,
    pub product_image_url: Option<String>,
    pub exchange_product_id: Option<String>,
    pub exchange_product_name: Option<String>,
    pub exchange_variant_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitReturnRequest {
    pub order_number: String,
    pub reason: String,
    pub other_reason_description: Option<String>,
    pub customer_notes: Option<String>,
    pub category: ReturnCategory,
    pub type_option_id: Option<TypeOptionId>,
    pub items: Vec<SubmitItemRequest>,
    #[serde(default)]
    pub evidence_image_urls: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct PolicyRequest {
    pub name: String,
    pub return_window_days: u32,
    pub return_window_start: WindowStart,
    pub allow_refunds: bool,
    pub allow_exchanges: bool,
    pub allow_store_credit: bool,
    pub store_credit_bonus_percent: Option<u16>,
    pub restocking_fee_percent: Option<u16>,
    #[serde(default)]
    pub requires_receipt: bool,
    #[serde(default)]
    pub requires_original_packaging: bool,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct ReasonRequest {
    pub reason: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub sort_order: u32,
}

#[derive(Debug, Deserialize)]
pub struct TypeOptionRequest {
    pub label: String,
    pub description: Option<String>,
    pub category: ReturnCategory,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub sort_order: u32,
}

#[derive(Debug, Deserialize)]
pub struct ShippingSettingsRequest {
    pub return_shipping_fee: Money,
    pub new_product_shipping_fee: Money,
    pub currency: String,
}

#[derive(Debug, Deserialize)]
pub struct ListRequestsQuery {
    pub status: Option<String>,
    pub category: Option<String>,
}

fn default_true() -> bool {
    true
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn policy_to_json(policy: &ReturnPolicy) -> serde_json::Value {
    serde_json::json!({
        "id": policy.id.to_string(),
        "name": policy.name,
        "return_window_days": policy.return_window_days,
        "return_window_start": policy.return_window_start,
        "allow_refunds": policy.allow_refunds,
        "allow_exchanges": policy.allow_exchanges,
        "allow_store_credit": policy.allow_store_credit,
        "store_credit_bonus_percent": policy.store_credit_bonus_percent,
        "restocking_fee_percent": policy.restocking_fee_percent,
        "requires_receipt": policy.requires_receipt,
        "requires_original_packaging": policy.requires_original_packaging,
        "is_default": policy.is_default,
        "is_active": policy.is_active,
    })
}

pub fn request_to_json(
    request: &ReturnRequest,
    window: Option<&RemainingWindow>,
) -> serde_json::Value {
    serde_json::json!({
        "id": request.id.to_string(),
        "order_id": request.order_id,
        "order_number": request.order_number,
        "customer_name": request.customer_name,
        "customer_email": request.customer_email,
        "reason": request.reason,
        "other_reason_description": request.other_reason_description,
        "customer_notes": request.customer_notes,
        "category": request.category,
        "evidence_image_urls": request.evidence_image_urls,
        "original_amount": request.original_amount,
        "refund_amount": request.refund_amount,
        "store_credit_amount": request.store_credit_amount,
        "policy_id": request.policy_id.map(|p| p.to_string()),
        "status": request.status,
        "created_at": request.created_at,
        "approved_at": request.approved_at,
        "approved_by": request.approved_by.map(|u| u.to_string()),
        "shipped_at": request.shipped_at,
        "received_at": request.received_at,
        "completed_at": request.completed_at,
        "window": window.map(|w| serde_json::json!({
            "days": w.days,
            "expired": w.expired,
            "urgent": w.is_urgent(),
        })),
    })
}

pub fn item_to_json(item: &ReturnItem) -> serde_json::Value {
    serde_json::json!({
        "id": item.id.to_string(),
        "product_id": item.product_id,
        "product_name": item.product_name,
        "variant_id": item.variant_id,
        "variant_name": item.variant_name,
        "quantity": item.quantity,
        "unit_price": item.unit_price,
        "product_image_url": item.product_image_url,
        "exchange_product_id": item.exchange_product_id,
        "exchange_product_name": item.exchange_product_name,
        "exchange_variant_name": item.exchange_variant_name,
    })
}
