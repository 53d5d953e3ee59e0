//! Customer-facing order lookup.
//!
//! The entry point of the portal flow: the customer types an order number,
//! we resolve the order through the commerce platform, pair it with the
//! owning merchant's return window, and hand back the storefront catalogs
//! the submission form needs.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use returnflow_core::TenantId;
use returnflow_eligibility::{default_reasons, default_type_options, ReturnReason, ReturnTypeOption};
use returnflow_fees::ShippingFeeSettings;
use returnflow_policy::{remaining, window_deadline, RemainingWindow, ReturnPolicy};

use crate::catalog::{lookup_with_retry, normalize_order_number, CatalogError, OrderCatalog, OrderSnapshot};
use crate::gateway::{GatewayError, ReturnStore};

#[derive(Debug, Error)]
pub enum LookupError {
    /// The platform answered and no such order exists.
    #[error("order not found")]
    NotFound,

    /// The platform could not be reached even after retries.
    #[error("order lookup unavailable: {0}")]
    CollaboratorUnavailable(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// What the submission form needs from the merchant's configuration.
///
/// Empty catalogs fall back to the built-in defaults, so a fresh merchant
/// account has a working portal before any customization.
#[derive(Debug, Clone, Serialize)]
pub struct StorefrontConfig {
    pub reasons: Vec<ReturnReason>,
    pub type_options: Vec<ReturnTypeOption>,
    pub shipping: Option<ShippingFeeSettings>,
}

/// A resolved order plus its return-window position.
///
/// `window` is `None` when the merchant has no active default policy; the
/// portal then shows the order without a deadline.
#[derive(Debug, Clone, Serialize)]
pub struct OrderLookup {
    pub order: OrderSnapshot,
    pub policy: Option<ReturnPolicy>,
    pub deadline: Option<DateTime<Utc>>,
    pub window: Option<RemainingWindow>,
}

/// Resolves orders for the customer portal.
pub struct LookupOrderService {
    catalog: Arc<dyn OrderCatalog>,
    store: Arc<dyn ReturnStore>,
}

impl LookupOrderService {
    pub fn new(catalog: Arc<dyn OrderCatalog>, store: Arc<dyn ReturnStore>) -> Self {
        Self { catalog, store }
    }

    /// Resolve an order number to its order and return-window position.
    ///
    /// The window is anchored at the order date, evaluated against the
    /// owning merchant's active default policy.
    pub async fn lookup(&self, raw_order_number: &str) -> Result<OrderLookup, LookupError> {
        let order_number = normalize_order_number(raw_order_number);
        let order = lookup_with_retry(self.catalog.as_ref(), &order_number)
            .await
            .map_err(|err| match err {
                CatalogError::Transient(reason) | CatalogError::Fatal(reason) => {
                    LookupError::CollaboratorUnavailable(reason)
                }
            })?
            .ok_or(LookupError::NotFound)?;

        let policy = self.store.default_policy(order.merchant_id).await?;
        let now = Utc::now();
        let deadline = policy.as_ref().map(|p| window_deadline(p, order.order_date));
        let window = policy.as_ref().map(|p| remaining(p, order.order_date, now));

        info!(
            order_number,
            merchant_id = %order.merchant_id,
            has_policy = policy.is_some(),
            "resolved order for portal"
        );

        Ok(OrderLookup {
            order,
            policy,
            deadline,
            window,
        })
    }

    /// Catalogs and fees for the submission form of one merchant.
    pub async fn storefront_config(
        &self,
        tenant_id: TenantId,
    ) -> Result<StorefrontConfig, GatewayError> {
        let mut reasons = self.store.list_reasons(tenant_id, true).await?;
        if reasons.is_empty() {
            reasons = default_reasons(tenant_id);
        }

        let mut type_options = self.store.list_type_options(tenant_id, true).await?;
        if type_options.is_empty() {
            type_options = default_type_options(tenant_id);
        }

        let shipping = self.store.shipping_settings(tenant_id).await?;

        Ok(StorefrontConfig {
            reasons,
            type_options,
            shipping,
        })
    }
}
