//! Read-only boundary to the merchant's commerce platform.
//!
//! Orders live in an external system; this module only looks them up by the
//! customer-facing order number. Lookups are retried a bounded number of
//! times on transient failures, never on fatal ones.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use returnflow_core::{Money, TenantId};

/// Order-catalog lookup error.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The platform was unreachable or rate-limited; worth retrying.
    #[error("catalog temporarily unavailable: {0}")]
    Transient(String),

    /// The platform rejected the request; retrying will not help.
    #[error("catalog lookup failed: {0}")]
    Fatal(String),
}

/// One purchasable line of the original order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub id: String,
    pub title: String,
    pub variant_title: Option<String>,
    pub quantity: u32,
    pub unit_price: Money,
    pub product_id: String,
    pub variant_id: Option<String>,
    pub sku: Option<String>,
    pub image_url: Option<String>,
}

/// Snapshot of an order as the commerce platform reported it.
///
/// Carries the owning merchant so public flows can resolve the tenant from
/// the order itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub merchant_id: TenantId,
    pub order_id: String,
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: String,
    pub order_date: DateTime<Utc>,
    pub currency: String,
    pub total_amount: Money,
    pub fulfillment_status: Option<String>,
    pub line_items: Vec<OrderLineItem>,
}

/// Strip the display prefix and stray whitespace from a customer-typed order
/// number, so "#1001", " 1001 " and "1001" all address the same order.
pub fn normalize_order_number(raw: &str) -> String {
    raw.trim().trim_start_matches('#').trim().to_string()
}

/// Boundary to the commerce platform's order store.
#[async_trait]
pub trait OrderCatalog: Send + Sync {
    /// Look up an order by its normalized order number. `Ok(None)` means the
    /// platform answered and no such order exists.
    async fn lookup(&self, order_number: &str) -> Result<Option<OrderSnapshot>, CatalogError>;
}

const LOOKUP_ATTEMPTS: u32 = 3;

/// Run a catalog lookup with bounded retries on transient failures.
pub async fn lookup_with_retry(
    catalog: &dyn OrderCatalog,
    order_number: &str,
) -> Result<Option<OrderSnapshot>, CatalogError> {
    let mut attempt = 1;
    loop {
        match catalog.lookup(order_number).await {
            Err(CatalogError::Transient(reason)) if attempt < LOOKUP_ATTEMPTS => {
                warn!(order_number, attempt, %reason, "order lookup failed, retrying");
                attempt += 1;
            }
            other => return other,
        }
    }
}

/// In-process catalog backed by a map of normalized order numbers.
///
/// Serves tests and single-tenant deployments where orders are synced in
/// ahead of time.
#[derive(Debug, Default)]
pub struct StaticOrderCatalog {
    orders: RwLock<HashMap<String, OrderSnapshot>>,
}

impl StaticOrderCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, order: OrderSnapshot) {
        let key = normalize_order_number(&order.order_number);
        self.orders
            .write()
            .expect("order catalog lock poisoned")
            .insert(key, order);
    }
}

#[async_trait]
impl OrderCatalog for StaticOrderCatalog {
    async fn lookup(&self, order_number: &str) -> Result<Option<OrderSnapshot>, CatalogError> {
        let orders = self
            .orders
            .read()
            .map_err(|_| CatalogError::Fatal("order catalog lock poisoned".into()))?;
        Ok(orders.get(&normalize_order_number(order_number)).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn sample_order(number: &str) -> OrderSnapshot {
        OrderSnapshot {
            merchant_id: TenantId::new(),
            order_id: "gid://orders/1".into(),
            order_number: number.into(),
            customer_name: "Ada Lovelace".into(),
            customer_email: "ada@example.com".into(),
            order_date: Utc::now(),
            currency: "USD".into(),
            total_amount: Money::from_minor(4_999),
            fulfillment_status: Some("fulfilled".into()),
            line_items: vec![],
        }
    }

    #[test]
    fn normalization_strips_prefix_and_whitespace() {
        assert_eq!(normalize_order_number("#1001"), "1001");
        assert_eq!(normalize_order_number("  #1001  "), "1001");
        assert_eq!(normalize_order_number("1001"), "1001");
        assert_eq!(normalize_order_number("# 1001"), "1001");
    }

    #[tokio::test]
    async fn static_catalog_matches_any_spelling() {
        let catalog = StaticOrderCatalog::new();
        catalog.insert(sample_order("#1001"));

        for spelling in ["#1001", "1001", " 1001 "] {
            let found = catalog.lookup(spelling).await.unwrap();
            assert!(found.is_some(), "spelling {spelling:?} should resolve");
        }
        assert!(catalog.lookup("#2002").await.unwrap().is_none());
    }

    struct FlakyCatalog {
        calls: AtomicU32,
        fail_times: u32,
    }

    #[async_trait]
    impl OrderCatalog for FlakyCatalog {
        async fn lookup(&self, number: &str) -> Result<Option<OrderSnapshot>, CatalogError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_times {
                Err(CatalogError::Transient("connection reset".into()))
            } else {
                Ok(Some(sample_order(number)))
            }
        }
    }

    #[tokio::test]
    async fn retry_recovers_from_transient_failures() {
        let catalog = FlakyCatalog {
            calls: AtomicU32::new(0),
            fail_times: 2,
        };
        let found = lookup_with_retry(&catalog, "1001").await.unwrap();
        assert!(found.is_some());
        assert_eq!(catalog.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retry_gives_up_after_bounded_attempts() {
        let catalog = FlakyCatalog {
            calls: AtomicU32::new(0),
            fail_times: 10,
        };
        let err = lookup_with_retry(&catalog, "1001").await.unwrap_err();
        assert!(matches!(err, CatalogError::Transient(_)));
        assert_eq!(catalog.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn fatal_errors_are_not_retried() {
        struct AlwaysFatal(AtomicU32);

        #[async_trait]
        impl OrderCatalog for AlwaysFatal {
            async fn lookup(&self, _: &str) -> Result<Option<OrderSnapshot>, CatalogError> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Err(CatalogError::Fatal("bad credentials".into()))
            }
        }

        let catalog = AlwaysFatal(AtomicU32::new(0));
        let err = lookup_with_retry(&catalog, "1001").await.unwrap_err();
        assert!(matches!(err, CatalogError::Fatal(_)));
        assert_eq!(catalog.0.load(Ordering::SeqCst), 1);
    }
}
