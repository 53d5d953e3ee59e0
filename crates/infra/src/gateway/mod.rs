//! Durable store for policies, reasons, type options, requests, items, and
//! shipping-fee settings.
//!
//! Every operation is tenant-scoped; a record from another tenant is
//! indistinguishable from a missing one. Two operations carry extra atomicity
//! requirements and every implementation must honor them:
//!
//! - `set_default_policy` clears sibling default flags and sets the new one
//!   as a single atomic step — at no observable point are zero or two
//!   policies default.
//! - `transition_request` is a conditional update on the stored status, so
//!   concurrent transitions serialize and the loser gets `InvalidTransition`.
//! - `insert_request` persists the request and its items all-or-nothing.

pub mod in_memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use returnflow_core::{TenantId, UserId};
use returnflow_eligibility::{ReasonId, ReturnCategory, ReturnReason, ReturnTypeOption, TypeOptionId};
use returnflow_fees::ShippingFeeSettings;
use returnflow_policy::{PolicyId, ReturnPolicy};
use returnflow_requests::{RequestId, RequestStatus, ReturnItem, ReturnRequest, TransitionError};

pub use in_memory::InMemoryReturnStore;
pub use postgres::PostgresReturnStore;

/// Persistence-layer error.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The addressed record does not exist for this tenant.
    #[error("not found")]
    NotFound,

    /// Illegal lifecycle edge, or a concurrent transition won the race.
    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),

    /// The backing store failed; retryable at the caller's discretion.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl GatewayError {
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}

/// Listing filter for the merchant dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestFilter {
    pub status: Option<RequestStatus>,
    pub category: Option<ReturnCategory>,
}

impl RequestFilter {
    pub fn matches(&self, request: &ReturnRequest) -> bool {
        self.status.is_none_or(|s| request.status == s)
            && self.category.is_none_or(|c| request.category == c)
    }
}

/// Durable store boundary.
#[async_trait]
pub trait ReturnStore: Send + Sync {
    // Policies.
    async fn insert_policy(&self, policy: ReturnPolicy) -> Result<(), GatewayError>;
    async fn update_policy(&self, policy: ReturnPolicy) -> Result<(), GatewayError>;
    async fn delete_policy(&self, tenant_id: TenantId, id: PolicyId) -> Result<(), GatewayError>;
    async fn get_policy(
        &self,
        tenant_id: TenantId,
        id: PolicyId,
    ) -> Result<Option<ReturnPolicy>, GatewayError>;
    async fn list_policies(&self, tenant_id: TenantId) -> Result<Vec<ReturnPolicy>, GatewayError>;
    /// Atomically make `id` the tenant's only default policy.
    async fn set_default_policy(
        &self,
        tenant_id: TenantId,
        id: PolicyId,
    ) -> Result<(), GatewayError>;
    /// The tenant's active default policy. Absence is configuration, not an
    /// error: callers fall back to "window unknown".
    async fn default_policy(&self, tenant_id: TenantId)
        -> Result<Option<ReturnPolicy>, GatewayError>;

    // Reason catalog.
    async fn upsert_reason(&self, reason: ReturnReason) -> Result<(), GatewayError>;
    async fn delete_reason(&self, tenant_id: TenantId, id: ReasonId) -> Result<(), GatewayError>;
    /// Reasons in sort order; `only_active` is what customers see.
    async fn list_reasons(
        &self,
        tenant_id: TenantId,
        only_active: bool,
    ) -> Result<Vec<ReturnReason>, GatewayError>;

    // Return-type option catalog.
    async fn upsert_type_option(&self, option: ReturnTypeOption) -> Result<(), GatewayError>;
    async fn delete_type_option(
        &self,
        tenant_id: TenantId,
        id: TypeOptionId,
    ) -> Result<(), GatewayError>;
    async fn list_type_options(
        &self,
        tenant_id: TenantId,
        only_active: bool,
    ) -> Result<Vec<ReturnTypeOption>, GatewayError>;
    async fn get_type_option(
        &self,
        tenant_id: TenantId,
        id: TypeOptionId,
    ) -> Result<Option<ReturnTypeOption>, GatewayError>;

    // Shipping-fee settings (one record per tenant).
    async fn shipping_settings(
        &self,
        tenant_id: TenantId,
    ) -> Result<Option<ShippingFeeSettings>, GatewayError>;
    async fn upsert_shipping_settings(
        &self,
        settings: ShippingFeeSettings,
    ) -> Result<(), GatewayError>;

    // Requests.
    /// Persist a request and its items all-or-nothing.
    async fn insert_request(
        &self,
        request: ReturnRequest,
        items: Vec<ReturnItem>,
    ) -> Result<(), GatewayError>;
    async fn get_request(
        &self,
        tenant_id: TenantId,
        id: RequestId,
    ) -> Result<Option<ReturnRequest>, GatewayError>;
    async fn list_requests(
        &self,
        tenant_id: TenantId,
        filter: RequestFilter,
    ) -> Result<Vec<ReturnRequest>, GatewayError>;
    async fn request_items(
        &self,
        tenant_id: TenantId,
        id: RequestId,
    ) -> Result<Vec<ReturnItem>, GatewayError>;
    /// Validate and apply a lifecycle transition as a conditional update on
    /// the stored status. Returns the updated request.
    async fn transition_request(
        &self,
        tenant_id: TenantId,
        id: RequestId,
        to: RequestStatus,
        now: DateTime<Utc>,
        actor: Option<UserId>,
    ) -> Result<ReturnRequest, GatewayError>;
}
