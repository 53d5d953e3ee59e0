//! Return-request submission.
//!
//! One service method drives the whole portal submit: validation gates,
//! eligibility, settlement math, default-policy resolution, then the
//! all-or-nothing write of the request and its items. Validation failures
//! are the customer's to fix and are never logged as faults.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use returnflow_core::{DomainError, EntityId, Money, TenantId};
use returnflow_eligibility::{
    default_type_options, evaluate, Flow, ReasonKind, ReturnCategory, ReturnTypeOption,
    TypeOptionId,
};
use returnflow_fees::{
    exchange_shipping_total, items_value, outcome_amount, ExchangeShipping, OutcomeAmounts,
};
use returnflow_requests::{ItemId, NewReturnRequest, RequestId, ReturnItem, ReturnRequest};

use crate::gateway::{GatewayError, ReturnStore};

/// Upper bound on evidence images per request.
pub const MAX_EVIDENCE_IMAGES: usize = 5;

/// Submitter-recoverable rejection: surfaced verbatim, fixable in the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("a return reason is required")]
    MissingReason,

    #[error("please describe what is wrong with your item")]
    MissingElaboration,

    #[error("select at least one item to return")]
    NoItemsSelected,

    #[error("no eligible return type is available for this reason")]
    NoReturnTypeSelected,

    #[error("the selected return type is not available for this reason")]
    Ineligible,

    #[error("please attach at least one photo of the item")]
    EvidenceRequired,

    #[error("at most {MAX_EVIDENCE_IMAGES} evidence images are allowed")]
    TooManyEvidenceImages,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// One selected line of the order, as the form submits it.
#[derive(Debug, Clone)]
pub struct SubmitItem {
    pub product_id: String,
    pub product_name: String,
    pub variant_id: Option<String>,
    pub variant_name: Option<String>,
    pub quantity: u32,
    pub unit_price: Money,
    pub product_image_url: Option<String>,
    pub exchange_product_id: Option<String>,
    pub exchange_product_name: Option<String>,
    pub exchange_variant_name: Option<String>,
}

/// Full submission payload.
#[derive(Debug, Clone)]
pub struct SubmitReturn {
    pub tenant_id: TenantId,
    pub order_id: String,
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: String,
    pub reason: String,
    pub other_reason_description: Option<String>,
    pub customer_notes: Option<String>,
    pub category: ReturnCategory,
    /// Explicit option choice; when absent the first active option of the
    /// chosen category (or the built-in default) is used.
    pub type_option_id: Option<TypeOptionId>,
    pub items: Vec<SubmitItem>,
    pub evidence_image_urls: Vec<String>,
}

/// What the customer sees after a successful submit.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub request_id: RequestId,
    pub flow: Flow,
    pub amounts: OutcomeAmounts,
    pub shipping: ExchangeShipping,
}

/// Drives the portal submit end to end.
pub struct SubmitReturnService {
    store: Arc<dyn ReturnStore>,
}

impl SubmitReturnService {
    pub fn new(store: Arc<dyn ReturnStore>) -> Self {
        Self { store }
    }

    pub async fn submit(&self, input: SubmitReturn) -> Result<SubmissionReceipt, SubmitError> {
        let reason = input.reason.trim();
        if reason.is_empty() {
            return Err(ValidationError::MissingReason.into());
        }
        let kind = ReasonKind::classify(reason);
        if kind == ReasonKind::Other
            && input
                .other_reason_description
                .as_deref()
                .is_none_or(|d| d.trim().is_empty())
        {
            return Err(ValidationError::MissingElaboration.into());
        }
        if input.items.is_empty() {
            return Err(ValidationError::NoItemsSelected.into());
        }
        if input.evidence_image_urls.len() > MAX_EVIDENCE_IMAGES {
            return Err(ValidationError::TooManyEvidenceImages.into());
        }

        let option = self.resolve_option(&input).await?;
        let eligibility = evaluate(reason, &option);
        if !eligibility.allowed {
            return Err(ValidationError::Ineligible.into());
        }
        if eligibility.requires_evidence && input.evidence_image_urls.is_empty() {
            return Err(ValidationError::EvidenceRequired.into());
        }

        let value = items_value(input.items.iter().map(|i| (i.unit_price, i.quantity)))?;
        let policy = self.store.default_policy(input.tenant_id).await?;
        let amounts = outcome_amount(option.category, value, policy.as_ref())?;
        let settings = self.store.shipping_settings(input.tenant_id).await?;
        let shipping = exchange_shipping_total(eligibility.flow, settings.as_ref())?;

        let order_number = input.order_number.clone();
        let request = ReturnRequest::submit(
            NewReturnRequest {
                tenant_id: input.tenant_id,
                order_id: input.order_id,
                order_number: input.order_number,
                customer_name: input.customer_name,
                customer_email: input.customer_email,
                reason: reason.to_string(),
                other_reason_description: input.other_reason_description,
                customer_notes: input.customer_notes,
                category: option.category,
                evidence_image_urls: input.evidence_image_urls,
                // The original amount is the value of the selected items,
                // not the whole order: a partial return records only what
                // the customer is sending back.
                original_amount: value,
                refund_amount: amounts.refund,
                store_credit_amount: amounts.store_credit,
                policy_id: policy.as_ref().map(|p| p.id),
            },
            Utc::now(),
        )?;

        let items: Vec<ReturnItem> = input
            .items
            .into_iter()
            .map(|item| ReturnItem {
                id: ItemId::new(EntityId::new()),
                request_id: request.id,
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
            .collect();

        let request_id = request.id;
        let flow = eligibility.flow;
        self.store.insert_request(request, items).await?;

        info!(
            request_id = %request_id,
            tenant_id = %input.tenant_id,
            order_number = %order_number,
            flow = ?flow,
            "return request submitted"
        );

        Ok(SubmissionReceipt {
            request_id,
            flow,
            amounts,
            shipping,
        })
    }

    /// Pick the return-type option the submission runs under.
    async fn resolve_option(
        &self,
        input: &SubmitReturn,
    ) -> Result<ReturnTypeOption, SubmitError> {
        if let Some(id) = input.type_option_id {
            return self
                .store
                .get_type_option(input.tenant_id, id)
                .await?
                .filter(|o| o.is_active)
                .ok_or_else(|| ValidationError::NoReturnTypeSelected.into());
        }

        let configured = self.store.list_type_options(input.tenant_id, true).await?;
        let pool = if configured.is_empty() {
            default_type_options(input.tenant_id)
        } else {
            configured
        };
        pool.into_iter()
            .find(|o| o.category == input.category)
            .ok_or_else(|| ValidationError::NoReturnTypeSelected.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use returnflow_core::UserId;
    use returnflow_fees::ShippingFeeSettings;
    use returnflow_policy::{PolicyId, ReturnPolicy, WindowStart};
    use returnflow_requests::RequestStatus;

    use crate::gateway::InMemoryReturnStore;

    fn item(price: u64, quantity: u32) -> SubmitItem {
        SubmitItem {
            product_id: "prod-1".into(),
            product_name: "Trail Jacket".into(),
            variant_id: Some("var-1".into()),
            variant_name: Some("M / Green".into()),
            quantity,
            unit_price: Money::from_minor(price),
            product_image_url: None,
            exchange_product_id: None,
            exchange_product_name: None,
            exchange_variant_name: None,
        }
    }

    fn submission(tenant_id: TenantId, reason: &str, category: ReturnCategory) -> SubmitReturn {
        SubmitReturn {
            tenant_id,
            order_id: "gid://orders/1".into(),
            order_number: "1001".into(),
            customer_name: "Ada Lovelace".into(),
            customer_email: "ada@example.com".into(),
            reason: reason.into(),
            other_reason_description: None,
            customer_notes: None,
            category,
            type_option_id: None,
            items: vec![item(5_000, 2)],
            evidence_image_urls: vec![],
        }
    }

    fn policy_with_fees(tenant_id: TenantId, restocking: u16, bonus: u16) -> ReturnPolicy {
        ReturnPolicy {
            id: PolicyId::new(EntityId::new()),
            tenant_id,
            name: "Standard".into(),
            return_window_days: 30,
            return_window_start: WindowStart::Fulfilled,
            allow_refunds: true,
            allow_exchanges: true,
            allow_store_credit: true,
            store_credit_bonus_percent: Some(bonus),
            restocking_fee_percent: Some(restocking),
            requires_receipt: false,
            requires_original_packaging: false,
            is_default: true,
            is_active: true,
        }
    }

    fn service() -> (SubmitReturnService, Arc<InMemoryReturnStore>) {
        let store = Arc::new(InMemoryReturnStore::new());
        (SubmitReturnService::new(store.clone()), store)
    }

    fn size_exchange_option(tenant_id: TenantId) -> ReturnTypeOption {
        ReturnTypeOption {
            id: TypeOptionId::new(EntityId::new()),
            tenant_id,
            label: "Exchange for different size".into(),
            description: None,
            category: ReturnCategory::Exchange,
            is_active: true,
            sort_order: 1,
        }
    }

    #[tokio::test]
    async fn size_exchange_charges_both_shipping_fees() {
        let tenant = TenantId::new();
        let (svc, store) = service();
        store
            .upsert_shipping_settings(ShippingFeeSettings {
                tenant_id: tenant,
                return_shipping_fee: Money::from_minor(500),
                new_product_shipping_fee: Money::from_minor(700),
                currency: "USD".into(),
            })
            .await
            .unwrap();
        let option = size_exchange_option(tenant);
        store.upsert_type_option(option.clone()).await.unwrap();

        let mut input = submission(tenant, "Wrong size", ReturnCategory::Exchange);
        input.type_option_id = Some(option.id);
        input.items[0].exchange_variant_name = Some("L / Green".into());

        let receipt = svc.submit(input).await.unwrap();

        assert_eq!(receipt.flow, Flow::SizeExchange);
        assert_eq!(receipt.shipping, ExchangeShipping::Total(Money::from_minor(1_200)));
        assert_eq!(receipt.amounts, OutcomeAmounts::default());
    }

    #[tokio::test]
    async fn size_exchange_without_settings_reports_unconfigured() {
        let tenant = TenantId::new();
        let (svc, store) = service();
        let option = size_exchange_option(tenant);
        store.upsert_type_option(option.clone()).await.unwrap();

        let mut input = submission(tenant, "Wrong size", ReturnCategory::Exchange);
        input.type_option_id = Some(option.id);
        let receipt = svc.submit(input).await.unwrap();

        assert_eq!(receipt.flow, Flow::SizeExchange);
        assert_eq!(receipt.shipping, ExchangeShipping::Unconfigured);
    }

    #[tokio::test]
    async fn damaged_refund_requires_evidence_and_sheds_restocking_fee() {
        let tenant = TenantId::new();
        let (svc, store) = service();
        store
            .insert_policy(policy_with_fees(tenant, 10, 15))
            .await
            .unwrap();

        let bare = submission(tenant, "Damaged or defective", ReturnCategory::Refund);
        let err = svc.submit(bare.clone()).await.unwrap_err();
        assert!(matches!(
            err,
            SubmitError::Validation(ValidationError::EvidenceRequired)
        ));

        let mut with_photo = bare;
        with_photo.evidence_image_urls = vec!["mem://t/1/damage.jpg".into()];
        let receipt = svc.submit(with_photo).await.unwrap();

        assert_eq!(receipt.flow, Flow::DirectRefundOrCredit);
        // 10_000 minus the 10% restocking share.
        assert_eq!(receipt.amounts.refund, Some(Money::from_minor(9_000)));
        assert_eq!(receipt.amounts.store_credit, None);
    }

    #[tokio::test]
    async fn store_credit_gains_bonus_share() {
        let tenant = TenantId::new();
        let (svc, store) = service();
        store
            .insert_policy(policy_with_fees(tenant, 10, 15))
            .await
            .unwrap();

        let receipt = svc
            .submit(submission(tenant, "No longer needed", ReturnCategory::StoreCredit))
            .await
            .unwrap();

        assert_eq!(receipt.amounts.store_credit, Some(Money::from_minor(11_500)));
        assert_eq!(receipt.amounts.refund, None);
    }

    #[tokio::test]
    async fn other_reason_needs_elaboration() {
        let tenant = TenantId::new();
        let (svc, _) = service();

        for description in [None, Some("   ".to_string())] {
            let mut input = submission(tenant, "Other", ReturnCategory::Refund);
            input.other_reason_description = description;
            let err = svc.submit(input).await.unwrap_err();
            assert!(matches!(
                err,
                SubmitError::Validation(ValidationError::MissingElaboration)
            ));
        }
    }

    #[tokio::test]
    async fn generic_exchange_rejects_wrong_size_reason() {
        let tenant = TenantId::new();
        let (svc, store) = service();
        // A configured generic exchange option, fetched by id.
        let option = ReturnTypeOption {
            id: TypeOptionId::new(EntityId::new()),
            tenant_id: tenant,
            label: "Exchange".into(),
            description: Some("Swap for a different product".into()),
            category: ReturnCategory::Exchange,
            is_active: true,
            sort_order: 0,
        };
        store.upsert_type_option(option.clone()).await.unwrap();

        let mut input = submission(tenant, "Wrong size", ReturnCategory::Exchange);
        input.type_option_id = Some(option.id);

        let err = svc.submit(input).await.unwrap_err();
        assert!(matches!(
            err,
            SubmitError::Validation(ValidationError::Ineligible)
        ));
    }

    #[tokio::test]
    async fn empty_selections_are_rejected() {
        let tenant = TenantId::new();
        let (svc, _) = service();

        let mut no_reason = submission(tenant, "  ", ReturnCategory::Refund);
        no_reason.reason = "  ".into();
        assert!(matches!(
            svc.submit(no_reason).await.unwrap_err(),
            SubmitError::Validation(ValidationError::MissingReason)
        ));

        let mut no_items = submission(tenant, "Changed my mind", ReturnCategory::Refund);
        no_items.items.clear();
        assert!(matches!(
            svc.submit(no_items).await.unwrap_err(),
            SubmitError::Validation(ValidationError::NoItemsSelected)
        ));

        let mut too_many = submission(tenant, "Changed my mind", ReturnCategory::Refund);
        too_many.evidence_image_urls = (0..6).map(|i| format!("mem://t/{i}.jpg")).collect();
        assert!(matches!(
            svc.submit(too_many).await.unwrap_err(),
            SubmitError::Validation(ValidationError::TooManyEvidenceImages)
        ));
    }

    #[tokio::test]
    async fn submitted_request_and_items_are_persisted_together() {
        let tenant = TenantId::new();
        let (svc, store) = service();

        let mut input = submission(tenant, "Changed my mind", ReturnCategory::Refund);
        input.items.push(item(2_500, 1));
        let receipt = svc.submit(input).await.unwrap();

        let stored = store
            .get_request(tenant, receipt.request_id)
            .await
            .unwrap()
            .expect("request should be stored");
        assert_eq!(stored.status, RequestStatus::Pending);
        assert_eq!(stored.refund_amount, Some(Money::from_minor(12_500)));

        let items = store.request_items(tenant, receipt.request_id).await.unwrap();
        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn original_amount_records_only_the_selected_items() {
        let tenant = TenantId::new();
        let (svc, store) = service();

        // One 3_500 line out of a larger order; the rest of the order is
        // not coming back and must not inflate the recorded amount.
        let mut input = submission(tenant, "Changed my mind", ReturnCategory::Refund);
        input.items = vec![item(3_500, 1)];
        let receipt = svc.submit(input).await.unwrap();

        let stored = store
            .get_request(tenant, receipt.request_id)
            .await
            .unwrap()
            .expect("request should be stored");
        assert_eq!(stored.original_amount, Money::from_minor(3_500));
        assert_eq!(stored.refund_amount, Some(Money::from_minor(3_500)));
    }

    #[tokio::test]
    async fn concurrent_approvals_serialize_to_one_winner() {
        let tenant = TenantId::new();
        let (svc, store) = service();

        let receipt = svc
            .submit(submission(tenant, "Changed my mind", ReturnCategory::Refund))
            .await
            .unwrap();

        let merchant = UserId::new();
        let now = Utc::now();
        let a = store.transition_request(
            tenant,
            receipt.request_id,
            RequestStatus::Approved,
            now,
            Some(merchant),
        );
        let b = store.transition_request(
            tenant,
            receipt.request_id,
            RequestStatus::Approved,
            now,
            Some(merchant),
        );
        let (a, b) = tokio::join!(a, b);

        let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1, "exactly one approve may win");
        let loser = if a.is_err() { a } else { b };
        assert!(matches!(
            loser.unwrap_err(),
            GatewayError::InvalidTransition(_)
        ));
    }
}
