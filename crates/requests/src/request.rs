use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use returnflow_core::{DomainError, DomainResult, Entity, EntityId, Money, TenantId, UserId};
use returnflow_eligibility::ReturnCategory;
use returnflow_policy::PolicyId;

use crate::status::{RequestStatus, TransitionError};

/// Return request identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub EntityId);

impl RequestId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for RequestId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl core::str::FromStr for RequestId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// The central entity: one customer-submitted return/exchange request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnRequest {
    pub id: RequestId,
    pub tenant_id: TenantId,
    /// Commerce-platform order identifier (opaque).
    pub order_id: String,
    /// Human-facing order number ("1001").
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: String,
    /// Declared reason label; may equal a configured `ReturnReason`'s text.
    pub reason: String,
    /// Free-text elaboration; only meaningful when `reason` is "Other".
    pub other_reason_description: Option<String>,
    pub customer_notes: Option<String>,
    pub category: ReturnCategory,
    pub evidence_image_urls: Vec<String>,
    /// Sum of the selected line items at submission time.
    pub original_amount: Money,
    pub refund_amount: Option<Money>,
    pub store_credit_amount: Option<Money>,
    pub policy_id: Option<PolicyId>,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub approved_by: Option<UserId>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub received_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Entity for ReturnRequest {
    type Id = RequestId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Fields captured at submission; everything lifecycle-related starts empty.
#[derive(Debug, Clone)]
pub struct NewReturnRequest {
    pub tenant_id: TenantId,
    pub order_id: String,
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: String,
    pub reason: String,
    pub other_reason_description: Option<String>,
    pub customer_notes: Option<String>,
    pub category: ReturnCategory,
    pub evidence_image_urls: Vec<String>,
    pub original_amount: Money,
    pub refund_amount: Option<Money>,
    pub store_credit_amount: Option<Money>,
    pub policy_id: Option<PolicyId>,
}

impl ReturnRequest {
    /// Create a freshly-submitted request in `pending`.
    ///
    /// Enforces the settlement invariant: refund and store-credit amounts are
    /// mutually exclusive, and an exchange carries neither.
    pub fn submit(new: NewReturnRequest, now: DateTime<Utc>) -> DomainResult<Self> {
        if new.refund_amount.is_some() && new.store_credit_amount.is_some() {
            return Err(DomainError::invariant(
                "refund and store-credit amounts are mutually exclusive",
            ));
        }
        if new.category == ReturnCategory::Exchange
            && (new.refund_amount.is_some() || new.store_credit_amount.is_some())
        {
            return Err(DomainError::invariant(
                "exchange requests carry no settlement amount",
            ));
        }

        Ok(Self {
            id: RequestId::new(EntityId::new()),
            tenant_id: new.tenant_id,
            order_id: new.order_id,
            order_number: new.order_number,
            customer_name: new.customer_name,
            customer_email: new.customer_email,
            reason: new.reason,
            other_reason_description: new.other_reason_description,
            customer_notes: new.customer_notes,
            category: new.category,
            evidence_image_urls: new.evidence_image_urls,
            original_amount: new.original_amount,
            refund_amount: new.refund_amount,
            store_credit_amount: new.store_credit_amount,
            policy_id: new.policy_id,
            status: RequestStatus::Pending,
            created_at: now,
            approved_at: None,
            approved_by: None,
            shipped_at: None,
            received_at: None,
            completed_at: None,
        })
    }

    /// Apply a lifecycle transition, stamping the matching timestamp.
    ///
    /// Fails without touching the record when the edge is not in the allowed
    /// set. `actor` is recorded on approval.
    pub fn transition(
        &mut self,
        to: RequestStatus,
        now: DateTime<Utc>,
        actor: Option<UserId>,
    ) -> Result<(), TransitionError> {
        self.status.check_transition(to)?;

        self.status = to;
        match to {
            RequestStatus::Approved => {
                self.approved_at = Some(now);
                self.approved_by = actor;
            }
            RequestStatus::Shipped => self.shipped_at = Some(now),
            RequestStatus::Received => self.received_at = Some(now),
            RequestStatus::Completed => self.completed_at = Some(now),
            RequestStatus::Pending
            | RequestStatus::Processing
            | RequestStatus::Rejected
            | RequestStatus::Cancelled => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_request(category: ReturnCategory, refund: Option<u64>, credit: Option<u64>) -> NewReturnRequest {
        NewReturnRequest {
            tenant_id: TenantId::new(),
            order_id: "gid://shop/Order/1".to_string(),
            order_number: "1001".to_string(),
            customer_name: "Ada Lovelace".to_string(),
            customer_email: "ada@example.com".to_string(),
            reason: "Wrong color".to_string(),
            other_reason_description: None,
            customer_notes: None,
            category,
            evidence_image_urls: vec![],
            original_amount: Money::from_minor(5_000),
            refund_amount: refund.map(Money::from_minor),
            store_credit_amount: credit.map(Money::from_minor),
            policy_id: None,
        }
    }

    #[test]
    fn submitted_request_starts_pending_with_no_lifecycle_stamps() {
        let request =
            ReturnRequest::submit(new_request(ReturnCategory::Refund, Some(5_000), None), Utc::now())
                .unwrap();

        assert_eq!(request.status, RequestStatus::Pending);
        assert!(request.approved_at.is_none());
        assert!(request.shipped_at.is_none());
        assert!(request.received_at.is_none());
        assert!(request.completed_at.is_none());
    }

    #[test]
    fn settlement_amounts_are_mutually_exclusive() {
        let err = ReturnRequest::submit(
            new_request(ReturnCategory::Refund, Some(5_000), Some(5_000)),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn exchanges_carry_no_settlement_amount() {
        let err = ReturnRequest::submit(
            new_request(ReturnCategory::Exchange, Some(5_000), None),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));

        let ok = ReturnRequest::submit(new_request(ReturnCategory::Exchange, None, None), Utc::now());
        assert!(ok.is_ok());
    }

    #[test]
    fn approval_stamps_time_and_actor() {
        let mut request =
            ReturnRequest::submit(new_request(ReturnCategory::Refund, Some(5_000), None), Utc::now())
                .unwrap();
        let merchant = UserId::new();
        let at = Utc::now();

        request.transition(RequestStatus::Approved, at, Some(merchant)).unwrap();

        assert_eq!(request.status, RequestStatus::Approved);
        assert_eq!(request.approved_at, Some(at));
        assert_eq!(request.approved_by, Some(merchant));
    }

    #[test]
    fn full_forward_path_stamps_each_milestone() {
        let mut request =
            ReturnRequest::submit(new_request(ReturnCategory::Refund, Some(5_000), None), Utc::now())
                .unwrap();
        let actor = UserId::new();

        for to in [
            RequestStatus::Approved,
            RequestStatus::Processing,
            RequestStatus::Shipped,
            RequestStatus::Received,
            RequestStatus::Completed,
        ] {
            request.transition(to, Utc::now(), Some(actor)).unwrap();
        }

        assert_eq!(request.status, RequestStatus::Completed);
        assert!(request.approved_at.is_some());
        assert!(request.shipped_at.is_some());
        assert!(request.received_at.is_some());
        assert!(request.completed_at.is_some());
    }

    #[test]
    fn illegal_edge_leaves_the_record_unchanged() {
        let mut request =
            ReturnRequest::submit(new_request(ReturnCategory::Refund, Some(5_000), None), Utc::now())
                .unwrap();
        let before = request.clone();

        let err = request
            .transition(RequestStatus::Shipped, Utc::now(), None)
            .unwrap_err();

        assert_eq!(err.from, RequestStatus::Pending);
        assert_eq!(err.to, RequestStatus::Shipped);
        assert_eq!(request, before);
    }

    #[test]
    fn rejected_request_is_terminal() {
        let mut request =
            ReturnRequest::submit(new_request(ReturnCategory::Refund, Some(5_000), None), Utc::now())
                .unwrap();
        request
            .transition(RequestStatus::Rejected, Utc::now(), None)
            .unwrap();

        let err = request
            .transition(RequestStatus::Approved, Utc::now(), None)
            .unwrap_err();
        assert_eq!(err.from, RequestStatus::Rejected);
    }
}
