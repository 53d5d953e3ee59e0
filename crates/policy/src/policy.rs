use serde::{Deserialize, Serialize};

use returnflow_core::{Entity, EntityId, TenantId};

/// Return policy identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyId(pub EntityId);

impl PolicyId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for PolicyId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl core::str::FromStr for PolicyId {
    type Err = returnflow_core::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// Anchor event the return window counts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowStart {
    Fulfilled,
    Delivered,
}

impl WindowStart {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fulfilled => "fulfilled",
            Self::Delivered => "delivered",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "fulfilled" => Some(Self::Fulfilled),
            "delivered" => Some(Self::Delivered),
            _ => None,
        }
    }
}

/// A merchant-defined rule set governing returns.
///
/// Exactly one policy per tenant may carry `is_default` at any time; the
/// persistence layer enforces the exclusivity atomically on set-default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnPolicy {
    pub id: PolicyId,
    pub tenant_id: TenantId,
    pub name: String,
    pub return_window_days: u32,
    pub return_window_start: WindowStart,
    pub allow_refunds: bool,
    pub allow_exchanges: bool,
    pub allow_store_credit: bool,
    /// Whole-percent bonus added to store-credit amounts, if configured.
    pub store_credit_bonus_percent: Option<u16>,
    /// Whole-percent share withheld from refunds, if configured.
    pub restocking_fee_percent: Option<u16>,
    pub requires_receipt: bool,
    pub requires_original_packaging: bool,
    pub is_default: bool,
    pub is_active: bool,
}

impl Entity for ReturnPolicy {
    type Id = PolicyId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl ReturnPolicy {
    /// A policy only governs new requests while active.
    pub fn is_applicable(&self) -> bool {
        self.is_active
    }

    /// Restocking fee with zero treated the same as unset.
    pub fn effective_restocking_fee(&self) -> Option<u16> {
        self.restocking_fee_percent.filter(|p| *p > 0)
    }

    /// Store-credit bonus with zero treated the same as unset.
    pub fn effective_store_credit_bonus(&self) -> Option<u16> {
        self.store_credit_bonus_percent.filter(|p| *p > 0)
    }
}
