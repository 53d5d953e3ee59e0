//! Merchant-configurable reason and return-type catalogs.

use serde::{Deserialize, Serialize};

use returnflow_core::{Entity, EntityId, TenantId};

/// Return reason identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReasonId(pub EntityId);

impl ReasonId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ReasonId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl core::str::FromStr for ReasonId {
    type Err = returnflow_core::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// Return type option identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeOptionId(pub EntityId);

impl TypeOptionId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for TypeOptionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl core::str::FromStr for TypeOptionId {
    type Err = returnflow_core::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// Underlying settlement kind of a return-type option, independent of its
/// merchant-facing label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnCategory {
    Refund,
    Exchange,
    StoreCredit,
}

impl ReturnCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Refund => "refund",
            Self::Exchange => "exchange",
            Self::StoreCredit => "store_credit",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "refund" => Some(Self::Refund),
            "exchange" => Some(Self::Exchange),
            "store_credit" => Some(Self::StoreCredit),
            _ => None,
        }
    }
}

/// A merchant-defined reason label customers can pick from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnReason {
    pub id: ReasonId,
    pub tenant_id: TenantId,
    pub reason: String,
    pub is_active: bool,
    pub sort_order: u32,
}

impl Entity for ReturnReason {
    type Id = ReasonId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// A merchant-defined desired outcome customers can pick from.
///
/// Multiple options may map to the same category: a merchant can offer a
/// generic "Exchange for another item" next to "Exchange for different size",
/// both with category [`ReturnCategory::Exchange`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnTypeOption {
    pub id: TypeOptionId,
    pub tenant_id: TenantId,
    pub label: String,
    pub description: Option<String>,
    pub category: ReturnCategory,
    pub is_active: bool,
    pub sort_order: u32,
}

impl Entity for ReturnTypeOption {
    type Id = TypeOptionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl ReturnTypeOption {
    /// Whether the label denotes an exchange for a different size.
    pub fn is_size_exchange(&self) -> bool {
        self.category == ReturnCategory::Exchange && self.label.to_lowercase().contains("size")
    }
}

/// Built-in reason labels, substituted whenever a merchant has configured none.
pub const DEFAULT_REASONS: [&str; 7] = [
    "Wrong size",
    "Wrong color",
    "Damaged or defective",
    "Changed my mind",
    "Received wrong item",
    "Quality not as expected",
    "Other",
];

/// Seed the built-in reason list for a tenant, in display order.
pub fn default_reasons(tenant_id: TenantId) -> Vec<ReturnReason> {
    DEFAULT_REASONS
        .iter()
        .enumerate()
        .map(|(i, reason)| ReturnReason {
            id: ReasonId::new(EntityId::new()),
            tenant_id,
            reason: (*reason).to_string(),
            is_active: true,
            sort_order: i as u32,
        })
        .collect()
}

/// Seed the built-in type options for a tenant: one option per category.
pub fn default_type_options(tenant_id: TenantId) -> Vec<ReturnTypeOption> {
    let defaults = [
        (
            "Refund to original payment",
            "Customer receives money back to their original payment method",
            ReturnCategory::Refund,
        ),
        (
            "Exchange for another item",
            "Customer can swap for a different product",
            ReturnCategory::Exchange,
        ),
        (
            "Store credit",
            "Customer receives credit to use on future purchases",
            ReturnCategory::StoreCredit,
        ),
    ];

    defaults
        .iter()
        .enumerate()
        .map(|(i, (label, description, category))| ReturnTypeOption {
            id: TypeOptionId::new(EntityId::new()),
            tenant_id,
            label: (*label).to_string(),
            description: Some((*description).to_string()),
            category: *category,
            is_active: true,
            sort_order: i as u32,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalogs_cover_all_categories_in_order() {
        let tenant = TenantId::new();

        let reasons = default_reasons(tenant);
        assert_eq!(reasons.len(), 7);
        assert!(reasons.iter().all(|r| r.is_active));
        assert_eq!(reasons[0].reason, "Wrong size");
        assert_eq!(reasons[6].reason, "Other");

        let options = default_type_options(tenant);
        let categories: Vec<_> = options.iter().map(|o| o.category).collect();
        assert_eq!(
            categories,
            vec![
                ReturnCategory::Refund,
                ReturnCategory::Exchange,
                ReturnCategory::StoreCredit
            ]
        );
    }

    #[test]
    fn size_exchange_detection_is_label_driven() {
        let tenant = TenantId::new();
        let mut option = default_type_options(tenant).remove(1);
        assert!(!option.is_size_exchange());

        option.label = "Exchange for different size".to_string();
        assert!(option.is_size_exchange());

        // A refund option mentioning size is still not a size exchange.
        option.category = ReturnCategory::Refund;
        assert!(!option.is_size_exchange());
    }

    #[test]
    fn category_round_trips_through_strings() {
        for category in [
            ReturnCategory::Refund,
            ReturnCategory::Exchange,
            ReturnCategory::StoreCredit,
        ] {
            assert_eq!(ReturnCategory::parse(category.as_str()), Some(category));
        }
        assert_eq!(ReturnCategory::parse("voucher"), None);
    }
}
