use serde::{Deserialize, Serialize};

use returnflow_core::{Entity, EntityId, Money};

use crate::request::RequestId;

/// Return item identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub EntityId);

impl ItemId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ItemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// One selected line of the original order.
///
/// Owned exclusively by its parent request: inserted with it, deleted with it,
/// no independent lifecycle. Product/variant identifiers are the commerce
/// platform's opaque strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnItem {
    pub id: ItemId,
    pub request_id: RequestId,
    pub product_id: String,
    pub product_name: String,
    pub variant_id: Option<String>,
    pub variant_name: Option<String>,
    pub quantity: u32,
    pub unit_price: Money,
    pub product_image_url: Option<String>,
    /// Product the customer wants instead, for exchange flows.
    pub exchange_product_id: Option<String>,
    pub exchange_product_name: Option<String>,
    /// Selected replacement size/variant label, for size exchanges.
    pub exchange_variant_name: Option<String>,
}

impl Entity for ReturnItem {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl ReturnItem {
    /// Line total in minor units.
    pub fn line_value(&self) -> Option<Money> {
        self.unit_price.times(self.quantity)
    }
}
