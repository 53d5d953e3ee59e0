use serde::{Deserialize, Serialize};

use returnflow_core::{Money, TenantId};

/// Per-merchant shipping fees, charged only when an exchange requires the
/// original item to be shipped back.
///
/// One record per tenant. Absence means "not configured", which renders as
/// "fees will be applied" — never as a silent zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingFeeSettings {
    pub tenant_id: TenantId,
    pub return_shipping_fee: Money,
    pub new_product_shipping_fee: Money,
    /// ISO currency code the fee amounts (and all of the tenant's money
    /// fields) are denominated in.
    pub currency: String,
}
