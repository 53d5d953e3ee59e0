//! Fee and settlement-amount computation.

use serde::{Deserialize, Serialize};

use returnflow_core::{DomainError, DomainResult, Money};
use returnflow_eligibility::{Flow, ReturnCategory};
use returnflow_policy::ReturnPolicy;

use crate::settings::ShippingFeeSettings;

/// Sum of `unit_price * quantity` over the selected line items.
///
/// Order-independent and exact in minor units; overflow (absurd for real
/// orders) surfaces as an invariant violation rather than wrapping.
pub fn items_value<I>(items: I) -> DomainResult<Money>
where
    I: IntoIterator<Item = (Money, u32)>,
{
    let mut total = Money::ZERO;
    for (unit_price, quantity) in items {
        let line = unit_price
            .times(quantity)
            .ok_or_else(|| DomainError::invariant("line amount overflows minor units"))?;
        total = total
            .checked_add(line)
            .ok_or_else(|| DomainError::invariant("items value overflows minor units"))?;
    }
    Ok(total)
}

/// Settlement amounts for a request. At most one side is populated, and for
/// exchanges neither is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OutcomeAmounts {
    pub refund: Option<Money>,
    pub store_credit: Option<Money>,
}

/// Compute the settlement amount for the chosen category.
///
/// Refunds shed the policy's restocking-fee share; store credit gains the
/// policy's bonus share. Exchanges settle in kind, so no amount is produced.
pub fn outcome_amount(
    category: ReturnCategory,
    items_value: Money,
    policy: Option<&ReturnPolicy>,
) -> DomainResult<OutcomeAmounts> {
    let overflow = || DomainError::invariant("outcome amount overflows minor units");

    match category {
        ReturnCategory::Refund => {
            let amount = match policy.and_then(|p| p.effective_restocking_fee()) {
                Some(percent) => items_value.minus_percent(percent).ok_or_else(overflow)?,
                None => items_value,
            };
            Ok(OutcomeAmounts {
                refund: Some(amount),
                store_credit: None,
            })
        }
        ReturnCategory::StoreCredit => {
            let amount = match policy.and_then(|p| p.effective_store_credit_bonus()) {
                Some(percent) => items_value.plus_percent(percent).ok_or_else(overflow)?,
                None => items_value,
            };
            Ok(OutcomeAmounts {
                refund: None,
                store_credit: Some(amount),
            })
        }
        ReturnCategory::Exchange => Ok(OutcomeAmounts::default()),
    }
}

/// Shipping fees owed by the customer for an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "total")]
pub enum ExchangeShipping {
    /// No fee for this flow (merchant-fault replacement, or no exchange at all).
    NotCharged,
    /// Fees apply but the merchant has not configured amounts yet; render as
    /// "fees will be applied".
    Unconfigured,
    /// Return fee plus new-product fee.
    Total(Money),
}

/// Total shipping fee for the given flow.
///
/// Only the size-exchange flow charges the customer: the item itself is fine,
/// so shipping both ways is on them. Merchant-fault replacements ship free.
pub fn exchange_shipping_total(
    flow: Flow,
    settings: Option<&ShippingFeeSettings>,
) -> DomainResult<ExchangeShipping> {
    if flow != Flow::SizeExchange {
        return Ok(ExchangeShipping::NotCharged);
    }

    match settings {
        None => Ok(ExchangeShipping::Unconfigured),
        Some(s) => {
            let total = s
                .return_shipping_fee
                .checked_add(s.new_product_shipping_fee)
                .ok_or_else(|| DomainError::invariant("shipping fees overflow minor units"))?;
            Ok(ExchangeShipping::Total(total))
        }
    }
}
