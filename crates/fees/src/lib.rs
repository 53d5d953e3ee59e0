//! Monetary figures for a return: item value, settlement amount, and the
//! shipping fees owed on exchanges.

pub mod calculator;
pub mod settings;

pub use calculator::{
    exchange_shipping_total, items_value, outcome_amount, ExchangeShipping, OutcomeAmounts,
};
pub use settings::ShippingFeeSettings;
