//! Return eligibility: reasons, type options, and the rules that decide which
//! combinations are legal, when photo evidence is mandatory, and which
//! downstream flow a submission takes.

pub mod catalog;
pub mod engine;
pub mod reason;

pub use catalog::{
    default_reasons, default_type_options, ReasonId, ReturnCategory, ReturnReason,
    ReturnTypeOption, TypeOptionId, DEFAULT_REASONS,
};
pub use engine::{evaluate, Eligibility, Flow};
pub use reason::ReasonKind;
