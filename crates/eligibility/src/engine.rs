//! The eligibility decision table.
//!
//! One evaluation per (reason, type option) pair answers three questions:
//! is the combination legal, is photo evidence mandatory, and which flow the
//! submission takes afterwards. The function is total — every input pair
//! produces an answer, and precondition failures (missing elaboration,
//! missing images) are enforced by the submission gates, not here.

use serde::{Deserialize, Serialize};

use crate::catalog::{ReturnCategory, ReturnTypeOption};
use crate::reason::ReasonKind;

/// The post-validation branch controlling what happens between the
/// reason/type form and final submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Flow {
    /// Merchant-fault reason settled in money: customer keeps the item,
    /// no return shipment, an informational review step only.
    DirectRefundOrCredit,
    /// Wrong size exchanged for another size: replacement size selected per
    /// item, both shipping fees owed by the customer.
    SizeExchange,
    /// Merchant-fault reason settled in kind: replacement size selected,
    /// no shipping fee.
    ReplacementExchange,
    /// Everything else: submit directly after the form.
    Standard,
}

impl Flow {
    /// Whether an intermediate review/size-selection step precedes submission.
    pub fn has_review_step(&self) -> bool {
        !matches!(self, Flow::Standard)
    }

    /// Whether the customer selects replacement sizes in this flow.
    pub fn selects_replacement(&self) -> bool {
        matches!(self, Flow::SizeExchange | Flow::ReplacementExchange)
    }
}

/// Outcome of evaluating one (reason, type option) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eligibility {
    /// Whether the customer may pick this option for this reason. When a
    /// previously-selected option turns ineligible after a reason change the
    /// caller clears the selection; nothing here auto-substitutes.
    pub allowed: bool,
    /// Whether at least one uploaded image is a submission precondition.
    pub requires_evidence: bool,
    /// The downstream flow; meaningful when `allowed` is true.
    pub flow: Flow,
}

/// Evaluate a declared reason against a candidate return-type option.
pub fn evaluate(reason: &str, option: &ReturnTypeOption) -> Eligibility {
    let kind = ReasonKind::classify(reason);

    Eligibility {
        allowed: is_allowed(kind, option),
        requires_evidence: requires_evidence(kind, option.category),
        flow: flow(kind, option.category),
    }
}

/// Rule 1 — type/label compatibility.
///
/// A size-specific exchange is reserved for wrong-size (and "Other") returns;
/// wrong-size customers in turn must use it instead of a generic exchange.
/// Refund and store-credit options are open to every reason.
fn is_allowed(kind: ReasonKind, option: &ReturnTypeOption) -> bool {
    if option.is_size_exchange() {
        return matches!(kind, ReasonKind::WrongSize | ReasonKind::Other);
    }

    match option.category {
        ReturnCategory::Exchange => kind != ReasonKind::WrongSize,
        ReturnCategory::Refund | ReturnCategory::StoreCredit => true,
    }
}

/// Rule 2 — evidence requirement.
fn requires_evidence(kind: ReasonKind, category: ReturnCategory) -> bool {
    match (kind, category) {
        // Intentional exception: a wrong-size exchange never needs photo
        // proof, even where the label text might brush a wrong-item check.
        (ReasonKind::WrongSize, ReturnCategory::Exchange) => false,
        (ReasonKind::DamagedOrDefective | ReasonKind::WrongItem, _) => true,
        _ => false,
    }
}

/// Rule 3 — flow selection.
fn flow(kind: ReasonKind, category: ReturnCategory) -> Flow {
    match (kind, category) {
        (
            ReasonKind::DamagedOrDefective | ReasonKind::WrongItem,
            ReturnCategory::Refund | ReturnCategory::StoreCredit,
        ) => Flow::DirectRefundOrCredit,
        (ReasonKind::WrongSize, ReturnCategory::Exchange) => Flow::SizeExchange,
        (ReasonKind::DamagedOrDefective | ReasonKind::WrongItem, ReturnCategory::Exchange) => {
            Flow::ReplacementExchange
        }
        _ => Flow::Standard,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ReturnTypeOption, TypeOptionId};
    use proptest::prelude::*;
    use returnflow_core::{EntityId, TenantId};

    fn option(label: &str, category: ReturnCategory) -> ReturnTypeOption {
        ReturnTypeOption {
            id: TypeOptionId::new(EntityId::new()),
            tenant_id: TenantId::new(),
            label: label.to_string(),
            description: None,
            category,
            is_active: true,
            sort_order: 0,
        }
    }

    fn size_exchange() -> ReturnTypeOption {
        option("Exchange for different size", ReturnCategory::Exchange)
    }

    fn generic_exchange() -> ReturnTypeOption {
        option("Exchange for another item", ReturnCategory::Exchange)
    }

    fn refund() -> ReturnTypeOption {
        option("Refund to original payment", ReturnCategory::Refund)
    }

    fn store_credit() -> ReturnTypeOption {
        option("Store credit", ReturnCategory::StoreCredit)
    }

    #[test]
    fn size_exchange_only_for_wrong_size_and_other() {
        assert!(evaluate("Wrong size", &size_exchange()).allowed);
        assert!(evaluate("Other", &size_exchange()).allowed);

        assert!(!evaluate("Wrong color", &size_exchange()).allowed);
        assert!(!evaluate("Damaged or defective", &size_exchange()).allowed);
        assert!(!evaluate("Changed my mind", &size_exchange()).allowed);
    }

    #[test]
    fn wrong_size_must_use_the_size_specific_exchange() {
        assert!(!evaluate("Wrong size", &generic_exchange()).allowed);
        assert!(evaluate("Wrong color", &generic_exchange()).allowed);
        assert!(evaluate("Other", &generic_exchange()).allowed);
    }

    #[test]
    fn refund_and_store_credit_are_open_to_every_reason() {
        for reason in crate::catalog::DEFAULT_REASONS {
            assert!(evaluate(reason, &refund()).allowed, "refund for {reason:?}");
            assert!(
                evaluate(reason, &store_credit()).allowed,
                "store credit for {reason:?}"
            );
        }
    }

    #[test]
    fn evidence_required_for_damage_and_wrong_item() {
        assert!(evaluate("Damaged or defective", &refund()).requires_evidence);
        assert!(evaluate("Received wrong item", &store_credit()).requires_evidence);
        assert!(evaluate("Damaged or defective", &generic_exchange()).requires_evidence);

        assert!(!evaluate("Wrong color", &refund()).requires_evidence);
        assert!(!evaluate("Changed my mind", &store_credit()).requires_evidence);
    }

    #[test]
    fn wrong_size_exchange_never_requires_evidence() {
        let e = evaluate("Wrong size", &size_exchange());
        assert!(e.allowed);
        assert!(!e.requires_evidence);

        // Even a label that mentions the item wrongness stays exempt once it
        // classifies as wrong-size.
        let e = evaluate("Wrong size, item doesn't fit", &size_exchange());
        assert!(!e.requires_evidence);
    }

    #[test]
    fn flow_table_matches_the_four_branches() {
        assert_eq!(
            evaluate("Damaged or defective", &refund()).flow,
            Flow::DirectRefundOrCredit
        );
        assert_eq!(
            evaluate("Received wrong item", &store_credit()).flow,
            Flow::DirectRefundOrCredit
        );
        assert_eq!(evaluate("Wrong size", &size_exchange()).flow, Flow::SizeExchange);
        assert_eq!(
            evaluate("Damaged or defective", &generic_exchange()).flow,
            Flow::ReplacementExchange
        );
        assert_eq!(evaluate("Wrong color", &refund()).flow, Flow::Standard);
        assert_eq!(evaluate("Changed my mind", &store_credit()).flow, Flow::Standard);
    }

    #[test]
    fn review_step_presence_follows_the_flow() {
        assert!(Flow::DirectRefundOrCredit.has_review_step());
        assert!(Flow::SizeExchange.has_review_step());
        assert!(Flow::ReplacementExchange.has_review_step());
        assert!(!Flow::Standard.has_review_step());

        assert!(Flow::SizeExchange.selects_replacement());
        assert!(!Flow::DirectRefundOrCredit.selects_replacement());
    }

    fn arb_category() -> impl Strategy<Value = ReturnCategory> {
        prop_oneof![
            Just(ReturnCategory::Refund),
            Just(ReturnCategory::Exchange),
            Just(ReturnCategory::StoreCredit),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 512,
            ..ProptestConfig::default()
        })]

        /// Property: evaluation is total and deterministic over arbitrary
        /// reason text and option labels.
        #[test]
        fn evaluate_is_total_and_deterministic(
            reason in ".{0,64}",
            label in ".{0,64}",
            category in arb_category(),
        ) {
            let opt = option(&label, category);
            let first = evaluate(&reason, &opt);
            let second = evaluate(&reason, &opt);
            prop_assert_eq!(first, second);
        }

        /// Property: a size-exchange option is never eligible unless the
        /// reason is wrong-size or literally "Other".
        #[test]
        fn size_exchange_never_leaks_to_other_reasons(reason in ".{0,64}") {
            let e = evaluate(&reason, &size_exchange());
            let kind = ReasonKind::classify(&reason);
            if !matches!(kind, ReasonKind::WrongSize | ReasonKind::Other) {
                prop_assert!(!e.allowed);
            }
        }

        /// Property: evidence is required iff the reason is merchant-fault
        /// and the pair is not a wrong-size exchange.
        #[test]
        fn evidence_rule_is_exact(reason in ".{0,64}", category in arb_category()) {
            let opt = option("Anything", category);
            let e = evaluate(&reason, &opt);
            let kind = ReasonKind::classify(&reason);

            let expected = kind.is_merchant_fault()
                && !(kind == ReasonKind::WrongSize && category == ReturnCategory::Exchange);
            prop_assert_eq!(e.requires_evidence, expected);
        }
    }
}
