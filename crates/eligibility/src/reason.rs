//! Reason normalization.
//!
//! Merchants define reasons as free text, so the engine classifies the label
//! once into a closed kind and every rule downstream is keyed on that kind.

/// Normalized classification of a return-reason label.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ReasonKind {
    /// The item doesn't fit ("Wrong size").
    WrongSize,
    /// The item arrived damaged or defective.
    DamagedOrDefective,
    /// The customer received something other than what they ordered.
    WrongItem,
    /// The literal "Other" reason; submission requires a free-text elaboration.
    Other,
    /// Any other merchant-defined reason (wrong color, changed my mind, ...).
    General,
}

impl ReasonKind {
    /// Classify a reason label.
    ///
    /// Precedence matters: "wrong size" is checked before "wrong item" so a
    /// label like "Wrong sized item" lands on `WrongSize` and never trips the
    /// wrong-item evidence rule.
    pub fn classify(reason: &str) -> Self {
        let lower = reason.trim().to_lowercase();

        if lower == "other" {
            return Self::Other;
        }
        if lower.contains("wrong size") {
            return Self::WrongSize;
        }
        if lower.contains("damaged") || lower.contains("defective") {
            return Self::DamagedOrDefective;
        }
        if lower.contains("wrong item") {
            return Self::WrongItem;
        }

        Self::General
    }

    /// Reasons where the customer keeps the original item and the merchant is
    /// at fault (no return shipment, photo proof instead).
    pub fn is_merchant_fault(&self) -> bool {
        matches!(self, Self::DamagedOrDefective | Self::WrongItem)
    }
}
