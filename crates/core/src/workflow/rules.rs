//! Approval rule model and invariant validation.
//!
//! A company configures at most one rule. The rule decides when the
//! compiled steps of an expense are *satisfied*:
//! - `Percentage` - a fraction of the flow-derived steps must approve
//! - `SpecificApprover` - one named user must approve
//! - `Hybrid` - both conditions must hold

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::workflow::error::WorkflowError;

/// Kind of approval rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    /// A threshold fraction of flow steps must approve.
    Percentage,
    /// A named approver must approve.
    #[serde(rename = "specific")]
    SpecificApprover,
    /// Both the percentage and the specific-approver condition apply.
    Hybrid,
}

impl RuleKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
            Self::SpecificApprover => "specific",
            Self::Hybrid => "hybrid",
        }
    }

    /// Parses a kind from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "percentage" => Some(Self::Percentage),
            "specific" => Some(Self::SpecificApprover),
            "hybrid" => Some(Self::Hybrid),
            _ => None,
        }
    }
}

/// A company's approval rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRule {
    /// Kind of rule.
    pub kind: RuleKind,
    /// Fraction of flow steps that must approve, in (0, 1].
    /// Required for Percentage and Hybrid.
    pub threshold: Option<Decimal>,
    /// Named approver. Required for SpecificApprover and Hybrid.
    pub specific_approver_id: Option<Uuid>,
}

impl ApprovalRule {
    /// Creates a percentage rule.
    #[must_use]
    pub const fn percentage(threshold: Decimal) -> Self {
        Self {
            kind: RuleKind::Percentage,
            threshold: Some(threshold),
            specific_approver_id: None,
        }
    }

    /// Creates a specific-approver rule.
    #[must_use]
    pub const fn specific(approver_id: Uuid) -> Self {
        Self {
            kind: RuleKind::SpecificApprover,
            threshold: None,
            specific_approver_id: Some(approver_id),
        }
    }

    /// Creates a hybrid rule.
    #[must_use]
    pub const fn hybrid(threshold: Decimal, approver_id: Uuid) -> Self {
        Self {
            kind: RuleKind::Hybrid,
            threshold: Some(threshold),
            specific_approver_id: Some(approver_id),
        }
    }

    /// Validates the rule's field invariants.
    ///
    /// Percentage requires a threshold in (0, 1] and no specific approver;
    /// SpecificApprover requires the reverse; Hybrid requires both.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::InvalidRule` describing the violation.
    pub fn validate(&self) -> Result<(), WorkflowError> {
        match self.kind {
            RuleKind::Percentage => {
                if self.specific_approver_id.is_some() {
                    return Err(WorkflowError::InvalidRule(
                        "percentage rule must not name a specific approver".to_string(),
                    ));
                }
                self.validate_threshold()
            }
            RuleKind::SpecificApprover => {
                if self.threshold.is_some() {
                    return Err(WorkflowError::InvalidRule(
                        "specific-approver rule must not set a threshold".to_string(),
                    ));
                }
                if self.specific_approver_id.is_none() {
                    return Err(WorkflowError::InvalidRule(
                        "specific-approver rule requires an approver".to_string(),
                    ));
                }
                Ok(())
            }
            RuleKind::Hybrid => {
                if self.specific_approver_id.is_none() {
                    return Err(WorkflowError::InvalidRule(
                        "hybrid rule requires a specific approver".to_string(),
                    ));
                }
                self.validate_threshold()
            }
        }
    }

    fn validate_threshold(&self) -> Result<(), WorkflowError> {
        let Some(threshold) = self.threshold else {
            return Err(WorkflowError::InvalidRule(
                "percentage condition requires a threshold".to_string(),
            ));
        };
        if threshold <= Decimal::ZERO || threshold > Decimal::ONE {
            return Err(WorkflowError::InvalidRule(format!(
                "threshold must be in (0, 1], got {threshold}"
            )));
        }
        Ok(())
    }

    /// Returns true if the rule names a specific approver that must be
    /// part of the compiled steps.
    #[must_use]
    pub const fn requires_specific_step(&self) -> bool {
        matches!(self.kind, RuleKind::SpecificApprover | RuleKind::Hybrid)
    }

    /// Returns true if the rule carries a percentage condition.
    #[must_use]
    pub const fn has_percentage_condition(&self) -> bool {
        matches!(self.kind, RuleKind::Percentage | RuleKind::Hybrid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_percentage_rule_valid() {
        assert!(ApprovalRule::percentage(dec!(0.6)).validate().is_ok());
        assert!(ApprovalRule::percentage(dec!(1)).validate().is_ok());
    }

    #[test]
    fn test_percentage_rule_threshold_bounds() {
        assert!(ApprovalRule::percentage(dec!(0)).validate().is_err());
        assert!(ApprovalRule::percentage(dec!(1.01)).validate().is_err());
        assert!(ApprovalRule::percentage(dec!(-0.5)).validate().is_err());
    }

    #[test]
    fn test_percentage_rule_rejects_specific_approver() {
        let rule = ApprovalRule {
            kind: RuleKind::Percentage,
            threshold: Some(dec!(0.5)),
            specific_approver_id: Some(Uuid::new_v4()),
        };
        assert!(matches!(rule.validate(), Err(WorkflowError::InvalidRule(_))));
    }

    #[test]
    fn test_specific_rule_valid() {
        assert!(ApprovalRule::specific(Uuid::new_v4()).validate().is_ok());
    }

    #[test]
    fn test_specific_rule_rejects_threshold() {
        let rule = ApprovalRule {
            kind: RuleKind::SpecificApprover,
            threshold: Some(dec!(0.5)),
            specific_approver_id: Some(Uuid::new_v4()),
        };
        assert!(rule.validate().is_err());
    }

    #[test]
    fn test_specific_rule_requires_approver() {
        let rule = ApprovalRule {
            kind: RuleKind::SpecificApprover,
            threshold: None,
            specific_approver_id: None,
        };
        assert!(rule.validate().is_err());
    }

    #[test]
    fn test_hybrid_rule_requires_both() {
        assert!(
            ApprovalRule::hybrid(dec!(0.6), Uuid::new_v4())
                .validate()
                .is_ok()
        );

        let missing_approver = ApprovalRule {
            kind: RuleKind::Hybrid,
            threshold: Some(dec!(0.6)),
            specific_approver_id: None,
        };
        assert!(missing_approver.validate().is_err());

        let missing_threshold = ApprovalRule {
            kind: RuleKind::Hybrid,
            threshold: None,
            specific_approver_id: Some(Uuid::new_v4()),
        };
        assert!(missing_threshold.validate().is_err());
    }

    #[test]
    fn test_rule_kind_parse() {
        assert_eq!(RuleKind::parse("percentage"), Some(RuleKind::Percentage));
        assert_eq!(RuleKind::parse("SPECIFIC"), Some(RuleKind::SpecificApprover));
        assert_eq!(RuleKind::parse("Hybrid"), Some(RuleKind::Hybrid));
        assert_eq!(RuleKind::parse("unknown"), None);
    }

    #[test]
    fn test_rule_helpers() {
        assert!(ApprovalRule::specific(Uuid::new_v4()).requires_specific_step());
        assert!(!ApprovalRule::percentage(dec!(0.5)).requires_specific_step());
        assert!(ApprovalRule::hybrid(dec!(0.5), Uuid::new_v4()).has_percentage_condition());
        assert!(!ApprovalRule::specific(Uuid::new_v4()).has_percentage_condition());
    }
}
