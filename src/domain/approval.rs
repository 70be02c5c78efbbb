use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::domain::error::ApprovalError;

/// Lifecycle of an approvable subject (a request or a per-employee duty
/// attendance row). `Approved` and `Rejected` are terminal; there is no
/// undo transition, corrections require a new request.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum ApprovalState {
    #[strum(serialize = "pending")]
    Pending,
    #[strum(serialize = "approved")]
    Approved,
    #[strum(serialize = "rejected")]
    Rejected,
}

/// An admin decision. Build rejections through [`Decision::reject`] so a
/// blank reason can never reach the transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject { reason: String },
}

impl Decision {
    pub fn reject(reason: &str) -> Result<Self, ApprovalError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ApprovalError::ReasonRequired);
        }
        Ok(Decision::Reject { reason: reason.to_string() })
    }

    pub fn target_state(&self) -> ApprovalState {
        match self {
            Decision::Approve => ApprovalState::Approved,
            Decision::Reject { .. } => ApprovalState::Rejected,
        }
    }
}

/// Apply a decision to the subject's current state. Exactly-once: anything
/// other than `Pending` refuses with `AlreadyDecided`.
pub fn decide(current: ApprovalState, decision: &Decision) -> Result<ApprovalState, ApprovalError> {
    if current != ApprovalState::Pending {
        return Err(ApprovalError::AlreadyDecided);
    }
    Ok(decision.target_state())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn approve_from_pending() {
        assert_eq!(
            decide(ApprovalState::Pending, &Decision::Approve).unwrap(),
            ApprovalState::Approved
        );
    }

    #[test]
    fn reject_requires_a_reason() {
        assert_eq!(Decision::reject("").unwrap_err(), ApprovalError::ReasonRequired);
        assert_eq!(Decision::reject("   ").unwrap_err(), ApprovalError::ReasonRequired);
    }

    #[test]
    fn reject_stores_the_trimmed_reason() {
        let decision = Decision::reject(" Dokumen tidak lengkap ").unwrap();
        assert_eq!(
            decision,
            Decision::Reject { reason: "Dokumen tidak lengkap".to_string() }
        );
        assert_eq!(
            decide(ApprovalState::Pending, &decision).unwrap(),
            ApprovalState::Rejected
        );
    }

    #[test]
    fn decided_subjects_refuse_further_decisions() {
        for terminal in [ApprovalState::Approved, ApprovalState::Rejected] {
            assert_eq!(
                decide(terminal, &Decision::Approve).unwrap_err(),
                ApprovalError::AlreadyDecided
            );
            let reject = Decision::reject("terlalu lama").unwrap();
            assert_eq!(decide(terminal, &reject).unwrap_err(), ApprovalError::AlreadyDecided);
        }
    }

    #[test]
    fn state_parses_from_db_strings() {
        assert_eq!(ApprovalState::from_str("pending").unwrap(), ApprovalState::Pending);
        assert_eq!(ApprovalState::from_str("Approved").unwrap(), ApprovalState::Approved);
        assert_eq!(ApprovalState::Rejected.as_ref(), "rejected");
    }
}
