use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::approval::ApprovalState;
use crate::model::duty::DutySubStatus;

/// Dashboard counters over requests. Snapshot of the rows handed in; no
/// state of its own.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct RequestStats {
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
    pub total: u64,
}

pub fn request_stats(states: impl IntoIterator<Item = ApprovalState>) -> RequestStats {
    let mut stats = RequestStats::default();
    for state in states {
        stats.total += 1;
        match state {
            ApprovalState::Pending => stats.pending += 1,
            ApprovalState::Approved => stats.approved += 1,
            ApprovalState::Rejected => stats.rejected += 1,
        }
    }
    stats
}

/// One duty member as seen at aggregation time. `work_started` is the
/// time-dependent part: whether the member's assignment has reached its
/// work-start moment at the current wall clock.
#[derive(Debug, Clone, Copy)]
pub struct DutyMemberSnapshot {
    pub sub_status: DutySubStatus,
    pub validation: ApprovalState,
    pub work_started: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct DutyStats {
    /// Attended (`hadir`) but not yet validated by an admin.
    pub needs_validation: u64,
    /// Validated: decision made and approved.
    pub validated: u64,
    /// Not yet checked in although the assignment's work start has passed.
    pub absent: u64,
    pub total: u64,
}

pub fn duty_stats(members: impl IntoIterator<Item = DutyMemberSnapshot>) -> DutyStats {
    let mut stats = DutyStats::default();
    for member in members {
        stats.total += 1;
        match member.sub_status {
            DutySubStatus::Hadir if member.validation == ApprovalState::Pending => {
                stats.needs_validation += 1
            }
            DutySubStatus::BelumAbsen if member.work_started => stats.absent += 1,
            _ => {}
        }
        if member.validation == ApprovalState::Approved {
            stats.validated += 1;
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_counters_partition_by_state() {
        let stats = request_stats([
            ApprovalState::Pending,
            ApprovalState::Pending,
            ApprovalState::Approved,
            ApprovalState::Rejected,
        ]);
        assert_eq!(
            stats,
            RequestStats { pending: 2, approved: 1, rejected: 1, total: 4 }
        );
    }

    #[test]
    fn empty_collections_count_zero() {
        assert_eq!(request_stats([]), RequestStats::default());
        assert_eq!(duty_stats([]), DutyStats::default());
    }

    fn member(
        sub_status: DutySubStatus,
        validation: ApprovalState,
        work_started: bool,
    ) -> DutyMemberSnapshot {
        DutyMemberSnapshot { sub_status, validation, work_started }
    }

    #[test]
    fn duty_counters_follow_the_validation_rules() {
        let stats = duty_stats([
            member(DutySubStatus::Hadir, ApprovalState::Pending, true),
            member(DutySubStatus::Hadir, ApprovalState::Approved, true),
            member(DutySubStatus::Terlambat, ApprovalState::Pending, true),
            member(DutySubStatus::BelumAbsen, ApprovalState::Pending, true),
        ]);
        assert_eq!(
            stats,
            DutyStats { needs_validation: 1, validated: 1, absent: 1, total: 4 }
        );
    }

    #[test]
    fn absent_requires_the_work_start_to_have_passed() {
        let before = duty_stats([member(DutySubStatus::BelumAbsen, ApprovalState::Pending, false)]);
        assert_eq!(before.absent, 0);

        let after = duty_stats([member(DutySubStatus::BelumAbsen, ApprovalState::Pending, true)]);
        assert_eq!(after.absent, 1);
    }

    #[test]
    fn rejected_duty_attendance_is_neither_pending_nor_validated() {
        let stats = duty_stats([member(DutySubStatus::Hadir, ApprovalState::Rejected, true)]);
        assert_eq!(
            stats,
            DutyStats { needs_validation: 0, validated: 0, absent: 0, total: 1 }
        );
    }
}
