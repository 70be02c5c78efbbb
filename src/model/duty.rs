use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::domain::approval::ApprovalState;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(ascii_case_insensitive)]
pub enum DutyKind {
    #[strum(serialize = "dalam_kota")]
    DalamKota,
    #[strum(serialize = "luar_kota")]
    LuarKota,
    #[strum(serialize = "luar_negeri")]
    LuarNegeri,
}

/// Per-employee attendance sub-status inside a duty assignment.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(ascii_case_insensitive)]
pub enum DutySubStatus {
    #[strum(serialize = "hadir")]
    Hadir,
    #[strum(serialize = "terlambat")]
    Terlambat,
    #[strum(to_string = "belum_absen", serialize = "belum absen")]
    BelumAbsen,
}

/// A scheduled duty-travel activity with its own sites and date range.
///
/// `restrict_to_assigned_sites` decides whether duty check-in must match one
/// of the assignment's own sites or any active site qualifies.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct DutyAssignment {
    pub id: u64,
    #[schema(example = "Rapat koordinasi wilayah")]
    pub activity: String,
    #[schema(example = "ST-2026/081")]
    pub order_number: String,
    #[schema(example = "luar_kota")]
    pub kind: String,
    #[schema(example = "2026-08-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-08-07", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "09:00:00", value_type = String)]
    pub work_start: NaiveTime,
    #[schema(example = "16:00:00", value_type = String)]
    pub work_end: NaiveTime,
    pub restrict_to_assigned_sites: bool,
}

impl DutyAssignment {
    /// Active iff the date falls inside [start_date, end_date], inclusive.
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Whether the assignment's work-start moment has passed. Used for the
    /// time-dependent absent count, recomputed on read.
    pub fn work_started_by(&self, now: NaiveDateTime) -> bool {
        now >= self.start_date.and_time(self.work_start)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct DutyMember {
    pub id: u64,
    pub duty_id: u64,
    pub employee_id: u64,
    #[schema(example = "belum_absen")]
    pub sub_status: String,
    #[schema(example = "pending")]
    pub validation: String,
    pub rejection_reason: Option<String>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub decided_at: Option<DateTime<Utc>>,
}

impl DutyMember {
    /// Unknown spellings fold to `BelumAbsen`, never to an attended state.
    pub fn sub_status(&self) -> DutySubStatus {
        DutySubStatus::from_str(&self.sub_status).unwrap_or(DutySubStatus::BelumAbsen)
    }

    /// The database `WHERE validation = 'pending'` guard stays authoritative
    /// for decisions; this parse is for read-side counters only.
    pub fn validation(&self) -> ApprovalState {
        ApprovalState::from_str(&self.validation).unwrap_or(ApprovalState::Pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment(start: NaiveDate, end: NaiveDate) -> DutyAssignment {
        DutyAssignment {
            id: 1,
            activity: "Sosialisasi".to_string(),
            order_number: "ST-1".to_string(),
            kind: "dalam_kota".to_string(),
            start_date: start,
            end_date: end,
            work_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            work_end: NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
            restrict_to_assigned_sites: true,
        }
    }

    #[test]
    fn active_range_is_inclusive() {
        let d = |day| NaiveDate::from_ymd_opt(2026, 8, day).unwrap();
        let duty = assignment(d(5), d(7));

        assert!(!duty.is_active_on(d(4)));
        assert!(duty.is_active_on(d(5)));
        assert!(duty.is_active_on(d(7)));
        assert!(!duty.is_active_on(d(8)));
    }

    #[test]
    fn work_started_uses_the_start_date_work_start_moment() {
        let d = |day| NaiveDate::from_ymd_opt(2026, 8, day).unwrap();
        let duty = assignment(d(5), d(7));

        let before = d(5).and_hms_opt(8, 59, 0).unwrap();
        let after = d(5).and_hms_opt(9, 0, 0).unwrap();
        assert!(!duty.work_started_by(before));
        assert!(duty.work_started_by(after));
    }
}
