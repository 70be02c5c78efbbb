use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Work hours for one weekday. `weekday` is 0 = Monday .. 6 = Sunday
/// (chrono's `num_days_from_monday`). A check-in after `attendance_cutoff`
/// on a workday counts as late.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct ScheduleDay {
    #[schema(example = 0)]
    pub weekday: u8,
    #[schema(example = "08:00:00", value_type = String)]
    pub work_start: NaiveTime,
    #[schema(example = "08:30:00", value_type = String)]
    pub attendance_cutoff: NaiveTime,
    #[schema(example = "17:00:00", value_type = String)]
    pub work_end: NaiveTime,
    pub is_workday: bool,
}

pub fn weekday_index(weekday: Weekday) -> u8 {
    weekday.num_days_from_monday() as u8
}

/// Gazetted holiday; overrides the weekday classification for its date.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Holiday {
    #[schema(example = "2026-08-17", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "Hari Kemerdekaan")]
    pub label: String,
}
