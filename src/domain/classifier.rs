use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::Serialize;

use crate::model::attendance::RawStatus;
use crate::model::schedule::ScheduleDay;

/// Canonical display status for one (employee, date).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "label")]
pub enum DayStatus {
    Libur(String),
    Hadir,
    Terlambat,
    TidakHadir,
    Izin,
    Sakit,
    Cuti,
    PulangCepat,
}

impl DayStatus {
    /// Single canonical casing for display.
    pub fn display(&self) -> &'static str {
        match self {
            DayStatus::Libur(_) => "Libur",
            DayStatus::Hadir => "Hadir",
            DayStatus::Terlambat => "Terlambat",
            DayStatus::TidakHadir => "Tidak Hadir",
            DayStatus::Izin => "Izin",
            DayStatus::Sakit => "Sakit",
            DayStatus::Cuti => "Cuti",
            DayStatus::PulangCepat => "Pulang Cepat",
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            DayStatus::Libur(label) => Some(label),
            _ => None,
        }
    }
}

/// The raw signal set the classifier reconciles for one day.
#[derive(Debug, Clone)]
pub struct DaySignals<'a> {
    pub date: NaiveDate,
    /// Holiday label for the date, if gazetted.
    pub holiday: Option<&'a str>,
    /// Schedule row for the date's weekday; a missing row is treated as a
    /// workday so an absence never silently reads as a free day.
    pub schedule: Option<&'a ScheduleDay>,
    /// Recorded check-in time, if any.
    pub check_in: Option<NaiveTime>,
    /// Normalized raw status of the attendance row, if a row exists.
    pub raw_status: Option<RawStatus>,
}

fn nama_hari(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Senin",
        Weekday::Tue => "Selasa",
        Weekday::Wed => "Rabu",
        Weekday::Thu => "Kamis",
        Weekday::Fri => "Jumat",
        Weekday::Sat => "Sabtu",
        Weekday::Sun => "Minggu",
    }
}

pub fn weekend_label(date: NaiveDate) -> String {
    format!("Hari {}", nama_hari(date.weekday()))
}

/// Collapse the day's signals into exactly one display status.
///
/// Precedence, highest first:
/// 1. a holiday entry always wins, even over a recorded check-in;
/// 2. a non-workday with no check-in on file is `Libur`; an employee who
///    voluntarily worked the weekend keeps their recorded status;
/// 3. duty-travel raw statuses count as present;
/// 4. the absent family collapses to `Tidak Hadir`;
/// 5. everything else passes through in canonical casing. A workday with no
///    row at all is `Tidak Hadir`.
pub fn classify(signals: &DaySignals) -> DayStatus {
    if let Some(label) = signals.holiday {
        return DayStatus::Libur(label.to_string());
    }

    let workday = signals.schedule.map_or(true, |d| d.is_workday);
    if !workday && signals.check_in.is_none() {
        return DayStatus::Libur(weekend_label(signals.date));
    }

    match signals.raw_status {
        Some(RawStatus::Dinas) => DayStatus::Hadir,
        Some(RawStatus::TidakHadir) | None => DayStatus::TidakHadir,
        Some(RawStatus::Hadir) => DayStatus::Hadir,
        Some(RawStatus::Terlambat) => DayStatus::Terlambat,
        Some(RawStatus::Izin) => DayStatus::Izin,
        Some(RawStatus::Sakit) => DayStatus::Sakit,
        Some(RawStatus::Cuti) => DayStatus::Cuti,
        Some(RawStatus::PulangCepat) => DayStatus::PulangCepat,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn schedule(is_workday: bool) -> ScheduleDay {
        ScheduleDay {
            weekday: 0,
            work_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            attendance_cutoff: NaiveTime::from_hms_opt(8, 30, 0).unwrap(),
            work_end: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            is_workday,
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn holiday_beats_a_recorded_check_in() {
        let day = schedule(true);
        let signals = DaySignals {
            date: d(2026, 8, 17),
            holiday: Some("Hari Kemerdekaan"),
            schedule: Some(&day),
            check_in: NaiveTime::from_hms_opt(7, 55, 0),
            raw_status: Some(RawStatus::Hadir),
        };
        assert_eq!(classify(&signals), DayStatus::Libur("Hari Kemerdekaan".to_string()));
    }

    #[test]
    fn saturday_without_check_in_is_libur() {
        // 2026-08-08 is a Saturday
        let day = schedule(false);
        let signals = DaySignals {
            date: d(2026, 8, 8),
            holiday: None,
            schedule: Some(&day),
            check_in: None,
            raw_status: None,
        };
        assert_eq!(classify(&signals), DayStatus::Libur("Hari Sabtu".to_string()));
    }

    #[test]
    fn saturday_with_check_in_keeps_the_recorded_status() {
        let day = schedule(false);
        let signals = DaySignals {
            date: d(2026, 8, 8),
            holiday: None,
            schedule: Some(&day),
            check_in: NaiveTime::from_hms_opt(9, 0, 0),
            raw_status: Some(RawStatus::Hadir),
        };
        assert_eq!(classify(&signals), DayStatus::Hadir);
    }

    #[test]
    fn duty_travel_counts_as_present() {
        let day = schedule(true);
        let signals = DaySignals {
            date: d(2026, 8, 6),
            holiday: None,
            schedule: Some(&day),
            check_in: NaiveTime::from_hms_opt(8, 10, 0),
            raw_status: Some(RawStatus::from_str("Perjalanan Dinas").unwrap()),
        };
        assert_eq!(classify(&signals), DayStatus::Hadir);
    }

    #[test]
    fn absent_family_collapses_to_tidak_hadir() {
        let day = schedule(true);
        for spelling in ["Mangkir", "alpha", "tidak hadir"] {
            let signals = DaySignals {
                date: d(2026, 8, 6),
                holiday: None,
                schedule: Some(&day),
                check_in: None,
                raw_status: Some(RawStatus::from_str(spelling).unwrap()),
            };
            assert_eq!(classify(&signals), DayStatus::TidakHadir, "spelling {spelling}");
        }
    }

    #[test]
    fn late_check_in_passes_through_as_terlambat() {
        let day = schedule(true);
        let signals = DaySignals {
            date: d(2026, 8, 6),
            holiday: None,
            schedule: Some(&day),
            check_in: NaiveTime::from_hms_opt(8, 35, 0),
            raw_status: Some(RawStatus::Terlambat),
        };
        assert_eq!(classify(&signals), DayStatus::Terlambat);
        assert_eq!(classify(&signals).display(), "Terlambat");
    }

    #[test]
    fn workday_without_a_row_is_tidak_hadir() {
        let day = schedule(true);
        let signals = DaySignals {
            date: d(2026, 8, 6),
            holiday: None,
            schedule: Some(&day),
            check_in: None,
            raw_status: None,
        };
        assert_eq!(classify(&signals), DayStatus::TidakHadir);
        assert_eq!(classify(&signals).display(), "Tidak Hadir");
    }

    #[test]
    fn missing_schedule_row_is_treated_as_a_workday() {
        let signals = DaySignals {
            date: d(2026, 8, 8),
            holiday: None,
            schedule: None,
            check_in: None,
            raw_status: None,
        };
        assert_eq!(classify(&signals), DayStatus::TidakHadir);
    }
}
