use chrono::NaiveTime;

use crate::domain::error::{AttendanceError, GeofenceError};
use crate::domain::location::Resolution;
use crate::model::attendance::RawStatus;
use crate::model::schedule::ScheduleDay;

/// Per-(employee, date) attendance lifecycle. `CheckedOut` is terminal for
/// the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotCheckedIn,
    CheckedIn,
    CheckedOut,
}

/// The day's session, hydrated from the attendance row (or its absence).
/// Transitions are pure decisions; persisting the accepted half is the
/// caller's job and must happen exactly once.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttendanceSession {
    pub check_in: Option<NaiveTime>,
    pub check_out: Option<NaiveTime>,
}

/// Accepted check-in: what the caller should persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckIn {
    pub time: NaiveTime,
    pub site_id: u64,
    pub is_late: bool,
    pub status: RawStatus,
}

/// Accepted check-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOut {
    pub time: NaiveTime,
    pub site_id: u64,
}

impl AttendanceSession {
    pub fn state(&self) -> SessionState {
        match (self.check_in, self.check_out) {
            (None, _) => SessionState::NotCheckedIn,
            (Some(_), None) => SessionState::CheckedIn,
            (Some(_), Some(_)) => SessionState::CheckedOut,
        }
    }

    /// State is examined before the geofence verdict: a duplicate check-in
    /// fails with `AlreadyCheckedIn` no matter what the fix looks like.
    pub fn check_in(
        &self,
        now: NaiveTime,
        geofence: Result<Resolution<'_>, GeofenceError>,
        day: Option<&ScheduleDay>,
    ) -> Result<CheckIn, AttendanceError> {
        match self.state() {
            SessionState::CheckedIn => Err(AttendanceError::AlreadyCheckedIn),
            SessionState::CheckedOut => Err(AttendanceError::AlreadyCompleted),
            SessionState::NotCheckedIn => {
                let resolved = geofence.map_err(AttendanceError::Geofence)?;
                let is_late = day.is_some_and(|d| d.is_workday && now > d.attendance_cutoff);
                Ok(CheckIn {
                    time: now,
                    site_id: resolved.site.id,
                    is_late,
                    status: if is_late { RawStatus::Terlambat } else { RawStatus::Hadir },
                })
            }
        }
    }

    /// Check-out shares the geofence gate with check-in; for duty travel the
    /// site need not be the same one the employee checked in at.
    pub fn check_out(
        &self,
        now: NaiveTime,
        geofence: Result<Resolution<'_>, GeofenceError>,
    ) -> Result<CheckOut, AttendanceError> {
        match self.state() {
            SessionState::NotCheckedIn => Err(AttendanceError::NotCheckedIn),
            SessionState::CheckedOut => Err(AttendanceError::AlreadyCompleted),
            SessionState::CheckedIn => {
                let resolved = geofence.map_err(AttendanceError::Geofence)?;
                // check-out may never precede check-in (client clock skew)
                let time = match self.check_in {
                    Some(check_in) if now < check_in => check_in,
                    _ => now,
                };
                Ok(CheckOut { time, site_id: resolved.site.id })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::location::{validate, Fix};
    use crate::model::site::{Site, SiteKind};

    fn office() -> Site {
        Site {
            id: 1,
            name: "Kantor Pusat".to_string(),
            address: String::new(),
            latitude: -6.2000,
            longitude: 106.8160,
            radius_m: 100.0,
            kind: "fixed".to_string(),
            status: "active".to_string(),
        }
    }

    fn workday() -> ScheduleDay {
        ScheduleDay {
            weekday: 0,
            work_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            attendance_cutoff: NaiveTime::from_hms_opt(8, 30, 0).unwrap(),
            work_end: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            is_workday: true,
        }
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn check_in_on_time_is_not_late() {
        let sites = vec![office()];
        let fix = Fix { lat: -6.2005, lon: 106.8165 };
        let session = AttendanceSession::default();

        let accepted = session
            .check_in(t(8, 10), validate(&fix, &sites, Some(SiteKind::Fixed)), Some(&workday()))
            .unwrap();

        assert_eq!(accepted.site_id, 1);
        assert!(!accepted.is_late);
        assert_eq!(accepted.status, RawStatus::Hadir);
    }

    #[test]
    fn check_in_after_cutoff_is_late() {
        let sites = vec![office()];
        let fix = Fix { lat: -6.2000, lon: 106.8160 };
        let session = AttendanceSession::default();

        let accepted = session
            .check_in(t(8, 35), validate(&fix, &sites, Some(SiteKind::Fixed)), Some(&workday()))
            .unwrap();

        assert!(accepted.is_late);
        assert_eq!(accepted.status, RawStatus::Terlambat);
    }

    #[test]
    fn out_of_range_check_in_is_rejected() {
        let sites = vec![office()];
        let fix = Fix { lat: -6.1955, lon: 106.8160 };
        let session = AttendanceSession::default();

        let err = session
            .check_in(t(8, 10), validate(&fix, &sites, Some(SiteKind::Fixed)), Some(&workday()))
            .unwrap_err();

        assert_eq!(err.code(), "out_of_range");
    }

    #[test]
    fn second_check_in_fails_even_with_a_valid_fix() {
        let sites = vec![office()];
        let fix = Fix { lat: -6.2000, lon: 106.8160 };
        let session = AttendanceSession { check_in: Some(t(8, 5)), check_out: None };

        let err = session
            .check_in(t(9, 0), validate(&fix, &sites, Some(SiteKind::Fixed)), Some(&workday()))
            .unwrap_err();

        assert_eq!(err, AttendanceError::AlreadyCheckedIn);
    }

    #[test]
    fn second_check_in_fails_even_with_an_invalid_fix() {
        let session = AttendanceSession { check_in: Some(t(8, 5)), check_out: None };

        let err = session
            .check_in(t(9, 0), Err(GeofenceError::Undetectable), Some(&workday()))
            .unwrap_err();

        assert_eq!(err, AttendanceError::AlreadyCheckedIn);
    }

    #[test]
    fn check_out_before_check_in_fails() {
        let sites = vec![office()];
        let fix = Fix { lat: -6.2000, lon: 106.8160 };
        let session = AttendanceSession::default();

        let err = session
            .check_out(t(17, 0), validate(&fix, &sites, Some(SiteKind::Fixed)))
            .unwrap_err();

        assert_eq!(err, AttendanceError::NotCheckedIn);
    }

    #[test]
    fn completed_day_rejects_further_transitions() {
        let sites = vec![office()];
        let fix = Fix { lat: -6.2000, lon: 106.8160 };
        let session = AttendanceSession { check_in: Some(t(8, 5)), check_out: Some(t(17, 2)) };

        let verdict = validate(&fix, &sites, Some(SiteKind::Fixed));
        assert_eq!(
            session.check_in(t(18, 0), verdict.clone(), Some(&workday())).unwrap_err(),
            AttendanceError::AlreadyCompleted
        );
        assert_eq!(
            session.check_out(t(18, 0), verdict).unwrap_err(),
            AttendanceError::AlreadyCompleted
        );
    }

    #[test]
    fn check_out_never_precedes_check_in() {
        let sites = vec![office()];
        let fix = Fix { lat: -6.2000, lon: 106.8160 };
        let session = AttendanceSession { check_in: Some(t(9, 0)), check_out: None };

        let accepted = session
            .check_out(t(8, 50), validate(&fix, &sites, Some(SiteKind::Fixed)))
            .unwrap();
        assert_eq!(accepted.time, t(9, 0));
    }
}
