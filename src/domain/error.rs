use derive_more::Display;

/// Why a position fix failed the geofence gate.
///
/// `OutOfRange` carries the distance already rounded to whole meters so the
/// user-facing message can state exactly how far off the fix was.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum GeofenceError {
    #[display(fmt = "location undetectable")]
    Undetectable,

    #[display(fmt = "wrong location type")]
    WrongLocationType,

    #[display(
        fmt = "out of range: {} m from {} (allowed {} m)",
        distance_m,
        site_name,
        radius_m
    )]
    OutOfRange {
        distance_m: i64,
        radius_m: i64,
        site_name: String,
    },
}

impl std::error::Error for GeofenceError {}

impl GeofenceError {
    pub fn code(&self) -> &'static str {
        match self {
            GeofenceError::Undetectable => "location_undetectable",
            GeofenceError::WrongLocationType => "wrong_location_type",
            GeofenceError::OutOfRange { .. } => "out_of_range",
        }
    }
}

/// Deterministic precondition failures of the per-day attendance state
/// machine. None of these are retryable as-is.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum AttendanceError {
    #[display(fmt = "{}", _0)]
    Geofence(GeofenceError),

    #[display(fmt = "already checked in today")]
    AlreadyCheckedIn,

    #[display(fmt = "no active check-in found for today")]
    NotCheckedIn,

    #[display(fmt = "attendance for today is already complete")]
    AlreadyCompleted,

    #[display(fmt = "location permission denied or no fix available")]
    PermissionDenied,
}

impl std::error::Error for AttendanceError {}

impl AttendanceError {
    pub fn code(&self) -> &'static str {
        match self {
            AttendanceError::Geofence(g) => g.code(),
            AttendanceError::AlreadyCheckedIn => "already_checked_in",
            AttendanceError::NotCheckedIn => "not_checked_in",
            AttendanceError::AlreadyCompleted => "already_completed",
            AttendanceError::PermissionDenied => "permission_denied",
        }
    }
}

/// Precondition failures of the approve/reject workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ApprovalError {
    #[display(fmt = "subject not found")]
    NotFound,

    #[display(fmt = "subject has already been decided")]
    AlreadyDecided,

    #[display(fmt = "a rejection reason is required")]
    ReasonRequired,
}

impl std::error::Error for ApprovalError {}

impl ApprovalError {
    pub fn code(&self) -> &'static str {
        match self {
            ApprovalError::NotFound => "not_found",
            ApprovalError::AlreadyDecided => "already_decided",
            ApprovalError::ReasonRequired => "reason_required",
        }
    }
}
