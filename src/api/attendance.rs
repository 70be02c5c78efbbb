use crate::auth::auth::AuthUser;
use crate::domain::classifier::{self, DaySignals};
use crate::domain::error::{AttendanceError, GeofenceError};
use crate::domain::location::{self, Fix, Resolution};
use crate::domain::session::{AttendanceSession, SessionState};
use crate::model::attendance::{Attendance, RawStatus};
use crate::model::duty::DutyAssignment;
use crate::model::role::Role;
use crate::model::schedule::{ScheduleDay, weekday_index};
use crate::model::site::{Site, SiteKind};
use crate::utils::holiday_cache;
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::{Datelike, Local, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use std::collections::HashMap;
use utoipa::{IntoParams, ToSchema};

/// What the device submits for either half of the day. `photo` is an opaque
/// reference produced by the upload pipeline; capture and transport live
/// outside this service.
#[derive(Deserialize, ToSchema)]
pub struct CheckPayload {
    #[schema(example = -6.2005)]
    pub lat: Option<f64>,
    #[schema(example = 106.8165)]
    pub lon: Option<f64>,
    #[schema(example = "absen/2026-08-06/ci-1a2b3c.jpg", nullable = true)]
    pub photo: Option<String>,
    /// Set by the client when the device refused location or camera access
    pub permission_denied: Option<bool>,
}

#[derive(Serialize, ToSchema)]
pub struct CheckAccepted {
    #[schema(example = "08:12:40", value_type = String)]
    pub time: NaiveTime,
    pub site_id: u64,
    #[schema(example = "Kantor Pusat")]
    pub site_name: String,
    #[schema(example = 42)]
    pub distance_m: i64,
    pub is_late: bool,
    #[schema(example = "hadir")]
    pub status: String,
}

#[derive(Serialize, ToSchema)]
pub struct HistoryDay {
    #[schema(example = "2026-08-06", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "Hadir")]
    pub status: String,
    #[schema(example = "Hari Kemerdekaan", nullable = true)]
    pub label: Option<String>,
    #[schema(example = "08:12:40", value_type = Option<String>, nullable = true)]
    pub check_in: Option<NaiveTime>,
    #[schema(example = "17:03:10", value_type = Option<String>, nullable = true)]
    pub check_out: Option<NaiveTime>,
    pub is_late: bool,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct HistoryQuery {
    /// Range start (defaults to the 1st of the current month)
    pub from: Option<NaiveDate>,
    /// Range end (defaults to today; clamped to today)
    pub to: Option<NaiveDate>,
    /// Admin only: another employee's history
    pub employee_id: Option<u64>,
}

fn precondition_response(err: &AttendanceError) -> HttpResponse {
    let body = serde_json::json!({
        "error": err.code(),
        "message": err.to_string(),
    });
    match err {
        AttendanceError::AlreadyCheckedIn | AttendanceError::AlreadyCompleted => {
            HttpResponse::Conflict().json(body)
        }
        _ => HttpResponse::BadRequest().json(body),
    }
}

async fn day_row(
    pool: &MySqlPool,
    employee_id: u64,
    date: NaiveDate,
) -> Result<Option<Attendance>, sqlx::Error> {
    sqlx::query_as::<_, Attendance>("SELECT * FROM attendance WHERE employee_id = ? AND date = ?")
        .bind(employee_id)
        .bind(date)
        .fetch_optional(pool)
        .await
}

async fn schedule_for(
    pool: &MySqlPool,
    date: NaiveDate,
) -> Result<Option<ScheduleDay>, sqlx::Error> {
    sqlx::query_as::<_, ScheduleDay>("SELECT * FROM work_schedule WHERE weekday = ?")
        .bind(weekday_index(date.weekday()))
        .fetch_optional(pool)
        .await
}

/// The employee's active duty assignment for the date, if any.
async fn active_duty(
    pool: &MySqlPool,
    employee_id: u64,
    date: NaiveDate,
) -> Result<Option<DutyAssignment>, sqlx::Error> {
    sqlx::query_as::<_, DutyAssignment>(
        r#"
        SELECT d.*
        FROM duty_assignments d
        JOIN duty_members m ON m.duty_id = d.id
        WHERE m.employee_id = ? AND d.start_date <= ? AND d.end_date >= ?
        ORDER BY d.start_date, d.id
        LIMIT 1
        "#,
    )
    .bind(employee_id)
    .bind(date)
    .bind(date)
    .fetch_optional(pool)
    .await
}

/// Candidate sites plus the kind the nearest one must have. Ordinary
/// check-in demands an active `fixed` site; duty check-in is scoped to the
/// assignment's sites when the assignment says so.
async fn candidate_sites(
    pool: &MySqlPool,
    duty: Option<&DutyAssignment>,
) -> Result<(Vec<Site>, Option<SiteKind>), sqlx::Error> {
    match duty {
        Some(assignment) if assignment.restrict_to_assigned_sites => {
            let sites = sqlx::query_as::<_, Site>(
                r#"
                SELECT s.*
                FROM sites s
                JOIN duty_sites ds ON ds.site_id = s.id
                WHERE ds.duty_id = ? AND s.status = 'active'
                "#,
            )
            .bind(assignment.id)
            .fetch_all(pool)
            .await?;
            Ok((sites, None))
        }
        Some(_) => {
            let sites = sqlx::query_as::<_, Site>("SELECT * FROM sites WHERE status = 'active'")
                .fetch_all(pool)
                .await?;
            Ok((sites, None))
        }
        None => {
            let sites = sqlx::query_as::<_, Site>("SELECT * FROM sites WHERE status = 'active'")
                .fetch_all(pool)
                .await?;
            Ok((sites, Some(SiteKind::Fixed)))
        }
    }
}

fn geofence<'a>(
    payload: &CheckPayload,
    sites: &'a [Site],
    required_kind: Option<SiteKind>,
) -> Result<Resolution<'a>, GeofenceError> {
    match (payload.lat, payload.lon) {
        (Some(lat), Some(lon)) => location::validate(&Fix { lat, lon }, sites, required_kind),
        // no fix from the device
        _ => Err(GeofenceError::Undetectable),
    }
}

/// When the client reported a device capability failure, surface that
/// instead of the generic undetectable verdict (state errors still win).
fn adjust_for_permission(err: AttendanceError, payload: &CheckPayload) -> AttendanceError {
    if payload.permission_denied.unwrap_or(false)
        && matches!(err, AttendanceError::Geofence(GeofenceError::Undetectable))
    {
        AttendanceError::PermissionDenied
    } else {
        err
    }
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/v1/attendance/check-in",
    request_body = CheckPayload,
    responses(
        (status = 200, description = "Checked in successfully", body = CheckAccepted),
        (status = 400, description = "Geofence or capability precondition failed", body = Object, example = json!({
            "error": "out_of_range",
            "message": "out of range: 500 m from Kantor Pusat (allowed 100 m)"
        })),
        (status = 409, description = "Already checked in today", body = Object, example = json!({
            "error": "already_checked_in",
            "message": "already checked in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CheckPayload>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;

    let now = Local::now().naive_local();
    let today = now.date();

    let row = day_row(pool.get_ref(), employee_id, today)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id, "Failed to load today's attendance");
            ErrorInternalServerError("Internal Server Error")
        })?;
    let session = AttendanceSession {
        check_in: row.as_ref().and_then(|r| r.check_in),
        check_out: row.as_ref().and_then(|r| r.check_out),
    };

    let duty = active_duty(pool.get_ref(), employee_id, today)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id, "Failed to load duty assignment");
            ErrorInternalServerError("Internal Server Error")
        })?;
    let (sites, required_kind) = candidate_sites(pool.get_ref(), duty.as_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to load sites");
            ErrorInternalServerError("Internal Server Error")
        })?;
    let day = schedule_for(pool.get_ref(), today).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to load work schedule");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let verdict = geofence(&payload, &sites, required_kind);
    let resolved = verdict
        .as_ref()
        .ok()
        .map(|r| (r.site.name.clone(), r.distance_m.round() as i64));

    let accepted = match session.check_in(now.time(), verdict, day.as_ref()) {
        Ok(accepted) => accepted,
        Err(err) => return Ok(precondition_response(&adjust_for_permission(err, &payload))),
    };

    // duty travel is recorded as dinas regardless of the lateness flag
    let status = if duty.is_some() { RawStatus::Dinas } else { accepted.status };

    let result = sqlx::query(
        r#"
        INSERT INTO attendance
            (employee_id, date, check_in, check_in_lat, check_in_lng,
             check_in_site_id, check_in_photo, is_late, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(today)
    .bind(accepted.time)
    .bind(payload.lat)
    .bind(payload.lon)
    .bind(accepted.site_id)
    .bind(&payload.photo)
    .bind(accepted.is_late)
    .bind(status.as_ref())
    .execute(pool.get_ref())
    .await;

    if let Err(e) = result {
        // A concurrent submission won the unique (employee_id, date) key
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.code().as_deref() == Some("23000") {
                return Ok(precondition_response(&AttendanceError::AlreadyCheckedIn));
            }
        }

        tracing::error!(error = %e, employee_id, "Check-in failed");
        return Err(ErrorInternalServerError("Internal Server Error"));
    }

    if let Some(assignment) = &duty {
        let sub_status = if accepted.is_late { "terlambat" } else { "hadir" };
        if let Err(e) = sqlx::query(
            r#"
            UPDATE duty_members
            SET sub_status = ?
            WHERE duty_id = ? AND employee_id = ? AND sub_status = 'belum_absen'
            "#,
        )
        .bind(sub_status)
        .bind(assignment.id)
        .bind(employee_id)
        .execute(pool.get_ref())
        .await
        {
            tracing::error!(error = %e, duty_id = assignment.id, "Failed to update duty sub-status");
        }
    }

    let (site_name, distance_m) = resolved.unwrap_or_default();
    Ok(HttpResponse::Ok().json(CheckAccepted {
        time: accepted.time,
        site_id: accepted.site_id,
        site_name,
        distance_m,
        is_late: accepted.is_late,
        status: status.to_string(),
    }))
}

/// Check-out endpoint
#[utoipa::path(
    post,
    path = "/api/v1/attendance/check-out",
    request_body = CheckPayload,
    responses(
        (status = 200, description = "Checked out successfully", body = CheckAccepted),
        (status = 400, description = "No active check-in found for today", body = Object, example = json!({
            "error": "not_checked_in",
            "message": "no active check-in found for today"
        })),
        (status = 409, description = "Attendance already complete for today"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CheckPayload>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;

    let now = Local::now().naive_local();
    let today = now.date();

    let row = day_row(pool.get_ref(), employee_id, today)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id, "Failed to load today's attendance");
            ErrorInternalServerError("Internal Server Error")
        })?;
    let session = AttendanceSession {
        check_in: row.as_ref().and_then(|r| r.check_in),
        check_out: row.as_ref().and_then(|r| r.check_out),
    };

    let duty = active_duty(pool.get_ref(), employee_id, today)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id, "Failed to load duty assignment");
            ErrorInternalServerError("Internal Server Error")
        })?;
    let (sites, required_kind) = candidate_sites(pool.get_ref(), duty.as_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to load sites");
            ErrorInternalServerError("Internal Server Error")
        })?;

    let verdict = geofence(&payload, &sites, required_kind);
    let resolved = verdict
        .as_ref()
        .ok()
        .map(|r| (r.site.name.clone(), r.distance_m.round() as i64));

    let accepted = match session.check_out(now.time(), verdict) {
        Ok(accepted) => accepted,
        Err(err) => return Ok(precondition_response(&adjust_for_permission(err, &payload))),
    };

    let result = sqlx::query(
        r#"
        UPDATE attendance
        SET check_out = ?, check_out_lat = ?, check_out_lng = ?,
            check_out_site_id = ?, check_out_photo = ?
        WHERE employee_id = ? AND date = ?
          AND check_in IS NOT NULL AND check_out IS NULL
        "#,
    )
    .bind(accepted.time)
    .bind(payload.lat)
    .bind(payload.lon)
    .bind(accepted.site_id)
    .bind(&payload.photo)
    .bind(employee_id)
    .bind(today)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id, "Check-out failed");
        ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        // the session said CheckedIn, so a concurrent check-out beat us
        return Ok(precondition_response(&AttendanceError::AlreadyCompleted));
    }

    let is_late = row.as_ref().map(|r| r.is_late).unwrap_or(false);
    let row_status = row.map(|r| r.raw_status()).unwrap_or(RawStatus::Hadir);
    let (site_name, distance_m) = resolved.unwrap_or_default();
    Ok(HttpResponse::Ok().json(CheckAccepted {
        time: accepted.time,
        site_id: accepted.site_id,
        site_name,
        distance_m,
        is_late,
        status: row_status.to_string(),
    }))
}

/// Today's session state, used to hydrate the device on app start
#[utoipa::path(
    get,
    path = "/api/v1/attendance/today",
    responses(
        (status = 200, description = "Today's attendance state", body = Object, example = json!({
            "date": "2026-08-06",
            "state": "checked_in",
            "check_in": "08:12:40",
            "check_out": null,
            "is_late": false,
            "status": "Hadir",
            "label": null
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn today(auth: AuthUser, pool: web::Data<MySqlPool>) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;
    let today = Local::now().date_naive();

    let row = day_row(pool.get_ref(), employee_id, today)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id, "Failed to load today's attendance");
            ErrorInternalServerError("Internal Server Error")
        })?;
    let day = schedule_for(pool.get_ref(), today).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to load work schedule");
        ErrorInternalServerError("Internal Server Error")
    })?;
    let holiday = holiday_cache::label_for(pool.get_ref(), today).await;

    let session = AttendanceSession {
        check_in: row.as_ref().and_then(|r| r.check_in),
        check_out: row.as_ref().and_then(|r| r.check_out),
    };
    let state = match session.state() {
        SessionState::NotCheckedIn => "not_checked_in",
        SessionState::CheckedIn => "checked_in",
        SessionState::CheckedOut => "checked_out",
    };

    let status = classifier::classify(&DaySignals {
        date: today,
        holiday: holiday.as_deref(),
        schedule: day.as_ref(),
        check_in: session.check_in,
        raw_status: row.as_ref().map(|r| r.raw_status()),
    });

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "date": today,
        "state": state,
        "check_in": session.check_in,
        "check_out": session.check_out,
        "is_late": row.as_ref().map(|r| r.is_late).unwrap_or(false),
        "status": status.display(),
        "label": status.label(),
    })))
}

/// Attendance history with one classified status per day
#[utoipa::path(
    get,
    path = "/api/v1/attendance/history",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Classified day-by-day history", body = [HistoryDay]),
        (status = 400, description = "Bad date range"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn history(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<HistoryQuery>,
) -> actix_web::Result<impl Responder> {
    let own_employee_id = auth.require_employee().ok();
    let employee_id = match query.employee_id {
        Some(other) if auth.role == Role::Admin => other,
        Some(_) => {
            return Ok(HttpResponse::Forbidden().json(serde_json::json!({
                "message": "Only admins may view another employee's history"
            })));
        }
        None => match own_employee_id {
            Some(id) => id,
            None => return Err(actix_web::error::ErrorForbidden("No employee profile")),
        },
    };

    let today = Local::now().date_naive();
    let from = query
        .from
        .unwrap_or_else(|| today.with_day(1).unwrap_or(today));
    let to = query.to.unwrap_or(today).min(today);

    if from > to {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "from must not be after to"
        })));
    }
    if (to - from).num_days() > 366 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "date range too large (max 366 days)"
        })));
    }

    let rows = sqlx::query_as::<_, Attendance>(
        "SELECT * FROM attendance WHERE employee_id = ? AND date BETWEEN ? AND ?",
    )
    .bind(employee_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id, "Failed to fetch attendance history");
        ErrorInternalServerError("Internal Server Error")
    })?;
    let rows: HashMap<NaiveDate, Attendance> =
        rows.into_iter().map(|r| (r.date, r)).collect();

    let holidays: HashMap<NaiveDate, String> = sqlx::query_as::<_, (NaiveDate, String)>(
        "SELECT date, label FROM holidays WHERE date BETWEEN ? AND ?",
    )
    .bind(from)
    .bind(to)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch holidays");
        ErrorInternalServerError("Internal Server Error")
    })?
    .into_iter()
    .collect();

    let schedule: HashMap<u8, ScheduleDay> =
        sqlx::query_as::<_, ScheduleDay>("SELECT * FROM work_schedule")
            .fetch_all(pool.get_ref())
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to fetch work schedule");
                ErrorInternalServerError("Internal Server Error")
            })?
            .into_iter()
            .map(|d| (d.weekday, d))
            .collect();

    let days: Vec<HistoryDay> = from
        .iter_days()
        .take_while(|d| *d <= to)
        .map(|date| {
            let row = rows.get(&date);
            let status = classifier::classify(&DaySignals {
                date,
                holiday: holidays.get(&date).map(String::as_str),
                schedule: schedule.get(&weekday_index(date.weekday())),
                check_in: row.and_then(|r| r.check_in),
                raw_status: row.map(|r| r.raw_status()),
            });
            HistoryDay {
                date,
                status: status.display().to_string(),
                label: status.label().map(str::to_string),
                check_in: row.and_then(|r| r.check_in),
                check_out: row.and_then(|r| r.check_out),
                is_late: row.map(|r| r.is_late).unwrap_or(false),
            }
        })
        .collect();

    Ok(HttpResponse::Ok().json(days))
}
