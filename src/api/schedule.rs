use crate::auth::auth::AuthUser;
use crate::model::schedule::{Holiday, ScheduleDay};
use crate::utils::holiday_cache;
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct UpdateScheduleDay {
    #[schema(example = "08:00:00", value_type = String)]
    pub work_start: NaiveTime,
    #[schema(example = "08:30:00", value_type = String)]
    pub attendance_cutoff: NaiveTime,
    #[schema(example = "17:00:00", value_type = String)]
    pub work_end: NaiveTime,
    pub is_workday: bool,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateHoliday {
    #[schema(example = "2026-08-17", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "Hari Kemerdekaan")]
    pub label: String,
}

#[derive(Deserialize, ToSchema)]
pub struct HolidayQuery {
    #[schema(example = 2026)]
    pub year: Option<i32>,
}

/// The weekly work schedule, one row per weekday
#[utoipa::path(
    get,
    path = "/api/v1/schedule",
    responses(
        (status = 200, description = "Work schedule", body = [ScheduleDay]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Schedule"
)]
pub async fn get_schedule(pool: web::Data<MySqlPool>) -> actix_web::Result<impl Responder> {
    let days = sqlx::query_as::<_, ScheduleDay>("SELECT * FROM work_schedule ORDER BY weekday")
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch work schedule");
            ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(days))
}

/// Upsert one weekday's schedule (Admin)
#[utoipa::path(
    put,
    path = "/api/v1/schedule/{weekday}",
    params(
        ("weekday" = u8, Path, description = "0 = Monday .. 6 = Sunday")
    ),
    request_body = UpdateScheduleDay,
    responses(
        (status = 200, description = "Schedule updated", body = Object, example = json!({
            "message": "Schedule updated"
        })),
        (status = 400, description = "Invalid weekday or time window"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Schedule"
)]
pub async fn update_schedule(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u8>,
    payload: web::Json<UpdateScheduleDay>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let weekday = path.into_inner();

    if weekday > 6 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "weekday must be 0..6"
        })));
    }
    if payload.work_start > payload.work_end
        || payload.attendance_cutoff < payload.work_start
        || payload.attendance_cutoff > payload.work_end
    {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "expected work_start <= attendance_cutoff <= work_end"
        })));
    }

    sqlx::query(
        r#"
        INSERT INTO work_schedule (weekday, work_start, attendance_cutoff, work_end, is_workday)
        VALUES (?, ?, ?, ?, ?)
        ON DUPLICATE KEY UPDATE
            work_start = VALUES(work_start),
            attendance_cutoff = VALUES(attendance_cutoff),
            work_end = VALUES(work_end),
            is_workday = VALUES(is_workday)
        "#,
    )
    .bind(weekday)
    .bind(payload.work_start)
    .bind(payload.attendance_cutoff)
    .bind(payload.work_end)
    .bind(payload.is_workday)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, weekday, "Failed to update work schedule");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Schedule updated"
    })))
}

/// Holiday calendar
#[utoipa::path(
    get,
    path = "/api/v1/holiday",
    params(
        ("year", Query, description = "Calendar year (defaults to all)")
    ),
    responses(
        (status = 200, description = "Holiday list", body = [Holiday]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Schedule"
)]
pub async fn list_holidays(
    pool: web::Data<MySqlPool>,
    query: web::Query<HolidayQuery>,
) -> actix_web::Result<impl Responder> {
    let holidays = match query.year {
        Some(year) => {
            sqlx::query_as::<_, Holiday>(
                "SELECT * FROM holidays WHERE YEAR(date) = ? ORDER BY date",
            )
            .bind(year)
            .fetch_all(pool.get_ref())
            .await
        }
        None => {
            sqlx::query_as::<_, Holiday>("SELECT * FROM holidays ORDER BY date")
                .fetch_all(pool.get_ref())
                .await
        }
    }
    .map_err(|e| {
        error!(error = %e, "Failed to fetch holidays");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(holidays))
}

/// Add a holiday (Admin)
#[utoipa::path(
    post,
    path = "/api/v1/holiday",
    request_body = CreateHoliday,
    responses(
        (status = 201, description = "Holiday created", body = Object, example = json!({
            "message": "Holiday created"
        })),
        (status = 400, description = "Empty label"),
        (status = 409, description = "Holiday already exists for that date"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Schedule"
)]
pub async fn create_holiday(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateHoliday>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let label = payload.label.trim();
    if label.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "label must not be empty"
        })));
    }

    let result = sqlx::query("INSERT INTO holidays (date, label) VALUES (?, ?)")
        .bind(payload.date)
        .bind(label)
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(_) => {
            // keep the read-through cache coherent for today's checks
            holiday_cache::put(payload.date, label).await;
            Ok(HttpResponse::Created().json(json!({
                "message": "Holiday created"
            })))
        }
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::Conflict().json(json!({
                        "message": "Holiday already exists for that date"
                    })));
                }
            }

            error!(error = %e, "Failed to create holiday");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            })))
        }
    }
}
