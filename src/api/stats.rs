use crate::auth::auth::AuthUser;
use crate::domain::approval::ApprovalState;
use crate::domain::stats::{DutyMemberSnapshot, DutyStats, RequestStats, duty_stats, request_stats};
use crate::model::duty::DutySubStatus;
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::{Local, NaiveDate, NaiveTime};
use serde::Deserialize;
use sqlx::MySqlPool;
use std::str::FromStr;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct RequestStatsQuery {
    /// Count requests whose range ends on/after this date
    pub from: Option<NaiveDate>,
    /// Count requests whose range starts on/before this date
    pub to: Option<NaiveDate>,
    #[schema(example = "cuti_tahunan")]
    pub kind: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct DutyStatsQuery {
    /// Only assignments whose date range covers today
    pub active: Option<bool>,
}

/// Request counters for the admin dashboard
#[utoipa::path(
    get,
    path = "/api/v1/stats/requests",
    params(RequestStatsQuery),
    responses(
        (status = 200, description = "Request counters", body = RequestStats),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Stats"
)]
pub async fn request_counters(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<RequestStatsQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let mut where_sql = String::from(" WHERE 1=1");
    let mut str_args: Vec<String> = Vec::new();
    let mut date_args: Vec<NaiveDate> = Vec::new();

    if let Some(kind) = &query.kind {
        where_sql.push_str(" AND kind = ?");
        str_args.push(kind.clone());
    }
    if let Some(from) = query.from {
        where_sql.push_str(" AND end_date >= ?");
        date_args.push(from);
    }
    if let Some(to) = query.to {
        where_sql.push_str(" AND start_date <= ?");
        date_args.push(to);
    }

    let sql = format!("SELECT status FROM requests{}", where_sql);
    let mut q = sqlx::query_scalar::<_, String>(&sql);
    for s in &str_args {
        q = q.bind(s);
    }
    for d in &date_args {
        q = q.bind(*d);
    }

    let statuses = q.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to fetch request statuses");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let stats: RequestStats = request_stats(
        statuses
            .iter()
            .filter_map(|s| ApprovalState::from_str(s).ok()),
    );

    Ok(HttpResponse::Ok().json(stats))
}

/// Duty attendance validation counters for the admin dashboard
#[utoipa::path(
    get,
    path = "/api/v1/stats/duty",
    params(DutyStatsQuery),
    responses(
        (status = 200, description = "Duty validation counters", body = DutyStats),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Stats"
)]
pub async fn duty_counters(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<DutyStatsQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let now = Local::now().naive_local();
    let today = now.date();

    let sql = if query.active.unwrap_or(false) {
        r#"
        SELECT m.sub_status, m.validation, d.start_date, d.work_start
        FROM duty_members m
        JOIN duty_assignments d ON d.id = m.duty_id
        WHERE d.start_date <= ? AND d.end_date >= ?
        "#
    } else {
        r#"
        SELECT m.sub_status, m.validation, d.start_date, d.work_start
        FROM duty_members m
        JOIN duty_assignments d ON d.id = m.duty_id
        "#
    };

    let mut q = sqlx::query_as::<_, (String, String, NaiveDate, NaiveTime)>(sql);
    if query.active.unwrap_or(false) {
        q = q.bind(today).bind(today);
    }

    let rows = q.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to fetch duty member rows");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let stats: DutyStats = duty_stats(rows.iter().map(|(sub_status, validation, start_date, work_start)| {
        DutyMemberSnapshot {
            sub_status: DutySubStatus::from_str(sub_status).unwrap_or(DutySubStatus::BelumAbsen),
            validation: ApprovalState::from_str(validation).unwrap_or(ApprovalState::Pending),
            work_started: now >= start_date.and_time(*work_start),
        }
    }));

    Ok(HttpResponse::Ok().json(stats))
}
