use crate::api::approval_error_response;
use crate::auth::auth::AuthUser;
use crate::domain::approval::{ApprovalState, Decision, decide};
use crate::domain::error::ApprovalError;
use crate::model::request::{Request, RequestKind};
use crate::model::role::Role;
use actix_web::{HttpResponse, Responder, web};
use chrono::{Local, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateRequest {
    #[schema(example = "cuti_tahunan")]
    pub kind: RequestKind,
    #[schema(example = "2026-08-10", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-08-12", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "13:00:00", value_type = Option<String>, nullable = true)]
    pub start_time: Option<NaiveTime>,
    #[schema(example = "15:00:00", value_type = Option<String>, nullable = true)]
    pub end_time: Option<NaiveTime>,
    #[schema(example = "Acara keluarga")]
    pub reason: String,
    #[schema(example = "pengajuan/surat-dokter-1a2b.pdf", nullable = true)]
    pub document: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct RejectBody {
    #[schema(example = "Dokumen tidak lengkap")]
    pub reason: String,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct RequestFilter {
    /// Filter by employee ID (admins only; employees always see their own)
    pub employee_id: Option<u64>,
    #[schema(example = "pending")]
    /// Filter by approval status
    pub status: Option<String>,
    #[schema(example = "cuti_tahunan")]
    /// Filter by request kind
    pub kind: Option<String>,
    /// Requests whose range ends on/after this date
    pub from: Option<NaiveDate>,
    /// Requests whose range starts on/before this date
    pub to: Option<NaiveDate>,
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    /// Pagination per page number
    pub per_page: Option<u64>,
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
    Date(NaiveDate),
}

#[derive(Serialize, ToSchema)]
pub struct RequestListResponse {
    pub data: Vec<Request>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

/* =========================
Submit request (pengajuan)
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/request",
    request_body(
        content = CreateRequest,
        description = "Leave/overtime/travel application payload",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Request submitted successfully", body = Object, example = json!({
            "message": "Request submitted",
            "status": "pending"
        })),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Request"
)]
pub async fn create_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateRequest>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;

    if payload.start_date > payload.end_date {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "start_date cannot be after end_date"
        })));
    }

    if payload.reason.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "reason must not be empty"
        })));
    }

    if let (Some(start), Some(end)) = (payload.start_time, payload.end_time) {
        if start > end {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "message": "start_time cannot be after end_time"
            })));
        }
    }

    // a range that starts in the past is a retroactive application
    let is_retroactive = payload.start_date < Local::now().date_naive();

    sqlx::query(
        r#"
        INSERT INTO requests
            (employee_id, kind, start_date, end_date, start_time, end_time,
             reason, document, status, is_retroactive, submitted_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'pending', ?, NOW())
        "#,
    )
    .bind(employee_id)
    .bind(payload.kind.as_ref())
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.start_time)
    .bind(payload.end_time)
    .bind(payload.reason.trim())
    .bind(&payload.document)
    .bind(is_retroactive)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id, "Failed to create request");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Request submitted",
        "status": "pending"
    })))
}

/* =========================
Approve request (Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/request/{request_id}/approve",
    params(
        ("request_id" = u64, Path, description = "ID of the request to approve")
    ),
    responses(
        (status = 200, description = "Request approved", body = Object, example = json!({
            "message": "Request approved"
        })),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request already decided", body = Object, example = json!({
            "error": "already_decided",
            "message": "subject has already been decided"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Request"
)]
pub async fn approve_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let request_id = path.into_inner();

    match apply_decision(pool.get_ref(), request_id, &Decision::Approve).await {
        Ok(()) => {
            reflect_on_attendance(pool.get_ref(), request_id).await;
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "message": "Request approved"
            })))
        }
        Err(DecisionFailure::Precondition(err)) => Ok(approval_error_response(&err)),
        Err(DecisionFailure::Db(e)) => {
            tracing::error!(error = %e, request_id, "Approve request failed");
            Err(actix_web::error::ErrorInternalServerError("Internal Server Error"))
        }
    }
}

/* =========================
Reject request (Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/request/{request_id}/reject",
    params(
        ("request_id" = u64, Path, description = "ID of the request to reject")
    ),
    request_body = RejectBody,
    responses(
        (status = 200, description = "Request rejected", body = Object, example = json!({
            "message": "Request rejected"
        })),
        (status = 400, description = "Rejection reason missing", body = Object, example = json!({
            "error": "reason_required",
            "message": "a rejection reason is required"
        })),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request already decided"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Request"
)]
pub async fn reject_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<RejectBody>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let request_id = path.into_inner();

    let decision = match Decision::reject(&body.reason) {
        Ok(d) => d,
        Err(err) => return Ok(approval_error_response(&err)),
    };

    match apply_decision(pool.get_ref(), request_id, &decision).await {
        Ok(()) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": "Request rejected"
        }))),
        Err(DecisionFailure::Precondition(err)) => Ok(approval_error_response(&err)),
        Err(DecisionFailure::Db(e)) => {
            tracing::error!(error = %e, request_id, "Reject request failed");
            Err(actix_web::error::ErrorInternalServerError("Internal Server Error"))
        }
    }
}

/// An approved leave-family application supersedes the raw status of the
/// days it covers (the rows are never deleted, only reclassified). The
/// decision itself is already committed, so failures here only log.
async fn reflect_on_attendance(pool: &MySqlPool, request_id: u64) {
    let row = sqlx::query_as::<_, (u64, String, NaiveDate, NaiveDate)>(
        "SELECT employee_id, kind, start_date, end_date FROM requests WHERE id = ?",
    )
    .bind(request_id)
    .fetch_optional(pool)
    .await;

    let (employee_id, kind, start_date, end_date) = match row {
        Ok(Some(row)) => row,
        Ok(None) => return,
        Err(e) => {
            tracing::error!(error = %e, request_id, "Failed to re-read approved request");
            return;
        }
    };

    let status = RequestKind::from_str(&kind)
        .ok()
        .and_then(|k| k.attendance_status());
    let Some(status) = status else { return };

    let mut date = start_date;
    while date <= end_date {
        if let Err(e) = sqlx::query(
            r#"
            INSERT INTO attendance (employee_id, date, status)
            VALUES (?, ?, ?)
            ON DUPLICATE KEY UPDATE status = VALUES(status)
            "#,
        )
        .bind(employee_id)
        .bind(date)
        .bind(status.as_ref())
        .execute(pool)
        .await
        {
            tracing::error!(error = %e, request_id, %date, "Failed to reclassify attendance day");
        }
        date = match date.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }
}

enum DecisionFailure {
    Precondition(ApprovalError),
    Db(sqlx::Error),
}

/// Exactly-once decision: the `status = 'pending'` guard makes the UPDATE
/// atomic, and a zero row count is mapped back to the precise precondition
/// error by re-reading the subject.
async fn apply_decision(
    pool: &MySqlPool,
    request_id: u64,
    decision: &Decision,
) -> Result<(), DecisionFailure> {
    let result = match decision {
        Decision::Approve => {
            sqlx::query(
                r#"
                UPDATE requests
                SET status = 'approved', decided_at = NOW()
                WHERE id = ? AND status = 'pending'
                "#,
            )
            .bind(request_id)
            .execute(pool)
            .await
        }
        Decision::Reject { reason } => {
            sqlx::query(
                r#"
                UPDATE requests
                SET status = 'rejected', rejection_reason = ?, decided_at = NOW()
                WHERE id = ? AND status = 'pending'
                "#,
            )
            .bind(reason)
            .bind(request_id)
            .execute(pool)
            .await
        }
    };

    let result = result.map_err(DecisionFailure::Db)?;
    if result.rows_affected() > 0 {
        return Ok(());
    }

    let current = sqlx::query_scalar::<_, String>("SELECT status FROM requests WHERE id = ?")
        .bind(request_id)
        .fetch_optional(pool)
        .await
        .map_err(DecisionFailure::Db)?;

    let err = match current {
        None => ApprovalError::NotFound,
        Some(status) => {
            let state = ApprovalState::from_str(&status).unwrap_or(ApprovalState::Pending);
            decide(state, decision)
                .err()
                .unwrap_or(ApprovalError::AlreadyDecided)
        }
    };
    Err(DecisionFailure::Precondition(err))
}

/// for getting a request's details endpoint
#[utoipa::path(
    get,
    path = "/api/v1/request/{request_id}",
    params(
        ("request_id" = u64, Path, description = "ID of the request to fetch")
    ),
    responses(
        (status = 200, description = "Request found", body = Request),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Request not found", body = Object, example = json!({
            "message": "Request not found"
        }))
    ),
    security(("bearer_auth" = [])),
    tag = "Request"
)]
pub async fn get_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let request_id = path.into_inner();

    let request = sqlx::query_as::<_, Request>("SELECT * FROM requests WHERE id = ?")
        .bind(request_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, request_id, "Failed to fetch request");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    match request {
        Some(data) => {
            // employees may only read their own applications
            if auth.role != Role::Admin && auth.employee_id != Some(data.employee_id) {
                return Ok(HttpResponse::Forbidden().json(serde_json::json!({
                    "message": "Not your request"
                })));
            }
            Ok(HttpResponse::Ok().json(data))
        }
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Request not found"
        }))),
    }
}

/// for listing requests endpoint
#[utoipa::path(
    get,
    path = "/api/v1/request",
    params(RequestFilter),
    responses(
        (status = 200, description = "Paginated request list", body = RequestListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Request"
)]
pub async fn request_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<RequestFilter>,
) -> actix_web::Result<impl Responder> {
    // -------------------------
    // Pagination
    // -------------------------
    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    // -------------------------
    // WHERE clause
    // -------------------------
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    // employees are always scoped to themselves
    let employee_filter = match auth.role {
        Role::Admin => query.employee_id,
        Role::Pegawai => Some(auth.require_employee()?),
    };
    if let Some(emp_id) = employee_filter {
        where_sql.push_str(" AND employee_id = ?");
        args.push(FilterValue::U64(emp_id));
    }

    if let Some(status) = query.status.as_deref() {
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status));
    }

    if let Some(kind) = query.kind.as_deref() {
        where_sql.push_str(" AND kind = ?");
        args.push(FilterValue::Str(kind));
    }

    if let Some(from) = query.from {
        where_sql.push_str(" AND end_date >= ?");
        args.push(FilterValue::Date(from));
    }

    if let Some(to) = query.to {
        where_sql.push_str(" AND start_date <= ?");
        args.push(FilterValue::Date(to));
    }

    // -------------------------
    // COUNT query
    // -------------------------
    let count_sql = format!("SELECT COUNT(*) FROM requests{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
            FilterValue::Date(d) => count_q.bind(*d),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to count requests");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // -------------------------
    // DATA query
    // -------------------------
    let data_sql = format!(
        r#"
        SELECT *
        FROM requests
        {}
        ORDER BY submitted_at DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, Request>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
            FilterValue::Date(d) => data_q.bind(d),
        };
    }

    let requests = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch request list");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let response = RequestListResponse {
        data: requests,
        page: page as u32,
        per_page: per_page as u32,
        total,
    };

    Ok(HttpResponse::Ok().json(response))
}
