use crate::api::approval_error_response;
use crate::auth::auth::AuthUser;
use crate::domain::approval::{Decision, decide};
use crate::domain::error::ApprovalError;
use crate::domain::stats::{DutyMemberSnapshot, DutyStats, duty_stats};
use crate::model::duty::{DutyAssignment, DutyKind, DutyMember};
use crate::model::role::Role;
use crate::model::site::Site;
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct DutyQuery {
    /// Only assignments whose date range covers today
    pub active: Option<bool>,
    #[schema(example = "luar_kota")]
    /// Filter by duty kind (dalam_kota/luar_kota/luar_negeri)
    pub kind: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct DutySummary {
    pub assignment: DutyAssignment,
    pub stats: DutyStats,
}

#[derive(Serialize, ToSchema)]
pub struct DutyListResponse {
    pub data: Vec<DutySummary>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

/// Member row joined with the employee register for display.
#[derive(Serialize, sqlx::FromRow, ToSchema)]
pub struct DutyMemberView {
    pub id: u64,
    pub duty_id: u64,
    pub employee_id: u64,
    #[schema(example = "Budi Santoso")]
    pub full_name: String,
    #[schema(example = "198701012010011001")]
    pub nip: String,
    #[schema(example = "hadir")]
    pub sub_status: String,
    #[schema(example = "pending")]
    pub validation: String,
    pub rejection_reason: Option<String>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub decided_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, ToSchema)]
pub struct DutyDetail {
    pub assignment: DutyAssignment,
    pub sites: Vec<Site>,
    pub members: Vec<DutyMemberView>,
    pub stats: DutyStats,
}

async fn members_of(pool: &MySqlPool, duty_id: u64) -> Result<Vec<DutyMember>, sqlx::Error> {
    sqlx::query_as::<_, DutyMember>("SELECT * FROM duty_members WHERE duty_id = ?")
        .bind(duty_id)
        .fetch_all(pool)
        .await
}

/// Counters are recomputed on read: "absent" depends on whether the
/// assignment's work start has passed at this wall-clock instant.
fn stats_for(assignment: &DutyAssignment, members: &[DutyMember]) -> DutyStats {
    let work_started = assignment.work_started_by(Local::now().naive_local());
    duty_stats(members.iter().map(|m| DutyMemberSnapshot {
        sub_status: m.sub_status(),
        validation: m.validation(),
        work_started,
    }))
}

/// List duty assignments with their validation counters
#[utoipa::path(
    get,
    path = "/api/v1/duty",
    params(DutyQuery),
    responses(
        (status = 200, description = "Paginated duty assignment list", body = DutyListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Duty"
)]
pub async fn duty_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<DutyQuery>,
) -> actix_web::Result<impl Responder> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let today = Local::now().date_naive();

    // the kind vocabulary is closed; reject unknown filters up front
    let kind = match query.kind.as_deref() {
        Some(raw) => match DutyKind::from_str(raw) {
            Ok(kind) => Some(kind),
            Err(_) => {
                return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                    "message": "kind must be one of dalam_kota, luar_kota, luar_negeri"
                })));
            }
        },
        None => None,
    };

    let mut conditions: Vec<&str> = Vec::new();
    if query.active.unwrap_or(false) {
        conditions.push("d.start_date <= ? AND d.end_date >= ?");
    }
    if kind.is_some() {
        conditions.push("d.kind = ?");
    }
    // employees only see assignments they belong to
    let member_scope = auth.role != Role::Admin;
    if member_scope {
        conditions.push("EXISTS (SELECT 1 FROM duty_members m WHERE m.duty_id = d.id AND m.employee_id = ?)");
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let employee_id = if member_scope { Some(auth.require_employee()?) } else { None };

    let count_sql = format!("SELECT COUNT(*) FROM duty_assignments d {}", where_clause);
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    if query.active.unwrap_or(false) {
        count_q = count_q.bind(today).bind(today);
    }
    if let Some(kind) = kind {
        count_q = count_q.bind(kind.as_ref().to_string());
    }
    if let Some(emp_id) = employee_id {
        count_q = count_q.bind(emp_id);
    }
    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to count duty assignments");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        "SELECT d.* FROM duty_assignments d {} ORDER BY d.start_date DESC, d.id DESC LIMIT ? OFFSET ?",
        where_clause
    );
    let mut data_q = sqlx::query_as::<_, DutyAssignment>(&data_sql);
    if query.active.unwrap_or(false) {
        data_q = data_q.bind(today).bind(today);
    }
    if let Some(kind) = kind {
        data_q = data_q.bind(kind.as_ref().to_string());
    }
    if let Some(emp_id) = employee_id {
        data_q = data_q.bind(emp_id);
    }
    let assignments = data_q
        .bind(per_page as i64)
        .bind(offset as i64)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch duty assignments");
            ErrorInternalServerError("Internal Server Error")
        })?;

    let mut data = Vec::with_capacity(assignments.len());
    for assignment in assignments {
        let members = members_of(pool.get_ref(), assignment.id).await.map_err(|e| {
            tracing::error!(error = %e, duty_id = assignment.id, "Failed to fetch duty members");
            ErrorInternalServerError("Internal Server Error")
        })?;
        let stats = stats_for(&assignment, &members);
        data.push(DutySummary { assignment, stats });
    }

    Ok(HttpResponse::Ok().json(DutyListResponse {
        data,
        page,
        per_page,
        total,
    }))
}

/// Duty assignment detail with sites, members and counters
#[utoipa::path(
    get,
    path = "/api/v1/duty/{duty_id}",
    params(
        ("duty_id" = u64, Path, description = "Duty assignment ID")
    ),
    responses(
        (status = 200, description = "Duty assignment detail", body = DutyDetail),
        (status = 404, description = "Duty assignment not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Duty"
)]
pub async fn duty_detail(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let duty_id = path.into_inner();

    let assignment =
        sqlx::query_as::<_, DutyAssignment>("SELECT * FROM duty_assignments WHERE id = ?")
            .bind(duty_id)
            .fetch_optional(pool.get_ref())
            .await
            .map_err(|e| {
                tracing::error!(error = %e, duty_id, "Failed to fetch duty assignment");
                ErrorInternalServerError("Internal Server Error")
            })?;

    let Some(assignment) = assignment else {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Duty assignment not found"
        })));
    };

    let sites = sqlx::query_as::<_, Site>(
        r#"
        SELECT s.*
        FROM sites s
        JOIN duty_sites ds ON ds.site_id = s.id
        WHERE ds.duty_id = ?
        "#,
    )
    .bind(duty_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, duty_id, "Failed to fetch duty sites");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let members = members_of(pool.get_ref(), duty_id).await.map_err(|e| {
        tracing::error!(error = %e, duty_id, "Failed to fetch duty members");
        ErrorInternalServerError("Internal Server Error")
    })?;
    let stats = stats_for(&assignment, &members);

    let member_views = sqlx::query_as::<_, DutyMemberView>(
        r#"
        SELECT m.id, m.duty_id, m.employee_id, e.full_name, e.nip,
               m.sub_status, m.validation, m.rejection_reason, m.decided_at
        FROM duty_members m
        JOIN employees e ON e.id = m.employee_id
        WHERE m.duty_id = ?
        ORDER BY e.full_name
        "#,
    )
    .bind(duty_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, duty_id, "Failed to fetch duty member views");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(DutyDetail {
        assignment,
        sites,
        members: member_views,
        stats,
    }))
}

enum MemberDecisionFailure {
    Precondition(ApprovalError),
    Db(sqlx::Error),
}

/// Same exactly-once pattern as request decisions: atomic guarded UPDATE,
/// zero rows re-read into the precise error.
async fn decide_member(
    pool: &MySqlPool,
    duty_id: u64,
    member_id: u64,
    decision: &Decision,
) -> Result<(), MemberDecisionFailure> {
    let result = match decision {
        Decision::Approve => {
            sqlx::query(
                r#"
                UPDATE duty_members
                SET validation = 'approved', decided_at = NOW()
                WHERE id = ? AND duty_id = ? AND validation = 'pending'
                "#,
            )
            .bind(member_id)
            .bind(duty_id)
            .execute(pool)
            .await
        }
        Decision::Reject { reason } => {
            sqlx::query(
                r#"
                UPDATE duty_members
                SET validation = 'rejected', rejection_reason = ?, decided_at = NOW()
                WHERE id = ? AND duty_id = ? AND validation = 'pending'
                "#,
            )
            .bind(reason)
            .bind(member_id)
            .bind(duty_id)
            .execute(pool)
            .await
        }
    };

    let result = result.map_err(MemberDecisionFailure::Db)?;
    if result.rows_affected() > 0 {
        return Ok(());
    }

    let member =
        sqlx::query_as::<_, DutyMember>("SELECT * FROM duty_members WHERE id = ? AND duty_id = ?")
            .bind(member_id)
            .bind(duty_id)
            .fetch_optional(pool)
            .await
            .map_err(MemberDecisionFailure::Db)?;

    let err = match member {
        None => ApprovalError::NotFound,
        Some(member) => decide(member.validation(), decision)
            .err()
            .unwrap_or(ApprovalError::AlreadyDecided),
    };
    Err(MemberDecisionFailure::Precondition(err))
}

#[derive(Deserialize, ToSchema)]
pub struct MemberRejectBody {
    #[schema(example = "Foto tidak sesuai lokasi")]
    pub reason: String,
}

/// Validate (approve) one member's duty attendance
#[utoipa::path(
    put,
    path = "/api/v1/duty/{duty_id}/member/{member_id}/approve",
    params(
        ("duty_id" = u64, Path, description = "Duty assignment ID"),
        ("member_id" = u64, Path, description = "Duty member row ID")
    ),
    responses(
        (status = 200, description = "Duty attendance validated", body = Object, example = json!({
            "message": "Duty attendance validated"
        })),
        (status = 404, description = "Member not found"),
        (status = 409, description = "Already decided"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Duty"
)]
pub async fn approve_member(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<(u64, u64)>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let (duty_id, member_id) = path.into_inner();

    match decide_member(pool.get_ref(), duty_id, member_id, &Decision::Approve).await {
        Ok(()) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": "Duty attendance validated"
        }))),
        Err(MemberDecisionFailure::Precondition(err)) => Ok(approval_error_response(&err)),
        Err(MemberDecisionFailure::Db(e)) => {
            tracing::error!(error = %e, duty_id, member_id, "Approve duty member failed");
            Err(ErrorInternalServerError("Internal Server Error"))
        }
    }
}

/// Reject one member's duty attendance (reason required)
#[utoipa::path(
    put,
    path = "/api/v1/duty/{duty_id}/member/{member_id}/reject",
    params(
        ("duty_id" = u64, Path, description = "Duty assignment ID"),
        ("member_id" = u64, Path, description = "Duty member row ID")
    ),
    request_body = MemberRejectBody,
    responses(
        (status = 200, description = "Duty attendance rejected", body = Object, example = json!({
            "message": "Duty attendance rejected"
        })),
        (status = 400, description = "Rejection reason missing"),
        (status = 404, description = "Member not found"),
        (status = 409, description = "Already decided"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Duty"
)]
pub async fn reject_member(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<(u64, u64)>,
    body: web::Json<MemberRejectBody>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let (duty_id, member_id) = path.into_inner();

    let decision = match Decision::reject(&body.reason) {
        Ok(d) => d,
        Err(err) => return Ok(approval_error_response(&err)),
    };

    match decide_member(pool.get_ref(), duty_id, member_id, &decision).await {
        Ok(()) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": "Duty attendance rejected"
        }))),
        Err(MemberDecisionFailure::Precondition(err)) => Ok(approval_error_response(&err)),
        Err(MemberDecisionFailure::Db(e)) => {
            tracing::error!(error = %e, duty_id, member_id, "Reject duty member failed");
            Err(ErrorInternalServerError("Internal Server Error"))
        }
    }
}
