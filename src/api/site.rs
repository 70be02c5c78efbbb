use crate::auth::auth::AuthUser;
use crate::model::site::{Site, SiteKind};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error};
use utoipa::ToSchema;

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateSite {
    #[schema(example = "Kantor Pusat")]
    pub name: String,
    #[schema(example = "Jl. Medan Merdeka Selatan No. 1, Jakarta")]
    pub address: String,
    #[schema(example = -6.2000)]
    pub latitude: f64,
    #[schema(example = 106.8160)]
    pub longitude: f64,
    #[schema(example = 100.0)]
    pub radius_m: f64,
    #[schema(example = "fixed")]
    pub kind: SiteKind,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateSite {
    pub name: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius_m: Option<f64>,
    pub kind: Option<SiteKind>,
    /// "active" or "inactive"; sites are deactivated, never deleted,
    /// because attendance rows keep referencing them
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SiteQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub kind: Option<String>,
    pub status: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct SiteListResponse {
    pub data: Vec<Site>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 3)]
    pub total: i64,
}

/// Registered coordinates must describe a usable geofence or the site would
/// be silently ineligible for every check-in.
fn validate_geometry(latitude: f64, longitude: f64, radius_m: f64) -> Result<(), &'static str> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err("latitude must be within -90..90");
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err("longitude must be within -180..180");
    }
    if !radius_m.is_finite() || radius_m <= 0.0 {
        return Err("radius_m must be greater than zero");
    }
    Ok(())
}

/// Create Site (Admin)
#[utoipa::path(
    post,
    path = "/api/v1/site",
    request_body = CreateSite,
    responses(
        (status = 201, description = "Site created successfully", body = Object, example = json!({
            "message": "Site created successfully"
        })),
        (status = 400, description = "Invalid geometry"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Site"
)]
pub async fn create_site(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateSite>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    if let Err(msg) = validate_geometry(payload.latitude, payload.longitude, payload.radius_m) {
        return Ok(HttpResponse::BadRequest().json(json!({ "message": msg })));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO sites (name, address, latitude, longitude, radius_m, kind, status)
        VALUES (?, ?, ?, ?, ?, ?, 'active')
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.address)
    .bind(payload.latitude)
    .bind(payload.longitude)
    .bind(payload.radius_m)
    .bind(payload.kind.as_ref())
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => Ok(HttpResponse::Created().json(json!({
            "message": "Site created successfully"
        }))),
        Err(e) => {
            error!(error = %e, "Failed to create site");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Something went wrong, Contact with system admin"
            })))
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/site",
    params(
        ("page", Query, description = "Page number"),
        ("per_page", Query, description = "Items per page"),
        ("kind", Query, description = "Filter by kind (fixed/travel)"),
        ("status", Query, description = "Filter by status (active/inactive)")
    ),
    responses(
        (status = 200, description = "Paginated site list", body = SiteListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Site"
)]
pub async fn list_sites(
    pool: web::Data<MySqlPool>,
    query: web::Query<SiteQuery>,
) -> actix_web::Result<impl Responder> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    // ---------- build WHERE clause dynamically ----------
    let mut conditions = Vec::new();
    let mut bindings: Vec<String> = Vec::new();

    if let Some(kind) = &query.kind {
        conditions.push("kind = ?");
        bindings.push(kind.clone());
    }

    if let Some(status) = &query.status {
        conditions.push("status = ?");
        bindings.push(status.clone());
    }

    let where_clause = if conditions.is_empty() {
        "".to_string()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let count_sql = format!("SELECT COUNT(*) as total FROM sites {}", where_clause);
    debug!(sql = %count_sql, bindings = ?bindings, "Counting sites");

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &bindings {
        count_query = count_query.bind(b);
    }

    let total = count_query.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %count_sql, "Failed to count sites");
        ErrorInternalServerError("Database error")
    })?;

    let data_sql = format!(
        "SELECT * FROM sites {} ORDER BY id LIMIT ? OFFSET ?",
        where_clause
    );

    let mut data_query = sqlx::query_as::<_, Site>(&data_sql);
    for b in &bindings {
        data_query = data_query.bind(b);
    }
    data_query = data_query.bind(per_page as i64).bind(offset as i64);

    let sites = data_query.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %data_sql, "Failed to fetch sites");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(SiteListResponse {
        data: sites,
        page,
        per_page,
        total,
    }))
}

/// Get Site by ID
#[utoipa::path(
    get,
    path = "/api/v1/site/{site_id}",
    params(
        ("site_id", Path, description = "Site ID")
    ),
    responses(
        (status = 200, description = "Site found", body = Site),
        (status = 404, description = "Site not found", body = Object, example = json!({
            "message": "Site not found"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Site"
)]
pub async fn get_site(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let site_id = path.into_inner();

    let site = sqlx::query_as::<_, Site>("SELECT * FROM sites WHERE id = ?")
        .bind(site_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, site_id, "Failed to fetch site");
            ErrorInternalServerError("Internal Server Error")
        })?;

    match site {
        Some(site) => Ok(HttpResponse::Ok().json(site)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Site not found"
        }))),
    }
}

/// Update Site (Admin)
#[utoipa::path(
    put,
    path = "/api/v1/site/{site_id}",
    params(
        ("site_id", Path, description = "Site ID")
    ),
    request_body = UpdateSite,
    responses(
        (status = 200, description = "Site updated successfully", body = Object, example = json!({
            "message": "Site updated successfully"
        })),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Site not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Site"
)]
pub async fn update_site(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateSite>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let site_id = path.into_inner();

    // the geometry rules apply to whichever coordinates the update touches
    if let Some(lat) = payload.latitude {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "latitude must be within -90..90"
            })));
        }
    }
    if let Some(lon) = payload.longitude {
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "longitude must be within -180..180"
            })));
        }
    }
    if let Some(radius) = payload.radius_m {
        if !radius.is_finite() || radius <= 0.0 {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "radius_m must be greater than zero"
            })));
        }
    }
    if let Some(status) = &payload.status {
        if !matches!(status.as_str(), "active" | "inactive") {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "status must be active or inactive"
            })));
        }
    }

    enum SetValue<'a> {
        Str(&'a str),
        F64(f64),
    }

    let mut sets: Vec<&str> = Vec::new();
    let mut values: Vec<SetValue> = Vec::new();

    if let Some(name) = &payload.name {
        sets.push("name = ?");
        values.push(SetValue::Str(name));
    }
    if let Some(address) = &payload.address {
        sets.push("address = ?");
        values.push(SetValue::Str(address));
    }
    if let Some(lat) = payload.latitude {
        sets.push("latitude = ?");
        values.push(SetValue::F64(lat));
    }
    if let Some(lon) = payload.longitude {
        sets.push("longitude = ?");
        values.push(SetValue::F64(lon));
    }
    if let Some(radius) = payload.radius_m {
        sets.push("radius_m = ?");
        values.push(SetValue::F64(radius));
    }
    if let Some(kind) = &payload.kind {
        sets.push("kind = ?");
        values.push(SetValue::Str(kind.as_ref()));
    }
    if let Some(status) = &payload.status {
        sets.push("status = ?");
        values.push(SetValue::Str(status));
    }

    if sets.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "No fields provided for update"
        })));
    }

    let sql = format!("UPDATE sites SET {} WHERE id = ?", sets.join(", "));
    let mut update = sqlx::query(&sql);
    for value in values {
        update = match value {
            SetValue::Str(s) => update.bind(s.to_string()),
            SetValue::F64(f) => update.bind(f),
        };
    }

    let result = update.bind(site_id).execute(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, site_id, "Failed to update site");
        ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Site not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Site updated successfully"
    })))
}
