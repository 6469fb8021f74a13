use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::categories::CategoryResponse;
use super::nullable;
use super::users::ChangeLogResponse;
use crate::api::errors::ApiError;
use crate::api::middleware::{ApiJson, AuthUser};
use crate::config::Config;
use crate::domain::catalog::DepartmentRef;
use crate::domain::grievance::{
    Feedback, Grievance, GrievanceFilter, GrievanceStatus, NewFeedback, NewGrievance, NewRemark,
    Remark, TrackingId,
};
use crate::domain::repositories::grievance_repository::GrievanceView;
use crate::domain::repositories::user_repository::UserSummary;
use crate::domain::repositories::{
    CategoryRepository, DepartmentRepository, GrievanceRepository, UserRepository,
};
use crate::domain::user::Role;
use crate::infrastructure::repositories::{
    PostgresCategoryRepository, PostgresDepartmentRepository, PostgresGrievanceRepository,
    PostgresUserRepository,
};

/// Grievance as listed
#[derive(Debug, Serialize)]
pub struct GrievanceResponse {
    pub id: i64,
    pub tracking_id: Option<String>,
    pub title: String,
    pub description: String,
    pub status: GrievanceStatus,
    pub user: Option<UserSummary>,
    pub category: Option<CategoryResponse>,
    pub department: Option<DepartmentRef>,
    pub assigned_officer: Option<UserSummary>,
    pub attachment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<GrievanceView> for GrievanceResponse {
    fn from(view: GrievanceView) -> Self {
        let g = view.grievance;
        Self {
            id: g.id(),
            tracking_id: g.tracking_id().map(|t| t.to_string()),
            title: g.title().to_string(),
            description: g.description().to_string(),
            status: g.status(),
            user: view.filer,
            category: view.category.map(CategoryResponse::from),
            department: view.department,
            assigned_officer: view.assigned_officer,
            attachment: g.attachment().map(str::to_string),
            created_at: g.created_at(),
            updated_at: g.updated_at(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RemarkResponse {
    pub id: i64,
    pub grievance_id: i64,
    pub officer: Option<UserSummary>,
    pub remark: String,
    pub created_at: DateTime<Utc>,
}

impl From<Remark> for RemarkResponse {
    fn from(r: Remark) -> Self {
        Self {
            id: r.id,
            grievance_id: r.grievance_id,
            officer: r.officer,
            remark: r.remark,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub id: i64,
    pub grievance_id: i64,
    pub rating: i16,
    pub comments: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl From<Feedback> for FeedbackResponse {
    fn from(f: Feedback) -> Self {
        Self {
            id: f.id,
            grievance_id: f.grievance_id,
            rating: f.rating,
            comments: f.comments,
            submitted_at: f.submitted_at,
        }
    }
}

/// Grievance with its remarks and feedback
#[derive(Debug, Serialize)]
pub struct GrievanceDetailResponse {
    #[serde(flatten)]
    pub grievance: GrievanceResponse,
    pub remarks: Vec<RemarkResponse>,
    pub feedback: Option<FeedbackResponse>,
}

#[derive(Debug, Serialize)]
pub struct GrievanceListResponse {
    pub count: i64,
    pub results: Vec<GrievanceResponse>,
}

#[derive(Debug, Deserialize)]
pub struct CreateGrievanceRequest {
    pub title: String,
    pub description: String,
    pub category_id: Option<i64>,
    pub department_id: Option<i64>,
    pub attachment: Option<String>,
}

/// Staff update; absent fields are unchanged, `null` clears classification
#[derive(Debug, Default, Deserialize)]
pub struct UpdateGrievanceRequest {
    pub status: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub category_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub department_id: Option<Option<i64>>,
    pub assigned_officer_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    #[serde(alias = "assigned_to", alias = "assigned")]
    pub assigned_officer: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RemarkRequest {
    #[serde(alias = "comment", alias = "text")]
    pub remark: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub rating: i64,
    pub comments: Option<String>,
}

/// Filers see their own grievances; staff see all
fn ensure_can_view(user: &AuthUser, grievance: &Grievance) -> Result<(), ApiError> {
    if user.role.is_staff() || grievance.is_filed_by(user.id) {
        Ok(())
    } else {
        Err(ApiError::forbidden(
            "You do not have permission to view this grievance.",
        ))
    }
}

/// Narrows a list filter to what the caller may see
fn scope_filter(user: &AuthUser, mut filter: GrievanceFilter) -> GrievanceFilter {
    match user.role {
        Role::Citizen => filter.user = Some(user.id),
        Role::Officer => filter.assigned_officer = Some(user.id),
        Role::Admin => {}
    }
    filter
}

fn grievance_not_found() -> ApiError {
    ApiError::not_found("Grievance not found")
}

async fn load(repo: &PostgresGrievanceRepository, id: i64) -> Result<Grievance, ApiError> {
    repo.find_by_id(id).await?.ok_or_else(grievance_not_found)
}

async fn detail(
    repo: &PostgresGrievanceRepository,
    id: i64,
) -> Result<GrievanceDetailResponse, ApiError> {
    let view = repo.find_view(id).await?.ok_or_else(grievance_not_found)?;
    let remarks = repo.remarks(id).await?;
    let feedback = repo.feedback(id).await?;

    Ok(GrievanceDetailResponse {
        grievance: GrievanceResponse::from(view),
        remarks: remarks.into_iter().map(RemarkResponse::from).collect(),
        feedback: feedback.map(FeedbackResponse::from),
    })
}

/// Category id and the department it belongs to; unknown ids are a 400
async fn check_category(pool: &PgPool, id: i64) -> Result<Option<i64>, ApiError> {
    let category = PostgresCategoryRepository::new(pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::bad_request("Invalid category"))?;
    Ok(category.department.map(|d| d.id))
}

async fn check_department(pool: &PgPool, id: i64) -> Result<(), ApiError> {
    PostgresDepartmentRepository::new(pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::bad_request("Invalid department"))?;
    Ok(())
}

/// The user must exist (404) and be an officer (400)
async fn check_officer(pool: &PgPool, id: Uuid) -> Result<(), ApiError> {
    let officer = PostgresUserRepository::new(pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Officer not found"))?;

    if !officer.role.is_officer() {
        return Err(ApiError::bad_request("Selected user is not an officer"));
    }
    if !officer.is_active {
        return Err(ApiError::bad_request("Selected officer is inactive"));
    }
    Ok(())
}

/// File a grievance
///
/// POST /api/grievances
pub async fn create_grievance(
    user: AuthUser,
    State(pool): State<PgPool>,
    State(config): State<Arc<Config>>,
    ApiJson(req): ApiJson<CreateGrievanceRequest>,
) -> Result<(StatusCode, Json<GrievanceDetailResponse>), ApiError> {
    let category_department = match req.category_id {
        Some(id) => check_category(&pool, id).await?,
        None => None,
    };
    if let Some(id) = req.department_id {
        check_department(&pool, id).await?;
    }

    let new = NewGrievance::new(
        user.id,
        req.title,
        req.description,
        req.category_id,
        req.department_id,
        req.attachment,
    )
    .map_err(ApiError::bad_request)?
    .with_default_department(category_department);

    let repo = PostgresGrievanceRepository::new(pool);
    let grievance = repo.create(&new, &config.tracking_id_prefix).await?;

    tracing::info!(
        grievance_id = grievance.id(),
        tracking_id = ?grievance.tracking_id().map(|t| t.as_str()),
        user_id = %user.id,
        "grievance filed"
    );

    Ok((StatusCode::CREATED, Json(detail(&repo, grievance.id()).await?)))
}

/// Role-scoped, filtered list
///
/// GET /api/grievances?status=&category=&assigned_officer=&search=&date_from=&date_to=&limit=&offset=
pub async fn list_grievances(
    user: AuthUser,
    State(pool): State<PgPool>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<GrievanceListResponse>, ApiError> {
    let (filter, page) = GrievanceFilter::from_query(&params);
    let filter = scope_filter(&user, filter);

    let (count, views) = PostgresGrievanceRepository::new(pool)
        .list(&filter, page)
        .await?;

    Ok(Json(GrievanceListResponse {
        count,
        results: views.into_iter().map(GrievanceResponse::from).collect(),
    }))
}

/// GET /api/grievances/:id
pub async fn get_grievance(
    user: AuthUser,
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<Json<GrievanceDetailResponse>, ApiError> {
    let repo = PostgresGrievanceRepository::new(pool);
    let grievance = load(&repo, id).await?;
    ensure_can_view(&user, &grievance)?;

    Ok(Json(detail(&repo, id).await?))
}

/// GET /api/grievances/track/:tracking_id
pub async fn track_grievance(
    user: AuthUser,
    State(pool): State<PgPool>,
    Path(tracking_id): Path<String>,
) -> Result<Json<GrievanceDetailResponse>, ApiError> {
    let tracking_id = TrackingId::parse(&tracking_id).map_err(ApiError::bad_request)?;

    let repo = PostgresGrievanceRepository::new(pool);
    let grievance = repo
        .find_by_tracking_id(&tracking_id)
        .await?
        .ok_or_else(grievance_not_found)?;
    ensure_can_view(&user, &grievance)?;

    Ok(Json(detail(&repo, grievance.id()).await?))
}

/// Staff update of status, classification and assignment
///
/// PATCH /api/grievances/:id
pub async fn update_grievance(
    user: AuthUser,
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<UpdateGrievanceRequest>,
) -> Result<Json<GrievanceDetailResponse>, ApiError> {
    user.require_staff()?;

    let repo = PostgresGrievanceRepository::new(pool.clone());
    let mut grievance = load(&repo, id).await?;
    let mut events = Vec::new();

    if let Some(officer_id) = req.assigned_officer_id {
        check_officer(&pool, officer_id).await?;
        events.extend(grievance.assign(officer_id).map_err(ApiError::bad_request)?);
    }

    if req.category_id.is_some() || req.department_id.is_some() {
        let category_id = req.category_id.unwrap_or(grievance.category_id());
        let department_id = req.department_id.unwrap_or(grievance.department_id());
        if let Some(id) = category_id.filter(|c| Some(*c) != grievance.category_id()) {
            check_category(&pool, id).await?;
        }
        if let Some(id) = department_id.filter(|d| Some(*d) != grievance.department_id()) {
            check_department(&pool, id).await?;
        }
        events.extend(grievance.reclassify(category_id, department_id));
    }

    if let Some(status) = req.status.as_deref() {
        let next: GrievanceStatus = status.parse().map_err(ApiError::bad_request)?;
        events.extend(grievance.change_status(next).map_err(ApiError::bad_request)?);
    }

    if !events.is_empty() {
        repo.save(&grievance, Some(user.id), &events).await?;
        tracing::info!(
            grievance_id = id,
            user_id = %user.id,
            changes = events.len(),
            status = %grievance.status(),
            "grievance updated"
        );
    }

    Ok(Json(detail(&repo, id).await?))
}

/// DELETE /api/grievances/:id
pub async fn delete_grievance(
    user: AuthUser,
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    user.require_admin()?;

    PostgresGrievanceRepository::new(pool).delete(id).await?;
    tracing::info!(grievance_id = id, user_id = %user.id, "grievance deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Assign an officer
///
/// POST /api/grievances/:id/assign
pub async fn assign_grievance(
    user: AuthUser,
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<AssignRequest>,
) -> Result<Json<GrievanceDetailResponse>, ApiError> {
    user.require_admin()?;

    let officer_id = req
        .assigned_officer
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::bad_request("assigned_officer is required"))?;
    let officer_id = Uuid::parse_str(officer_id)
        .map_err(|_| ApiError::not_found("Officer not found"))?;

    let repo = PostgresGrievanceRepository::new(pool.clone());
    let mut grievance = load(&repo, id).await?;
    check_officer(&pool, officer_id).await?;

    if let Some(event) = grievance.assign(officer_id).map_err(ApiError::bad_request)? {
        repo.save(&grievance, Some(user.id), &[event]).await?;
        tracing::info!(grievance_id = id, officer_id = %officer_id, "grievance assigned");
    }

    Ok(Json(detail(&repo, id).await?))
}

/// GET /api/grievances/:id/remarks
pub async fn list_remarks(
    user: AuthUser,
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<RemarkResponse>>, ApiError> {
    user.require_staff()?;

    let repo = PostgresGrievanceRepository::new(pool);
    load(&repo, id).await?;

    let remarks = repo.remarks(id).await?;
    Ok(Json(remarks.into_iter().map(RemarkResponse::from).collect()))
}

/// POST /api/grievances/:id/remarks
pub async fn add_remark(
    user: AuthUser,
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<RemarkRequest>,
) -> Result<(StatusCode, Json<RemarkResponse>), ApiError> {
    user.require_staff()?;

    let new = NewRemark::new(id, user.id, req.remark.as_deref().unwrap_or(""))
        .map_err(ApiError::bad_request)?;

    let repo = PostgresGrievanceRepository::new(pool);
    load(&repo, id).await?;

    let remark = repo.add_remark(&new).await?;
    tracing::info!(grievance_id = id, remark_id = remark.id, "remark added");

    Ok((StatusCode::CREATED, Json(RemarkResponse::from(remark))))
}

/// Filer rates a resolved or closed grievance, once
///
/// POST /api/grievances/:id/feedback
pub async fn submit_feedback(
    user: AuthUser,
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<FeedbackRequest>,
) -> Result<(StatusCode, Json<FeedbackResponse>), ApiError> {
    let repo = PostgresGrievanceRepository::new(pool);
    let grievance = load(&repo, id).await?;

    if !grievance.is_filed_by(user.id) {
        return Err(ApiError::forbidden(
            "Only the citizen who filed this grievance can give feedback.",
        ));
    }

    let (feedback, event) = NewFeedback::for_grievance(&grievance, req.rating, req.comments)
        .map_err(ApiError::bad_request)?;

    let stored = repo.add_feedback(&feedback, user.id, &event).await?;
    tracing::info!(grievance_id = id, rating = stored.rating, "feedback submitted");

    Ok((StatusCode::CREATED, Json(FeedbackResponse::from(stored))))
}

/// Change log, newest first
///
/// GET /api/grievances/:id/history
pub async fn grievance_history(
    user: AuthUser,
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<ChangeLogResponse>>, ApiError> {
    user.require_staff()?;

    let repo = PostgresGrievanceRepository::new(pool);
    load(&repo, id).await?;

    let entries = repo.history(id).await?;
    Ok(Json(entries.into_iter().map(ChangeLogResponse::from).collect()))
}
