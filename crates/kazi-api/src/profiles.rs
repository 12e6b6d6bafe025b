use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use kazi_db::queries::ProfileChanges;
use kazi_types::api::{Claims, UpdateProfileRequest, UserListResponse};
use kazi_types::models::Role;

use crate::auth::AppState;
use crate::convert::user_response;
use crate::error::ApiError;
use crate::jobs::{page_params, total_pages};
use crate::run_blocking;

/// The caller's own profile; email included, password hash never.
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user = run_blocking(move || {
        state
            .db
            .get_user_by_id(&claims.sub.to_string())?
            .ok_or_else(|| ApiError::NotFound("User not found".into()))
    })
    .await?;

    Ok(Json(serde_json::json!({ "user": user_response(user, true) })))
}

/// Partial update of the caller's own record. The request shape cannot
/// express `email`, `role` or `id`, and fields for the other role are
/// silently ignored rather than stored.
pub async fn update_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let skills = match &req.skills {
        Some(list) => {
            Some(serde_json::to_string(list).map_err(|e| anyhow::anyhow!("skills encode: {}", e))?)
        }
        None => None,
    };

    let seeker = claims.role == Role::JobSeeker;
    let employer = claims.role == Role::Employer;

    let changes = ProfileChanges {
        full_name: req.full_name,
        avatar_url: req.avatar_url,
        bio: req.bio.filter(|_| seeker),
        skills: skills.filter(|_| seeker),
        cv_url: req.cv_url.filter(|_| seeker),
        phone: req.phone.filter(|_| seeker),
        location: req.location,
        company_name: req.company_name.filter(|_| employer),
        company_description: req.company_description.filter(|_| employer),
        company_logo: req.company_logo.filter(|_| employer),
        company_website: req.company_website.filter(|_| employer),
        industry: req.industry.filter(|_| employer),
        company_size: req.company_size.filter(|_| employer),
    };

    let user = run_blocking(move || {
        let updated = state
            .db
            .update_user_profile(&claims.sub.to_string(), &changes)?;
        if !updated {
            return Err(ApiError::NotFound("User not found".into()));
        }
        state
            .db
            .get_user_by_id(&claims.sub.to_string())?
            .ok_or_else(|| ApiError::NotFound("User not found".into()))
    })
    .await?;

    Ok(Json(serde_json::json!({ "user": user_response(user, true) })))
}

/// Public profile view with password and email both stripped.
pub async fn public_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user = run_blocking(move || {
        state
            .db
            .get_user_by_id(&id.to_string())?
            .ok_or_else(|| ApiError::NotFound("User not found".into()))
    })
    .await?;

    Ok(Json(serde_json::json!({ "user": user_response(user, false) })))
}

#[derive(Debug, Deserialize)]
pub struct SeekerSearchQuery {
    /// Comma-separated; a profile matches if it has any of them.
    pub skills: Option<String>,
    pub location: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

pub async fn search_job_seekers(
    State(state): State<AppState>,
    Query(query): Query<SeekerSearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let skills: Vec<String> = query
        .skills
        .as_deref()
        .map(|raw| {
            raw.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let (page, limit) = page_params(query.page, query.limit);

    let (rows, total) = run_blocking(move || {
        state
            .db
            .search_job_seekers(&skills, query.location.as_deref(), page, limit)
            .map_err(ApiError::from)
    })
    .await?;

    Ok(Json(UserListResponse {
        users: rows.into_iter().map(|row| user_response(row, false)).collect(),
        total_pages: total_pages(total, limit),
        current_page: page,
        total,
    }))
}

#[derive(Debug, Deserialize)]
pub struct EmployerSearchQuery {
    pub industry: Option<String>,
    pub location: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

pub async fn search_employers(
    State(state): State<AppState>,
    Query(query): Query<EmployerSearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, limit) = page_params(query.page, query.limit);

    let (rows, total) = run_blocking(move || {
        state
            .db
            .search_employers(
                query.industry.as_deref(),
                query.location.as_deref(),
                page,
                limit,
            )
            .map_err(ApiError::from)
    })
    .await?;

    Ok(Json(UserListResponse {
        users: rows.into_iter().map(|row| user_response(row, false)).collect(),
        total_pages: total_pages(total, limit),
        current_page: page,
        total,
    }))
}
