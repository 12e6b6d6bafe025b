use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use kazi_db::queries::{JobChanges, JobFilters, NewJob};
use kazi_types::api::{Claims, CreateJobRequest, JobListResponse, UpdateJobRequest};
use kazi_types::models::{JobType, Role};

use crate::auth::AppState;
use crate::convert::{employer_detail, job_response};
use crate::error::ApiError;
use crate::middleware::require_role;
use crate::run_blocking;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListQuery {
    pub title: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub category: Option<String>,
    pub salary_min: Option<i64>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

pub(crate) fn page_params(page: Option<u32>, limit: Option<u32>) -> (u32, u32) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    (page, limit)
}

pub(crate) fn total_pages(total: u32, limit: u32) -> u32 {
    total.div_ceil(limit)
}

/// Public listing: active jobs only, filters ANDed, newest first.
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<JobListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let job_type = match &query.job_type {
        Some(raw) => Some(
            raw.parse::<JobType>()
                .map_err(|e| ApiError::Validation(e.to_string()))?,
        ),
        None => None,
    };

    let (page, limit) = page_params(query.page, query.limit);
    let filters = JobFilters {
        title: query.title,
        location: query.location,
        job_type: job_type.map(|t| t.as_str().to_string()),
        category: query.category,
        salary_min: query.salary_min,
    };

    let (rows, total) =
        run_blocking(move || state.db.search_jobs(&filters, page, limit).map_err(ApiError::from))
            .await?;

    Ok(Json(JobListResponse {
        jobs: rows.into_iter().map(job_response).collect(),
        total_pages: total_pages(total, limit),
        current_page: page,
        total,
    }))
}

pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let (job, employer) = run_blocking(move || {
        let job = state
            .db
            .get_job(&id.to_string())?
            .ok_or_else(|| ApiError::NotFound("Job not found".into()))?;
        let employer = state.db.get_user_by_id(&job.employer_id)?;
        Ok((job, employer))
    })
    .await?;

    let mut job = job_response(job);
    // single-job view carries the full company block
    if let Some(employer) = &employer {
        job.employer = Some(employer_detail(employer));
    }

    Ok(Json(serde_json::json!({ "job": job })))
}

pub async fn create_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateJobRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&claims, Role::Employer)?;

    if req.title.trim().is_empty() {
        return Err(ApiError::Validation("Title is required".into()));
    }
    if req.description.trim().is_empty() {
        return Err(ApiError::Validation("Description is required".into()));
    }
    if req.location.trim().is_empty() {
        return Err(ApiError::Validation("Location is required".into()));
    }

    let job_id = Uuid::new_v4();
    let requirements = serde_json::to_string(&req.requirements)
        .map_err(|e| anyhow::anyhow!("requirements encode: {}", e))?;

    let job = run_blocking(move || {
        // employer identity always comes from the token, never the body
        state.db.insert_job(&NewJob {
            id: &job_id.to_string(),
            employer_id: &claims.sub.to_string(),
            title: req.title.trim(),
            description: &req.description,
            requirements: &requirements,
            job_type: req.job_type.as_str(),
            location: req.location.trim(),
            salary_min: req.salary_min,
            salary_max: req.salary_max,
            category: req.category.as_deref(),
            is_active: req.is_active.unwrap_or(true),
        })?;

        state
            .db
            .get_job(&job_id.to_string())?
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("job vanished after insert")))
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "job": job_response(job) })),
    ))
}

pub async fn update_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateJobRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&claims, Role::Employer)?;

    for (field, value) in [
        ("Title", &req.title),
        ("Description", &req.description),
        ("Location", &req.location),
    ] {
        if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
            return Err(ApiError::Validation(format!("{field} cannot be empty")));
        }
    }

    let requirements = match &req.requirements {
        Some(list) => {
            Some(serde_json::to_string(list).map_err(|e| anyhow::anyhow!("requirements encode: {}", e))?)
        }
        None => None,
    };

    let changes = JobChanges {
        title: req.title,
        description: req.description,
        requirements,
        job_type: req.job_type.map(|t| t.as_str().to_string()),
        location: req.location,
        salary_min: req.salary_min,
        salary_max: req.salary_max,
        category: req.category,
        is_active: req.is_active,
    };

    let job = run_blocking(move || {
        let updated = state
            .db
            .update_job(&id.to_string(), &claims.sub.to_string(), &changes)?;
        if !updated {
            // merged with not-found so non-owners learn nothing
            return Err(ApiError::NotFound("Job not found or unauthorized".into()));
        }
        state
            .db
            .get_job(&id.to_string())?
            .ok_or_else(|| ApiError::NotFound("Job not found or unauthorized".into()))
    })
    .await?;

    Ok(Json(serde_json::json!({ "job": job_response(job) })))
}

pub async fn delete_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&claims, Role::Employer)?;

    let deleted = run_blocking(move || {
        state
            .db
            .delete_job(&id.to_string(), &claims.sub.to_string())
            .map_err(ApiError::from)
    })
    .await?;

    if !deleted {
        return Err(ApiError::NotFound("Job not found or unauthorized".into()));
    }

    Ok(Json(serde_json::json!({ "message": "Job deleted successfully" })))
}

/// The employer dashboard listing; inactive postings included.
pub async fn my_jobs(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&claims, Role::Employer)?;

    let rows = run_blocking(move || {
        state
            .db
            .jobs_by_employer(&claims.sub.to_string())
            .map_err(ApiError::from)
    })
    .await?;

    let jobs: Vec<_> = rows.into_iter().map(job_response).collect();
    Ok(Json(serde_json::json!({ "jobs": jobs })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_math_matches_the_listing_contract() {
        assert_eq!(page_params(None, None), (1, DEFAULT_PAGE_SIZE));
        assert_eq!(page_params(Some(0), Some(0)), (1, 1));
        assert_eq!(page_params(Some(3), Some(500)), (3, MAX_PAGE_SIZE));

        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
    }
}
