use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use kazi_types::api::{Claims, SaveJobRequest, SavedJobResponse};
use kazi_types::models::Role;

use crate::auth::AppState;
use crate::convert::{job_summary, parse_ts, parse_uuid};
use crate::error::ApiError;
use crate::middleware::require_role;
use crate::run_blocking;

/// Bookmark an active job. One bookmark per (seeker, job), backed by the
/// store constraint.
pub async fn save_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SaveJobRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&claims, Role::JobSeeker)?;

    let saved_id = Uuid::new_v4();
    let job_id = req.job_id;

    let row = run_blocking(move || {
        let job = state.db.get_job(&job_id.to_string())?;
        if !job.is_some_and(|j| j.is_active) {
            return Err(ApiError::NotFound("Job not found or inactive".into()));
        }

        state
            .db
            .insert_saved_job(
                &saved_id.to_string(),
                &claims.sub.to_string(),
                &job_id.to_string(),
            )
            .map_err(|e| {
                if kazi_db::is_unique_violation(&e) {
                    ApiError::Conflict("Job already saved".into())
                } else {
                    ApiError::Internal(e)
                }
            })?;

        state
            .db
            .get_saved_job(&saved_id.to_string())?
            .ok_or_else(|| ApiError::NotFound("Saved job not found".into()))
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "savedJob": SavedJobResponse {
                id: parse_uuid(&row.id, "saved job"),
                job_id: parse_uuid(&row.job_id, "job"),
                job: row.job.map(job_summary),
                created_at: parse_ts(&row.created_at),
            }
        })),
    ))
}

pub async fn list_saved(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&claims, Role::JobSeeker)?;

    let rows = run_blocking(move || {
        state
            .db
            .saved_jobs_by_seeker(&claims.sub.to_string())
            .map_err(ApiError::from)
    })
    .await?;

    let saved: Vec<SavedJobResponse> = rows
        .into_iter()
        .map(|row| SavedJobResponse {
            id: parse_uuid(&row.id, "saved job"),
            job_id: parse_uuid(&row.job_id, "job"),
            job: row.job.map(job_summary),
            created_at: parse_ts(&row.created_at),
        })
        .collect();

    Ok(Json(serde_json::json!({ "savedJobs": saved })))
}

/// Existence check used by the frontend to render bookmark state.
pub async fn check_saved(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&claims, Role::JobSeeker)?;

    let is_saved = run_blocking(move || {
        state
            .db
            .is_job_saved(&claims.sub.to_string(), &job_id.to_string())
            .map_err(ApiError::from)
    })
    .await?;

    Ok(Json(serde_json::json!({ "isSaved": is_saved })))
}

pub async fn unsave_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&claims, Role::JobSeeker)?;

    let deleted = run_blocking(move || {
        state
            .db
            .delete_saved_job(&claims.sub.to_string(), &job_id.to_string())
            .map_err(ApiError::from)
    })
    .await?;

    if !deleted {
        return Err(ApiError::NotFound("Saved job not found".into()));
    }

    Ok(Json(
        serde_json::json!({ "message": "Job removed from saved jobs" }),
    ))
}
