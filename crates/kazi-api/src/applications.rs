use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use kazi_types::api::{
    ApplicantSummary, ApplyRequest, Claims, EmployerApplicationsResponse, UpdateApplicationRequest,
    UpdateNoteRequest, UpdateStatusRequest,
};
use kazi_types::models::{ApplicationStatus, Role};

use crate::auth::AppState;
use crate::convert::{application_response, job_summary, parse_string_list_opt};
use crate::error::ApiError;
use crate::middleware::require_role;
use crate::run_blocking;

fn validate_content(cover_letter: &str, cv_url: &str) -> Result<(), ApiError> {
    if cover_letter.trim().is_empty() {
        return Err(ApiError::Validation("Cover letter is required".into()));
    }
    if !cv_url.starts_with("http://") && !cv_url.starts_with("https://") {
        return Err(ApiError::Validation(
            "CV URL must begin with http:// or https://".into(),
        ));
    }
    Ok(())
}

/// Apply to an active job. The (job, seeker) UNIQUE constraint decides
/// concurrent duplicate applies; the losing insert is translated into the
/// "already applied" conflict, never a 500.
pub async fn apply(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ApplyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&claims, Role::JobSeeker)?;
    validate_content(&req.cover_letter, &req.cv_url)?;

    let application_id = Uuid::new_v4();

    let row = run_blocking(move || {
        let job = state.db.get_job(&req.job_id.to_string())?;
        if !job.is_some_and(|j| j.is_active) {
            return Err(ApiError::NotFound("Job not found or inactive".into()));
        }

        state
            .db
            .insert_application(
                &application_id.to_string(),
                &req.job_id.to_string(),
                &claims.sub.to_string(),
                req.cover_letter.trim(),
                &req.cv_url,
            )
            .map_err(|e| {
                if kazi_db::is_unique_violation(&e) {
                    ApiError::Conflict("You have already applied for this job".into())
                } else {
                    ApiError::Internal(e)
                }
            })?;

        state
            .db
            .get_application(&application_id.to_string())?
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("application vanished after insert")))
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "application": application_response(row) })),
    ))
}

/// Seeker's own applications, with a joined job summary for each.
pub async fn my_applications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&claims, Role::JobSeeker)?;

    let rows = run_blocking(move || {
        state
            .db
            .applications_by_seeker(&claims.sub.to_string())
            .map_err(ApiError::from)
    })
    .await?;

    let applications: Vec<_> = rows
        .into_iter()
        .map(|row| {
            let mut resp = application_response(row.app);
            resp.job = row.job.map(job_summary);
            resp
        })
        .collect();

    Ok(Json(serde_json::json!({ "applications": applications })))
}

/// Applicants for one of the employer's own jobs. Ownership of the job is
/// checked first; a job that is missing or owned by someone else gets the
/// merged not-found answer.
pub async fn applicants_for_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&claims, Role::Employer)?;

    let (job_title, rows) = run_blocking(move || {
        let job = state
            .db
            .get_job(&job_id.to_string())?
            .filter(|j| j.employer_id == claims.sub.to_string())
            .ok_or_else(|| ApiError::NotFound("Job not found or unauthorized".into()))?;

        let rows = state.db.applications_for_job(&job_id.to_string())?;
        Ok((job.title, rows))
    })
    .await?;

    let applications: Vec<_> = rows
        .into_iter()
        .map(|row| {
            let mut resp = application_response(row.app);
            resp.applicant = Some(ApplicantSummary {
                full_name: row.full_name,
                email: row.email,
                bio: row.bio,
                skills: parse_string_list_opt(row.skills.as_deref()),
                phone: row.phone,
                location: row.location,
                cv_url: row.cv_url,
                avatar_url: row.avatar_url,
            });
            resp
        })
        .collect();

    Ok(Json(EmployerApplicationsResponse {
        applications,
        job_title,
    }))
}

/// Double-hop ownership gate for employer actions on an application
/// (application to job to employer). Fails closed: a missing application or a
/// deleted job resolves to the merged not-found, never to "proceed".
fn check_employer_owns(
    state: &AppState,
    application_id: &Uuid,
    claims: &Claims,
) -> Result<(), ApiError> {
    let owner = state.db.resolve_job_owner(&application_id.to_string())?;
    match owner {
        Some(employer_id) if employer_id == claims.sub.to_string() => Ok(()),
        _ => Err(ApiError::NotFound(
            "Application not found or unauthorized".into(),
        )),
    }
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&claims, Role::Employer)?;

    let row = run_blocking(move || {
        check_employer_owns(&state, &id, &claims)?;
        state
            .db
            .set_application_status(&id.to_string(), req.status.as_str())?;
        state
            .db
            .get_application(&id.to_string())?
            .ok_or_else(|| ApiError::NotFound("Application not found or unauthorized".into()))
    })
    .await?;

    Ok(Json(serde_json::json!({ "application": application_response(row) })))
}

pub async fn update_note(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateNoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&claims, Role::Employer)?;

    let row = run_blocking(move || {
        check_employer_owns(&state, &id, &claims)?;
        state.db.set_application_note(&id.to_string(), &req.note)?;
        state
            .db
            .get_application(&id.to_string())?
            .ok_or_else(|| ApiError::NotFound("Application not found or unauthorized".into()))
    })
    .await?;

    Ok(Json(serde_json::json!({ "application": application_response(row) })))
}

/// Employer removal of an application from their pipeline; allowed in any
/// status, still gated by the double-hop ownership check.
pub async fn employer_delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&claims, Role::Employer)?;

    run_blocking(move || {
        check_employer_owns(&state, &id, &claims)?;
        state.db.delete_application(&id.to_string())?;
        Ok(())
    })
    .await?;

    Ok(Json(serde_json::json!({ "message": "Application removed" })))
}

fn seeker_owned_pending(
    state: &AppState,
    id: &Uuid,
    claims: &Claims,
    action: &str,
) -> Result<(), ApiError> {
    let row = state
        .db
        .get_application(&id.to_string())?
        .filter(|a| a.job_seeker_id == claims.sub.to_string())
        .ok_or_else(|| ApiError::NotFound("Application not found".into()))?;

    if row.status != ApplicationStatus::Pending.as_str() {
        return Err(ApiError::Forbidden(format!(
            "Cannot {action} processed application"
        )));
    }
    Ok(())
}

/// Seeker edit of their own application; only while still pending.
pub async fn update_own(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateApplicationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&claims, Role::JobSeeker)?;
    validate_content(&req.cover_letter, &req.cv_url)?;

    let row = run_blocking(move || {
        seeker_owned_pending(&state, &id, &claims, "update")?;
        state.db.update_application_content(
            &id.to_string(),
            req.cover_letter.trim(),
            &req.cv_url,
        )?;
        state
            .db
            .get_application(&id.to_string())?
            .ok_or_else(|| ApiError::NotFound("Application not found".into()))
    })
    .await?;

    Ok(Json(serde_json::json!({ "application": application_response(row) })))
}

/// Withdraw: seeker delete of their own application, pending only.
pub async fn withdraw(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&claims, Role::JobSeeker)?;

    run_blocking(move || {
        seeker_owned_pending(&state, &id, &claims, "delete")?;
        state.db.delete_application(&id.to_string())?;
        Ok(())
    })
    .await?;

    Ok(Json(
        serde_json::json!({ "message": "Application withdrawn successfully" }),
    ))
}
