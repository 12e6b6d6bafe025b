pub mod applications;
pub mod auth;
mod convert;
pub mod error;
pub mod jobs;
pub mod middleware;
pub mod profiles;
pub mod saved_jobs;

use axum::{
    Json, Router,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
};

pub use auth::{AppState, AppStateInner};
use error::ApiError;

/// Full route table. The binary serves it; the integration tests drive it
/// directly with `tower::ServiceExt::oneshot`.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/jobs", get(jobs::list_jobs))
        .route("/jobs/{id}", get(jobs::get_job))
        .route("/profiles/job-seekers/search", get(profiles::search_job_seekers))
        .route("/profiles/employers/search", get(profiles::search_employers))
        .route("/profiles/{id}", get(profiles::public_profile))
        .with_state(state.clone());

    let protected = Router::new()
        .route("/profiles/me", get(profiles::me).put(profiles::update_me))
        .route("/jobs", post(jobs::create_job))
        .route("/jobs/{id}", put(jobs::update_job).delete(jobs::delete_job))
        .route("/jobs/employer/my-jobs", get(jobs::my_jobs))
        .route("/applications", post(applications::apply))
        .route("/applications/my-applications", get(applications::my_applications))
        .route(
            "/applications/employer/{id}",
            get(applications::applicants_for_job).delete(applications::employer_delete),
        )
        .route("/applications/{id}/status", put(applications::update_status))
        .route("/applications/{id}/note", put(applications::update_note))
        .route(
            "/applications/{id}",
            put(applications::update_own).delete(applications::withdraw),
        )
        .route("/saved-jobs", post(saved_jobs::save_job).get(saved_jobs::list_saved))
        .route("/saved-jobs/check/{job_id}", get(saved_jobs::check_saved))
        .route("/saved-jobs/{job_id}", delete(saved_jobs::unsave_job))
        .layer(from_fn_with_state(state.clone(), middleware::require_auth))
        .with_state(state);

    public.merge(protected)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Run blocking SQLite work off the async runtime.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        tracing::error!("spawn_blocking join error: {}", e);
        ApiError::Internal(anyhow::anyhow!("background task failed"))
    })?
}
