//! Black-box tests that drive the real router over in-memory SQLite.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use kazi_api::{AppStateInner, router};
use kazi_db::Database;

fn test_app() -> Router {
    let db = Database::open_in_memory().expect("in-memory db");
    let state = Arc::new(AppStateInner {
        db,
        jwt_secret: "test-secret".into(),
    });
    router(state)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(v) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn register(app: &Router, email: &str, role: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "email": email,
            "password": "hunter2",
            "fullName": "Test Person",
            "role": role,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    body["token"].as_str().unwrap().to_string()
}

async fn create_job(app: &Router, token: &str, title: &str, location: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/jobs",
        Some(token),
        Some(json!({
            "title": title,
            "description": "Build things",
            "location": location,
            "jobType": "full_time",
            "salaryMin": 50000,
            "salaryMax": 90000,
            "category": "engineering",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create job failed: {body}");
    body["job"]["id"].as_str().unwrap().to_string()
}

async fn apply(app: &Router, token: &str, job_id: &str) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/applications",
        Some(token),
        Some(json!({
            "jobId": job_id,
            "coverLetter": "Please hire me",
            "cvUrl": "https://cv.example/me.pdf",
        })),
    )
    .await
}

#[tokio::test]
async fn register_and_login() {
    let app = test_app();
    let _ = register(&app, "amina@example.com", "job_seeker").await;

    // duplicate email
    let (status, body) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "email": "amina@example.com",
            "password": "hunter2",
            "fullName": "Someone Else",
            "role": "employer",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "User already exists");

    // wrong password and unknown email look the same
    let (status, body) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "amina@example.com", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");

    let (status, _) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "nobody@example.com", "password": "hunter2" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "amina@example.com", "password": "hunter2" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();
    assert_eq!(body["user"]["role"], "job_seeker");

    let (status, body) = send(&app, "GET", "/profiles/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "amina@example.com");
    assert!(body["user"].get("password").is_none());
}

#[tokio::test]
async fn auth_is_required_for_protected_routes() {
    let app = test_app();

    let (status, _) = send(&app, "GET", "/profiles/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/profiles/me", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn job_crud_respects_ownership() {
    let app = test_app();
    let owner = register(&app, "owner@example.com", "employer").await;
    let rival = register(&app, "rival@example.com", "employer").await;
    let seeker = register(&app, "seeker@example.com", "job_seeker").await;
    let job_id = create_job(&app, &owner, "Backend Engineer", "Nairobi").await;

    // seekers cannot post jobs
    let (status, _) = send(
        &app,
        "POST",
        "/jobs",
        Some(&seeker),
        Some(json!({
            "title": "x", "description": "y", "location": "z", "jobType": "contract"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // public read needs no token
    let (status, body) = send(&app, "GET", &format!("/jobs/{job_id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["job"]["title"], "Backend Engineer");

    // non-owner update/delete is indistinguishable from a missing job
    let update = json!({ "title": "Hijacked" });
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/jobs/{job_id}"),
        Some(&rival),
        Some(update.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Job not found or unauthorized");

    let (status, _) = send(&app, "DELETE", &format!("/jobs/{job_id}"), Some(&rival), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // owner succeeds
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/jobs/{job_id}"),
        Some(&owner),
        Some(update),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["job"]["title"], "Hijacked");

    let (status, _) = send(&app, "DELETE", &format!("/jobs/{job_id}"), Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", &format!("/jobs/{job_id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn my_jobs_includes_inactive_listings() {
    let app = test_app();
    let employer = register(&app, "boss@example.com", "employer").await;
    let rival = register(&app, "rival@example.com", "employer").await;
    let seeker = register(&app, "dev@example.com", "job_seeker").await;

    let active = create_job(&app, &employer, "Engineer", "Nairobi").await;
    let paused = create_job(&app, &employer, "Designer", "Nairobi").await;
    create_job(&app, &rival, "Analyst", "Mombasa").await;

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/jobs/{paused}"),
        Some(&employer),
        Some(json!({ "isActive": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // the public listing hides the paused job
    let (_, body) = send(&app, "GET", "/jobs", None, None).await;
    assert_eq!(body["total"], 2);

    // the owner's view keeps it, and never leaks other employers' jobs
    let (status, body) = send(&app, "GET", "/jobs/employer/my-jobs", Some(&employer), None).await;
    assert_eq!(status, StatusCode::OK);
    let jobs = body["jobs"].as_array().unwrap();
    assert_eq!(jobs.len(), 2);
    let ids: Vec<&str> = jobs.iter().map(|j| j["id"].as_str().unwrap()).collect();
    assert!(ids.contains(&active.as_str()));
    assert!(ids.contains(&paused.as_str()));

    let (status, _) = send(&app, "GET", "/jobs/employer/my-jobs", Some(&seeker), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn listing_filters_and_paginates() {
    let app = test_app();
    let employer = register(&app, "emp@example.com", "employer").await;

    for i in 0..12 {
        create_job(&app, &employer, &format!("Engineer {i}"), "Nairobi, Kenya").await;
    }
    create_job(&app, &employer, "Designer", "Mombasa").await;
    let hidden = create_job(&app, &employer, "Ghost", "Nairobi CBD").await;
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/jobs/{hidden}"),
        Some(&employer),
        Some(json!({ "isActive": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "GET", "/jobs?location=nairobi&page=1&limit=10", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 12);
    assert_eq!(body["totalPages"], 2);
    assert_eq!(body["currentPage"], 1);
    assert_eq!(body["jobs"].as_array().unwrap().len(), 10);
    for job in body["jobs"].as_array().unwrap() {
        assert!(job["location"].as_str().unwrap().to_lowercase().contains("nairobi"));
        assert_eq!(job["isActive"], true);
    }

    let (_, body) = send(&app, "GET", "/jobs?location=nairobi&page=2&limit=10", None, None).await;
    assert_eq!(body["jobs"].as_array().unwrap().len(), 2);

    // deactivated job never appears, filters or not
    let (_, body) = send(&app, "GET", "/jobs", None, None).await;
    assert_eq!(body["total"], 13);
    assert!(
        body["jobs"]
            .as_array()
            .unwrap()
            .iter()
            .all(|j| j["title"] != "Ghost")
    );

    // jobType is an exact match
    let (_, body) = send(&app, "GET", "/jobs?jobType=internship", None, None).await;
    assert_eq!(body["total"], 0);

    let (status, _) = send(&app, "GET", "/jobs?jobType=freelance", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn application_lifecycle_state_machine() {
    let app = test_app();
    let employer = register(&app, "boss@example.com", "employer").await;
    let rival = register(&app, "other@example.com", "employer").await;
    let seeker = register(&app, "dev@example.com", "job_seeker").await;
    let job_id = create_job(&app, &employer, "Rust Engineer", "Remote").await;

    // apply -> 201 pending
    let (status, body) = apply(&app, &seeker, &job_id).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["application"]["status"], "pending");
    let app_id = body["application"]["id"].as_str().unwrap().to_string();

    // duplicate apply -> 400 conflict, no new record
    let (status, body) = apply(&app, &seeker, &job_id).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "You have already applied for this job");

    let (_, body) = send(&app, "GET", "/applications/my-applications", Some(&seeker), None).await;
    assert_eq!(body["applications"].as_array().unwrap().len(), 1);
    assert_eq!(body["applications"][0]["job"]["title"], "Rust Engineer");

    // seeker may edit while pending
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/applications/{app_id}"),
        Some(&seeker),
        Some(json!({ "coverLetter": "Updated letter", "cvUrl": "https://cv.example/v2.pdf" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // a different employer cannot touch the status
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/applications/{app_id}/status"),
        Some(&rival),
        Some(json!({ "status": "accepted" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // neither can the applicant (wrong role)
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/applications/{app_id}/status"),
        Some(&seeker),
        Some(json!({ "status": "accepted" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // owning employer accepts
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/applications/{app_id}/status"),
        Some(&employer),
        Some(json!({ "status": "accepted" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["application"]["status"], "accepted");

    // processed applications are frozen for the seeker
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/applications/{app_id}"),
        Some(&seeker),
        Some(json!({ "coverLetter": "Too late", "cvUrl": "https://cv.example/v3.pdf" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Cannot update processed application");

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/applications/{app_id}"),
        Some(&seeker),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // employer notes work in any status
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/applications/{app_id}/note"),
        Some(&employer),
        Some(json!({ "note": "Strong candidate" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["application"]["employerNotes"], "Strong candidate");

    // employer sees the applicant list with profile data
    let (status, body) = send(
        &app,
        "GET",
        &format!("/applications/employer/{job_id}"),
        Some(&employer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["jobTitle"], "Rust Engineer");
    assert_eq!(body["applications"][0]["applicant"]["email"], "dev@example.com");

    // and may delete regardless of status
    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/applications/employer/{app_id}"),
        Some(&employer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn withdraw_only_while_pending() {
    let app = test_app();
    let employer = register(&app, "boss@example.com", "employer").await;
    let seeker = register(&app, "dev@example.com", "job_seeker").await;
    let job_id = create_job(&app, &employer, "Engineer", "Remote").await;

    let (_, body) = apply(&app, &seeker, &job_id).await;
    let app_id = body["application"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        "DELETE",
        &format!("/applications/{app_id}"),
        Some(&seeker),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    // withdrawn: the seeker can apply again
    let (status, _) = apply(&app, &seeker, &job_id).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn apply_rejected_for_inactive_or_missing_job() {
    let app = test_app();
    let employer = register(&app, "boss@example.com", "employer").await;
    let seeker = register(&app, "dev@example.com", "job_seeker").await;
    let job_id = create_job(&app, &employer, "Engineer", "Remote").await;

    send(
        &app,
        "PUT",
        &format!("/jobs/{job_id}"),
        Some(&employer),
        Some(json!({ "isActive": false })),
    )
    .await;

    let (status, body) = apply(&app, &seeker, &job_id).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Job not found or inactive");

    let (status, _) = apply(&app, &seeker, &uuid::Uuid::new_v4().to_string()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn employer_actions_fail_closed_after_job_deleted() {
    let app = test_app();
    let employer = register(&app, "boss@example.com", "employer").await;
    let seeker = register(&app, "dev@example.com", "job_seeker").await;
    let job_id = create_job(&app, &employer, "Engineer", "Remote").await;

    let (_, body) = apply(&app, &seeker, &job_id).await;
    let app_id = body["application"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(&app, "DELETE", &format!("/jobs/{job_id}"), Some(&employer), None).await;
    assert_eq!(status, StatusCode::OK);

    // the job is gone, so the owner resolution must deny, not 500 and not allow
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/applications/{app_id}/status"),
        Some(&employer),
        Some(json!({ "status": "accepted" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Application not found or unauthorized");
}

#[tokio::test]
async fn saved_jobs_roundtrip() {
    let app = test_app();
    let employer = register(&app, "boss@example.com", "employer").await;
    let seeker = register(&app, "dev@example.com", "job_seeker").await;
    let job_id = create_job(&app, &employer, "Engineer", "Nairobi").await;

    let (status, body) = send(
        &app,
        "POST",
        "/saved-jobs",
        Some(&seeker),
        Some(json!({ "jobId": job_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    // the 201 echoes the stored row, joined job included
    assert_eq!(body["savedJob"]["jobId"], job_id);
    assert_eq!(body["savedJob"]["job"]["title"], "Engineer");

    let (status, body) = send(
        &app,
        "POST",
        "/saved-jobs",
        Some(&seeker),
        Some(json!({ "jobId": job_id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Job already saved");

    let (_, body) = send(&app, "GET", &format!("/saved-jobs/check/{job_id}"), Some(&seeker), None).await;
    assert_eq!(body["isSaved"], true);

    let (_, body) = send(&app, "GET", "/saved-jobs", Some(&seeker), None).await;
    let saved = body["savedJobs"].as_array().unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0]["job"]["title"], "Engineer");

    let (status, _) = send(&app, "DELETE", &format!("/saved-jobs/{job_id}"), Some(&seeker), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, "GET", &format!("/saved-jobs/check/{job_id}"), Some(&seeker), None).await;
    assert_eq!(body["isSaved"], false);

    let (status, _) = send(&app, "DELETE", &format!("/saved-jobs/{job_id}"), Some(&seeker), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn profile_update_is_allow_listed() {
    let app = test_app();
    let employer = register(&app, "boss@example.com", "employer").await;

    let (status, body) = send(
        &app,
        "PUT",
        "/profiles/me",
        Some(&employer),
        Some(json!({
            "companyName": "Kazi Ltd",
            "industry": "Software",
            // seeker-only field, silently ignored for employers
            "bio": "should not stick",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["user"]["companyName"], "Kazi Ltd");
    assert!(body["user"].get("bio").is_none());

    // email/role are not part of the request shape at all
    let (status, _) = send(
        &app,
        "PUT",
        "/profiles/me",
        Some(&employer),
        Some(json!({ "email": "new@example.com" })),
    )
    .await;
    assert!(status.is_client_error());

    // public view hides the email
    let (_, me) = send(&app, "GET", "/profiles/me", Some(&employer), None).await;
    let id = me["user"]["id"].as_str().unwrap();
    let (status, body) = send(&app, "GET", &format!("/profiles/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["user"].get("email").is_none());
    assert_eq!(body["user"]["companyName"], "Kazi Ltd");
}

#[tokio::test]
async fn public_directories_paginate() {
    let app = test_app();
    register(&app, "emp@example.com", "employer").await;
    let seeker = register(&app, "dev@example.com", "job_seeker").await;
    send(
        &app,
        "PUT",
        "/profiles/me",
        Some(&seeker),
        Some(json!({ "skills": ["rust", "sql"], "location": "Dodoma" })),
    )
    .await;

    let (status, body) = send(
        &app,
        "GET",
        "/profiles/job-seekers/search?skills=rust,go&location=dodoma",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert!(body["users"][0].get("email").is_none());

    let (status, body) = send(&app, "GET", "/profiles/employers/search", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
}
