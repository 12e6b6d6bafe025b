use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use kazi_db::{Database, queries::NewUser};
use kazi_types::api::{AuthResponse, Claims, LoginRequest, RegisterRequest};
use kazi_types::models::Role;

use crate::convert::user_response;
use crate::error::ApiError;
use crate::run_blocking;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Validate input
    if !req.email.contains('@') {
        return Err(ApiError::Validation("A valid email is required".into()));
    }
    if req.password.len() < 6 {
        return Err(ApiError::Validation(
            "Password must be at least 6 characters".into(),
        ));
    }
    if req.full_name.trim().is_empty() {
        return Err(ApiError::Validation("Full name is required".into()));
    }
    // Admin accounts are provisioned out-of-band, never self-registered
    if req.role == Role::Admin {
        return Err(ApiError::Validation("Invalid role".into()));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Password hashing failed: {}", e))?
        .to_string();

    let user_id = Uuid::new_v4();
    let role = req.role;
    let state2 = state.clone();

    let user = run_blocking(move || {
        if state2.db.get_user_by_email(&req.email)?.is_some() {
            return Err(ApiError::Conflict("User already exists".into()));
        }

        state2
            .db
            .create_user(&NewUser {
                id: &user_id.to_string(),
                email: &req.email,
                password_hash: &password_hash,
                full_name: req.full_name.trim(),
                role: req.role.as_str(),
            })
            .map_err(|e| {
                // lost a concurrent registration race on the same email
                if kazi_db::is_unique_violation(&e) {
                    ApiError::Conflict("User already exists".into())
                } else {
                    ApiError::Internal(e)
                }
            })?;

        state2
            .db
            .get_user_by_id(&user_id.to_string())?
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("user vanished after insert")))
    })
    .await?;

    let token = create_token(&state.jwt_secret, user_id, role)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user_response(user, true),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let state2 = state.clone();
    let email = req.email.clone();

    // One message for unknown email and wrong password alike
    let invalid = || ApiError::Unauthorized("Invalid credentials".into());

    let user = run_blocking(move || {
        state2
            .db
            .get_user_by_email(&email)
            .map_err(ApiError::Internal)
    })
    .await?
    .ok_or_else(invalid)?;

    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| anyhow::anyhow!("Corrupt password hash for {}: {}", user.id, e))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| invalid())?;

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| anyhow::anyhow!("Corrupt user id '{}': {}", user.id, e))?;
    let role: Role = user
        .role
        .parse()
        .map_err(|e| anyhow::anyhow!("Corrupt role on user '{}': {}", user.id, e))?;

    let token = create_token(&state.jwt_secret, user_id, role)?;

    Ok(Json(AuthResponse {
        token,
        user: user_response(user, true),
    }))
}

fn create_token(secret: &str, user_id: Uuid, role: Role) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        role,
        exp: (chrono::Utc::now() + chrono::Duration::days(7)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
