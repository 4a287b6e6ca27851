use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::auth::jwt::{encode_token, Claims};
use crate::auth::password;
use crate::auth::role::Role;
use crate::db;
use crate::error::AppError;
use crate::models::User;
use crate::state::SharedState;

const ACCESS_TOKEN_HOURS: i64 = 24;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: Role,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub user: User,
}

fn auth_cookie(access_token: &str) -> CookieJar {
    let access = Cookie::build(("access_token", access_token.to_string()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .build();
    CookieJar::new().add(access)
}

fn issue(state: &SharedState, user: User) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let claims = Claims::new(user.id, user.role, Duration::hours(ACCESS_TOKEN_HOURS));
    let access_token =
        encode_token(&claims, &state.config.jwt_secret).map_err(AppError::Internal)?;
    Ok((auth_cookie(&access_token), Json(AuthResponse { access_token, user })))
}

pub async fn register(
    State(state): State<SharedState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), AppError> {
    let email = req.email.trim().to_lowercase();
    let name = req.name.trim();
    if email.is_empty() || req.password.is_empty() || name.is_empty() {
        return Err(AppError::Validation("All fields are required".to_string()));
    }
    if !email.contains('@') {
        return Err(AppError::Validation("Invalid email address".to_string()));
    }
    password::validate(&req.password)?;

    let pw_hash = password::hash(&req.password).map_err(AppError::Internal)?;

    // Advisory lock serializes the admin bootstrap check.
    let mut tx = state.pool.begin().await?;
    sqlx::query("SELECT pg_advisory_xact_lock(1)")
        .execute(&mut *tx)
        .await?;

    if req.role == Role::Admin && db::users::count_all(&mut *tx).await? > 0 {
        return Err(AppError::Forbidden(
            "Admin accounts can only be created on first start".to_string(),
        ));
    }

    let user = db::users::create(&mut *tx, &email, &pw_hash, name, req.role)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Email is already registered"))?;

    tx.commit().await?;

    tracing::info!("Registered {} user {}", user.role.as_str(), user.id);

    if let Some(mailer) = state.system_mailer.clone() {
        let (to, name, base_url) = (user.email.clone(), user.name.clone(), state.config.base_url.clone());
        tokio::spawn(async move {
            if let Err(e) = mailer.send_welcome(&to, &name, &base_url).await {
                tracing::warn!("Failed to send welcome email: {e}");
            }
        });
    }

    let (jar, body) = issue(&state, user)?;
    Ok((StatusCode::CREATED, jar, body))
}

pub async fn login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let email = req.email.trim().to_lowercase();

    if state.login_limiter.check(&email).is_err() {
        return Err(AppError::RateLimited(
            "Too many login attempts. Please try again later.".to_string(),
        ));
    }

    let user = match db::users::find_by_email(&state.pool, &email).await? {
        Some(user) => user,
        None => {
            state.login_limiter.record_failure(&email);
            return Err(AppError::Unauthorized("Invalid credentials".to_string()));
        }
    };

    let valid = password::verify(&req.password, &user.password_hash).map_err(AppError::Internal)?;
    if !valid {
        state.login_limiter.record_failure(&email);
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    issue(&state, user)
}
