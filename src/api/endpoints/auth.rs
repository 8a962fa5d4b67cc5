//! Account endpoints.
//!
//! - `POST /api/register`: create a patient account, return a credential
//! - `POST /api/login`: exchange email + password for a credential

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{non_empty, ApiContext};
use crate::db::repository;
use crate::models::{NewUser, Role};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub message: &'static str,
    pub token: String,
    pub user_id: i64,
    pub role: Role,
}

/// `POST /api/register`: self-registration always creates a patient.
pub async fn register(
    State(ctx): State<ApiContext>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let Json(req) = payload?;

    // Passwords are taken verbatim; only identifying fields are trimmed
    let (Some(email), Some(password), Some(full_name)) = (
        non_empty(req.email),
        req.password.filter(|p| !p.is_empty()),
        non_empty(req.full_name),
    ) else {
        return Err(ApiError::BadRequest(
            "email, password and fullName are required".into(),
        ));
    };

    {
        let conn = ctx.core.open_db()?;
        if repository::email_taken(&conn, &email, None)? {
            return Err(ApiError::BadRequest(
                "User with this email already exists".into(),
            ));
        }
    }

    let password_hash = ctx.core.hash_password(password).await?;

    let conn = ctx.core.open_db()?;
    let user_id = match repository::insert_user(
        &conn,
        &NewUser {
            email,
            password_hash,
            full_name,
            phone: non_empty(req.phone),
            role: Role::Patient,
        },
    ) {
        Ok(id) => id,
        // Lost a race with a concurrent registration of the same email
        Err(e) if e.is_unique_violation() => {
            return Err(ApiError::BadRequest(
                "User with this email already exists".into(),
            ))
        }
        Err(e) => return Err(e.into()),
    };

    let user = repository::get_user(&conn, user_id)?
        .ok_or_else(|| ApiError::Internal("registered user vanished".into()))?;
    let token = ctx.core.issue_token(&user)?;

    tracing::info!(user_id, "Patient registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "Registration successful",
            token,
            user_id,
            role: Role::Patient,
        }),
    ))
}

/// `POST /api/login`
pub async fn login(
    State(ctx): State<ApiContext>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(req) = payload?;

    let (Some(email), Some(password)) = (
        non_empty(req.email),
        req.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::BadRequest("email and password are required".into()));
    };

    let user = {
        let conn = ctx.core.open_db()?;
        repository::find_user_by_email(&conn, &email)?
    };

    let Some(user) = user else {
        tracing::warn!("Login failed: unknown email");
        return Err(ApiError::InvalidLogin("Invalid email or password"));
    };

    if !ctx
        .core
        .verify_password(password, user.password_hash.clone())
        .await?
    {
        tracing::warn!(user_id = user.id, "Login failed: wrong password");
        return Err(ApiError::InvalidLogin("Invalid email or password"));
    }

    let token = ctx.core.issue_token(&user)?;
    tracing::info!(user_id = user.id, role = %user.role, "Login");

    Ok(Json(AuthResponse {
        message: "Login successful",
        token,
        user_id: user.id,
        role: user.role,
    }))
}
