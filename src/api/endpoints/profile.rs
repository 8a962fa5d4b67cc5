//! Own-profile endpoints, available to every authenticated role.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{non_empty, ApiContext};
use crate::crypto::Identity;
use crate::db::repository::{self, ProfileChanges};
use crate::models::UserProfile;

/// `GET /api/profile`
pub async fn get(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<UserProfile>, ApiError> {
    let conn = ctx.core.open_db()?;
    let user = repository::get_user(&conn, identity.user_id)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(Json(UserProfile::from(&user)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    /// Empty string clears the stored number.
    pub phone: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UpdateProfileResponse {
    pub message: &'static str,
    pub updated: Vec<&'static str>,
}

/// `PUT /api/profile`: partial update; a password change needs the current one.
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<UpdateProfileResponse>, ApiError> {
    let Json(req) = payload?;

    let user = {
        let conn = ctx.core.open_db()?;
        repository::get_user(&conn, identity.user_id)?
            .ok_or_else(|| ApiError::NotFound("User not found".into()))?
    };

    let mut changes = ProfileChanges {
        full_name: non_empty(req.full_name).filter(|n| *n != user.full_name),
        email: non_empty(req.email).filter(|e| *e != user.email),
        phone: req.phone.map(|p| non_empty(Some(p))).filter(|p| *p != user.phone),
        password_hash: None,
    };

    if let Some(new_password) = req.new_password.filter(|p| !p.is_empty()) {
        let current = req
            .current_password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ApiError::BadRequest("Current password is required".into()))?;

        if !ctx
            .core
            .verify_password(current, user.password_hash.clone())
            .await?
        {
            tracing::warn!(user_id = user.id, "Password change rejected: wrong current password");
            return Err(ApiError::InvalidLogin("Current password is incorrect"));
        }
        changes.password_hash = Some(ctx.core.hash_password(new_password).await?);
    }

    if changes.is_empty() {
        return Err(ApiError::BadRequest("Nothing to update".into()));
    }

    let conn = ctx.core.open_db()?;
    if let Some(email) = &changes.email {
        if repository::email_taken(&conn, email, Some(user.id))? {
            return Err(ApiError::BadRequest("Email is already in use".into()));
        }
    }

    match repository::update_user_profile(&conn, user.id, &changes) {
        Ok(true) => {}
        Ok(false) => return Err(ApiError::NotFound("User not found".into())),
        Err(e) if e.is_unique_violation() => {
            return Err(ApiError::BadRequest("Email is already in use".into()))
        }
        Err(e) => return Err(e.into()),
    }

    let updated = changes.changed_fields();
    tracing::info!(user_id = user.id, fields = ?updated, "Profile updated");

    Ok(Json(UpdateProfileResponse {
        message: "Profile updated",
        updated,
    }))
}
