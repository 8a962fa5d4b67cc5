//! Admin catalog management.
//!
//! - `GET|POST /api/admin/services`, `PUT|DELETE /api/admin/services/:id`
//! - `GET|POST /api/admin/doctors`, `PUT|DELETE /api/admin/doctors/:id`
//!
//! Records referenced by any appointment cannot be deleted.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use rusqlite::TransactionBehavior;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{non_empty, parse_id, ApiContext, CreatedResponse, MessageResponse};
use crate::db::repository;
use crate::models::{
    deserialize_flexible_int, DoctorAdminView, DoctorDetails, NewUser, Role, Service, ServiceDraft,
};

// ═══════════════════════════════════════════════════════════
// Services
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
pub struct ServiceRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    /// Minutes
    pub duration: Option<i64>,
}

impl ServiceRequest {
    fn into_draft(self) -> Result<ServiceDraft, ApiError> {
        let (Some(name), Some(price), Some(duration_minutes)) =
            (non_empty(self.name), self.price, self.duration)
        else {
            return Err(ApiError::BadRequest(
                "name, price and duration are required".into(),
            ));
        };
        if !(price.is_finite() && price > 0.0) {
            return Err(ApiError::BadRequest("price must be positive".into()));
        }
        if duration_minutes <= 0 {
            return Err(ApiError::BadRequest("duration must be positive".into()));
        }
        Ok(ServiceDraft {
            name,
            description: non_empty(self.description),
            price,
            duration_minutes,
        })
    }
}

/// `GET /api/admin/services`
pub async fn list_services(State(ctx): State<ApiContext>) -> Result<Json<Vec<Service>>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(repository::list_services(&conn)?))
}

/// `POST /api/admin/services`
pub async fn create_service(
    State(ctx): State<ApiContext>,
    payload: Result<Json<ServiceRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let Json(req) = payload?;
    let draft = req.into_draft()?;

    let conn = ctx.core.open_db()?;
    let id = repository::insert_service(&conn, &draft)?;
    tracing::info!(service_id = id, "Service created");

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            id,
            message: "Service created".into(),
        }),
    ))
}

/// `PUT /api/admin/services/:id`
pub async fn update_service(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    payload: Result<Json<ServiceRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id)?;
    let Json(req) = payload?;
    let draft = req.into_draft()?;

    let conn = ctx.core.open_db()?;
    repository::update_service(&conn, id, &draft)?;
    Ok(Json(MessageResponse::new("Service updated")))
}

/// `DELETE /api/admin/services/:id`
pub async fn delete_service(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id)?;
    let mut conn = ctx.core.open_db()?;
    // Holds the write lock from the in-use check through the delete
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    if repository::get_service(&tx, id)?.is_none() {
        return Err(ApiError::NotFound("Service not found".into()));
    }
    if repository::count_for_service(&tx, id)? > 0 {
        return Err(ApiError::BadRequest(
            "Service is used by existing appointments".into(),
        ));
    }
    repository::delete_service(&tx, id)?;
    tx.commit()?;

    tracing::info!(service_id = id, "Service deleted");
    Ok(Json(MessageResponse::new("Service deleted")))
}

// ═══════════════════════════════════════════════════════════
// Doctors
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDoctorRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub specialization: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flexible_int")]
    pub experience: Option<i64>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDoctorRequest {
    pub full_name: Option<String>,
    pub specialization: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flexible_int")]
    pub experience: Option<i64>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDoctorResponse {
    pub doctor_id: i64,
    pub user_id: i64,
    pub message: &'static str,
}

fn check_experience(years: Option<i64>) -> Result<Option<i64>, ApiError> {
    match years {
        Some(y) if y < 0 => Err(ApiError::BadRequest("experience cannot be negative".into())),
        other => Ok(other),
    }
}

/// `GET /api/admin/doctors`
pub async fn list_doctors(
    State(ctx): State<ApiContext>,
) -> Result<Json<Vec<DoctorAdminView>>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(repository::list_doctors_admin(&conn)?))
}

/// `POST /api/admin/doctors`: creates the doctor's login account too.
pub async fn create_doctor(
    State(ctx): State<ApiContext>,
    payload: Result<Json<CreateDoctorRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateDoctorResponse>), ApiError> {
    let Json(req) = payload?;

    let (Some(full_name), Some(email), Some(password), Some(specialization)) = (
        non_empty(req.full_name),
        non_empty(req.email),
        req.password.filter(|p| !p.is_empty()),
        non_empty(req.specialization),
    ) else {
        return Err(ApiError::BadRequest(
            "fullName, email, password and specialization are required".into(),
        ));
    };
    let details = DoctorDetails {
        specialization,
        experience_years: check_experience(req.experience)?,
        description: non_empty(req.description),
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
    let tx = conn.unchecked_transaction()?;
    let user_id = match repository::insert_user(
        &tx,
        &NewUser {
            email,
            password_hash,
            full_name,
            phone: None,
            role: Role::Doctor,
        },
    ) {
        Ok(id) => id,
        Err(e) if e.is_unique_violation() => {
            return Err(ApiError::BadRequest(
                "User with this email already exists".into(),
            ))
        }
        Err(e) => return Err(e.into()),
    };
    let doctor_id = repository::insert_doctor(&tx, user_id, &details)?;
    tx.commit()?;

    tracing::info!(doctor_id, user_id, "Doctor created");

    Ok((
        StatusCode::CREATED,
        Json(CreateDoctorResponse {
            doctor_id,
            user_id,
            message: "Doctor created",
        }),
    ))
}

/// `PUT /api/admin/doctors/:id`
pub async fn update_doctor(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateDoctorRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id)?;
    let Json(req) = payload?;

    let (Some(full_name), Some(specialization)) =
        (non_empty(req.full_name), non_empty(req.specialization))
    else {
        return Err(ApiError::BadRequest(
            "fullName and specialization are required".into(),
        ));
    };
    let details = DoctorDetails {
        specialization,
        experience_years: check_experience(req.experience)?,
        description: non_empty(req.description),
    };

    let conn = ctx.core.open_db()?;
    let doctor = repository::get_doctor(&conn, id)?
        .ok_or_else(|| ApiError::NotFound("Doctor not found".into()))?;

    let tx = conn.unchecked_transaction()?;
    repository::update_user_full_name(&tx, doctor.user_id, &full_name)?;
    repository::update_doctor_details(&tx, id, &details)?;
    tx.commit()?;

    Ok(Json(MessageResponse::new("Doctor updated")))
}

/// `DELETE /api/admin/doctors/:id`
///
/// Removes the doctor record and, for plain doctor accounts, the login.
/// An admin's own doctor record is removed without touching the account.
pub async fn delete_doctor(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id)?;
    let mut conn = ctx.core.open_db()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let doctor = repository::get_doctor(&tx, id)?
        .ok_or_else(|| ApiError::NotFound("Doctor not found".into()))?;
    if repository::count_for_doctor(&tx, id)? > 0 {
        return Err(ApiError::BadRequest(
            "Doctor has appointments and cannot be deleted".into(),
        ));
    }

    let owner_role = repository::get_user(&tx, doctor.user_id)?.map(|u| u.role);

    repository::delete_doctor(&tx, id)?;
    if owner_role == Some(Role::Doctor) {
        repository::delete_user(&tx, doctor.user_id)?;
    }
    tx.commit()?;

    tracing::info!(doctor_id = id, "Doctor deleted");
    Ok(Json(MessageResponse::new("Doctor deleted")))
}
