//! Appointment endpoints, grouped by the role that may call them.
//!
//! Patient:
//! - `POST /api/appointments`: book a slot
//! - `GET /api/patient/appointments`: own appointments
//! - `PUT /api/patient/appointments/:id`: cancel own appointment
//!
//! Doctor:
//! - `GET /api/doctor/appointments`: appointments assigned to the caller
//! - `PUT /api/doctor/appointments/:id`: change status
//!
//! Admin:
//! - `GET /api/admin/appointments`: everything
//! - `PUT /api/admin/appointments/:id`: change status

use std::str::FromStr;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::{parse_id, ApiContext, CreatedResponse, MessageResponse};
use crate::booking::{self, BookingRequest};
use crate::crypto::Identity;
use crate::db::repository;
use crate::models::{AppointmentStatus, AppointmentView};

// ── Patient ────────────────────────────────────────────────

/// `POST /api/appointments`
pub async fn book(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<BookingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let Json(req) = payload?;
    let booking = req.validate(identity.user_id)?;

    let mut conn = ctx.core.open_db()?;
    let id = booking::create_appointment(&mut conn, &booking)?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            id,
            message: "Appointment booked".into(),
        }),
    ))
}

/// `GET /api/patient/appointments`
pub async fn list_for_patient(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<AppointmentView>>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(repository::list_for_patient(&conn, identity.user_id)?))
}

/// `PUT /api/patient/appointments/:id`: patients can only cancel.
pub async fn cancel_for_patient(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id)?;
    let mut conn = ctx.core.open_db()?;
    booking::transition_status(&mut conn, &identity, id, AppointmentStatus::Canceled)?;
    Ok(Json(MessageResponse::new("Appointment canceled")))
}

// ── Doctor ─────────────────────────────────────────────────

/// `GET /api/doctor/appointments`
pub async fn list_for_doctor(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<AppointmentView>>, ApiError> {
    let conn = ctx.core.open_db()?;
    let doctor_id = repository::doctor_id_for_user(&conn, identity.user_id)?
        .ok_or_else(|| ApiError::NotFound("Doctor profile not found".into()))?;
    Ok(Json(repository::list_for_doctor(&conn, doctor_id)?))
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: Option<String>,
}

impl StatusRequest {
    fn target(&self) -> Result<AppointmentStatus, ApiError> {
        let raw = self
            .status
            .as_deref()
            .ok_or_else(|| ApiError::BadRequest("status is required".into()))?;
        AppointmentStatus::from_str(raw)
            .map_err(|_| ApiError::BadRequest(format!("Invalid status: {raw}")))
    }
}

/// Shared by the doctor and admin routes; ownership is decided by the
/// booking layer from the caller's role.
async fn change_status(
    ctx: ApiContext,
    identity: Identity,
    id: String,
    payload: Result<Json<StatusRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id)?;
    let Json(req) = payload?;
    let target = req.target()?;

    let mut conn = ctx.core.open_db()?;
    let appt = booking::transition_status(&mut conn, &identity, id, target)?;

    Ok(Json(MessageResponse::new(format!(
        "Appointment status changed to {}",
        appt.status
    ))))
}

/// `PUT /api/doctor/appointments/:id`
pub async fn update_for_doctor(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    payload: Result<Json<StatusRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    change_status(ctx, identity, id, payload).await
}

// ── Admin ──────────────────────────────────────────────────

/// `GET /api/admin/appointments`
pub async fn list_all(State(ctx): State<ApiContext>) -> Result<Json<Vec<AppointmentView>>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(repository::list_all(&conn)?))
}

/// `PUT /api/admin/appointments/:id`
pub async fn update_for_admin(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    payload: Result<Json<StatusRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    change_status(ctx, identity, id, payload).await
}
