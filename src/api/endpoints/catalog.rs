//! Public catalog endpoints (no credential required).
//!
//! - `GET /api/services`
//! - `GET /api/doctors`
//! - `GET /api/doctors/:id/booked-times?date=YYYY-MM-DD`

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{parse_id, ApiContext};
use crate::booking;
use crate::db::repository;
use crate::models::{DoctorCard, Service, DATE_FORMAT};

/// `GET /api/services`
pub async fn services(State(ctx): State<ApiContext>) -> Result<Json<Vec<Service>>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(repository::list_services(&conn)?))
}

/// `GET /api/doctors`
pub async fn doctors(State(ctx): State<ApiContext>) -> Result<Json<Vec<DoctorCard>>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(repository::list_doctor_cards(&conn)?))
}

#[derive(Debug, Deserialize)]
pub struct BookedTimesQuery {
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookedTimesResponse {
    pub doctor_id: i64,
    pub date: String,
    pub booked_times: Vec<String>,
}

/// `GET /api/doctors/:id/booked-times`: taken "HH:MM" slots on one day.
pub async fn booked_times(
    State(ctx): State<ApiContext>,
    Path(doctor_id): Path<String>,
    Query(query): Query<BookedTimesQuery>,
) -> Result<Json<BookedTimesResponse>, ApiError> {
    let doctor_id = parse_id(&doctor_id)?;
    let raw = query
        .date
        .ok_or_else(|| ApiError::BadRequest("date query parameter is required".into()))?;
    let date = booking::parse_date(&raw)?;

    let conn = ctx.core.open_db()?;
    let booked_times = booking::booked_times(&conn, doctor_id, date)?;

    Ok(Json(BookedTimesResponse {
        doctor_id,
        date: date.format(DATE_FORMAT).to_string(),
        booked_times,
    }))
}
