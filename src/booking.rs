//! Appointment booking and lifecycle.
//!
//! Invariant: at most one non-canceled appointment per (doctor, date, time).
//! Two layers uphold it:
//! 1. Booking runs in a `BEGIN IMMEDIATE` transaction, so the slot lookup
//!    and the insert see the same snapshot and writers queue on the lock.
//! 2. `idx_appointments_live_slot` (partial UNIQUE, excludes canceled rows)
//!    rejects any insert that slips past the lookup; that violation is
//!    reported as `SlotConflict` like the lookup hit.
//!
//! Status changes follow `AppointmentStatus::can_transition_to` for every
//! caller; role only narrows which targets may be requested.

use chrono::{NaiveDate, NaiveTime};
use rusqlite::{Connection, TransactionBehavior};
use serde::Deserialize;

use crate::authorization::may_request_status;
use crate::crypto::Identity;
use crate::db::repository;
use crate::db::DatabaseError;
use crate::models::{
    deserialize_flexible_int, Appointment, AppointmentStatus, Role, Slot, DATE_FORMAT, TIME_FORMAT,
};

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("This time is already taken")]
    SlotConflict,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Cannot change status from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },
    #[error("Role {role} may not set status {target}")]
    Forbidden {
        role: Role,
        target: AppointmentStatus,
    },
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<rusqlite::Error> for BookingError {
    fn from(err: rusqlite::Error) -> Self {
        BookingError::Database(err.into())
    }
}

/// Booking body as sent by the client. Every field is required but kept
/// optional here so a missing one is reported as `InvalidRequest` rather
/// than a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    #[serde(default, deserialize_with = "deserialize_flexible_int")]
    pub doctor_id: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_flexible_int")]
    pub service_id: Option<i64>,
    pub appointment_date: Option<String>,
    pub appointment_time: Option<String>,
}

/// A booking request that passed field validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidBooking {
    pub patient_id: i64,
    pub service_id: i64,
    pub slot: Slot,
}

impl BookingRequest {
    pub fn validate(&self, patient_id: i64) -> Result<ValidBooking, BookingError> {
        let (Some(doctor_id), Some(service_id), Some(date), Some(time)) = (
            self.doctor_id,
            self.service_id,
            self.appointment_date.as_deref(),
            self.appointment_time.as_deref(),
        ) else {
            return Err(BookingError::InvalidRequest(
                "doctorId, serviceId, appointmentDate and appointmentTime are required".into(),
            ));
        };

        Ok(ValidBooking {
            patient_id,
            service_id,
            slot: Slot {
                doctor_id,
                date: parse_date(date)?,
                time: parse_time(time)?,
            },
        })
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, BookingError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| BookingError::InvalidRequest(format!("Invalid date '{raw}', expected YYYY-MM-DD")))
}

pub fn parse_time(raw: &str) -> Result<NaiveTime, BookingError> {
    NaiveTime::parse_from_str(raw.trim(), TIME_FORMAT)
        .map_err(|_| BookingError::InvalidRequest(format!("Invalid time '{raw}', expected HH:MM")))
}

// ═══════════════════════════════════════════════════════════
// Slot checks
// ═══════════════════════════════════════════════════════════

/// True when no live appointment occupies the slot.
pub fn check_slot_available(conn: &Connection, slot: &Slot) -> Result<bool, BookingError> {
    Ok(repository::find_live_in_slot(conn, slot)?.is_none())
}

/// Taken times on a doctor's day. Unknown doctor is `NotFound`.
pub fn booked_times(
    conn: &Connection,
    doctor_id: i64,
    date: NaiveDate,
) -> Result<Vec<String>, BookingError> {
    if repository::get_doctor(conn, doctor_id)?.is_none() {
        return Err(BookingError::NotFound("Doctor"));
    }
    Ok(repository::booked_times(conn, doctor_id, date)?)
}

// ═══════════════════════════════════════════════════════════
// Booking
// ═══════════════════════════════════════════════════════════

/// Book the slot for the patient. Returns the new appointment id.
pub fn create_appointment(conn: &mut Connection, booking: &ValidBooking) -> Result<i64, BookingError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    if repository::get_doctor(&tx, booking.slot.doctor_id)?.is_none() {
        return Err(BookingError::NotFound("Doctor"));
    }
    if repository::get_service(&tx, booking.service_id)?.is_none() {
        return Err(BookingError::NotFound("Service"));
    }

    if !check_slot_available(&tx, &booking.slot)? {
        tracing::warn!(
            doctor_id = booking.slot.doctor_id,
            date = %booking.slot.date_key(),
            time = %booking.slot.time_key(),
            "Slot already taken"
        );
        return Err(BookingError::SlotConflict);
    }

    let id = match repository::insert_appointment(
        &tx,
        booking.patient_id,
        booking.service_id,
        &booking.slot,
    ) {
        Ok(id) => id,
        Err(e) if e.is_unique_violation() => return Err(BookingError::SlotConflict),
        Err(e) => return Err(e.into()),
    };

    tx.commit()?;

    tracing::info!(
        appointment_id = id,
        patient_id = booking.patient_id,
        doctor_id = booking.slot.doctor_id,
        "Appointment booked"
    );
    Ok(id)
}

// ═══════════════════════════════════════════════════════════
// Lifecycle
// ═══════════════════════════════════════════════════════════

/// Move an appointment to `target` on behalf of `actor`.
///
/// Appointments the actor cannot see (another patient's, another
/// doctor's) are reported as `NotFound`, the same as missing ones.
pub fn transition_status(
    conn: &mut Connection,
    actor: &Identity,
    appointment_id: i64,
    target: AppointmentStatus,
) -> Result<Appointment, BookingError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let mut appt = repository::get_appointment(&tx, appointment_id)?
        .ok_or(BookingError::NotFound("Appointment"))?;

    let visible = match actor.role {
        Role::Patient => appt.patient_id == actor.user_id,
        Role::Doctor => {
            let doctor_id = repository::doctor_id_for_user(&tx, actor.user_id)?
                .ok_or(BookingError::NotFound("Doctor profile"))?;
            appt.doctor_id == doctor_id
        }
        Role::Admin => true,
    };
    if !visible {
        return Err(BookingError::NotFound("Appointment"));
    }

    if !appt.status.can_transition_to(target) {
        return Err(BookingError::InvalidTransition {
            from: appt.status,
            to: target,
        });
    }
    if !may_request_status(actor.role, target) {
        return Err(BookingError::Forbidden {
            role: actor.role,
            target,
        });
    }

    if !repository::update_status_if(&tx, appointment_id, appt.status, target)? {
        return Err(BookingError::InvalidTransition {
            from: appt.status,
            to: target,
        });
    }
    tx.commit()?;

    tracing::info!(
        appointment_id,
        from = %appt.status,
        to = %target,
        actor = actor.user_id,
        role = %actor.role,
        "Appointment status changed"
    );
    appt.status = target;
    Ok(appt)
}
