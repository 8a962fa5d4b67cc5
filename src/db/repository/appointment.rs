use chrono::{NaiveDate, NaiveTime};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::parse_enum;
use crate::db::DatabaseError;
use crate::models::*;

fn appointment_from_row(row: &Row<'_>) -> rusqlite::Result<Appointment> {
    let date: String = row.get(4)?;
    let time: String = row.get(5)?;
    Ok(Appointment {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        service_id: row.get(3)?,
        appointment_date: NaiveDate::parse_from_str(&date, DATE_FORMAT).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?,
        appointment_time: NaiveTime::parse_from_str(&time, TIME_FORMAT).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?,
        status: parse_enum(6, row.get(6)?)?,
        created_at: row.get(7)?,
    })
}

/// Insert a new `pending` appointment for the slot. Returns the new id.
///
/// A live booking already in the slot surfaces as a UNIQUE violation from
/// `idx_appointments_live_slot`.
pub fn insert_appointment(
    conn: &Connection,
    patient_id: i64,
    service_id: i64,
    slot: &Slot,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO appointments (patient_id, doctor_id, service_id, appointment_date, appointment_time, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            patient_id,
            slot.doctor_id,
            service_id,
            slot.date_key(),
            slot.time_key(),
            AppointmentStatus::Pending.as_str(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_appointment(conn: &Connection, id: i64) -> Result<Option<Appointment>, DatabaseError> {
    let appt = conn
        .query_row(
            "SELECT id, patient_id, doctor_id, service_id, appointment_date, appointment_time, status, created_at
             FROM appointments WHERE id = ?1",
            params![id],
            appointment_from_row,
        )
        .optional()?;
    Ok(appt)
}

/// Id of the appointment holding the slot, ignoring canceled rows.
pub fn find_live_in_slot(conn: &Connection, slot: &Slot) -> Result<Option<i64>, DatabaseError> {
    let id = conn
        .query_row(
            "SELECT id FROM appointments
             WHERE doctor_id = ?1 AND appointment_date = ?2 AND appointment_time = ?3
               AND status != 'canceled'
             LIMIT 1",
            params![slot.doctor_id, slot.date_key(), slot.time_key()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

/// Times already taken on a doctor's day, ascending.
pub fn booked_times(
    conn: &Connection,
    doctor_id: i64,
    date: NaiveDate,
) -> Result<Vec<String>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT appointment_time FROM appointments
         WHERE doctor_id = ?1 AND appointment_date = ?2 AND status != 'canceled'
         ORDER BY appointment_time",
    )?;
    let rows = stmt.query_map(
        params![doctor_id, date.format(DATE_FORMAT).to_string()],
        |row| row.get::<_, String>(0),
    )?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// Move an appointment from `expected` to `next`.
///
/// Returns false when the row no longer has status `expected`, so a
/// concurrent transition cannot be silently overwritten.
pub fn update_status_if(
    conn: &Connection,
    id: i64,
    expected: AppointmentStatus,
    next: AppointmentStatus,
) -> Result<bool, DatabaseError> {
    let updated = conn.execute(
        "UPDATE appointments SET status = ?1 WHERE id = ?2 AND status = ?3",
        params![next.as_str(), id, expected.as_str()],
    )?;
    Ok(updated > 0)
}

pub fn count_for_doctor(conn: &Connection, doctor_id: i64) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM appointments WHERE doctor_id = ?1",
        params![doctor_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn count_for_service(conn: &Connection, service_id: i64) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM appointments WHERE service_id = ?1",
        params![service_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

// ═══════════════════════════════════════════
// Dashboard listings
// ═══════════════════════════════════════════

const VIEW_SELECT: &str = "SELECT a.id, a.patient_id, a.doctor_id, a.service_id,
        a.appointment_date, a.appointment_time, a.status, a.created_at,
        s.name, s.price, du.full_name, pu.full_name, pu.email, pu.phone
     FROM appointments a
     JOIN services s ON a.service_id = s.id
     JOIN doctors d ON a.doctor_id = d.id
     JOIN users du ON d.user_id = du.id
     JOIN users pu ON a.patient_id = pu.id";

const VIEW_ORDER: &str = "ORDER BY a.appointment_date, a.appointment_time";

/// Which names a listing exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Audience {
    Patient,
    Doctor,
    Admin,
}

fn view_from_row(row: &Row<'_>, audience: Audience) -> rusqlite::Result<AppointmentView> {
    let doctor_name: String = row.get(10)?;
    let patient_name: String = row.get(11)?;
    let patient_email: String = row.get(12)?;
    let patient_phone: Option<String> = row.get(13)?;

    let show_doctor = audience != Audience::Doctor;
    let show_patient = audience != Audience::Patient;
    let show_contact = audience == Audience::Doctor;

    Ok(AppointmentView {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        service_id: row.get(3)?,
        appointment_date: row.get(4)?,
        appointment_time: row.get(5)?,
        status: parse_enum(6, row.get(6)?)?,
        created_at: row.get(7)?,
        service_name: row.get(8)?,
        price: row.get(9)?,
        doctor_name: show_doctor.then_some(doctor_name),
        patient_name: show_patient.then_some(patient_name),
        patient_email: show_contact.then_some(patient_email),
        patient_phone: if show_contact { patient_phone } else { None },
    })
}

fn query_views(
    conn: &Connection,
    filter: &str,
    param: Option<i64>,
    audience: Audience,
) -> Result<Vec<AppointmentView>, DatabaseError> {
    let sql = format!("{VIEW_SELECT} {filter} {VIEW_ORDER}");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(param), |row| {
        view_from_row(row, audience)
    })?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn list_for_patient(conn: &Connection, patient_id: i64) -> Result<Vec<AppointmentView>, DatabaseError> {
    query_views(conn, "WHERE a.patient_id = ?1", Some(patient_id), Audience::Patient)
}

pub fn list_for_doctor(conn: &Connection, doctor_id: i64) -> Result<Vec<AppointmentView>, DatabaseError> {
    query_views(conn, "WHERE a.doctor_id = ?1", Some(doctor_id), Audience::Doctor)
}

pub fn list_all(conn: &Connection) -> Result<Vec<AppointmentView>, DatabaseError> {
    query_views(conn, "", None, Audience::Admin)
}
