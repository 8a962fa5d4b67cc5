use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_doctor(
    conn: &Connection,
    user_id: i64,
    details: &DoctorDetails,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO doctors (user_id, specialization, experience_years, description)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            user_id,
            details.specialization,
            details.experience_years,
            details.description,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_doctor(conn: &Connection, id: i64) -> Result<Option<Doctor>, DatabaseError> {
    let doctor = conn
        .query_row(
            "SELECT id, user_id, specialization, experience_years, description, photo_url
             FROM doctors WHERE id = ?1",
            params![id],
            |row| {
                Ok(Doctor {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    specialization: row.get(2)?,
                    experience_years: row.get(3)?,
                    description: row.get(4)?,
                    photo_url: row.get(5)?,
                })
            },
        )
        .optional()?;
    Ok(doctor)
}

/// Resolve the doctor record owned by a user account.
pub fn doctor_id_for_user(conn: &Connection, user_id: i64) -> Result<Option<i64>, DatabaseError> {
    let id = conn
        .query_row(
            "SELECT id FROM doctors WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

pub fn list_doctor_cards(conn: &Connection) -> Result<Vec<DoctorCard>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT d.id, u.full_name, d.specialization, d.experience_years, d.description, d.photo_url
         FROM doctors d
         JOIN users u ON d.user_id = u.id
         ORDER BY d.id",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(DoctorCard {
            id: row.get(0)?,
            full_name: row.get(1)?,
            specialization: row.get(2)?,
            experience_years: row.get(3)?,
            description: row.get(4)?,
            photo_url: row.get(5)?,
        })
    })?;

    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn list_doctors_admin(conn: &Connection) -> Result<Vec<DoctorAdminView>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT d.id, d.user_id, u.full_name, u.email, d.specialization,
                d.experience_years, d.description, d.photo_url
         FROM doctors d
         JOIN users u ON d.user_id = u.id
         ORDER BY d.id",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(DoctorAdminView {
            id: row.get(0)?,
            user_id: row.get(1)?,
            full_name: row.get(2)?,
            email: row.get(3)?,
            specialization: row.get(4)?,
            experience_years: row.get(5)?,
            description: row.get(6)?,
            photo_url: row.get(7)?,
        })
    })?;

    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn update_doctor_details(
    conn: &Connection,
    id: i64,
    details: &DoctorDetails,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE doctors SET specialization = ?1, experience_years = ?2, description = ?3
         WHERE id = ?4",
        params![
            details.specialization,
            details.experience_years,
            details.description,
            id,
        ],
    )?;
    if updated == 0 {
        return Err(DatabaseError::not_found("doctor", id));
    }
    Ok(())
}

pub fn delete_doctor(conn: &Connection, id: i64) -> Result<(), DatabaseError> {
    conn.execute("DELETE FROM doctors WHERE id = ?1", params![id])?;
    Ok(())
}
