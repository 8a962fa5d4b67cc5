use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::*;

fn service_from_row(row: &Row<'_>) -> rusqlite::Result<Service> {
    Ok(Service {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        price: row.get(3)?,
        duration_minutes: row.get(4)?,
    })
}

pub fn insert_service(conn: &Connection, draft: &ServiceDraft) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO services (name, description, price, duration_minutes)
         VALUES (?1, ?2, ?3, ?4)",
        params![draft.name, draft.description, draft.price, draft.duration_minutes],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_service(conn: &Connection, id: i64) -> Result<Option<Service>, DatabaseError> {
    let service = conn
        .query_row(
            "SELECT id, name, description, price, duration_minutes FROM services WHERE id = ?1",
            params![id],
            service_from_row,
        )
        .optional()?;
    Ok(service)
}

pub fn list_services(conn: &Connection) -> Result<Vec<Service>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, description, price, duration_minutes FROM services ORDER BY id",
    )?;
    let rows = stmt.query_map([], service_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn count_services(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM services", [], |row| row.get(0))?;
    Ok(count)
}

pub fn update_service(conn: &Connection, id: i64, draft: &ServiceDraft) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE services SET name = ?1, description = ?2, price = ?3, duration_minutes = ?4
         WHERE id = ?5",
        params![draft.name, draft.description, draft.price, draft.duration_minutes, id],
    )?;
    if updated == 0 {
        return Err(DatabaseError::not_found("service", id));
    }
    Ok(())
}

/// Delete a service. Returns false when no row matched.
pub fn delete_service(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    let deleted = conn.execute("DELETE FROM services WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}
