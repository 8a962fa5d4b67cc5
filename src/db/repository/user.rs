use rusqlite::{params, Connection, OptionalExtension, Row};

use super::parse_enum;
use crate::db::DatabaseError;
use crate::models::*;

const USER_COLUMNS: &str = "id, email, password_hash, full_name, phone, role, created_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        full_name: row.get(3)?,
        phone: row.get(4)?,
        role: parse_enum(5, row.get(5)?)?,
        created_at: row.get(6)?,
    })
}

/// Insert a user and return its id. A taken email surfaces as a UNIQUE violation.
pub fn insert_user(conn: &Connection, user: &NewUser) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO users (email, password_hash, full_name, phone, role)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            user.email,
            user.password_hash,
            user.full_name,
            user.phone,
            user.role.as_str(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_user(conn: &Connection, id: i64) -> Result<Option<User>, DatabaseError> {
    let user = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}

pub fn find_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>, DatabaseError> {
    let user = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
            params![email],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}

/// True when another account (not `except_id`) already uses `email`.
pub fn email_taken(
    conn: &Connection,
    email: &str,
    except_id: Option<i64>,
) -> Result<bool, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE email = ?1 AND id != ?2",
        params![email, except_id.unwrap_or(-1)],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Fields a user may change on their own profile. `None` leaves a column untouched.
#[derive(Debug, Default, Clone)]
pub struct ProfileChanges {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    /// `Some(None)` clears the phone number.
    pub phone: Option<Option<String>>,
}

impl ProfileChanges {
    /// Column names that this change set writes, in a stable order.
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.full_name.is_some() {
            fields.push("fullName");
        }
        if self.email.is_some() {
            fields.push("email");
        }
        if self.password_hash.is_some() {
            fields.push("password");
        }
        if self.phone.is_some() {
            fields.push("phone");
        }
        fields
    }

    pub fn is_empty(&self) -> bool {
        self.changed_fields().is_empty()
    }
}

/// Apply profile changes. Returns false when the user does not exist.
pub fn update_user_profile(
    conn: &Connection,
    id: i64,
    changes: &ProfileChanges,
) -> Result<bool, DatabaseError> {
    let updated = conn.execute(
        "UPDATE users SET
            full_name = COALESCE(?1, full_name),
            email = COALESCE(?2, email),
            password_hash = COALESCE(?3, password_hash),
            phone = CASE WHEN ?4 THEN ?5 ELSE phone END
         WHERE id = ?6",
        params![
            changes.full_name,
            changes.email,
            changes.password_hash,
            changes.phone.is_some(),
            changes.phone.clone().flatten(),
            id,
        ],
    )?;
    Ok(updated > 0)
}

pub fn update_user_full_name(conn: &Connection, id: i64, full_name: &str) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE users SET full_name = ?1 WHERE id = ?2",
        params![full_name, id],
    )?;
    if updated == 0 {
        return Err(DatabaseError::not_found("user", id));
    }
    Ok(())
}

pub fn delete_user(conn: &Connection, id: i64) -> Result<(), DatabaseError> {
    conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
    Ok(())
}
