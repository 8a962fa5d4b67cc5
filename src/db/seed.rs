//! First-start data: the default service catalog and an optional admin.
//!
//! Both steps are idempotent and safe to run on every startup.

use rusqlite::Connection;

use super::repository::{count_services, find_user_by_email, insert_doctor, insert_service, insert_user};
use super::DatabaseError;
use crate::models::{DoctorDetails, NewUser, Role, ServiceDraft};

/// (name, description, price, duration in minutes)
const DEFAULT_SERVICES: &[(&str, &str, f64, i64)] = &[
    ("Consultation", "Initial examination and treatment plan", 1000.0, 30),
    ("Professional cleaning", "Ultrasonic scaling and polishing", 3500.0, 60),
    ("Caries treatment", "Filling with light-cured composite", 4500.0, 60),
    ("Whitening", "In-office professional whitening", 7000.0, 90),
];

/// Insert the default services when the catalog is empty.
/// Returns the number of services inserted.
pub fn seed_services(conn: &Connection) -> Result<usize, DatabaseError> {
    if count_services(conn)? > 0 {
        return Ok(0);
    }

    for (name, description, price, duration_minutes) in DEFAULT_SERVICES {
        insert_service(
            conn,
            &ServiceDraft {
                name: (*name).to_string(),
                description: Some((*description).to_string()),
                price: *price,
                duration_minutes: *duration_minutes,
            },
        )?;
    }

    tracing::info!(count = DEFAULT_SERVICES.len(), "Seeded default services");
    Ok(DEFAULT_SERVICES.len())
}

/// Create the admin account and its doctor record unless the email exists.
///
/// `password_hash` is computed by the caller; this layer never sees
/// plaintext passwords. Returns the new user id, or `None` when skipped.
pub fn seed_admin(
    conn: &Connection,
    email: &str,
    password_hash: &str,
) -> Result<Option<i64>, DatabaseError> {
    if find_user_by_email(conn, email)?.is_some() {
        tracing::debug!("Admin account already present");
        return Ok(None);
    }

    let tx = conn.unchecked_transaction()?;
    let user_id = insert_user(
        &tx,
        &NewUser {
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            full_name: "Administrator".to_string(),
            phone: None,
            role: Role::Admin,
        },
    )?;
    insert_doctor(
        &tx,
        user_id,
        &DoctorDetails {
            specialization: "Chief physician".to_string(),
            experience_years: Some(10),
            description: None,
        },
    )?;
    tx.commit()?;

    tracing::info!(user_id, "Created admin account");
    Ok(Some(user_id))
}
