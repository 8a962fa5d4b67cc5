//! Per-entity SQL access. Functions take a borrowed `Connection` (or
//! `Transaction`, which derefs to one) so callers control transaction scope.

pub mod appointment;
pub mod doctor;
pub mod service;
pub mod user;

pub use appointment::*;
pub use doctor::*;
pub use service::*;
pub use user::*;

use std::str::FromStr;

use super::DatabaseError;

/// Parse a stored enum column, surfacing bad values as a row conversion error.
pub(crate) fn parse_enum<T>(idx: usize, raw: String) -> rusqlite::Result<T>
where
    T: FromStr<Err = DatabaseError>,
{
    T::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
