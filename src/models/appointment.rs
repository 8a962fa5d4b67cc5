use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::enums::AppointmentStatus;

/// Wire and storage format of appointment dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Wire and storage format of appointment times (minute precision).
pub const TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub service_id: i64,
    pub appointment_date: NaiveDate,
    #[serde(with = "hh_mm")]
    pub appointment_time: NaiveTime,
    pub status: AppointmentStatus,
    pub created_at: String,
}

/// Bookable unit of a doctor's schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot {
    pub doctor_id: i64,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl Slot {
    pub fn date_key(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }

    pub fn time_key(&self) -> String {
        self.time.format(TIME_FORMAT).to_string()
    }
}

/// Appointment joined with the names each dashboard shows.
///
/// `patient_*` fields are filled for doctor and admin listings,
/// `doctor_name` for patient and admin listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentView {
    pub id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub service_id: i64,
    pub appointment_date: String,
    pub appointment_time: String,
    pub status: AppointmentStatus,
    pub created_at: String,
    pub service_name: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_phone: Option<String>,
}

pub(crate) mod hh_mm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIME_FORMAT;

    pub fn serialize<S: Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&time.format(TIME_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveTime::parse_from_str(&raw, TIME_FORMAT).map_err(serde::de::Error::custom)
    }
}
