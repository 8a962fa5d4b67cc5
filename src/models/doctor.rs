use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    pub id: i64,
    pub user_id: i64,
    pub specialization: String,
    pub experience_years: Option<i64>,
    pub description: Option<String>,
    pub photo_url: Option<String>,
}

/// Public catalog entry: doctor joined with the owning user's name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorCard {
    pub id: i64,
    pub full_name: String,
    pub specialization: String,
    pub experience_years: Option<i64>,
    pub description: Option<String>,
    pub photo_url: Option<String>,
}

/// Admin listing adds account identifiers to the catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorAdminView {
    pub id: i64,
    pub user_id: i64,
    pub full_name: String,
    pub email: String,
    pub specialization: String,
    pub experience_years: Option<i64>,
    pub description: Option<String>,
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DoctorDetails {
    pub specialization: String,
    pub experience_years: Option<i64>,
    pub description: Option<String>,
}
