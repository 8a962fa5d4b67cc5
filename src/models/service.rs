use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub duration_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct ServiceDraft {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub duration_minutes: i64,
}
