use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Кинозал с фиксированным числом мест. После создания не меняется.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cinema {
    pub id: String,
    pub name: String,
    pub seat_count: i32,
    pub created_at: DateTime<Utc>,
}
