use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::Cinema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatStatus {
    Available,
    Purchased,
}

impl SeatStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeatStatus::Available => "available",
            SeatStatus::Purchased => "purchased",
        }
    }
}

impl fmt::Display for SeatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeatStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(SeatStatus::Available),
            "purchased" => Ok(SeatStatus::Purchased),
            other => Err(format!("unknown seat status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    pub id: i64,
    pub cinema_id: String,
    pub seat_number: i32,
    pub status: SeatStatus,
}

impl Seat {
    pub fn is_available(&self) -> bool {
        self.status == SeatStatus::Available
    }

    // Копия места после успешного conditional claim
    pub fn purchased(&self) -> Seat {
        Seat {
            status: SeatStatus::Purchased,
            ..self.clone()
        }
    }
}

/// Снимок зала: сам зал и его места по возрастанию номера.
/// Только для принятия решения, безопасность обеспечивает условная запись.
#[derive(Debug, Clone)]
pub struct SeatMap {
    pub cinema: Cinema,
    pub seats: Vec<Seat>,
}
