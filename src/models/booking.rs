use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One row of the `booking` table. Doctor correlation is by display name,
/// matching the legacy schema (no doctor id column).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub booking_id: String,
    pub name: String,
    pub doctor: String,
    pub department: String,
    pub appointment: Option<NaiveDateTime>,
    pub status: String,
}

/// Monthly count bucket for the admin analytics chart.
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyCount {
    pub month: String,
    pub count: i64,
}
