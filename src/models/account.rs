use serde::{Deserialize, Serialize};

/// One row of the legacy `role` table. Doctor-only columns are `None`
/// for patients and admins.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub role: String,
    pub address: Option<String>,
}

/// Account payload returned to clients. `name` duplicates `full_name`
/// because both keys are read by the legacy frontend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPayload {
    pub id: String,
    pub name: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub role: String,
    pub address: String,
}

impl From<&Account> for UserPayload {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            name: account.full_name.clone(),
            full_name: account.full_name.clone(),
            email: account.email.clone(),
            phone: account.phone.clone().unwrap_or_default(),
            role: account.role.clone(),
            address: account.address.clone().unwrap_or_default(),
        }
    }
}

/// Public doctor directory entry (no contact details beyond the profile).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorListing {
    pub id: String,
    pub name: String,
    pub department: String,
    pub specialization: String,
    pub qualification: String,
    pub experience: String,
    pub consultation_fee: String,
    pub status: String,
    pub licence_no: String,
}

/// Full doctor record as seen by the owning admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorProfile {
    pub id: String,
    pub name: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub department: String,
    pub specialization: String,
    pub qualification: String,
    pub experience: String,
    pub licence_no: String,
    pub consultation_fee: String,
    pub status: String,
}

/// Patient contact row for the admin dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientContact {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}
