//! Short numeric codes for account ids, booking ids, contact-query ids
//! and OTPs. Collisions on generated ids are possible and handled at the
//! insert site by retrying with a fresh code.

use rand::Rng;

/// 8-digit identifier used for accounts, bookings and queries.
pub fn generate_code() -> String {
    rand::thread_rng().gen_range(10_000_000u32..100_000_000).to_string()
}

/// 6-digit one-time password.
pub fn generate_otp() -> String {
    rand::thread_rng().gen_range(100_000u32..1_000_000).to_string()
}
