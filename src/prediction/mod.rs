//! Prediction record core: the packed-column codec and the role-aware
//! access layer over the legacy `prediction` table.

pub mod encoding;
pub mod store;

pub use encoding::{decode, encode, Confidence, DecodedDisease, DEFAULT_CONFIDENCE};
pub use store::*;
