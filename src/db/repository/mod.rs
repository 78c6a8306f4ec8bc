pub mod account;
pub mod booking;
pub mod prediction;
