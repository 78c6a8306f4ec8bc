pub mod account;
pub mod booking;
pub mod enums;

pub use account::*;
pub use booking::*;
pub use enums::*;
