//! Domain model & validation (component B): the Luhn check, the order
//! status enum, and nothing storage- or transport-specific.

pub mod luhn;
pub mod status;

pub use status::OrderStatus;
