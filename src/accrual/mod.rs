//! External accrual client and the scoring worker (component D).

mod client;
mod worker;

pub use client::{AccrualClient, AccrualError, AccrualPoll};
pub use worker::ScoringWorker;
