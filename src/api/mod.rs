//! API surface (component E): axum handlers, DTOs, and shared state.

mod dto;
mod handlers;
mod router;
mod state;

pub use router::build;
pub use state::AppState;
