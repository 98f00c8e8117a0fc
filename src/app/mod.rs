//! Shared application state and session bookkeeping

pub mod sessions;
pub mod state;

pub use state::AppState;
