#![forbid(unsafe_code)]

//! HTTP surface for the medication tracker: JSON CRUD over medications,
//! dose logs and notes, plus the adherence and drug information endpoints.

pub mod endpoints;
pub mod error;
pub mod query;
pub mod router;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use router::router;
pub use server::{serve, start, ServerHandle};
pub use state::AppState;
