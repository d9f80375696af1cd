#![forbid(unsafe_code)]

//! Core domain model and business logic for the medication tracker.
//!
//! This crate provides:
//! - Domain types (medications, dose logs, notes)
//! - Expected-dose and adherence arithmetic
//! - OpenFDA drug information lookup
//! - Record persistence (JSON store)
//! - Configuration and logging setup

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod adherence;
pub mod drug_info;
pub mod external;
pub mod store;

// Re-export commonly used types
pub use error::{Error, FieldErrors, Result};
pub use types::*;
pub use config::Config;
pub use adherence::{adherence_rate, adherence_rate_over_period, expected_doses};
pub use drug_info::{DrugInfo, DrugInfoSource, OpenFdaClient};
pub use external::{fetch_external_info, ExternalInfo};
pub use store::{JsonStore, RecordStore};
