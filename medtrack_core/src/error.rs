//! Error types for the medtrack_core library.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt;
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for medtrack_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Record failed field validation
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// No record with the given id
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },

    /// Medication cannot be used for dose arithmetic
    #[error("prescribed_per_day must be greater than 0 (got {0})")]
    Misconfigured(i64),

    /// Expected dose count does not fit in an i64
    #[error("expected dose count overflows: {prescribed_per_day} per day over {days} days")]
    DoseCountOverflow { prescribed_per_day: i64, days: u32 },

    /// Period bounds are reversed
    #[error("start_date {start} must not be after end_date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    /// Drug lookup called without a name
    #[error("drug_name is required")]
    MissingDrugName,

    /// Drug information service answered with a non-success status
    #[error("OpenFDA API error: {0}")]
    UpstreamStatus(u16),

    /// Drug information service found nothing
    #[error("No results found for this medication.")]
    NoResults,

    /// Transport-level failure talking to the drug information service
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// True for errors raised while talking to the drug information service.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Error::UpstreamStatus(_) | Error::NoResults | Error::Http(_)
        )
    }

    /// True for errors caused by caller input rather than the system.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Error::Validation(_)
                | Error::Misconfigured(_)
                | Error::DoseCountOverflow { .. }
                | Error::InvalidRange { .. }
                | Error::MissingDrugName
        )
    }
}

/// Validation messages keyed by field name.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// `Ok(())` when nothing was recorded, otherwise a validation error.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}
