//! External drug information for a stored medication.
//!
//! This is the one place where lookup errors are caught: any failure is
//! folded into an `{ "error": message }` value so the HTTP layer can answer
//! with a bad-gateway response instead of a generic failure.

use crate::drug_info::{DrugInfo, DrugInfoSource};
use crate::Medication;
use serde::Serialize;

/// Outcome of an external lookup, serialized as either the record or `{error}`
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ExternalInfo {
    Found(DrugInfo),
    Failed { error: String },
}

impl ExternalInfo {
    pub fn error(&self) -> Option<&str> {
        match self {
            ExternalInfo::Found(_) => None,
            ExternalInfo::Failed { error } => Some(error),
        }
    }
}

/// Look up drug information by the medication's name
pub async fn fetch_external_info(
    medication: &Medication,
    source: &dyn DrugInfoSource,
) -> ExternalInfo {
    match source.get_drug_info(&medication.name).await {
        Ok(info) => ExternalInfo::Found(info),
        Err(e) => {
            tracing::warn!(
                medication = medication.id,
                name = %medication.name,
                "External drug lookup failed: {}",
                e
            );
            ExternalInfo::Failed {
                error: e.to_string(),
            }
        }
    }
}
