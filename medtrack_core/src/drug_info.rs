//! Drug information lookup against the OpenFDA drug label API.
//!
//! One request per lookup, bounded by the configured timeout, no retries.
//! The first matching label is normalized into a fixed four-field
//! [`DrugInfo`]; further matches are ignored.

use crate::config::DrugInfoConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Manufacturer reported when the label names none
pub const UNKNOWN_MANUFACTURER: &str = "Unknown";

/// Single warning reported when the label carries none
pub const NO_WARNINGS: &str = "No warnings available";

/// Normalized drug label
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DrugInfo {
    pub name: Option<String>,
    pub manufacturer: String,
    pub warnings: Vec<String>,
    pub purpose: Vec<String>,
}

/// Anything that can look up drug information by generic name
#[async_trait]
pub trait DrugInfoSource: Send + Sync {
    async fn get_drug_info(&self, name: &str) -> Result<DrugInfo>;
}

/// HTTP client for the OpenFDA label endpoint
pub struct OpenFdaClient {
    base_url: String,
    client: reqwest::Client,
}

impl OpenFdaClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(config: &DrugInfoConfig) -> Result<Self> {
        Self::new(&config.base_url, Duration::from_secs(config.timeout_secs))
    }
}

#[async_trait]
impl DrugInfoSource for OpenFdaClient {
    async fn get_drug_info(&self, name: &str) -> Result<DrugInfo> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::MissingDrugName);
        }

        let search = format!("openfda.generic_name:\"{}\"", name);
        tracing::debug!(drug = name, url = %self.base_url, "Querying OpenFDA");

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("search", search.as_str()), ("limit", "1")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(drug = name, status = status.as_u16(), "OpenFDA returned an error");
            return Err(Error::UpstreamStatus(status.as_u16()));
        }

        let body: LabelResponse = response.json().await?;
        normalize(body)
    }
}

// ============================================================================
// Response shape
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub(crate) struct LabelResponse {
    #[serde(default)]
    results: Vec<LabelRecord>,
}

#[derive(Debug, Default, Deserialize)]
struct LabelRecord {
    #[serde(default)]
    openfda: OpenFdaFields,
    warnings: Option<OneOrMany>,
    purpose: Option<OneOrMany>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenFdaFields {
    generic_name: Option<OneOrMany>,
    manufacturer_name: Option<OneOrMany>,
}

/// Label fields arrive either as a bare string or as a list of strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn first(self) -> Option<String> {
        match self {
            OneOrMany::One(value) => Some(value),
            OneOrMany::Many(values) => values.into_iter().next(),
        }
    }

    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}

pub(crate) fn normalize(response: LabelResponse) -> Result<DrugInfo> {
    let record = response.results.into_iter().next().ok_or(Error::NoResults)?;

    Ok(DrugInfo {
        name: record.openfda.generic_name.and_then(OneOrMany::first),
        manufacturer: record
            .openfda
            .manufacturer_name
            .and_then(OneOrMany::first)
            .unwrap_or_else(|| UNKNOWN_MANUFACTURER.to_string()),
        warnings: record
            .warnings
            .map(OneOrMany::into_vec)
            .unwrap_or_else(|| vec![NO_WARNINGS.to_string()]),
        purpose: record.purpose.map(OneOrMany::into_vec).unwrap_or_default(),
    })
}
