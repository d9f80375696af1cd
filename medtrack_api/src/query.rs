//! Query-string parameters shared by several endpoints.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::ApiError;

pub const DAYS_REQUIRED: &str = "The 'days' parameter is required.";
pub const DAYS_INVALID: &str = "Days must be a positive integer.";
pub const DATES_INVALID: &str =
    "Both 'start' and 'end' query parameters are required and must be valid dates.";

/// `?days=N`, kept as text so bad input can be reported with our own message
#[derive(Debug, Default, Deserialize)]
pub struct DaysQuery {
    pub days: Option<String>,
}

impl DaysQuery {
    pub fn positive_days(&self) -> Result<u32, ApiError> {
        let raw = self
            .days
            .as_deref()
            .ok_or_else(|| ApiError::BadRequest(DAYS_REQUIRED.into()))?;
        match raw.trim().parse::<u32>() {
            Ok(days) if days > 0 => Ok(days),
            _ => Err(ApiError::BadRequest(DAYS_INVALID.into())),
        }
    }
}

/// `?start=YYYY-MM-DD&end=YYYY-MM-DD`
#[derive(Debug, Default, Deserialize)]
pub struct DateRangeQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl DateRangeQuery {
    /// Both bounds, or a bad request when either is missing or malformed
    pub fn required(&self) -> Result<(NaiveDate, NaiveDate), ApiError> {
        match (parse_date(self.start.as_deref()), parse_date(self.end.as_deref())) {
            (Some(start), Some(end)) => Ok((start, end)),
            _ => Err(ApiError::BadRequest(DATES_INVALID.into())),
        }
    }

    /// `None` when neither bound was given
    pub fn optional(&self) -> Result<Option<(NaiveDate, NaiveDate)>, ApiError> {
        if self.start.is_none() && self.end.is_none() {
            return Ok(None);
        }
        self.required().map(Some)
    }
}

fn parse_date(value: Option<&str>) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value?.trim(), "%Y-%m-%d").ok()
}
