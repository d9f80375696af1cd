//! Core domain types for the medication tracker.
//!
//! This module defines the records kept by the store and the input shapes
//! used to create or edit them:
//! - Medications and their prescribed schedule
//! - Dose logs (taken or missed events)
//! - Free-form notes

use crate::error::{Error, FieldErrors, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest accepted medication name
pub const MAX_NAME_LEN: usize = 100;

const REQUIRED: &str = "This field is required.";
const BLANK: &str = "This field may not be blank.";
const NEGATIVE: &str = "Ensure this value is greater than or equal to 0.";

// ============================================================================
// Medication
// ============================================================================

/// A tracked drug with its dosage and daily frequency
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Medication {
    pub id: u64,
    pub name: String,
    pub dosage_mg: i64,
    pub prescribed_per_day: i64,
}

impl fmt::Display for Medication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}mg)", self.name, self.dosage_mg)
    }
}

/// Validated medication fields, ready to be stored
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MedicationDraft {
    pub name: String,
    pub dosage_mg: i64,
    pub prescribed_per_day: i64,
}

impl MedicationDraft {
    pub fn into_medication(self, id: u64) -> Medication {
        Medication {
            id,
            name: self.name,
            dosage_mg: self.dosage_mg,
            prescribed_per_day: self.prescribed_per_day,
        }
    }
}

/// Medication fields as submitted by a client
///
/// Every field is optional so that missing values can be reported per field
/// instead of failing deserialization as a whole.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct MedicationInput {
    pub name: Option<String>,
    pub dosage_mg: Option<i64>,
    pub prescribed_per_day: Option<i64>,
}

impl MedicationInput {
    /// Validate a full submission (create or replace)
    pub fn validate(self) -> Result<MedicationDraft> {
        let mut errors = FieldErrors::new();
        if self.name.is_none() {
            errors.add("name", REQUIRED);
        }
        if self.dosage_mg.is_none() {
            errors.add("dosage_mg", REQUIRED);
        }
        if self.prescribed_per_day.is_none() {
            errors.add("prescribed_per_day", REQUIRED);
        }
        build_medication(
            errors,
            self.name.unwrap_or_default(),
            self.dosage_mg.unwrap_or_default(),
            self.prescribed_per_day.unwrap_or_default(),
        )
    }

    /// Validate a partial submission against the current record
    pub fn merge(self, current: &Medication) -> Result<MedicationDraft> {
        build_medication(
            FieldErrors::new(),
            self.name.unwrap_or_else(|| current.name.clone()),
            self.dosage_mg.unwrap_or(current.dosage_mg),
            self.prescribed_per_day
                .unwrap_or(current.prescribed_per_day),
        )
    }
}

fn build_medication(
    mut errors: FieldErrors,
    name: String,
    dosage_mg: i64,
    prescribed_per_day: i64,
) -> Result<MedicationDraft> {
    let name = name.trim().to_string();
    if name.is_empty() && !errors.contains("name") {
        errors.add("name", BLANK);
    }
    if name.chars().count() > MAX_NAME_LEN {
        errors.add(
            "name",
            format!("Ensure this field has no more than {} characters.", MAX_NAME_LEN),
        );
    }
    if dosage_mg < 0 {
        errors.add("dosage_mg", NEGATIVE);
    }
    if prescribed_per_day < 0 {
        errors.add("prescribed_per_day", NEGATIVE);
    }
    errors.into_result()?;

    Ok(MedicationDraft {
        name,
        dosage_mg,
        prescribed_per_day,
    })
}

// ============================================================================
// Dose Log
// ============================================================================

/// A single dose event for a medication, taken or missed
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DoseLog {
    pub id: u64,
    pub medication: u64,
    pub taken_at: DateTime<Utc>,
    pub was_taken: bool,
}

impl DoseLog {
    /// Calendar date the event falls on (UTC)
    pub fn date(&self) -> NaiveDate {
        self.taken_at.date_naive()
    }

    /// Human-readable line, e.g. `Aspirin at 2025-11-20 10:00 - Taken`
    pub fn describe(&self, medication_name: &str) -> String {
        let status = if self.was_taken { "Taken" } else { "Missed" };
        format!(
            "{} at {} - {}",
            medication_name,
            self.taken_at.format("%Y-%m-%d %H:%M"),
            status
        )
    }
}

/// Validated dose log fields. The medication reference is resolved by the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DoseLogDraft {
    pub medication: u64,
    pub taken_at: DateTime<Utc>,
    pub was_taken: bool,
}

impl DoseLogDraft {
    pub fn into_log(self, id: u64) -> DoseLog {
        DoseLog {
            id,
            medication: self.medication,
            taken_at: self.taken_at,
            was_taken: self.was_taken,
        }
    }
}

/// Dose log fields as submitted by a client
#[derive(Clone, Debug, Default, Deserialize)]
pub struct DoseLogInput {
    pub medication: Option<u64>,
    pub taken_at: Option<DateTime<Utc>>,
    pub was_taken: Option<bool>,
}

impl DoseLogInput {
    /// Validate a full submission; `taken_at` defaults to `now`, `was_taken` to true
    pub fn validate(self, now: DateTime<Utc>) -> Result<DoseLogDraft> {
        let Some(medication) = self.medication else {
            let mut errors = FieldErrors::new();
            errors.add("medication", REQUIRED);
            return Err(Error::Validation(errors));
        };
        Ok(DoseLogDraft {
            medication,
            taken_at: self.taken_at.unwrap_or(now),
            was_taken: self.was_taken.unwrap_or(true),
        })
    }

    /// Fill unset fields from the current record
    pub fn merge(self, current: &DoseLog) -> DoseLogDraft {
        DoseLogDraft {
            medication: self.medication.unwrap_or(current.medication),
            taken_at: self.taken_at.unwrap_or(current.taken_at),
            was_taken: self.was_taken.unwrap_or(current.was_taken),
        }
    }
}

// ============================================================================
// Note
// ============================================================================

/// Free-form annotation attached to a medication. Notes are never edited.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Note {
    pub id: u64,
    pub medication: u64,
    pub text: String,
    pub date: NaiveDate,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoteDraft {
    pub medication: u64,
    pub text: String,
    pub date: NaiveDate,
}

impl NoteDraft {
    pub fn into_note(self, id: u64) -> Note {
        Note {
            id,
            medication: self.medication,
            text: self.text,
            date: self.date,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct NoteInput {
    pub medication: Option<u64>,
    pub text: Option<String>,
    pub date: Option<NaiveDate>,
}

impl NoteInput {
    /// Validate a submission; `date` defaults to `today`
    pub fn validate(self, today: NaiveDate) -> Result<NoteDraft> {
        let mut errors = FieldErrors::new();
        if self.medication.is_none() {
            errors.add("medication", REQUIRED);
        }
        let text = match self.text {
            None => {
                errors.add("text", REQUIRED);
                String::new()
            }
            Some(text) if text.trim().is_empty() => {
                errors.add("text", BLANK);
                text
            }
            Some(text) => text,
        };
        errors.into_result()?;

        Ok(NoteDraft {
            medication: self.medication.unwrap_or_default(),
            text,
            date: self.date.unwrap_or(today),
        })
    }
}
