//! Record persistence for medications, dose logs and notes.
//!
//! [`RecordStore`] is the seam between the HTTP layer and storage. The
//! bundled [`JsonStore`] keeps a snapshot in memory and, when opened on a
//! path, writes the whole snapshot back after each mutation:
//! 1. Serialize to a temp file in the same directory (exclusively locked)
//! 2. Sync to disk
//! 3. Rename over the original

use crate::{
    DoseLog, DoseLogDraft, Error, FieldErrors, Medication, MedicationDraft, Note, NoteDraft,
    Result,
};
use chrono::NaiveDate;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Create/read/update/delete access to every record type.
///
/// Notes deliberately have no update operation.
pub trait RecordStore {
    fn create_medication(&mut self, draft: MedicationDraft) -> Result<Medication>;
    fn medication(&self, id: u64) -> Result<Medication>;
    fn medications(&self) -> Vec<Medication>;
    fn update_medication(&mut self, id: u64, draft: MedicationDraft) -> Result<Medication>;
    /// Removes the medication together with its dose logs and notes
    fn delete_medication(&mut self, id: u64) -> Result<()>;

    fn create_log(&mut self, draft: DoseLogDraft) -> Result<DoseLog>;
    fn log(&self, id: u64) -> Result<DoseLog>;
    fn logs(&self) -> Vec<DoseLog>;
    /// All logs of one medication, oldest first
    fn logs_for(&self, medication: u64) -> Vec<DoseLog>;
    /// Logs whose UTC date lies in `[start, end]`, oldest first
    fn logs_between(&self, start: NaiveDate, end: NaiveDate) -> Vec<DoseLog>;
    fn update_log(&mut self, id: u64, draft: DoseLogDraft) -> Result<DoseLog>;
    fn delete_log(&mut self, id: u64) -> Result<()>;

    fn create_note(&mut self, draft: NoteDraft) -> Result<Note>;
    fn note(&self, id: u64) -> Result<Note>;
    fn notes(&self) -> Vec<Note>;
    fn delete_note(&mut self, id: u64) -> Result<()>;
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct NextIds {
    medication: u64,
    log: u64,
    note: u64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    next_ids: NextIds,
    #[serde(default)]
    medications: BTreeMap<u64, Medication>,
    #[serde(default)]
    logs: BTreeMap<u64, DoseLog>,
    #[serde(default)]
    notes: BTreeMap<u64, Note>,
}

impl Snapshot {
    fn require_medication(&self, id: u64) -> Result<()> {
        if self.medications.contains_key(&id) {
            return Ok(());
        }
        let mut errors = FieldErrors::new();
        errors.add(
            "medication",
            format!("Invalid pk \"{}\" - object does not exist.", id),
        );
        Err(Error::Validation(errors))
    }
}

fn next(counter: &mut u64) -> u64 {
    *counter += 1;
    *counter
}

fn sorted_by_time(mut logs: Vec<DoseLog>) -> Vec<DoseLog> {
    logs.sort_by(|a, b| a.taken_at.cmp(&b.taken_at).then(a.id.cmp(&b.id)));
    logs
}

/// JSON-file backed store (or purely in-memory when opened without a path)
#[derive(Debug, Default)]
pub struct JsonStore {
    path: Option<PathBuf>,
    data: Snapshot,
}

impl JsonStore {
    /// A store that never touches the filesystem
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open a store file with shared locking
    ///
    /// Returns an empty store if the file doesn't exist yet. Unlike missing
    /// files, unreadable or corrupted files are errors: records are never
    /// silently replaced by an empty snapshot.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            tracing::info!("No store file at {:?}, starting empty", path);
            return Ok(Self {
                path: Some(path),
                data: Snapshot::default(),
            });
        }

        let file = File::open(&path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;

        let data: Snapshot = serde_json::from_str(&contents)?;
        tracing::debug!(
            medications = data.medications.len(),
            logs = data.logs.len(),
            notes = data.notes.len(),
            "Loaded store from {:?}",
            path
        );
        Ok(Self {
            path: Some(path),
            data,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn save(&self, data: &Snapshot) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            serde_json::to_writer(&mut writer, data)?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;
        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved store to {:?}", path);
        Ok(())
    }

    /// Apply a change to a copy of the snapshot, persist it, then adopt it.
    ///
    /// A failed change or a failed write leaves the store untouched.
    fn mutate<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Snapshot) -> Result<T>,
    {
        let mut next_data = self.data.clone();
        let value = f(&mut next_data)?;
        self.save(&next_data)?;
        self.data = next_data;
        Ok(value)
    }
}

impl RecordStore for JsonStore {
    fn create_medication(&mut self, draft: MedicationDraft) -> Result<Medication> {
        self.mutate(|data| {
            let medication = draft.into_medication(next(&mut data.next_ids.medication));
            data.medications.insert(medication.id, medication.clone());
            Ok(medication)
        })
    }

    fn medication(&self, id: u64) -> Result<Medication> {
        self.data
            .medications
            .get(&id)
            .cloned()
            .ok_or(Error::NotFound {
                entity: "Medication",
                id,
            })
    }

    fn medications(&self) -> Vec<Medication> {
        self.data.medications.values().cloned().collect()
    }

    fn update_medication(&mut self, id: u64, draft: MedicationDraft) -> Result<Medication> {
        self.medication(id)?;
        self.mutate(|data| {
            let medication = draft.into_medication(id);
            data.medications.insert(id, medication.clone());
            Ok(medication)
        })
    }

    fn delete_medication(&mut self, id: u64) -> Result<()> {
        self.medication(id)?;
        self.mutate(|data| {
            data.medications.remove(&id);
            data.logs.retain(|_, log| log.medication != id);
            data.notes.retain(|_, note| note.medication != id);
            Ok(())
        })
    }

    fn create_log(&mut self, draft: DoseLogDraft) -> Result<DoseLog> {
        self.mutate(|data| {
            data.require_medication(draft.medication)?;
            let log = draft.into_log(next(&mut data.next_ids.log));
            data.logs.insert(log.id, log.clone());
            Ok(log)
        })
    }

    fn log(&self, id: u64) -> Result<DoseLog> {
        self.data.logs.get(&id).cloned().ok_or(Error::NotFound {
            entity: "DoseLog",
            id,
        })
    }

    fn logs(&self) -> Vec<DoseLog> {
        self.data.logs.values().cloned().collect()
    }

    fn logs_for(&self, medication: u64) -> Vec<DoseLog> {
        sorted_by_time(
            self.data
                .logs
                .values()
                .filter(|log| log.medication == medication)
                .cloned()
                .collect(),
        )
    }

    fn logs_between(&self, start: NaiveDate, end: NaiveDate) -> Vec<DoseLog> {
        sorted_by_time(
            self.data
                .logs
                .values()
                .filter(|log| (start..=end).contains(&log.date()))
                .cloned()
                .collect(),
        )
    }

    fn update_log(&mut self, id: u64, draft: DoseLogDraft) -> Result<DoseLog> {
        self.log(id)?;
        self.mutate(|data| {
            data.require_medication(draft.medication)?;
            let log = draft.into_log(id);
            data.logs.insert(id, log.clone());
            Ok(log)
        })
    }

    fn delete_log(&mut self, id: u64) -> Result<()> {
        self.log(id)?;
        self.mutate(|data| {
            data.logs.remove(&id);
            Ok(())
        })
    }

    fn create_note(&mut self, draft: NoteDraft) -> Result<Note> {
        self.mutate(|data| {
            data.require_medication(draft.medication)?;
            let note = draft.into_note(next(&mut data.next_ids.note));
            data.notes.insert(note.id, note.clone());
            Ok(note)
        })
    }

    fn note(&self, id: u64) -> Result<Note> {
        self.data
            .notes
            .get(&id)
            .cloned()
            .ok_or(Error::NotFound { entity: "Note", id })
    }

    fn notes(&self) -> Vec<Note> {
        self.data.notes.values().cloned().collect()
    }

    fn delete_note(&mut self, id: u64) -> Result<()> {
        self.note(id)?;
        self.mutate(|data| {
            data.notes.remove(&id);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn aspirin() -> MedicationDraft {
        MedicationDraft {
            name: "Aspirin".into(),
            dosage_mg: 100,
            prescribed_per_day: 2,
        }
    }

    fn dose(medication: u64, day: u32, hour: u32) -> DoseLogDraft {
        DoseLogDraft {
            medication,
            taken_at: Utc.with_ymd_and_hms(2025, 11, day, hour, 0, 0).unwrap(),
            was_taken: true,
        }
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, d).unwrap()
    }

    #[test]
    fn test_ids_increase_and_are_not_reused() {
        let mut store = JsonStore::in_memory();
        let first = store.create_medication(aspirin()).unwrap();
        let second = store.create_medication(aspirin()).unwrap();
        assert_eq!((first.id, second.id), (1, 2));

        store.delete_medication(second.id).unwrap();
        let third = store.create_medication(aspirin()).unwrap();
        assert_eq!(third.id, 3);
    }

    #[test]
    fn test_log_requires_existing_medication() {
        let mut store = JsonStore::in_memory();
        match store.create_log(dose(9999, 20, 10)) {
            Err(Error::Validation(errors)) => assert!(errors.contains("medication")),
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(store.logs().is_empty());
    }

    #[test]
    fn test_logs_between_is_inclusive_and_ordered() {
        let mut store = JsonStore::in_memory();
        let med = store.create_medication(aspirin()).unwrap();
        let late = store.create_log(dose(med.id, 21, 23)).unwrap();
        let early = store.create_log(dose(med.id, 20, 0)).unwrap();
        store.create_log(dose(med.id, 22, 0)).unwrap();
        store.create_log(dose(med.id, 19, 23)).unwrap();

        let logs = store.logs_between(date(20), date(21));
        let ids: Vec<_> = logs.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![early.id, late.id]);
    }

    #[test]
    fn test_delete_medication_cascades() {
        let mut store = JsonStore::in_memory();
        let keep = store.create_medication(aspirin()).unwrap();
        let gone = store.create_medication(aspirin()).unwrap();
        store.create_log(dose(keep.id, 20, 8)).unwrap();
        store.create_log(dose(gone.id, 20, 8)).unwrap();
        store
            .create_note(NoteDraft {
                medication: gone.id,
                text: "Switching brand".into(),
                date: date(20),
            })
            .unwrap();

        store.delete_medication(gone.id).unwrap();
        assert_eq!(store.medications().len(), 1);
        assert_eq!(store.logs().len(), 1);
        assert!(store.notes().is_empty());
        assert!(matches!(
            store.medication(gone.id),
            Err(Error::NotFound { entity: "Medication", .. })
        ));
    }

    #[test]
    fn test_update_missing_record_is_not_found() {
        let mut store = JsonStore::in_memory();
        assert!(matches!(
            store.update_medication(4, aspirin()),
            Err(Error::NotFound { id: 4, .. })
        ));
        assert!(matches!(store.delete_log(1), Err(Error::NotFound { .. })));
        assert!(matches!(store.delete_note(1), Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_failed_mutation_leaves_store_untouched() {
        let mut store = JsonStore::in_memory();
        let med = store.create_medication(aspirin()).unwrap();
        let log = store.create_log(dose(med.id, 20, 8)).unwrap();

        let mut bad = dose(med.id, 21, 8);
        bad.medication = 42;
        assert!(store.update_log(log.id, bad).is_err());
        assert_eq!(store.log(log.id).unwrap(), log);
    }

    #[test]
    fn test_persist_and_reopen() {
        crate::logging::init_test();
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("data").join("medtrack.json");

        {
            let mut store = JsonStore::open(&path).unwrap();
            let med = store.create_medication(aspirin()).unwrap();
            store.create_log(dose(med.id, 20, 8)).unwrap();
        }

        let mut store = JsonStore::open(&path).unwrap();
        assert_eq!(store.medications().len(), 1);
        assert_eq!(store.logs_for(1).len(), 1);
        // Counters survive the reload.
        assert_eq!(store.create_medication(aspirin()).unwrap().id, 2);

        let extras: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "medtrack.json")
            .collect();
        assert!(extras.is_empty(), "stray files: {:?}", extras);
    }

    #[test]
    fn test_corrupted_file_is_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("medtrack.json");
        std::fs::write(&path, "{ invalid json }").unwrap();

        assert!(matches!(JsonStore::open(&path), Err(Error::Json(_))));
    }
}
