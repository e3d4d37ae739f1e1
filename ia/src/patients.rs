//! Patient registry: register / list / get / delete, with cascade revocation
//! of outstanding refresh tokens on delete.

use std::path::PathBuf;
use std::sync::Mutex;

use chrono::Utc;
use pghd_shared::store::AppendStore;

use crate::model::Patient;
use crate::refresh_tokens::RefreshTokenStore;

/// Monotonic id counter, persisted separately from the patient records so a
/// deleted patient's id is never reissued even though its record is gone.
struct IdCounter {
    path: PathBuf,
    next: Mutex<u64>,
}

impl IdCounter {
    fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let next = match std::fs::read_to_string(&path) {
            Ok(contents) => contents.trim().parse().unwrap_or(1),
            Err(_) => 1,
        };
        Ok(Self {
            path,
            next: Mutex::new(next),
        })
    }

    fn take(&self) -> anyhow::Result<u64> {
        let mut guard = self.next.lock().expect("counter mutex poisoned");
        let id = *guard;
        *guard += 1;
        pghd_shared::store::atomic_write(&self.path, guard.to_string().as_bytes())?;
        Ok(id)
    }
}

pub struct PatientStore {
    records: AppendStore<Patient>,
    counter: IdCounter,
}

impl PatientStore {
    pub fn open(patients_path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let patients_path = patients_path.into();
        let counter_path = patients_path.with_file_name("patients_seq.txt");
        Ok(Self {
            records: AppendStore::open(patients_path, |_| true)?,
            counter: IdCounter::open(counter_path)?,
        })
    }

    pub fn register(&self, given_name: String, family_name: String, date_of_birth: String) -> anyhow::Result<Patient> {
        let id = self.counter.take()?;
        let patient = Patient {
            id: id.to_string(),
            given_name,
            family_name,
            date_of_birth,
            created_at: Utc::now(),
        };
        self.records.mutate(|m| {
            m.insert(patient.id.clone(), patient.clone());
        })?;
        Ok(patient)
    }

    pub fn list(&self) -> Vec<Patient> {
        self.records.read(|m| m.values().cloned().collect())
    }

    pub fn get(&self, id: &str) -> Option<Patient> {
        self.records.read(|m| m.get(id).cloned())
    }

    /// Delete `id`, cascading revocation of its outstanding refresh tokens.
    /// Returns `true` if a patient was actually removed.
    pub fn delete(&self, id: &str, refresh_tokens: &RefreshTokenStore) -> anyhow::Result<bool> {
        let removed = self.records.mutate(|m| m.remove(id))?;
        if removed.is_some() {
            refresh_tokens.revoke_all_for_subject(id)?;
        }
        Ok(removed.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_decimal_and_never_reused_after_delete() {
        let dir = tempfile::tempdir().unwrap();
        let patients = PatientStore::open(dir.path().join("patients.txt")).unwrap();
        let refresh = RefreshTokenStore::open(dir.path().join("refresh_tokens.txt")).unwrap();

        let first = patients.register("Max".into(), "Mustermann".into(), "1990-01-15".into()).unwrap();
        assert_eq!(first.id, "1");

        patients.delete(&first.id, &refresh).unwrap();
        let second = patients.register("Anna".into(), "Muster".into(), "1991-02-20".into()).unwrap();
        assert_eq!(second.id, "2");
    }

    #[test]
    fn reload_preserves_counter_across_restarts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patients.txt");
        {
            let patients = PatientStore::open(&path).unwrap();
            patients.register("Max".into(), "Mustermann".into(), "1990-01-15".into()).unwrap();
        }
        let reopened = PatientStore::open(&path).unwrap();
        let second = reopened.register("Anna".into(), "Muster".into(), "1991-02-20".into()).unwrap();
        assert_eq!(second.id, "2");
    }
}

