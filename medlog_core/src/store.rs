//! Dose log persistence.
//!
//! The whole log list is the unit of persistence: every save rewrites the
//! slot completely. A missing or unreadable slot loads as an empty list.

use crate::{DoseLog, Error, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// File name of the log slot inside the data directory
pub const LOGS_FILE_NAME: &str = "medication_logs.json";

/// Store trait for loading and saving the dose log list
pub trait LogStore {
    /// Load every persisted record, or an empty list if nothing usable is stored
    fn load(&self) -> Vec<DoseLog>;

    /// Overwrite the slot with `logs`
    fn save(&mut self, logs: &[DoseLog]) -> Result<()>;
}

/// Suffix of the sidecar file that guards the slot
pub const LOCK_SUFFIX: &str = ".lock";

/// JSON file slot with file locking and atomic replacement
///
/// The slot itself is replaced on every save, so locks are taken on a
/// stable sidecar (`medication_logs.json.lock`) next to it.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(LOCK_SUFFIX);
        PathBuf::from(name)
    }

    fn open_lock(&self) -> std::io::Result<File> {
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.lock_path())
    }

    fn read_contents(&self) -> std::io::Result<String> {
        let lock = self.open_lock()?;
        // Shared lock: readers wait for an in-flight save to finish
        lock.lock_shared()?;

        let result = std::fs::read_to_string(&self.path);
        let _ = lock.unlock();
        result
    }
}

impl LogStore for JsonFileStore {
    fn load(&self) -> Vec<DoseLog> {
        if !self.path.exists() {
            tracing::info!("No log file at {:?}, starting empty", self.path);
            return Vec::new();
        }

        let contents = match self.read_contents() {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!(
                    "Failed to read log file {:?}: {}. Starting empty.",
                    self.path,
                    e
                );
                return Vec::new();
            }
        };

        parse_logs(&contents, &self.path.display().to_string())
    }

    /// Atomically writes the list by:
    /// 1. Writing to a temp file in the same directory
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    fn save(&mut self, logs: &[DoseLog]) -> Result<()> {
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent)?;

        // Exclusive lock on the sidecar serializes concurrent saves
        let lock = self.open_lock()?;
        lock.lock_exclusive()?;

        let temp = NamedTempFile::new_in(parent)?;
        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(logs)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;
        lock.unlock()?;

        tracing::debug!("Saved {} logs to {:?}", logs.len(), self.path);
        Ok(())
    }
}

/// In-memory slot holding the serialized text
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    slot: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the slot with raw text, as if a previous session had written it
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            slot: Some(contents.into()),
        }
    }

    pub fn contents(&self) -> Option<&str> {
        self.slot.as_deref()
    }
}

impl LogStore for MemoryStore {
    fn load(&self) -> Vec<DoseLog> {
        match &self.slot {
            Some(contents) => parse_logs(contents, "memory slot"),
            None => Vec::new(),
        }
    }

    fn save(&mut self, logs: &[DoseLog]) -> Result<()> {
        self.slot = Some(serde_json::to_string(logs)?);
        Ok(())
    }
}

/// Parse slot contents; malformed content counts as no data
fn parse_logs(contents: &str, source: &str) -> Vec<DoseLog> {
    if contents.trim().is_empty() {
        return Vec::new();
    }

    match serde_json::from_str::<Vec<DoseLog>>(contents) {
        Ok(logs) => {
            tracing::debug!("Loaded {} logs from {}", logs.len(), source);
            logs
        }
        Err(e) => {
            tracing::warn!("Failed to parse logs from {}: {}. Starting empty.", source, e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample_logs() -> Vec<DoseLog> {
        vec![
            DoseLog {
                id: 1,
                medicine: "Aspirin".into(),
                date_time: Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(),
                is_edited: false,
            },
            DoseLog {
                id: 2,
                medicine: "Ibuprofen".into(),
                date_time: Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap(),
                is_edited: true,
            },
        ]
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        crate::logging::init_test();
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(temp_dir.path().join(LOGS_FILE_NAME));

        store.save(&sample_logs()).unwrap();
        assert_eq!(store.load(), sample_logs());
    }

    #[test]
    fn test_save_of_load_is_idempotent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(temp_dir.path().join(LOGS_FILE_NAME));
        store.save(&sample_logs()).unwrap();

        let first = store.load();
        store.save(&first).unwrap();
        let second = store.load();
        assert_eq!(first, second);
    }

    #[test]
    fn test_load_nonexistent_returns_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(temp_dir.path().join("missing.json"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_corrupted_file_returns_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join(LOGS_FILE_NAME);
        std::fs::write(&path, "{ invalid json }").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested/data").join(LOGS_FILE_NAME);

        let mut store = JsonFileStore::new(&path);
        store.save(&sample_logs()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_atomic_save_leaves_no_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(temp_dir.path().join(LOGS_FILE_NAME));
        store.save(&sample_logs()).unwrap();
        store.save(&[]).unwrap();

        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != LOGS_FILE_NAME)
            .filter(|e| e.file_name() != format!("{}{}", LOGS_FILE_NAME, LOCK_SUFFIX).as_str())
            .collect();
        assert!(extras.is_empty(), "Found extras: {:?}", extras);
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_save_waits_for_sidecar_lock() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join(LOGS_FILE_NAME);
        let lock_path = temp_dir.path().join(format!("{}{}", LOGS_FILE_NAME, LOCK_SUFFIX));

        let holder = File::create(&lock_path).unwrap();
        holder.lock_exclusive().unwrap();

        let saver_path = path.clone();
        let saver = std::thread::spawn(move || {
            let mut store = JsonFileStore::new(saver_path);
            store.save(&sample_logs()).unwrap();
        });

        std::thread::sleep(std::time::Duration::from_millis(200));
        assert!(!path.exists(), "save must not run while the sidecar is locked");

        holder.unlock().unwrap();
        saver.join().unwrap();
        assert_eq!(JsonFileStore::new(&path).load(), sample_logs());

        // Released after the save
        let reopened = File::open(&lock_path).unwrap();
        reopened.try_lock_exclusive().unwrap();
    }

    #[test]
    fn test_memory_store_roundtrip_and_corruption() {
        let mut store = MemoryStore::new();
        assert!(store.load().is_empty());

        store.save(&sample_logs()).unwrap();
        assert_eq!(store.load(), sample_logs());
        assert!(store.contents().unwrap().contains("\"dateTime\""));

        let corrupted = MemoryStore::with_contents("not json");
        assert!(corrupted.load().is_empty());
    }
}
