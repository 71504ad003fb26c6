//! Model persistence and the train-once cache policy
//!
//! The [`ModelStore`] owns the lifecycle around a persisted model artifact:
//! it loads an existing artifact, or trains from synthetic data, saves the
//! result, and hands the model back. Storage is injected through the
//! [`ModelStorage`] trait so tests can swap the filesystem for memory.
//!
//! Artifacts are JSON envelopes carrying a schema version, the coefficients,
//! the training timestamp, and a SHA-256 checksum over the serialized
//! coefficients. A corrupt artifact is surfaced as an error, never silently
//! retrained over; only artifact *absence* falls back to training.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::dataset::{self, DEFAULT_SAMPLE_COUNT, DEFAULT_SEED};
use crate::error::{EnergyError, Result};
use crate::model::FittedModel;
use crate::trainer;

/// Artifact schema understood by this build
const ARTIFACT_SCHEMA_VERSION: u32 = 1;

/// Where serialized model artifacts live.
///
/// Implementations only move bytes. Artifact encoding, checksum verification,
/// and the train-on-absence policy belong to [`ModelStore`].
pub trait ModelStorage: Send + Sync {
    /// Human-readable location for logs and error messages.
    fn location(&self) -> String;

    /// Reads the artifact bytes, or `None` if nothing has been stored yet.
    fn read(&self) -> io::Result<Option<Vec<u8>>>;

    /// Replaces the stored artifact.
    fn write(&self, bytes: &[u8]) -> io::Result<()>;
}

/// File-backed artifact storage.
///
/// Writes go through a temp file and rename so a crash mid-write never
/// leaves a truncated artifact at the well-known path.
pub struct FsStorage {
    path: PathBuf,
}

impl FsStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ModelStorage for FsStorage {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn read(&self) -> io::Result<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn write(&self, bytes: &[u8]) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp_path = self.path.with_extension("tmp");
        let mut file = File::create(&temp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

/// In-memory artifact storage for tests and embedded use.
#[derive(Default)]
pub struct MemoryStorage {
    bytes: Mutex<Option<Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ModelStorage for MemoryStorage {
    fn location(&self) -> String {
        "<memory>".to_string()
    }

    fn read(&self) -> io::Result<Option<Vec<u8>>> {
        // A poisoned lock still holds consistent bytes; recover the guard
        let guard = self.bytes.lock().unwrap_or_else(|e| e.into_inner());
        Ok(guard.clone())
    }

    fn write(&self, bytes: &[u8]) -> io::Result<()> {
        let mut guard = self.bytes.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(bytes.to_vec());
        Ok(())
    }
}

/// Parameters used when the store trains from scratch.
#[derive(Debug, Clone, Copy)]
pub struct TrainingConfig {
    pub sample_count: usize,
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            sample_count: DEFAULT_SAMPLE_COUNT,
            seed: DEFAULT_SEED,
        }
    }
}

/// Counters describing how this store has satisfied model requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Models trained and persisted by this store
    pub trainings: u64,
    /// Models decoded from an existing artifact
    pub artifact_loads: u64,
}

/// Persisted envelope around a fitted model.
#[derive(Debug, Serialize, Deserialize)]
struct ModelArtifact {
    schema_version: u32,
    model: FittedModel,
    /// UNIX timestamp (seconds) of the fit
    trained_at: i64,
    training_samples: usize,
    /// SHA-256 hex digest over the serialized `model` field
    checksum: String,
}

/// Owns the train-once, cache-forever policy over an injected backend.
pub struct ModelStore {
    storage: Box<dyn ModelStorage>,
    training: TrainingConfig,
    /// Serializes first-time training so concurrent callers fit once
    train_lock: Mutex<()>,
    trainings: AtomicU64,
    artifact_loads: AtomicU64,
}

impl ModelStore {
    pub fn new(storage: impl ModelStorage + 'static, training: TrainingConfig) -> Self {
        Self {
            storage: Box::new(storage),
            training,
            train_lock: Mutex::new(()),
            trainings: AtomicU64::new(0),
            artifact_loads: AtomicU64::new(0),
        }
    }

    /// Backend location, for logs and status reporting.
    pub fn location(&self) -> String {
        self.storage.location()
    }

    /// Counters for trainings performed and artifacts loaded.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            trainings: self.trainings.load(Ordering::Relaxed),
            artifact_loads: self.artifact_loads.load(Ordering::Relaxed),
        }
    }

    /// Serializes `model` into an artifact and overwrites the backend.
    pub fn save(&self, model: &FittedModel) -> Result<()> {
        let bytes = self.encode_artifact(model)?;
        self.storage.write(&bytes).map_err(|err| {
            EnergyError::storage_io(self.storage.location(), "failed to write artifact", err)
        })?;
        debug!(
            location = %self.storage.location(),
            bytes = bytes.len(),
            "model artifact saved"
        );
        Ok(())
    }

    /// Returns the persisted model, training one first if the backend holds
    /// nothing yet.
    ///
    /// Training cost is paid at most once per artifact lifetime; afterwards
    /// every call is a decode of the stored artifact. First-time training is
    /// guarded by a lock, so callers racing on an empty backend block until
    /// the first writer finishes and then load the artifact it produced.
    pub fn load_or_train(&self) -> Result<FittedModel> {
        if let Some(model) = self.try_load()? {
            return Ok(model);
        }

        // A poisoned lock means another caller panicked mid-train; the
        // artifact state is still consistent, so recover and continue.
        let _guard = self
            .train_lock
            .lock()
            .unwrap_or_else(|e| e.into_inner());

        // Double check: another caller may have trained while we waited
        if let Some(model) = self.try_load()? {
            return Ok(model);
        }

        info!(
            samples = self.training.sample_count,
            seed = self.training.seed,
            location = %self.storage.location(),
            "no model artifact found, training from synthetic data"
        );
        let data = dataset::generate(self.training.sample_count, self.training.seed);
        let model = trainer::train(&data)?;
        self.save(&model)?;
        self.trainings.fetch_add(1, Ordering::Relaxed);
        Ok(model)
    }

    fn try_load(&self) -> Result<Option<FittedModel>> {
        let bytes = self.storage.read().map_err(|err| {
            EnergyError::storage_io(self.storage.location(), "failed to read artifact", err)
        })?;
        let Some(bytes) = bytes else {
            return Ok(None);
        };

        let model = self.decode_artifact(&bytes)?;
        self.artifact_loads.fetch_add(1, Ordering::Relaxed);
        debug!(location = %self.storage.location(), "model artifact loaded");
        Ok(Some(model))
    }

    fn encode_artifact(&self, model: &FittedModel) -> Result<Vec<u8>> {
        let location = self.storage.location();
        let model_bytes = serde_json::to_vec(model).map_err(|err| {
            EnergyError::storage(location.as_str(), format!("failed to encode model: {err}"))
        })?;

        let artifact = ModelArtifact {
            schema_version: ARTIFACT_SCHEMA_VERSION,
            model: model.clone(),
            trained_at: chrono::Utc::now().timestamp(),
            training_samples: self.training.sample_count,
            checksum: compute_checksum(&model_bytes),
        };
        serde_json::to_vec_pretty(&artifact).map_err(|err| {
            EnergyError::storage(location.as_str(), format!("failed to encode artifact: {err}"))
        })
    }

    fn decode_artifact(&self, bytes: &[u8]) -> Result<FittedModel> {
        let location = self.storage.location();
        let artifact: ModelArtifact = serde_json::from_slice(bytes).map_err(|err| {
            EnergyError::storage(location.as_str(), format!("artifact is not valid JSON: {err}"))
        })?;

        if artifact.schema_version != ARTIFACT_SCHEMA_VERSION {
            return Err(EnergyError::storage(
                location.as_str(),
                format!(
                    "unsupported artifact schema {} (expected {ARTIFACT_SCHEMA_VERSION})",
                    artifact.schema_version
                ),
            ));
        }

        let model_bytes = serde_json::to_vec(&artifact.model).map_err(|err| {
            EnergyError::storage(location.as_str(), format!("failed to re-encode model: {err}"))
        })?;
        let computed = compute_checksum(&model_bytes);
        if computed != artifact.checksum {
            return Err(EnergyError::storage(
                location.as_str(),
                format!(
                    "checksum mismatch: expected {}, got {computed}",
                    artifact.checksum
                ),
            ));
        }

        Ok(artifact.model)
    }
}

/// Compute SHA256 checksum of data
fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn memory_store() -> ModelStore {
        ModelStore::new(MemoryStorage::new(), TrainingConfig::default())
    }

    #[test]
    fn test_compute_checksum_is_stable() {
        let checksum = compute_checksum(b"coefficients");
        assert_eq!(checksum.len(), 64); // SHA256 hex is 64 chars
        assert_eq!(checksum, compute_checksum(b"coefficients"));
    }

    #[test]
    fn test_first_call_trains_second_call_loads() {
        let store = memory_store();

        let first = store.load_or_train().unwrap();
        assert_eq!(
            store.stats(),
            StoreStats {
                trainings: 1,
                artifact_loads: 0
            }
        );

        let second = store.load_or_train().unwrap();
        assert_eq!(
            store.stats(),
            StoreStats {
                trainings: 1,
                artifact_loads: 1
            }
        );
        assert_eq!(first, second);
    }

    #[test]
    fn test_save_then_load_round_trips_predictions() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("energy_model.json");

        let writer = ModelStore::new(FsStorage::new(&path), TrainingConfig::default());
        let original = writer.load_or_train().unwrap();
        assert!(path.exists());

        // A fresh store against the same path must load, not retrain
        let reader = ModelStore::new(FsStorage::new(&path), TrainingConfig::default());
        let restored = reader.load_or_train().unwrap();
        assert_eq!(reader.stats().trainings, 0);
        assert_eq!(reader.stats().artifact_loads, 1);

        for (hour, temp, weekend) in [(0.0, 20.0, 0.0), (12.0, 30.0, 0.0), (23.0, 39.5, 1.0)] {
            let a = original.predict_raw(hour, temp, weekend);
            let b = restored.predict_raw(hour, temp, weekend);
            assert!((a - b).abs() < 1e-6, "{a} vs {b}");
        }
    }

    #[test]
    fn test_save_overwrites_previous_artifact() {
        let store = memory_store();
        let trained = store.load_or_train().unwrap();

        let replacement = FittedModel {
            intercept: 1.0,
            weights: [0.0, 0.0, 0.0],
        };
        store.save(&replacement).unwrap();

        let loaded = store.load_or_train().unwrap();
        assert_eq!(loaded, replacement);
        assert_ne!(loaded, trained);
    }

    #[test]
    fn test_corrupt_artifact_is_storage_error() {
        let storage = MemoryStorage::new();
        storage.write(b"definitely not json").unwrap();

        let store = ModelStore::new(storage, TrainingConfig::default());
        let err = store.load_or_train().unwrap_err();
        assert!(
            matches!(err, EnergyError::StorageUnavailable { .. }),
            "got {err}"
        );
        // And it must not have retrained over the corrupt artifact
        assert_eq!(store.stats().trainings, 0);
    }

    #[test]
    fn test_tampered_coefficients_fail_checksum() {
        let store = memory_store();
        store.load_or_train().unwrap();

        // Rewrite the artifact with a bumped intercept but the old checksum
        let bytes = store.storage.read().unwrap().unwrap();
        let mut artifact: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        artifact["model"]["intercept"] = serde_json::json!(9999.0);
        store
            .storage
            .write(&serde_json::to_vec(&artifact).unwrap())
            .unwrap();

        let err = store.load_or_train().unwrap_err();
        match err {
            EnergyError::StorageUnavailable { reason, .. } => {
                assert!(reason.contains("checksum"), "reason was '{reason}'")
            }
            other => panic!("expected StorageUnavailable, got {other}"),
        }
    }

    #[test]
    fn test_unknown_schema_version_is_rejected() {
        let store = memory_store();
        store.load_or_train().unwrap();

        let bytes = store.storage.read().unwrap().unwrap();
        let mut artifact: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        artifact["schema_version"] = serde_json::json!(99);
        store
            .storage
            .write(&serde_json::to_vec(&artifact).unwrap())
            .unwrap();

        let err = store.load_or_train().unwrap_err();
        match err {
            EnergyError::StorageUnavailable { reason, .. } => {
                assert!(reason.contains("schema"), "reason was '{reason}'")
            }
            other => panic!("expected StorageUnavailable, got {other}"),
        }
    }

    #[test]
    fn test_concurrent_first_callers_train_exactly_once() {
        let store = Arc::new(ModelStore::new(
            MemoryStorage::new(),
            // Small dataset keeps the race window wide relative to the fit
            TrainingConfig {
                sample_count: 64,
                seed: DEFAULT_SEED,
            },
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.load_or_train().unwrap())
            })
            .collect();

        let models: Vec<FittedModel> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(store.stats().trainings, 1);
        for model in &models {
            assert_eq!(model, &models[0]);
        }
    }

    #[test]
    fn test_fs_storage_missing_file_reads_none() {
        let tmp = TempDir::new().unwrap();
        let storage = FsStorage::new(tmp.path().join("absent.json"));
        assert!(storage.read().unwrap().is_none());
    }

    #[test]
    fn test_fs_storage_creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/dir/model.json");
        let storage = FsStorage::new(&path);
        storage.write(b"{}").unwrap();
        assert_eq!(storage.read().unwrap().unwrap(), b"{}");
    }
}
