use std::{collections::BTreeMap, fs, path::{Path, PathBuf}};

use ahash::AHashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of the layer storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("layer {0:?} not found")]
    NotFound(String),
    #[error("layer storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("layer storage is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Persisted state of one layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerRecord {
    pub postal_codes: Vec<String>,
}

/// Where layer selections are persisted. Only called at explicit save and load points.
pub trait LayerStore: Send + Sync {
    fn get_layer(&self, layer_id: &str) -> Result<LayerRecord, StoreError>;

    fn set_layer_codes(&self, layer_id: &str, codes: &[String]) -> Result<(), StoreError>;
}

/// In-process store, for tests and embedding hosts that persist elsewhere.
#[derive(Debug, Default)]
pub struct MemoryLayerStore {
    layers: Mutex<AHashMap<String, LayerRecord>>,
    writes: Mutex<usize>,
}

impl MemoryLayerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `set_layer_codes` calls.
    pub fn writes(&self) -> usize {
        *self.writes.lock()
    }
}

impl LayerStore for MemoryLayerStore {
    fn get_layer(&self, layer_id: &str) -> Result<LayerRecord, StoreError> {
        self.layers.lock().get(layer_id).cloned()
            .ok_or_else(|| StoreError::NotFound(layer_id.to_string()))
    }

    fn set_layer_codes(&self, layer_id: &str, codes: &[String]) -> Result<(), StoreError> {
        self.layers.lock().insert(layer_id.to_string(), LayerRecord { postal_codes: codes.to_vec() });
        *self.writes.lock() += 1;
        Ok(())
    }
}

/// One JSON document mapping layer id to its record. Writes go through a temporary file
/// in the same directory and are renamed into place.
#[derive(Debug)]
pub struct JsonFileLayerStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileLayerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, LayerRecord>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, layers: &BTreeMap<String, LayerRecord>) -> Result<(), StoreError> {
        let text = serde_json::to_string_pretty(layers)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl LayerStore for JsonFileLayerStore {
    fn get_layer(&self, layer_id: &str) -> Result<LayerRecord, StoreError> {
        let _guard = self.lock.lock();
        self.read_all()?.remove(layer_id)
            .ok_or_else(|| StoreError::NotFound(layer_id.to_string()))
    }

    fn set_layer_codes(&self, layer_id: &str, codes: &[String]) -> Result<(), StoreError> {
        let _guard = self.lock.lock();
        let mut layers = self.read_all()?;
        layers.insert(layer_id.to_string(), LayerRecord { postal_codes: codes.to_vec() });
        self.write_all(&layers)
    }
}
