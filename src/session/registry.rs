use std::sync::Arc;

use ahash::AHashMap;
use anyhow::{anyhow, Result};
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::config::EngineConfig;
use crate::region::Granularity;

use super::{IndexCatalog, Session};

/// Open sessions by layer id, each behind its own mutex.
pub struct SessionRegistry {
    catalog: Arc<IndexCatalog>,
    config: EngineConfig,
    sessions: RwLock<AHashMap<String, Arc<Mutex<Session>>>>,
}

impl SessionRegistry {
    pub fn new(catalog: Arc<IndexCatalog>, config: EngineConfig) -> Self {
        Self { catalog, config, sessions: RwLock::new(AHashMap::new()) }
    }

    #[inline] pub fn catalog(&self) -> &Arc<IndexCatalog> { &self.catalog }

    /// The session for `layer_id`, opened on the current `granularity` index if it is not
    /// open yet. An already open session is returned as is, whatever its granularity.
    pub fn open(&self, layer_id: &str, granularity: Granularity) -> Result<Arc<Mutex<Session>>> {
        if let Some(session) = self.sessions.read().get(layer_id) {
            return Ok(session.clone());
        }

        let index = self.catalog.get(granularity)
            .ok_or_else(|| anyhow!("no {granularity} dataset loaded"))?;

        let mut sessions = self.sessions.write();
        // Another caller may have opened it between the two locks.
        let session = sessions.entry(layer_id.to_string())
            .or_insert_with(|| {
                debug!(layer = layer_id, %granularity, "opening session");
                Arc::new(Mutex::new(Session::new(layer_id, index, self.config.clone())))
            })
            .clone();
        Ok(session)
    }

    pub fn get(&self, layer_id: &str) -> Option<Arc<Mutex<Session>>> {
        self.sessions.read().get(layer_id).cloned()
    }

    /// Forget a session. Holders of its handle may keep using it.
    pub fn close(&self, layer_id: &str) -> Option<Arc<Mutex<Session>>> {
        self.sessions.write().remove(layer_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// Open layer ids, sorted.
    pub fn layer_ids(&self) -> Vec<String> {
        let mut ids = self.sessions.read().keys().cloned().collect::<Vec<_>>();
        ids.sort_unstable();
        ids
    }
}
