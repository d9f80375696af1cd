//! Shared handler state: the record store and the drug information source.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use medtrack_core::{DrugInfoSource, RecordStore};

use crate::error::ApiError;

pub type DynStore = dyn RecordStore + Send + Sync;

#[derive(Clone)]
pub struct AppState {
    store: Arc<RwLock<DynStore>>,
    pub drug_info: Arc<dyn DrugInfoSource>,
}

impl AppState {
    pub fn new<S>(store: S, drug_info: Arc<dyn DrugInfoSource>) -> Self
    where
        S: RecordStore + Send + Sync + 'static,
    {
        let store: Arc<RwLock<DynStore>> = Arc::new(RwLock::new(store));
        Self { store, drug_info }
    }

    pub fn read_store(&self) -> Result<RwLockReadGuard<'_, DynStore>, ApiError> {
        self.store
            .read()
            .map_err(|_| ApiError::Internal("store lock poisoned".into()))
    }

    pub fn write_store(&self) -> Result<RwLockWriteGuard<'_, DynStore>, ApiError> {
        self.store
            .write()
            .map_err(|_| ApiError::Internal("store lock poisoned".into()))
    }
}
