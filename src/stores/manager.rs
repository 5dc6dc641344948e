//! Staff account (blood manager) state.

use std::sync::{Arc, RwLock};

use tracing::warn;

use crate::backend::{BackendResult, ManagerBackend};
use crate::models::{Manager, ManagerUpdate, NewManager};
use crate::services::validate_manager_registration;

#[derive(Debug, Clone, Default)]
pub struct ManagerState {
    pub items: Vec<Manager>,
    pub selected: Option<Manager>,
    pub is_loading: bool,
    pub error: Option<String>,
}

pub struct ManagerStore {
    backend: Arc<dyn ManagerBackend>,
    state: RwLock<ManagerState>,
}

impl ManagerStore {
    pub fn new(backend: Arc<dyn ManagerBackend>) -> Self {
        Self {
            backend,
            state: RwLock::new(ManagerState::default()),
        }
    }

    pub fn snapshot(&self) -> ManagerState {
        self.state.read().unwrap().clone()
    }

    pub fn clear_error(&self) {
        self.state.write().unwrap().error = None;
    }

    pub fn set_selected(&self, manager: Option<Manager>) {
        self.state.write().unwrap().selected = manager;
    }

    fn begin_loading(&self) {
        let mut state = self.state.write().unwrap();
        state.is_loading = true;
        state.error = None;
    }

    fn record_failure(&self, err: &crate::backend::BackendError) {
        let mut state = self.state.write().unwrap();
        state.is_loading = false;
        state.error = Some(err.to_string());
    }

    pub async fn fetch(&self) -> BackendResult<Vec<Manager>> {
        self.begin_loading();
        match self.backend.list().await {
            Ok(managers) => {
                let mut state = self.state.write().unwrap();
                state.items = managers.clone();
                state.is_loading = false;
                Ok(managers)
            }
            Err(err) => {
                warn!(error = %err, "manager fetch failed");
                self.record_failure(&err);
                Err(err)
            }
        }
    }

    pub async fn fetch_one(&self, id: i64) -> BackendResult<Manager> {
        self.begin_loading();
        match self.backend.get(id).await {
            Ok(manager) => {
                let mut state = self.state.write().unwrap();
                state.selected = Some(manager.clone());
                state.is_loading = false;
                Ok(manager)
            }
            Err(err) => {
                self.record_failure(&err);
                Err(err)
            }
        }
    }

    /// Validate and register a new staff account; appends the record.
    pub async fn register(
        &self,
        draft: &NewManager,
        password_confirmation: &str,
    ) -> BackendResult<Manager> {
        validate_manager_registration(draft, password_confirmation)?;
        self.begin_loading();
        match self.backend.register(draft).await {
            Ok(manager) => {
                let mut state = self.state.write().unwrap();
                state.items.push(manager.clone());
                state.is_loading = false;
                Ok(manager)
            }
            Err(err) => {
                self.record_failure(&err);
                Err(err)
            }
        }
    }

    pub async fn update(&self, id: i64, update: &ManagerUpdate) -> BackendResult<Manager> {
        self.begin_loading();
        match self.backend.update(id, update).await {
            Ok(manager) => {
                let mut state = self.state.write().unwrap();
                if let Some(existing) = state.items.iter_mut().find(|m| m.id == id) {
                    *existing = manager.clone();
                }
                if state.selected.as_ref().map(|m| m.id) == Some(id) {
                    state.selected = Some(manager.clone());
                }
                state.is_loading = false;
                Ok(manager)
            }
            Err(err) => {
                self.record_failure(&err);
                Err(err)
            }
        }
    }

    /// Drop a record from local state without a backend call. There is no
    /// delete endpoint; deactivation happens elsewhere.
    pub fn remove_from_state(&self, id: i64) {
        let mut state = self.state.write().unwrap();
        state.items.retain(|m| m.id != id);
        if state.selected.as_ref().map(|m| m.id) == Some(id) {
            state.selected = None;
        }
    }
}
