//! Blood stock (inventory) state.

use std::sync::{Arc, RwLock};

use chrono::Utc;
use tracing::warn;

use crate::backend::{BackendResult, StockBackend};
use crate::models::{BloodType, StockStatus, StockUnit, EXPIRY_WARNING_DAYS};
use crate::services::{expiring_stocks, stock_stats, StockStats};

#[derive(Debug, Clone, Default)]
pub struct StockState {
    pub items: Vec<StockUnit>,
    pub selected: Option<StockUnit>,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// Wildcard-style filter for the stock table; `None` matches everything.
#[derive(Debug, Clone, Default)]
pub struct StockFilter {
    pub blood_type: Option<BloodType>,
    pub status: Option<StockStatus>,
    pub location: Option<String>,
}

pub struct StockStore {
    backend: Arc<dyn StockBackend>,
    state: RwLock<StockState>,
}

impl StockStore {
    pub fn new(backend: Arc<dyn StockBackend>) -> Self {
        Self {
            backend,
            state: RwLock::new(StockState::default()),
        }
    }

    pub fn snapshot(&self) -> StockState {
        self.state.read().unwrap().clone()
    }

    pub fn clear_error(&self) {
        self.state.write().unwrap().error = None;
    }

    pub fn set_selected(&self, unit: Option<StockUnit>) {
        self.state.write().unwrap().selected = unit;
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

    pub async fn fetch(&self) -> BackendResult<Vec<StockUnit>> {
        self.begin_loading();
        match self.backend.list().await {
            Ok(stocks) => {
                let mut state = self.state.write().unwrap();
                state.items = stocks.clone();
                state.is_loading = false;
                Ok(stocks)
            }
            Err(err) => {
                warn!(error = %err, "stock fetch failed");
                self.record_failure(&err);
                Err(err)
            }
        }
    }

    pub async fn fetch_one(&self, id: i64) -> BackendResult<StockUnit> {
        self.begin_loading();
        match self.backend.get(id).await {
            Ok(unit) => {
                let mut state = self.state.write().unwrap();
                state.selected = Some(unit.clone());
                state.is_loading = false;
                Ok(unit)
            }
            Err(err) => {
                self.record_failure(&err);
                Err(err)
            }
        }
    }

    /// Change a unit's status and replace it locally.
    pub async fn update_status(&self, id: i64, status: StockStatus) -> BackendResult<StockUnit> {
        self.begin_loading();
        match self.backend.update_status(id, status).await {
            Ok(unit) => {
                let mut state = self.state.write().unwrap();
                if let Some(existing) = state.items.iter_mut().find(|s| s.id == id) {
                    *existing = unit.clone();
                }
                if state.selected.as_ref().map(|s| s.id) == Some(id) {
                    state.selected = Some(unit.clone());
                }
                state.is_loading = false;
                Ok(unit)
            }
            Err(err) => {
                self.record_failure(&err);
                Err(err)
            }
        }
    }

    pub async fn reserve(&self, id: i64) -> BackendResult<StockUnit> {
        self.update_status(id, StockStatus::Reserved).await
    }

    pub async fn make_available(&self, id: i64) -> BackendResult<StockUnit> {
        self.update_status(id, StockStatus::Available).await
    }

    pub async fn mark_used(&self, id: i64) -> BackendResult<StockUnit> {
        self.update_status(id, StockStatus::Used).await
    }

    pub async fn mark_expired(&self, id: i64) -> BackendResult<StockUnit> {
        self.update_status(id, StockStatus::Expired).await
    }

    /// Currently fetched units matching every set filter field.
    pub fn filtered(&self, filter: &StockFilter) -> Vec<StockUnit> {
        let location = filter.location.as_deref().map(str::to_lowercase);
        self.state
            .read()
            .unwrap()
            .items
            .iter()
            .filter(|unit| {
                filter.blood_type.map_or(true, |bt| unit.blood_type == bt)
                    && filter.status.map_or(true, |s| unit.status == s)
                    && location.as_deref().map_or(true, |loc| {
                        unit.location
                            .as_deref()
                            .map(|l| l.to_lowercase().contains(loc))
                            .unwrap_or(false)
                    })
            })
            .cloned()
            .collect()
    }

    /// Aggregate counters over the currently fetched units.
    pub fn stats(&self) -> StockStats {
        stock_stats(&self.state.read().unwrap().items)
    }

    /// Units expiring within the warning window, soonest first.
    pub fn expiring_soon(&self) -> Vec<StockUnit> {
        expiring_stocks(
            &self.state.read().unwrap().items,
            Utc::now(),
            EXPIRY_WARNING_DAYS,
        )
    }
}
