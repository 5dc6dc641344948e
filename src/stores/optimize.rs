//! Inventory-optimization state with stale-response protection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

use crate::backend::{BackendResult, OptimizeBackend};
use crate::models::{ForecastPeriod, Optimization};
use crate::services::{optimization_summary, OptimizationSummary};

#[derive(Debug, Clone)]
pub struct OptimizeState {
    pub current: Option<Optimization>,
    pub period: ForecastPeriod,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl Default for OptimizeState {
    fn default() -> Self {
        Self {
            current: None,
            period: ForecastPeriod::OneDay,
            is_loading: false,
            error: None,
        }
    }
}

/// Optimization store; same generation-counting stale guard as the
/// forecast store.
pub struct OptimizeStore {
    backend: Arc<dyn OptimizeBackend>,
    state: RwLock<OptimizeState>,
    generation: AtomicU64,
}

impl OptimizeStore {
    pub fn new(backend: Arc<dyn OptimizeBackend>) -> Self {
        Self {
            backend,
            state: RwLock::new(OptimizeState::default()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> OptimizeState {
        self.state.read().unwrap().clone()
    }

    pub fn clear_error(&self) {
        self.state.write().unwrap().error = None;
    }

    pub fn clear_data(&self) {
        let mut state = self.state.write().unwrap();
        state.current = None;
        state.error = None;
        state.is_loading = false;
    }

    fn begin(&self, period: ForecastPeriod) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let mut state = self.state.write().unwrap();
        state.period = period;
        state.is_loading = true;
        state.error = None;
        generation
    }

    fn publish(
        &self,
        generation: u64,
        result: BackendResult<Optimization>,
    ) -> BackendResult<Option<Optimization>> {
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("discarding superseded optimization response");
            return Ok(None);
        }
        match result {
            Ok(optimization) => {
                let mut state = self.state.write().unwrap();
                state.current = Some(optimization.clone());
                state.is_loading = false;
                Ok(Some(optimization))
            }
            Err(err) => {
                warn!(error = %err, "optimization request failed");
                let mut state = self.state.write().unwrap();
                state.is_loading = false;
                state.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Re-run the optimization. Returns `None` when superseded.
    pub async fn run(&self, period: ForecastPeriod) -> BackendResult<Option<Optimization>> {
        let generation = self.begin(period);
        let result = self.backend.run(period).await;
        self.publish(generation, result)
    }

    /// Load the last stored optimization for a period.
    pub async fn fetch_latest(
        &self,
        period: ForecastPeriod,
    ) -> BackendResult<Option<Optimization>> {
        let generation = self.begin(period);
        let result = self.backend.latest(period).await;
        self.publish(generation, result)
    }

    /// Summary of the published optimization for the active period.
    pub fn summary(&self) -> OptimizationSummary {
        let state = self.state.read().unwrap();
        match &state.current {
            Some(optimization) => optimization_summary(optimization, state.period),
            None => OptimizationSummary::default(),
        }
    }
}
