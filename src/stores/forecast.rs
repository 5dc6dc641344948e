//! Demand-forecast state with stale-response protection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

use crate::backend::{BackendResult, ForecastBackend};
use crate::models::{Forecast, ForecastPeriod};
use crate::services::{forecast_summary, ForecastSummary};

#[derive(Debug, Clone)]
pub struct ForecastState {
    pub current: Option<Forecast>,
    pub period: ForecastPeriod,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl Default for ForecastState {
    fn default() -> Self {
        Self {
            current: None,
            period: ForecastPeriod::OneDay,
            is_loading: false,
            error: None,
        }
    }
}

/// Forecast store.
///
/// Every request bumps a generation counter; a response belonging to an
/// older generation is discarded, so rapid period switches can never
/// publish a stale payload over a newer one.
pub struct ForecastStore {
    backend: Arc<dyn ForecastBackend>,
    state: RwLock<ForecastState>,
    generation: AtomicU64,
}

impl ForecastStore {
    pub fn new(backend: Arc<dyn ForecastBackend>) -> Self {
        Self {
            backend,
            state: RwLock::new(ForecastState::default()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> ForecastState {
        self.state.read().unwrap().clone()
    }

    pub fn clear_error(&self) {
        self.state.write().unwrap().error = None;
    }

    /// Drop the published forecast, e.g. when leaving the analytics page.
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

    fn is_stale(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) != generation
    }

    fn publish(
        &self,
        generation: u64,
        result: BackendResult<Forecast>,
    ) -> BackendResult<Option<Forecast>> {
        if self.is_stale(generation) {
            debug!("discarding superseded forecast response");
            return Ok(None);
        }
        match result {
            Ok(forecast) => {
                let mut state = self.state.write().unwrap();
                state.current = Some(forecast.clone());
                state.is_loading = false;
                Ok(Some(forecast))
            }
            Err(err) => {
                warn!(error = %err, "forecast request failed");
                let mut state = self.state.write().unwrap();
                state.is_loading = false;
                state.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Re-run the prediction for a period. Returns `None` when a newer
    /// request superseded this one.
    pub async fn predict(&self, period: ForecastPeriod) -> BackendResult<Option<Forecast>> {
        let generation = self.begin(period);
        let result = match period {
            ForecastPeriod::OneDay => self.backend.predict_today().await,
            ForecastPeriod::SevenDays => self.backend.predict_next_7_days().await,
        };
        self.publish(generation, result)
    }

    /// Load the last stored forecast for a period.
    pub async fn fetch_latest(&self, period: ForecastPeriod) -> BackendResult<Option<Forecast>> {
        let generation = self.begin(period);
        let result = self.backend.latest(period).await;
        self.publish(generation, result)
    }

    /// Summary of the published forecast; empty summary when none.
    pub fn summary(&self) -> ForecastSummary {
        let state = self.state.read().unwrap();
        match &state.current {
            Some(forecast) => forecast_summary(forecast),
            None => forecast_summary(&Forecast::Daily(Default::default())),
        }
    }
}
