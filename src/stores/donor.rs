//! Donor registry state.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use tracing::warn;

use crate::backend::{BackendResult, DonorBackend};
use crate::models::{BloodType, Donor, DonorFilterOverrides, DonorFilters, DonorUpdate, NewDonor};
use crate::services::{donor_stats, validate_donor, DonorStats};

use super::debounce::Debouncer;

const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Default)]
pub struct DonorState {
    pub items: Vec<Donor>,
    pub selected: Option<Donor>,
    pub filters: DonorFilters,
    pub is_loading: bool,
    pub error: Option<String>,
}

pub struct DonorStore {
    backend: Arc<dyn DonorBackend>,
    state: RwLock<DonorState>,
    search_debounce: Debouncer,
}

impl DonorStore {
    pub fn new(backend: Arc<dyn DonorBackend>) -> Self {
        Self {
            backend,
            state: RwLock::new(DonorState::default()),
            search_debounce: Debouncer::new(SEARCH_DEBOUNCE),
        }
    }

    pub fn snapshot(&self) -> DonorState {
        self.state.read().unwrap().clone()
    }

    pub fn clear_error(&self) {
        self.state.write().unwrap().error = None;
    }

    pub fn set_selected(&self, donor: Option<Donor>) {
        self.state.write().unwrap().selected = donor;
    }

    /// Replace the stored filters without fetching.
    pub fn set_filters(&self, filters: DonorFilters) {
        self.state.write().unwrap().filters = filters;
    }

    fn begin_loading(&self) -> DonorFilters {
        let mut state = self.state.write().unwrap();
        state.is_loading = true;
        state.error = None;
        state.filters.clone()
    }

    fn record_failure(&self, err: &crate::backend::BackendError) {
        let mut state = self.state.write().unwrap();
        state.is_loading = false;
        state.error = Some(err.to_string());
    }

    /// Fetch the donor list. Per-call overrides merge over the stored
    /// filters and the merged result becomes the new stored filters. A
    /// failed fetch keeps the previously fetched items.
    pub async fn fetch(&self, overrides: DonorFilterOverrides) -> BackendResult<Vec<Donor>> {
        let filters = self.begin_loading().merged_with(&overrides);
        self.state.write().unwrap().filters = filters.clone();

        match self.backend.list(&filters).await {
            Ok(donors) => {
                let mut state = self.state.write().unwrap();
                state.items = donors.clone();
                state.is_loading = false;
                Ok(donors)
            }
            Err(err) => {
                warn!(error = %err, "donor fetch failed");
                self.record_failure(&err);
                Err(err)
            }
        }
    }

    /// Fetch one donor and select it.
    pub async fn fetch_one(&self, id: i64) -> BackendResult<Donor> {
        self.begin_loading();
        match self.backend.get(id).await {
            Ok(donor) => {
                let mut state = self.state.write().unwrap();
                state.selected = Some(donor.clone());
                state.is_loading = false;
                Ok(donor)
            }
            Err(err) => {
                self.record_failure(&err);
                Err(err)
            }
        }
    }

    /// Validate and create a donor; the new record is prepended locally.
    pub async fn create(&self, draft: &NewDonor) -> BackendResult<Donor> {
        validate_donor(draft)?;
        self.begin_loading();
        match self.backend.create(draft).await {
            Ok(donor) => {
                let mut state = self.state.write().unwrap();
                state.items.insert(0, donor.clone());
                state.is_loading = false;
                Ok(donor)
            }
            Err(err) => {
                self.record_failure(&err);
                Err(err)
            }
        }
    }

    /// Update a donor in place; also refreshes `selected` when it matches.
    pub async fn update(&self, id: i64, update: &DonorUpdate) -> BackendResult<Donor> {
        self.begin_loading();
        match self.backend.update(id, update).await {
            Ok(donor) => {
                let mut state = self.state.write().unwrap();
                if let Some(existing) = state.items.iter_mut().find(|d| d.id == id) {
                    *existing = donor.clone();
                }
                if state.selected.as_ref().map(|d| d.id) == Some(id) {
                    state.selected = Some(donor.clone());
                }
                state.is_loading = false;
                Ok(donor)
            }
            Err(err) => {
                self.record_failure(&err);
                Err(err)
            }
        }
    }

    pub async fn delete(&self, id: i64) -> BackendResult<()> {
        self.begin_loading();
        match self.backend.delete(id).await {
            Ok(()) => {
                let mut state = self.state.write().unwrap();
                state.items.retain(|d| d.id != id);
                if state.selected.as_ref().map(|d| d.id) == Some(id) {
                    state.selected = None;
                }
                state.is_loading = false;
                Ok(())
            }
            Err(err) => {
                self.record_failure(&err);
                Err(err)
            }
        }
    }

    /// Flip a donor's eligibility flag.
    pub async fn toggle_eligibility(&self, id: i64) -> BackendResult<Donor> {
        let current = {
            let state = self.state.read().unwrap();
            state
                .items
                .iter()
                .find(|d| d.id == id)
                .map(|d| d.is_eligible)
        };
        let is_eligible = match current {
            Some(flag) => !flag,
            None => self.backend.get(id).await.map(|d| !d.is_eligible)?,
        };
        self.update(
            id,
            &DonorUpdate {
                is_eligible: Some(is_eligible),
                ..DonorUpdate::default()
            },
        )
        .await
    }

    /// Fetch-then-filter search over name, email, phone and location. An
    /// empty term is a plain fetch.
    pub async fn search(&self, term: &str) -> BackendResult<Vec<Donor>> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return self.fetch(DonorFilterOverrides::default()).await;
        }

        let filters = self.begin_loading();
        match self.backend.list(&filters).await {
            Ok(donors) => {
                let matched: Vec<Donor> = donors
                    .into_iter()
                    .filter(|d| donor_matches(d, &term))
                    .collect();
                let mut state = self.state.write().unwrap();
                state.items = matched.clone();
                state.is_loading = false;
                Ok(matched)
            }
            Err(err) => {
                self.record_failure(&err);
                Err(err)
            }
        }
    }

    /// Debounced search. Returns `None` when a newer keystroke superseded
    /// this call before its debounce window elapsed.
    pub async fn search_debounced(&self, term: &str) -> BackendResult<Option<Vec<Donor>>> {
        if !self.search_debounce.wait().await {
            return Ok(None);
        }
        self.search(term).await.map(Some)
    }

    /// Aggregate counters over the currently fetched donors.
    pub fn stats(&self) -> DonorStats {
        donor_stats(&self.state.read().unwrap().items)
    }

    /// Currently fetched donors of one blood type.
    pub fn by_blood_type(&self, blood_type: BloodType) -> Vec<Donor> {
        self.state
            .read()
            .unwrap()
            .items
            .iter()
            .filter(|d| d.blood_type == blood_type)
            .cloned()
            .collect()
    }
}

fn donor_matches(donor: &Donor, term: &str) -> bool {
    let fields = [
        Some(donor.full_name.as_str()),
        donor.email.as_deref(),
        donor.phone.as_deref(),
        donor.location.as_deref(),
    ];
    fields
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(term))
}
