//! Donation history state.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use tracing::warn;

use crate::backend::{BackendResult, DonationBackend};
use crate::models::{
    Donation, DonationFilterOverrides, DonationFilters, DonationUpdate, NewDonation,
};
use crate::services::validate_donation;

use super::debounce::Debouncer;

const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Default)]
pub struct DonationState {
    pub items: Vec<Donation>,
    pub selected: Option<Donation>,
    pub filters: DonationFilters,
    pub is_loading: bool,
    pub error: Option<String>,
}

pub struct DonationStore {
    backend: Arc<dyn DonationBackend>,
    state: RwLock<DonationState>,
    search_debounce: Debouncer,
}

impl DonationStore {
    pub fn new(backend: Arc<dyn DonationBackend>) -> Self {
        Self {
            backend,
            state: RwLock::new(DonationState::default()),
            search_debounce: Debouncer::new(SEARCH_DEBOUNCE),
        }
    }

    pub fn snapshot(&self) -> DonationState {
        self.state.read().unwrap().clone()
    }

    pub fn clear_error(&self) {
        self.state.write().unwrap().error = None;
    }

    pub fn set_selected(&self, donation: Option<Donation>) {
        self.state.write().unwrap().selected = donation;
    }

    pub fn set_filters(&self, filters: DonationFilters) {
        self.state.write().unwrap().filters = filters;
    }

    fn begin_loading(&self) -> DonationFilters {
        let mut state = self.state.write().unwrap();
        state.is_loading = true;
        state.error = None;
        state.filters
    }

    fn record_failure(&self, err: &crate::backend::BackendError) {
        let mut state = self.state.write().unwrap();
        state.is_loading = false;
        state.error = Some(err.to_string());
    }

    /// Fetch the donation list; overrides merge over the stored filters.
    pub async fn fetch(&self, overrides: DonationFilterOverrides) -> BackendResult<Vec<Donation>> {
        let filters = self.begin_loading().merged_with(&overrides);
        self.state.write().unwrap().filters = filters;

        match self.backend.list(&filters).await {
            Ok(donations) => {
                let mut state = self.state.write().unwrap();
                state.items = donations.clone();
                state.is_loading = false;
                Ok(donations)
            }
            Err(err) => {
                warn!(error = %err, "donation fetch failed");
                self.record_failure(&err);
                Err(err)
            }
        }
    }

    pub async fn fetch_one(&self, id: i64) -> BackendResult<Donation> {
        self.begin_loading();
        match self.backend.get(id).await {
            Ok(donation) => {
                let mut state = self.state.write().unwrap();
                state.selected = Some(donation.clone());
                state.is_loading = false;
                Ok(donation)
            }
            Err(err) => {
                self.record_failure(&err);
                Err(err)
            }
        }
    }

    /// Validate and record a donation for a donor; prepends the result.
    pub async fn create(&self, donor_id: i64, draft: &NewDonation) -> BackendResult<Donation> {
        validate_donation(draft)?;
        self.begin_loading();
        match self.backend.create(donor_id, draft).await {
            Ok(donation) => {
                let mut state = self.state.write().unwrap();
                state.items.insert(0, donation.clone());
                state.is_loading = false;
                Ok(donation)
            }
            Err(err) => {
                self.record_failure(&err);
                Err(err)
            }
        }
    }

    pub async fn update(&self, id: i64, update: &DonationUpdate) -> BackendResult<Donation> {
        self.begin_loading();
        match self.backend.update(id, update).await {
            Ok(donation) => {
                let mut state = self.state.write().unwrap();
                if let Some(existing) = state.items.iter_mut().find(|d| d.donation_id == id) {
                    *existing = donation.clone();
                }
                if state.selected.as_ref().map(|d| d.donation_id) == Some(id) {
                    state.selected = Some(donation.clone());
                }
                state.is_loading = false;
                Ok(donation)
            }
            Err(err) => {
                self.record_failure(&err);
                Err(err)
            }
        }
    }

    /// Bulk import from a spreadsheet file; returns the raw import report.
    pub async fn upload(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> BackendResult<serde_json::Value> {
        self.begin_loading();
        match self.backend.upload(filename, bytes).await {
            Ok(report) => {
                self.state.write().unwrap().is_loading = false;
                Ok(report)
            }
            Err(err) => {
                self.record_failure(&err);
                Err(err)
            }
        }
    }

    /// Fetch-then-filter search over donor name/email, collection site and
    /// blood type. An empty term is a plain fetch.
    pub async fn search(&self, term: &str) -> BackendResult<Vec<Donation>> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return self.fetch(DonationFilterOverrides::default()).await;
        }

        let filters = self.begin_loading();
        match self.backend.list(&filters).await {
            Ok(donations) => {
                let matched: Vec<Donation> = donations
                    .into_iter()
                    .filter(|d| donation_matches(d, &term))
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

    /// Debounced search. Returns `None` when superseded by a newer call.
    pub async fn search_debounced(&self, term: &str) -> BackendResult<Option<Vec<Donation>>> {
        if !self.search_debounce.wait().await {
            return Ok(None);
        }
        self.search(term).await.map(Some)
    }
}

fn donation_matches(donation: &Donation, term: &str) -> bool {
    let donor_fields = donation.donor.as_ref().map(|donor| {
        (
            donor.full_name.to_lowercase(),
            donor.email.as_deref().map(str::to_lowercase),
        )
    });
    if let Some((name, email)) = &donor_fields {
        if name.contains(term) || email.as_deref().is_some_and(|e| e.contains(term)) {
            return true;
        }
    }
    if donation.collection_site.to_lowercase().contains(term) {
        return true;
    }
    donation
        .blood_type
        .map(|bt| bt.as_str().to_lowercase().contains(term))
        .unwrap_or(false)
}
