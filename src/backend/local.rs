//! In-memory backend implementation.
//!
//! Implements every backend trait over plain in-memory collections, giving
//! tests and local development fast, deterministic, isolated execution. The
//! health flag turns every call into a transport failure, which is how tests
//! exercise the "backend unreachable" paths, and the verify-call counter
//! makes the session controller's single-flight guarantee observable.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::error::{BackendError, BackendResult};
use super::traits::*;
use crate::models::*;

#[derive(Default)]
struct LocalData {
    // email -> (password, user)
    accounts: HashMap<String, (String, User)>,
    // issued bearer token -> user email
    issued_tokens: HashMap<String, String>,

    donors: Vec<Donor>,
    donations: Vec<Donation>,
    stocks: Vec<StockUnit>,
    managers: Vec<Manager>,

    daily_forecast: Option<Forecast>,
    weekly_forecast: Option<Forecast>,
    daily_optimization: Option<Optimization>,
    weekly_optimization: Option<Optimization>,

    next_donor_id: i64,
    next_donation_id: i64,
    next_stock_id: i64,
    next_manager_id: i64,
    next_token: u64,

    healthy: bool,
    verify_calls: u64,
}

/// In-memory implementation of all backend traits.
#[derive(Clone)]
pub struct LocalBackend {
    data: Arc<RwLock<LocalData>>,
}

impl Default for LocalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalBackend {
    /// Create an empty, healthy backend.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData {
                next_donor_id: 1,
                next_donation_id: 1,
                next_stock_id: 1,
                next_manager_id: 1,
                next_token: 1,
                healthy: true,
                ..Default::default()
            })),
        }
    }

    fn guard(&self) -> BackendResult<()> {
        if self.data.read().unwrap().healthy {
            Ok(())
        } else {
            Err(BackendError::Network("connection refused".to_string()))
        }
    }

    /// Toggle reachability: while unhealthy, every call fails with `Network`.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().unwrap().healthy = healthy;
    }

    /// Register a login account.
    pub fn add_account(&self, email: &str, password: &str, role: Role) {
        let user = User {
            email: email.to_string(),
            role,
            full_name: None,
        };
        self.data
            .write()
            .unwrap()
            .accounts
            .insert(email.to_string(), (password.to_string(), user));
    }

    /// Revoke every issued token, as if the sessions expired server-side.
    pub fn revoke_all_tokens(&self) {
        self.data.write().unwrap().issued_tokens.clear();
    }

    /// Number of verify-token calls received so far.
    pub fn verify_call_count(&self) -> u64 {
        self.data.read().unwrap().verify_calls
    }

    /// Seed a donor; the id is assigned and returned.
    pub fn insert_donor(&self, mut donor: Donor) -> i64 {
        let mut data = self.data.write().unwrap();
        donor.id = data.next_donor_id;
        data.next_donor_id += 1;
        let id = donor.id;
        data.donors.insert(0, donor);
        id
    }

    /// Seed a stock unit; the id is assigned and returned.
    pub fn insert_stock(&self, mut stock: StockUnit) -> i64 {
        let mut data = self.data.write().unwrap();
        stock.id = data.next_stock_id;
        data.next_stock_id += 1;
        let id = stock.id;
        data.stocks.push(stock);
        id
    }

    /// Seed a manager account record; the id is assigned and returned.
    pub fn insert_manager(&self, mut manager: Manager) -> i64 {
        let mut data = self.data.write().unwrap();
        manager.id = data.next_manager_id;
        data.next_manager_id += 1;
        let id = manager.id;
        data.managers.push(manager);
        id
    }

    /// Set the canned forecast for a period.
    pub fn set_forecast(&self, forecast: Forecast) {
        let mut data = self.data.write().unwrap();
        match forecast.period() {
            ForecastPeriod::OneDay => data.daily_forecast = Some(forecast),
            ForecastPeriod::SevenDays => data.weekly_forecast = Some(forecast),
        }
    }

    /// Set the canned optimization for a period.
    pub fn set_optimization(&self, period: ForecastPeriod, optimization: Optimization) {
        let mut data = self.data.write().unwrap();
        match period {
            ForecastPeriod::OneDay => data.daily_optimization = Some(optimization),
            ForecastPeriod::SevenDays => data.weekly_optimization = Some(optimization),
        }
    }

    fn issue_token(data: &mut LocalData, email: &str) -> LoginOutcome {
        let token = format!("local-token-{}", data.next_token);
        data.next_token += 1;
        data.issued_tokens.insert(token.clone(), email.to_string());
        let user = data.accounts[email].1.clone();
        LoginOutcome {
            access_token: token,
            token_type: "bearer".to_string(),
            user,
        }
    }

    fn authenticate(
        data: &mut LocalData,
        email: &str,
        password: &str,
        expected_role: Option<Role>,
    ) -> BackendResult<LoginOutcome> {
        match data.accounts.get(email) {
            Some((stored, user))
                if stored == password
                    && expected_role.map_or(true, |role| user.role == role) =>
            {
                Ok(Self::issue_token(data, email))
            }
            _ => Err(BackendError::Api {
                status: 401,
                message: "Invalid email or password".to_string(),
            }),
        }
    }
}

#[async_trait]
impl AuthBackend for LocalBackend {
    async fn login(&self, credentials: &Credentials) -> BackendResult<LoginOutcome> {
        self.guard()?;
        let mut data = self.data.write().unwrap();
        Self::authenticate(
            &mut data,
            &credentials.email,
            &credentials.password,
            Some(credentials.role),
        )
    }

    async fn verify_token(&self, token: &str) -> BackendResult<User> {
        {
            let mut data = self.data.write().unwrap();
            data.verify_calls += 1;
        }
        // Yield so concurrent validations actually interleave on a
        // current-thread runtime, as a real network round-trip would.
        tokio::task::yield_now().await;
        self.guard()?;
        let data = self.data.read().unwrap();
        match data.issued_tokens.get(token) {
            Some(email) => Ok(data.accounts[email].1.clone()),
            None => Err(BackendError::Unauthorized { status: 401 }),
        }
    }
}

#[async_trait]
impl ManagerBackend for LocalBackend {
    async fn login(&self, email: &str, password: &str) -> BackendResult<LoginOutcome> {
        self.guard()?;
        let mut data = self.data.write().unwrap();
        Self::authenticate(&mut data, email, password, Some(Role::BloodManager))
    }

    async fn register(&self, manager: &NewManager) -> BackendResult<Manager> {
        self.guard()?;
        let mut data = self.data.write().unwrap();
        if data.managers.iter().any(|m| m.email == manager.email) {
            return Err(BackendError::Api {
                status: 409,
                message: "Manager with this email already exists".to_string(),
            });
        }
        let record = Manager {
            id: data.next_manager_id,
            full_name: manager.full_name.clone(),
            email: manager.email.clone(),
            phone_number: manager.phone_number.clone(),
            created_at: Some(Utc::now()),
        };
        data.next_manager_id += 1;
        let user = User {
            email: manager.email.clone(),
            role: Role::BloodManager,
            full_name: Some(manager.full_name.clone()),
        };
        data.accounts
            .insert(manager.email.clone(), (manager.password.clone(), user));
        data.managers.push(record.clone());
        Ok(record)
    }

    async fn list(&self) -> BackendResult<Vec<Manager>> {
        self.guard()?;
        Ok(self.data.read().unwrap().managers.clone())
    }

    async fn get(&self, id: i64) -> BackendResult<Manager> {
        self.guard()?;
        self.data
            .read()
            .unwrap()
            .managers
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| BackendError::Api {
                status: 404,
                message: format!("Manager {} not found", id),
            })
    }

    async fn update(&self, id: i64, update: &ManagerUpdate) -> BackendResult<Manager> {
        self.guard()?;
        let mut data = self.data.write().unwrap();
        let manager = data
            .managers
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| BackendError::Api {
                status: 404,
                message: format!("Manager {} not found", id),
            })?;
        if let Some(full_name) = &update.full_name {
            manager.full_name = full_name.clone();
        }
        if let Some(email) = &update.email {
            manager.email = email.clone();
        }
        if let Some(phone_number) = &update.phone_number {
            manager.phone_number = phone_number.clone();
        }
        Ok(manager.clone())
    }
}

#[async_trait]
impl DonorBackend for LocalBackend {
    async fn list(&self, filters: &DonorFilters) -> BackendResult<Vec<Donor>> {
        self.guard()?;
        let data = self.data.read().unwrap();
        Ok(data
            .donors
            .iter()
            .filter(|d| filters.is_eligible.map_or(true, |e| d.is_eligible == e))
            .skip(filters.skip as usize)
            .take(filters.limit as usize)
            .cloned()
            .collect())
    }

    async fn get(&self, id: i64) -> BackendResult<Donor> {
        self.guard()?;
        self.data
            .read()
            .unwrap()
            .donors
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or_else(|| BackendError::Api {
                status: 404,
                message: format!("Donor {} not found", id),
            })
    }

    async fn create(&self, donor: &NewDonor) -> BackendResult<Donor> {
        self.guard()?;
        let mut data = self.data.write().unwrap();
        let record = Donor {
            id: data.next_donor_id,
            full_name: donor.full_name.clone(),
            email: Some(donor.email.clone()),
            phone: Some(donor.phone.clone()),
            gender: donor.gender,
            age: donor.age,
            blood_type: donor.blood_type,
            location: Some(donor.location.clone()),
            is_eligible: donor.is_eligible,
            created_at: Some(Utc::now()),
        };
        data.next_donor_id += 1;
        data.donors.insert(0, record.clone());
        Ok(record)
    }

    async fn update(&self, id: i64, update: &DonorUpdate) -> BackendResult<Donor> {
        self.guard()?;
        let mut data = self.data.write().unwrap();
        let donor = data
            .donors
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| BackendError::Api {
                status: 404,
                message: format!("Donor {} not found", id),
            })?;
        if let Some(full_name) = &update.full_name {
            donor.full_name = full_name.clone();
        }
        if let Some(email) = &update.email {
            donor.email = Some(email.clone());
        }
        if let Some(phone) = &update.phone {
            donor.phone = Some(phone.clone());
        }
        if let Some(gender) = update.gender {
            donor.gender = gender;
        }
        if let Some(age) = update.age {
            donor.age = age;
        }
        if let Some(blood_type) = update.blood_type {
            donor.blood_type = blood_type;
        }
        if let Some(location) = &update.location {
            donor.location = Some(location.clone());
        }
        if let Some(is_eligible) = update.is_eligible {
            donor.is_eligible = is_eligible;
        }
        Ok(donor.clone())
    }

    async fn delete(&self, id: i64) -> BackendResult<()> {
        self.guard()?;
        let mut data = self.data.write().unwrap();
        let before = data.donors.len();
        data.donors.retain(|d| d.id != id);
        if data.donors.len() == before {
            return Err(BackendError::Api {
                status: 404,
                message: format!("Donor {} not found", id),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DonationBackend for LocalBackend {
    async fn list(&self, filters: &DonationFilters) -> BackendResult<Vec<Donation>> {
        self.guard()?;
        let data = self.data.read().unwrap();
        Ok(data
            .donations
            .iter()
            .filter(|d| filters.donor_id.map_or(true, |id| d.donor_id == id))
            .skip(filters.skip as usize)
            .take(filters.limit as usize)
            .cloned()
            .collect())
    }

    async fn get(&self, id: i64) -> BackendResult<Donation> {
        self.guard()?;
        self.data
            .read()
            .unwrap()
            .donations
            .iter()
            .find(|d| d.donation_id == id)
            .cloned()
            .ok_or_else(|| BackendError::Api {
                status: 404,
                message: format!("Donation {} not found", id),
            })
    }

    async fn create(&self, donor_id: i64, donation: &NewDonation) -> BackendResult<Donation> {
        self.guard()?;
        let mut data = self.data.write().unwrap();
        let donor = data
            .donors
            .iter()
            .find(|d| d.id == donor_id)
            .cloned()
            .ok_or_else(|| BackendError::Api {
                status: 404,
                message: format!("Donor {} not found", donor_id),
            })?;
        let screening_result = match donation.hemoglobin_g_dl {
            Some(h) if h >= SAFE_HEMOGLOBIN_G_DL => Some(ScreeningResult::Safe),
            Some(_) => Some(ScreeningResult::Unsafe),
            None => Some(ScreeningResult::Pending),
        };
        let record = Donation {
            donation_id: data.next_donation_id,
            donor_id,
            blood_type: Some(donor.blood_type),
            donor: Some(donor),
            collection_site: donation.collection_site.clone(),
            volume_ml: donation.volume_ml,
            hemoglobin_g_dl: donation.hemoglobin_g_dl,
            donation_date: Some(Utc::now()),
            created_at: Some(Utc::now()),
            screening_result,
        };
        data.next_donation_id += 1;
        data.donations.insert(0, record.clone());
        Ok(record)
    }

    async fn update(&self, id: i64, update: &DonationUpdate) -> BackendResult<Donation> {
        self.guard()?;
        let mut data = self.data.write().unwrap();
        let donation = data
            .donations
            .iter_mut()
            .find(|d| d.donation_id == id)
            .ok_or_else(|| BackendError::Api {
                status: 404,
                message: format!("Donation {} not found", id),
            })?;
        if let Some(site) = &update.collection_site {
            donation.collection_site = site.clone();
        }
        if let Some(volume) = update.volume_ml {
            donation.volume_ml = volume;
        }
        if let Some(hemoglobin) = update.hemoglobin_g_dl {
            donation.hemoglobin_g_dl = Some(hemoglobin);
        }
        if let Some(result) = update.screening_result {
            donation.screening_result = Some(result);
        }
        Ok(donation.clone())
    }

    async fn upload(&self, filename: &str, bytes: Vec<u8>) -> BackendResult<serde_json::Value> {
        self.guard()?;
        let rows = bytes.split(|b| *b == b'\n').filter(|l| !l.is_empty()).count();
        Ok(serde_json::json!({
            "status": "success",
            "filename": filename,
            "rows_received": rows,
        }))
    }
}

#[async_trait]
impl StockBackend for LocalBackend {
    async fn list(&self) -> BackendResult<Vec<StockUnit>> {
        self.guard()?;
        Ok(self.data.read().unwrap().stocks.clone())
    }

    async fn get(&self, id: i64) -> BackendResult<StockUnit> {
        self.guard()?;
        self.data
            .read()
            .unwrap()
            .stocks
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| BackendError::Api {
                status: 404,
                message: format!("Stock unit {} not found", id),
            })
    }

    async fn update_status(&self, id: i64, status: StockStatus) -> BackendResult<StockUnit> {
        self.guard()?;
        let mut data = self.data.write().unwrap();
        let stock = data
            .stocks
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| BackendError::Api {
                status: 404,
                message: format!("Stock unit {} not found", id),
            })?;
        stock.status = status;
        Ok(stock.clone())
    }
}

#[async_trait]
impl ForecastBackend for LocalBackend {
    async fn predict_today(&self) -> BackendResult<Forecast> {
        ForecastBackend::latest(self, ForecastPeriod::OneDay).await
    }

    async fn predict_next_7_days(&self) -> BackendResult<Forecast> {
        ForecastBackend::latest(self, ForecastPeriod::SevenDays).await
    }

    async fn latest(&self, period: ForecastPeriod) -> BackendResult<Forecast> {
        self.guard()?;
        let data = self.data.read().unwrap();
        let stored = match period {
            ForecastPeriod::OneDay => data.daily_forecast.clone(),
            ForecastPeriod::SevenDays => data.weekly_forecast.clone(),
        };
        // No stored result degrades to an empty forecast, like the service.
        Ok(stored.unwrap_or_else(|| match period {
            ForecastPeriod::OneDay => Forecast::Daily(Default::default()),
            ForecastPeriod::SevenDays => Forecast::Weekly(Vec::new()),
        }))
    }
}

#[async_trait]
impl OptimizeBackend for LocalBackend {
    async fn run(&self, period: ForecastPeriod) -> BackendResult<Optimization> {
        OptimizeBackend::latest(self, period).await
    }

    async fn latest(&self, period: ForecastPeriod) -> BackendResult<Optimization> {
        self.guard()?;
        let data = self.data.read().unwrap();
        let stored = match period {
            ForecastPeriod::OneDay => data.daily_optimization.clone(),
            ForecastPeriod::SevenDays => data.weekly_optimization.clone(),
        };
        Ok(stored.unwrap_or_default())
    }
}
