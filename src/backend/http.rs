//! reqwest-based implementations of the backend traits.
//!
//! One [`HttpClient`] per resource family, all sharing the same token store
//! and session-expiry hook. Every request reads the persisted token and
//! attaches it as a bearer header; a 401/403 on a request that carried a
//! token clears the token and fires the hook (global logout), unless the
//! request was the token-verification call itself, which the session
//! controller handles on its own terms.
//!
//! Response envelopes are unwrapped here so the stores only ever see typed
//! records: the auth/manager/donor backends reply `{status, data}`, the
//! donation and stock backends reply bare arrays/objects, and the two
//! prediction services go through the tolerant normalizers in
//! [`crate::models::analytics`].

use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use super::config::BackendConfig;
use super::error::{BackendError, BackendResult};
use super::token::TokenStore;
use super::traits::*;
use crate::models::*;

/// Path suffix of the token-verification endpoint, exempt from the forced
/// logout so the startup check cannot log itself out.
const VERIFY_TOKEN_PATH: &str = "/verify-token";

/// Callback fired when an authenticated request is rejected with 401/403.
pub type UnauthorizedHook = Arc<dyn Fn() + Send + Sync>;

/// Late-bound session-expiry hook shared by every HTTP client.
///
/// The hook target (the session store) is constructed after the clients, so
/// the cell starts empty and is wired at composition time.
#[derive(Clone, Default)]
pub struct SessionExpiryHook {
    hook: Arc<RwLock<Option<UnauthorizedHook>>>,
}

impl SessionExpiryHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the logout callback.
    pub fn install(&self, hook: UnauthorizedHook) {
        *self.hook.write().unwrap() = Some(hook);
    }

    /// Invoke the installed callback, if any.
    pub fn fire(&self) {
        if let Some(hook) = self.hook.read().unwrap().as_ref() {
            hook();
        }
    }
}

/// Whether a rejected request must force a global logout.
fn forces_logout(status: u16, had_token: bool, path: &str) -> bool {
    matches!(status, 401 | 403) && had_token && !path.ends_with(VERIFY_TOKEN_PATH)
}

/// Thin wrapper over `reqwest::Client` bound to one backend's base URL.
#[derive(Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
    expiry: SessionExpiryHook,
}

impl HttpClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        tokens: Arc<dyn TokenStore>,
        expiry: SessionExpiryHook,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            tokens,
            expiry,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str, query: &[(&str, String)], fallback: &str) -> BackendResult<Value> {
        let builder = self.http.get(self.url(path)).query(query);
        self.execute(builder, path, fallback).await
    }

    async fn post_json<B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: &B,
        fallback: &str,
    ) -> BackendResult<Value> {
        let builder = self.http.post(self.url(path)).query(query).json(body);
        self.execute(builder, path, fallback).await
    }

    async fn put_json<B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        fallback: &str,
    ) -> BackendResult<Value> {
        let builder = self.http.put(self.url(path)).json(body);
        self.execute(builder, path, fallback).await
    }

    async fn patch_json<B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        fallback: &str,
    ) -> BackendResult<Value> {
        let builder = self.http.patch(self.url(path)).json(body);
        self.execute(builder, path, fallback).await
    }

    async fn delete(&self, path: &str, fallback: &str) -> BackendResult<Value> {
        let builder = self.http.delete(self.url(path));
        self.execute(builder, path, fallback).await
    }

    async fn post_multipart(
        &self,
        path: &str,
        filename: &str,
        bytes: Vec<u8>,
        fallback: &str,
    ) -> BackendResult<Value> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);
        let builder = self.http.post(self.url(path)).multipart(form);
        self.execute(builder, path, fallback).await
    }

    /// Verify-token is the one request whose bearer token is passed
    /// explicitly instead of read from the store.
    async fn post_with_token(&self, path: &str, token: &str, fallback: &str) -> BackendResult<Value> {
        let builder = self
            .http
            .post(self.url(path))
            .bearer_auth(token)
            .json(&serde_json::json!({}));
        self.finish(builder.send().await, path, true, fallback).await
    }

    async fn execute(
        &self,
        mut builder: reqwest::RequestBuilder,
        path: &str,
        fallback: &str,
    ) -> BackendResult<Value> {
        let token = self.tokens.load();
        if let Some(token) = &token {
            builder = builder.bearer_auth(token);
        }
        self.finish(builder.send().await, path, token.is_some(), fallback)
            .await
    }

    async fn finish(
        &self,
        sent: Result<reqwest::Response, reqwest::Error>,
        path: &str,
        had_token: bool,
        fallback: &str,
    ) -> BackendResult<Value> {
        let response = sent.map_err(|err| BackendError::Network(err.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|err| BackendError::Network(err.to_string()))?;

        if (200..300).contains(&status) {
            if body.trim().is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_str(&body)
                .map_err(|err| BackendError::Network(format!("invalid response body: {}", err)));
        }

        if matches!(status, 401 | 403) && had_token {
            if forces_logout(status, had_token, path) {
                tracing::warn!(path, status, "token rejected mid-session, forcing logout");
                self.tokens.clear();
                self.expiry.fire();
            }
            return Err(BackendError::Unauthorized { status });
        }

        tracing::debug!(path, status, "backend request failed");
        Err(BackendError::api(status, &body, fallback))
    }
}

/// `{status, data}` response envelope used by the auth, manager and donor
/// backends.
#[derive(Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    status: Option<String>,
    data: T,
}

fn unwrap_envelope<T: DeserializeOwned>(value: Value) -> BackendResult<T> {
    serde_json::from_value::<Envelope<T>>(value)
        .map(|envelope| envelope.data)
        .map_err(|err| BackendError::Network(format!("unexpected response shape: {}", err)))
}

/// Parse a JSON array leniently: null elements and records that fail to
/// decode are dropped (the backends occasionally interleave them).
fn parse_list<T: DeserializeOwned>(value: Value, what: &str) -> Vec<T> {
    let Value::Array(items) = value else {
        tracing::warn!(what, "expected an array payload, treating as empty");
        return Vec::new();
    };
    items
        .into_iter()
        .filter(|item| !item.is_null())
        .filter_map(|item| match serde_json::from_value::<T>(item) {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::warn!(what, %err, "dropping malformed record");
                None
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Per-family implementations
// ---------------------------------------------------------------------------

pub struct HttpAuthBackend {
    client: HttpClient,
}

#[async_trait]
impl AuthBackend for HttpAuthBackend {
    async fn login(&self, credentials: &Credentials) -> BackendResult<LoginOutcome> {
        let value = self
            .client
            .post_json("/login", &[], credentials, "Login failed")
            .await?;
        unwrap_envelope(value)
    }

    async fn verify_token(&self, token: &str) -> BackendResult<User> {
        let value = self
            .client
            .post_with_token(VERIFY_TOKEN_PATH, token, "Token validation failed")
            .await?;
        let envelope: Envelope<User> = serde_json::from_value(value)
            .map_err(|err| BackendError::Network(format!("unexpected response shape: {}", err)))?;
        if envelope.status.as_deref() != Some("success") {
            return Err(BackendError::Api {
                status: 200,
                message: "Token invalid or expired".to_string(),
            });
        }
        Ok(envelope.data)
    }
}

pub struct HttpManagerBackend {
    client: HttpClient,
}

#[async_trait]
impl ManagerBackend for HttpManagerBackend {
    async fn login(&self, email: &str, password: &str) -> BackendResult<LoginOutcome> {
        let body = serde_json::json!({ "email": email, "password": password });
        let value = self
            .client
            .post_json("/login", &[], &body, "Blood manager login failed")
            .await?;
        unwrap_envelope(value)
    }

    async fn register(&self, manager: &NewManager) -> BackendResult<Manager> {
        let value = self
            .client
            .post_json("/register", &[], manager, "Manager registration failed")
            .await?;
        unwrap_envelope(value)
    }

    async fn list(&self) -> BackendResult<Vec<Manager>> {
        let value = self.client.get("/", &[], "Failed to fetch managers").await?;
        Ok(parse_list(unwrap_envelope::<Value>(value)?, "manager"))
    }

    async fn get(&self, id: i64) -> BackendResult<Manager> {
        let value = self
            .client
            .get(&format!("/{}", id), &[], "Failed to fetch manager")
            .await?;
        unwrap_envelope(value)
    }

    async fn update(&self, id: i64, update: &ManagerUpdate) -> BackendResult<Manager> {
        let value = self
            .client
            .put_json(&format!("/{}", id), update, "Manager update failed")
            .await?;
        unwrap_envelope(value)
    }
}

pub struct HttpDonorBackend {
    client: HttpClient,
}

fn donor_query(filters: &DonorFilters) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if let Some(eligible) = filters.is_eligible {
        query.push(("is_eligible", eligible.to_string()));
    }
    query.push(("skip", filters.skip.to_string()));
    query.push(("limit", filters.limit.to_string()));
    query
}

#[async_trait]
impl DonorBackend for HttpDonorBackend {
    async fn list(&self, filters: &DonorFilters) -> BackendResult<Vec<Donor>> {
        let value = self
            .client
            .get("/", &donor_query(filters), "Failed to fetch donors")
            .await?;
        Ok(parse_list(unwrap_envelope::<Value>(value)?, "donor"))
    }

    async fn get(&self, id: i64) -> BackendResult<Donor> {
        let value = self
            .client
            .get(&format!("/{}", id), &[], "Failed to fetch donor")
            .await?;
        unwrap_envelope(value)
    }

    async fn create(&self, donor: &NewDonor) -> BackendResult<Donor> {
        let value = self
            .client
            .post_json("/", &[], donor, "Failed to create donor")
            .await?;
        unwrap_envelope(value)
    }

    async fn update(&self, id: i64, update: &DonorUpdate) -> BackendResult<Donor> {
        let value = self
            .client
            .put_json(&format!("/{}", id), update, "Failed to update donor")
            .await?;
        unwrap_envelope(value)
    }

    async fn delete(&self, id: i64) -> BackendResult<()> {
        self.client
            .delete(&format!("/{}", id), "Failed to delete donor")
            .await?;
        Ok(())
    }
}

pub struct HttpDonationBackend {
    client: HttpClient,
}

#[async_trait]
impl DonationBackend for HttpDonationBackend {
    async fn list(&self, filters: &DonationFilters) -> BackendResult<Vec<Donation>> {
        let mut query = Vec::new();
        if let Some(donor_id) = filters.donor_id {
            query.push(("donor_id", donor_id.to_string()));
        }
        query.push(("skip", filters.skip.to_string()));
        query.push(("limit", filters.limit.to_string()));

        // This backend answers with a bare array, no envelope.
        let value = self
            .client
            .get("/", &query, "Failed to fetch donations")
            .await?;
        Ok(parse_list(value, "donation"))
    }

    async fn get(&self, id: i64) -> BackendResult<Donation> {
        let value = self
            .client
            .get(&format!("/{}", id), &[], "Failed to fetch donation")
            .await?;
        serde_json::from_value(value)
            .map_err(|err| BackendError::Network(format!("unexpected response shape: {}", err)))
    }

    async fn create(&self, donor_id: i64, donation: &NewDonation) -> BackendResult<Donation> {
        let query = [("donor_id", donor_id.to_string())];
        let value = self
            .client
            .post_json("/", &query, donation, "Failed to create donation")
            .await?;
        unwrap_envelope(value)
    }

    async fn update(&self, id: i64, update: &DonationUpdate) -> BackendResult<Donation> {
        let value = self
            .client
            .put_json(&format!("/{}", id), update, "Failed to update donation")
            .await?;
        serde_json::from_value(value)
            .map_err(|err| BackendError::Network(format!("unexpected response shape: {}", err)))
    }

    async fn upload(&self, filename: &str, bytes: Vec<u8>) -> BackendResult<Value> {
        self.client
            .post_multipart("/upload", filename, bytes, "Failed to upload donations file")
            .await
    }
}

pub struct HttpStockBackend {
    client: HttpClient,
}

#[async_trait]
impl StockBackend for HttpStockBackend {
    async fn list(&self) -> BackendResult<Vec<StockUnit>> {
        let value = self.client.get("/", &[], "Failed to fetch stocks").await?;
        Ok(parse_list(value, "stock unit"))
    }

    async fn get(&self, id: i64) -> BackendResult<StockUnit> {
        let value = self
            .client
            .get(&format!("/{}", id), &[], "Failed to fetch stock")
            .await?;
        serde_json::from_value(value)
            .map_err(|err| BackendError::Network(format!("unexpected response shape: {}", err)))
    }

    async fn update_status(&self, id: i64, status: StockStatus) -> BackendResult<StockUnit> {
        let value = self
            .client
            .patch_json(
                &format!("/{}/status", id),
                &StockStatusChange { status },
                "Failed to update stock status",
            )
            .await?;
        serde_json::from_value(value)
            .map_err(|err| BackendError::Network(format!("unexpected response shape: {}", err)))
    }
}

pub struct HttpForecastBackend {
    client: HttpClient,
}

#[async_trait]
impl ForecastBackend for HttpForecastBackend {
    async fn predict_today(&self) -> BackendResult<Forecast> {
        let value = self
            .client
            .get("/predict", &[], "Failed to get current day prediction")
            .await?;
        Ok(Forecast::from_value(ForecastPeriod::OneDay, &value))
    }

    async fn predict_next_7_days(&self) -> BackendResult<Forecast> {
        let value = self
            .client
            .get("/predict/next-7-days", &[], "Failed to get 7-day forecast")
            .await?;
        let predictions = value.get("predictions").cloned().unwrap_or(Value::Null);
        Ok(Forecast::from_value(ForecastPeriod::SevenDays, &predictions))
    }

    async fn latest(&self, period: ForecastPeriod) -> BackendResult<Forecast> {
        let query = [("period", period.as_str().to_string())];
        let value = self
            .client
            .get("/forecast/latest", &query, "Failed to get latest forecast")
            .await?;
        let data = value.get("data").cloned().unwrap_or(Value::Null);
        Ok(Forecast::from_value(period, &data))
    }
}

pub struct HttpOptimizeBackend {
    client: HttpClient,
}

impl HttpOptimizeBackend {
    fn normalize(period: ForecastPeriod, value: &Value) -> Optimization {
        let optimization = Optimization::from_value(value);
        if !optimization.has_meaningful_data() {
            tracing::warn!(%period, "optimization service returned no meaningful data");
        }
        optimization
    }
}

#[async_trait]
impl OptimizeBackend for HttpOptimizeBackend {
    async fn run(&self, period: ForecastPeriod) -> BackendResult<Optimization> {
        let query = [("period", period.as_str().to_string())];
        let value = self
            .client
            .get("/optimize", &query, "Failed to get optimization")
            .await?;
        Ok(Self::normalize(period, &value))
    }

    async fn latest(&self, period: ForecastPeriod) -> BackendResult<Optimization> {
        let query = [("period", period.as_str().to_string())];
        let value = self
            .client
            .get("/optimization/latest", &query, "Failed to get latest optimization")
            .await?;
        Ok(Self::normalize(period, &value))
    }
}

/// The full set of HTTP backends plus the hook handle for wiring the forced
/// logout at composition time.
pub struct HttpBackends {
    pub auth: Arc<dyn AuthBackend>,
    pub managers: Arc<dyn ManagerBackend>,
    pub donors: Arc<dyn DonorBackend>,
    pub donations: Arc<dyn DonationBackend>,
    pub stocks: Arc<dyn StockBackend>,
    pub forecast: Arc<dyn ForecastBackend>,
    pub optimize: Arc<dyn OptimizeBackend>,
    pub expiry: SessionExpiryHook,
}

impl HttpBackends {
    /// Build one client per resource family, all sharing the same reqwest
    /// connection pool, token store, and session-expiry hook.
    pub fn from_config(
        config: &BackendConfig,
        tokens: Arc<dyn TokenStore>,
    ) -> BackendResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| BackendError::Network(format!("failed to build HTTP client: {}", err)))?;

        let expiry = SessionExpiryHook::new();
        let client = |base: &str| {
            HttpClient::new(http.clone(), base, Arc::clone(&tokens), expiry.clone())
        };

        Ok(Self {
            auth: Arc::new(HttpAuthBackend {
                client: client(&config.auth_url),
            }),
            managers: Arc::new(HttpManagerBackend {
                client: client(&config.manager_url),
            }),
            donors: Arc::new(HttpDonorBackend {
                client: client(&config.donor_url),
            }),
            donations: Arc::new(HttpDonationBackend {
                client: client(&config.donation_url),
            }),
            stocks: Arc::new(HttpStockBackend {
                client: client(&config.stock_url),
            }),
            forecast: Arc::new(HttpForecastBackend {
                client: client(&config.forecast_url),
            }),
            optimize: Arc::new(HttpOptimizeBackend {
                client: client(&config.optimize_url),
            }),
            expiry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryTokenStore;

    fn bare_client(tokens: Arc<MemoryTokenStore>) -> HttpClient {
        HttpClient::new(
            reqwest::Client::new(),
            "http://localhost",
            tokens,
            SessionExpiryHook::new(),
        )
    }

    #[tokio::test]
    async fn rejected_login_surfaces_the_backend_message() {
        let tokens = Arc::new(MemoryTokenStore::new());
        let client = bare_client(tokens.clone());
        let response = http::Response::builder()
            .status(401)
            .body(r#"{"message": "Invalid email or password"}"#)
            .unwrap();
        let err = client
            .finish(Ok(response.into()), "/login", false, "Login failed")
            .await
            .unwrap_err();
        match err {
            BackendError::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid email or password");
            }
            other => panic!("expected an API error, got {other}"),
        }
    }

    #[tokio::test]
    async fn token_bearing_rejection_maps_to_unauthorized_and_clears_the_token() {
        let tokens = Arc::new(MemoryTokenStore::new());
        tokens.save("stale-token");
        let client = bare_client(tokens.clone());
        let response = http::Response::builder().status(401).body("{}").unwrap();
        let err = client
            .finish(Ok(response.into()), "/donors", true, "Request failed")
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Unauthorized { status: 401 }));
        assert!(tokens.load().is_none());
    }

    #[test]
    fn logout_forced_only_with_token_and_off_verify_path() {
        assert!(forces_logout(401, true, "/donors/3"));
        assert!(forces_logout(403, true, "/stocks/1/status"));
        // No token attached: nothing to expire.
        assert!(!forces_logout(401, false, "/donors/3"));
        // The verification call handles rejection itself.
        assert!(!forces_logout(401, true, "/verify-token"));
        // Other statuses are ordinary API errors.
        assert!(!forces_logout(500, true, "/donors/3"));
    }

    #[test]
    fn envelope_unwraps_data_field() {
        let value = serde_json::json!({"status": "success", "data": {"id": 7}});
        #[derive(Deserialize)]
        struct Rec {
            id: i64,
        }
        let rec: Rec = unwrap_envelope(value).unwrap();
        assert_eq!(rec.id, 7);
    }

    #[test]
    fn parse_list_drops_null_and_malformed_entries() {
        let value = serde_json::json!([
            {"id": 1, "full_name": "A", "email": "a@x.cm", "phone_number": "6", "created_at": null},
            null,
            {"wrong": true}
        ]);
        let managers: Vec<Manager> = parse_list(value, "manager");
        assert_eq!(managers.len(), 1);
        assert_eq!(managers[0].id, 1);
    }
}
