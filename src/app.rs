//! Application root: config → clients → stores.

use std::sync::Arc;

use tracing::info;

use crate::backend::http::HttpBackends;
use crate::backend::{
    AuthBackend, BackendConfig, BackendResult, DonationBackend, DonorBackend, ForecastBackend,
    LocalBackend, ManagerBackend, MemoryTokenStore, OptimizeBackend, StockBackend, TokenStore,
};
use crate::stores::{
    DonationStore, DonorStore, ForecastStore, ManagerStore, OptimizeStore, SessionStore,
    StockStore,
};

/// The composed application: one store per resource plus the session
/// controller, all sharing the same token store.
pub struct App {
    pub session: Arc<SessionStore>,
    pub donors: Arc<DonorStore>,
    pub donations: Arc<DonationStore>,
    pub stocks: Arc<StockStore>,
    pub managers: Arc<ManagerStore>,
    pub forecast: Arc<ForecastStore>,
    pub optimize: Arc<OptimizeStore>,
    pub tokens: Arc<dyn TokenStore>,
}

impl App {
    /// Build from `BLOODLINK_*` environment variables with HTTP backends.
    /// `BLOODLINK_TOKEN_FILE` selects on-disk token persistence; without it
    /// the token lives in memory for the process lifetime.
    pub fn from_env() -> anyhow::Result<Self> {
        let config = BackendConfig::from_env().map_err(anyhow::Error::msg)?;
        let tokens: Arc<dyn TokenStore> = match std::env::var("BLOODLINK_TOKEN_FILE") {
            Ok(path) if !path.is_empty() => Arc::new(crate::backend::FileTokenStore::new(path)),
            _ => Arc::new(MemoryTokenStore::new()),
        };
        Ok(Self::from_config(&config, tokens)?)
    }

    /// Build HTTP backends from a config and compose the stores.
    pub fn from_config(
        config: &BackendConfig,
        tokens: Arc<dyn TokenStore>,
    ) -> BackendResult<Self> {
        let backends = HttpBackends::from_config(config, Arc::clone(&tokens))?;
        let app = Self::with_backends(
            backends.auth,
            backends.managers,
            backends.donors,
            backends.donations,
            backends.stocks,
            backends.forecast,
            backends.optimize,
            tokens,
        );

        // A rejected authenticated request anywhere logs the session out.
        let session = Arc::clone(&app.session);
        backends.expiry.install(Arc::new(move || {
            session.force_logout();
        }));

        info!("application composed with HTTP backends");
        Ok(app)
    }

    /// Compose the stores over explicit backend implementations.
    #[allow(clippy::too_many_arguments)]
    pub fn with_backends(
        auth: Arc<dyn AuthBackend>,
        managers: Arc<dyn ManagerBackend>,
        donors: Arc<dyn DonorBackend>,
        donations: Arc<dyn DonationBackend>,
        stocks: Arc<dyn StockBackend>,
        forecast: Arc<dyn ForecastBackend>,
        optimize: Arc<dyn OptimizeBackend>,
        tokens: Arc<dyn TokenStore>,
    ) -> Self {
        Self {
            session: Arc::new(SessionStore::new(
                auth,
                Arc::clone(&managers),
                Arc::clone(&tokens),
            )),
            donors: Arc::new(DonorStore::new(donors)),
            donations: Arc::new(DonationStore::new(donations)),
            stocks: Arc::new(StockStore::new(stocks)),
            managers: Arc::new(ManagerStore::new(managers)),
            forecast: Arc::new(ForecastStore::new(forecast)),
            optimize: Arc::new(OptimizeStore::new(optimize)),
            tokens,
        }
    }

    /// Compose over a single in-memory backend, for tests and local runs.
    pub fn local(backend: &LocalBackend) -> Self {
        Self::with_backends(
            Arc::new(backend.clone()),
            Arc::new(backend.clone()),
            Arc::new(backend.clone()),
            Arc::new(backend.clone()),
            Arc::new(backend.clone()),
            Arc::new(backend.clone()),
            Arc::new(backend.clone()),
            Arc::new(MemoryTokenStore::new()),
        )
    }
}
