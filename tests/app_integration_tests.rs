//! Integration tests driving the composed application against the
//! in-memory backend.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use serde_json::json;

use bloodlink::backend::{BackendError, LocalBackend};
use bloodlink::models::*;
use bloodlink::services::{combined_metrics, RiskLevel};
use bloodlink::stores::AuthState;
use bloodlink::App;

fn seeded_backend() -> LocalBackend {
    let backend = LocalBackend::new();
    backend.add_account("admin@bank.org", "s3cret-pass", Role::Admin);
    backend.add_account("staff@bank.org", "manager-pass", Role::BloodManager);
    backend.insert_donor(Donor {
        id: 0,
        full_name: "Ama Mensah".into(),
        email: Some("ama@example.com".into()),
        phone: Some("+237 650 000 000".into()),
        gender: Gender::Female,
        age: 29,
        blood_type: BloodType::OPos,
        location: Some("Douala".into()),
        is_eligible: true,
        created_at: None,
    });
    backend.insert_stock(StockUnit {
        id: 0,
        blood_type: BloodType::OPos,
        volume_ml: Some(450.0),
        location: Some("Douala".into()),
        stored_date: None,
        expiry_date: Some(Utc::now() + ChronoDuration::days(3)),
        status: StockStatus::Available,
    });
    backend
}

fn admin_credentials() -> Credentials {
    Credentials {
        email: "admin@bank.org".into(),
        password: "s3cret-pass".into(),
        role: Role::Admin,
    }
}

#[tokio::test]
async fn login_reload_initialize_reproduces_the_session() {
    let backend = seeded_backend();
    let app = App::local(&backend);

    let user = app.session.login(&admin_credentials()).await.unwrap();
    assert_eq!(user.email, "admin@bank.org");

    // A "reload": new stores over the same token store and backend.
    let reloaded = App::with_backends(
        Arc::new(backend.clone()),
        Arc::new(backend.clone()),
        Arc::new(backend.clone()),
        Arc::new(backend.clone()),
        Arc::new(backend.clone()),
        Arc::new(backend.clone()),
        Arc::new(backend.clone()),
        Arc::clone(&app.tokens),
    );
    assert!(reloaded.session.initialize().await.unwrap());
    let state = reloaded.session.snapshot();
    assert_eq!(state.auth, AuthState::Authenticated);
    assert_eq!(
        state.user.map(|u| u.email),
        Some("admin@bank.org".to_string())
    );
}

#[tokio::test]
async fn concurrent_initialize_validates_once() {
    let backend = seeded_backend();
    let app = Arc::new(App::local(&backend));
    app.session.login(&admin_credentials()).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let app = Arc::clone(&app);
        handles.push(tokio::spawn(async move {
            app.session.check_auth().await.unwrap()
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap());
    }
    assert_eq!(backend.verify_call_count(), 1);
}

#[tokio::test]
async fn unreachable_backend_preserves_the_session_token() {
    let backend = seeded_backend();
    let app = App::local(&backend);
    app.session.login(&admin_credentials()).await.unwrap();

    backend.set_healthy(false);
    assert!(matches!(
        app.session.check_auth().await,
        Err(BackendError::Network(_))
    ));
    assert!(app.tokens.load().is_some());

    backend.set_healthy(true);
    assert!(app.session.check_auth().await.unwrap());
}

#[tokio::test]
async fn revoked_token_logs_out_on_next_check() {
    let backend = seeded_backend();
    let app = App::local(&backend);
    app.session.login(&admin_credentials()).await.unwrap();

    backend.revoke_all_tokens();
    assert!(!app.session.check_auth().await.unwrap());
    assert!(app.tokens.load().is_none());
    assert_eq!(app.session.snapshot().auth, AuthState::Unauthenticated);
}

#[tokio::test]
async fn expiry_hook_forces_a_global_logout() {
    let backend = seeded_backend();
    let app = Arc::new(App::local(&backend));
    app.session.login(&admin_credentials()).await.unwrap();

    // Wire the hook the way the HTTP composition does.
    let hook = bloodlink::backend::http::SessionExpiryHook::new();
    let session = Arc::clone(&app.session);
    hook.install(Arc::new(move || session.force_logout()));

    hook.fire();
    let state = app.session.snapshot();
    assert_eq!(state.auth, AuthState::Unauthenticated);
    assert!(state.user.is_none());
    assert!(app.tokens.load().is_none());
}

#[tokio::test]
async fn donor_crud_flow_through_the_store() {
    let app = App::local(&seeded_backend());
    app.session.login(&admin_credentials()).await.unwrap();

    app.donors
        .fetch(DonorFilterOverrides::default())
        .await
        .unwrap();
    let created = app
        .donors
        .create(&NewDonor {
            full_name: "Kwame Boateng".into(),
            email: "kwame@example.com".into(),
            phone: "+237 651 111 111".into(),
            gender: Gender::Male,
            age: 34,
            blood_type: BloodType::ANeg,
            location: "Yaounde".into(),
            is_eligible: true,
        })
        .await
        .unwrap();

    let updated = app
        .donors
        .update(
            created.id,
            &DonorUpdate {
                location: Some("Bafoussam".into()),
                ..DonorUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.location.as_deref(), Some("Bafoussam"));

    app.donors.delete(created.id).await.unwrap();
    assert!(app
        .donors
        .snapshot()
        .items
        .iter()
        .all(|d| d.id != created.id));
}

#[tokio::test]
async fn donation_recording_updates_state_and_screens() {
    let backend = seeded_backend();
    let app = App::local(&backend);
    app.session.login(&admin_credentials()).await.unwrap();

    let donors = app
        .donors
        .fetch(DonorFilterOverrides::default())
        .await
        .unwrap();
    let donation = app
        .donations
        .create(
            donors[0].id,
            &NewDonation {
                collection_site: "Central Clinic".into(),
                volume_ml: 450.0,
                hemoglobin_g_dl: Some(11.0),
            },
        )
        .await
        .unwrap();
    assert_eq!(donation.screening_result, Some(ScreeningResult::Unsafe));
    assert_eq!(app.donations.snapshot().items.len(), 1);
}

#[tokio::test]
async fn fetch_is_idempotent() {
    let app = App::local(&seeded_backend());
    app.session.login(&admin_credentials()).await.unwrap();

    let first = app.stocks.fetch().await.unwrap();
    let second = app.stocks.fetch().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(app.stocks.snapshot().items, second);
}

#[tokio::test]
async fn dashboard_summary_pipeline() {
    let backend = seeded_backend();
    backend.set_forecast(Forecast::from_value(
        ForecastPeriod::SevenDays,
        &json!([
            {"date": "2026-08-28", "blood_type": "O+", "predicted_volume": 600.0},
            {"date": "2026-08-29", "blood_type": "A-", "predicted_volume": 300.0}
        ]),
    ));
    backend.set_optimization(
        ForecastPeriod::SevenDays,
        Optimization::from_value(&json!({
            "status": "success",
            "data": {
                "O+": {"recommended_order_bags": 3.0, "emergency_needed_bags": 0.0, "total_cost_xaf": 30000.0},
                "total_week_cost_xaf": 30000.0
            }
        })),
    );
    let app = App::local(&backend);
    app.session.login(&admin_credentials()).await.unwrap();

    let stocks = app.stocks.fetch().await.unwrap();
    let forecast = app
        .forecast
        .fetch_latest(ForecastPeriod::SevenDays)
        .await
        .unwrap();
    let optimization = app
        .optimize
        .fetch_latest(ForecastPeriod::SevenDays)
        .await
        .unwrap();

    let metrics = combined_metrics(
        forecast.as_ref(),
        optimization.as_ref(),
        &stocks,
        ForecastPeriod::SevenDays,
    );
    assert_eq!(metrics.forecast_total_ml, 900.0);
    assert_eq!(metrics.optimization_cost_xaf, 30000.0);
    assert_eq!(metrics.available_stock_ml, 450.0);
    assert_eq!(metrics.stock_adequacy_pct, 50.0);
    assert_eq!(metrics.risk, RiskLevel::Low);

    // The seeded unit expires within the warning window.
    assert_eq!(app.stocks.expiring_soon().len(), 1);
}

/// Forecast backend that answers the daily prediction late, so a period
/// switch can overtake it.
struct SlowDailyForecast {
    inner: LocalBackend,
    delay: Duration,
}

#[async_trait::async_trait]
impl bloodlink::backend::ForecastBackend for SlowDailyForecast {
    async fn predict_today(&self) -> bloodlink::BackendResult<Forecast> {
        self.inner.predict_today().await
    }

    async fn predict_next_7_days(&self) -> bloodlink::BackendResult<Forecast> {
        self.inner.predict_next_7_days().await
    }

    async fn latest(&self, period: ForecastPeriod) -> bloodlink::BackendResult<Forecast> {
        if period == ForecastPeriod::OneDay {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.latest(period).await
    }
}

#[tokio::test]
async fn rapid_period_switch_discards_the_stale_response() {
    let backend = seeded_backend();
    backend.set_forecast(Forecast::from_value(
        ForecastPeriod::OneDay,
        &json!({"O+": 100.0}),
    ));
    backend.set_forecast(Forecast::from_value(
        ForecastPeriod::SevenDays,
        &json!([
            {"date": "2026-08-28", "blood_type": "O+", "predicted_volume": 700.0}
        ]),
    ));
    let store = Arc::new(bloodlink::stores::ForecastStore::new(Arc::new(
        SlowDailyForecast {
            inner: backend,
            delay: Duration::from_millis(100),
        },
    )));

    let slow = {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.fetch_latest(ForecastPeriod::OneDay).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    let fast = store.fetch_latest(ForecastPeriod::SevenDays).await.unwrap();
    assert!(fast.is_some());

    // The daily response arrives after the weekly request started and must
    // be discarded.
    assert!(slow.await.unwrap().unwrap().is_none());
    let published = store.snapshot();
    assert_eq!(published.period, ForecastPeriod::SevenDays);
    assert_eq!(
        published.current.map(|f| f.period()),
        Some(ForecastPeriod::SevenDays)
    );
}

#[tokio::test]
async fn debounced_search_runs_only_the_last_call() {
    let backend = seeded_backend();
    let app = Arc::new(App::local(&backend));
    app.session.login(&admin_credentials()).await.unwrap();

    let stale = {
        let app = Arc::clone(&app);
        tokio::spawn(async move { app.donors.search_debounced("am").await.unwrap() })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    let fresh = {
        let app = Arc::clone(&app);
        tokio::spawn(async move { app.donors.search_debounced("ama").await.unwrap() })
    };

    assert!(stale.await.unwrap().is_none());
    let results = fresh.await.unwrap().expect("newest search must run");
    assert_eq!(results.len(), 1);
}
