use std::sync::Arc;

use serde_json::json;

use crate::backend::{BackendError, LocalBackend};
use crate::models::*;
use crate::stores::*;

fn donor(name: &str, blood_type: BloodType, eligible: bool) -> Donor {
    Donor {
        id: 0,
        full_name: name.to_string(),
        email: Some(format!(
            "{}@example.com",
            name.to_lowercase().replace(' ', ".")
        )),
        phone: Some("+237 650 000 000".to_string()),
        gender: Gender::Female,
        age: 30,
        blood_type,
        location: Some("Douala".to_string()),
        is_eligible: eligible,
        created_at: None,
    }
}

fn new_donor(name: &str) -> NewDonor {
    NewDonor {
        full_name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        phone: "+237 650 000 000".to_string(),
        gender: Gender::Male,
        age: 25,
        blood_type: BloodType::APos,
        location: "Yaounde".to_string(),
        is_eligible: true,
    }
}

fn stock(blood_type: BloodType, status: StockStatus, location: &str) -> StockUnit {
    StockUnit {
        id: 0,
        blood_type,
        volume_ml: Some(450.0),
        location: Some(location.to_string()),
        stored_date: None,
        expiry_date: None,
        status,
    }
}

#[tokio::test]
async fn donor_fetch_stores_items_and_merges_filters() {
    let backend = LocalBackend::new();
    backend.insert_donor(donor("Ama Mensah", BloodType::OPos, true));
    backend.insert_donor(donor("Kofi Asante", BloodType::ANeg, false));
    let store = DonorStore::new(Arc::new(backend));

    let all = store.fetch(DonorFilterOverrides::default()).await.unwrap();
    assert_eq!(all.len(), 2);

    let eligible = store
        .fetch(DonorFilterOverrides {
            is_eligible: Some(true),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(eligible.len(), 1);
    // The override sticks for the next plain fetch.
    assert_eq!(store.snapshot().filters.is_eligible, Some(true));
}

#[tokio::test]
async fn donor_blood_type_filter_keeps_only_matching_records() {
    let backend = LocalBackend::new();
    backend.insert_donor(donor("Ama Mensah", BloodType::OPos, true));
    backend.insert_donor(donor("Kofi Asante", BloodType::APos, true));
    let store = DonorStore::new(Arc::new(backend));
    store.fetch(DonorFilterOverrides::default()).await.unwrap();

    let matching = store.by_blood_type(BloodType::OPos);
    assert_eq!(matching.len(), 1);
    assert_eq!(matching[0].full_name, "Ama Mensah");
    assert!(store.by_blood_type(BloodType::AbNeg).is_empty());
}

#[tokio::test]
async fn donor_fetch_failure_keeps_previous_items() {
    let backend = LocalBackend::new();
    backend.insert_donor(donor("Ama Mensah", BloodType::OPos, true));
    let store = DonorStore::new(Arc::new(backend.clone()));

    store.fetch(DonorFilterOverrides::default()).await.unwrap();
    backend.set_healthy(false);
    assert!(store.fetch(DonorFilterOverrides::default()).await.is_err());

    let state = store.snapshot();
    assert_eq!(state.items.len(), 1);
    assert!(state.error.is_some());
    assert!(!state.is_loading);
}

#[tokio::test]
async fn donor_create_validates_before_the_wire_and_prepends() {
    let backend = LocalBackend::new();
    backend.insert_donor(donor("Ama Mensah", BloodType::OPos, true));
    let store = DonorStore::new(Arc::new(backend));
    store.fetch(DonorFilterOverrides::default()).await.unwrap();

    let invalid = NewDonor {
        age: 12,
        ..new_donor("Too Young")
    };
    assert!(matches!(
        store.create(&invalid).await,
        Err(BackendError::Validation(_))
    ));

    let created = store.create(&new_donor("Kwame Boateng")).await.unwrap();
    let state = store.snapshot();
    assert_eq!(state.items.first().map(|d| d.id), Some(created.id));
    assert_eq!(state.items.len(), 2);
}

#[tokio::test]
async fn donor_delete_clears_matching_selection() {
    let backend = LocalBackend::new();
    let id = backend.insert_donor(donor("Ama Mensah", BloodType::OPos, true));
    let store = DonorStore::new(Arc::new(backend));
    store.fetch(DonorFilterOverrides::default()).await.unwrap();
    store.fetch_one(id).await.unwrap();

    store.delete(id).await.unwrap();
    let state = store.snapshot();
    assert!(state.items.is_empty());
    assert!(state.selected.is_none());
}

#[tokio::test]
async fn donor_toggle_eligibility_round_trips() {
    let backend = LocalBackend::new();
    let id = backend.insert_donor(donor("Ama Mensah", BloodType::OPos, true));
    let store = DonorStore::new(Arc::new(backend));
    store.fetch(DonorFilterOverrides::default()).await.unwrap();

    let toggled = store.toggle_eligibility(id).await.unwrap();
    assert!(!toggled.is_eligible);
    assert!(!store.snapshot().items[0].is_eligible);
}

#[tokio::test]
async fn donor_search_filters_across_fields_case_insensitively() {
    let backend = LocalBackend::new();
    backend.insert_donor(donor("Ama Mensah", BloodType::OPos, true));
    backend.insert_donor(donor("Kofi Asante", BloodType::ANeg, true));
    let store = DonorStore::new(Arc::new(backend));

    let matched = store.search("MENSAH").await.unwrap();
    assert_eq!(matched.len(), 1);
    assert_eq!(store.snapshot().items.len(), 1);

    // Empty term falls back to a plain fetch.
    let all = store.search("  ").await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn donation_create_embeds_donor_and_screens_hemoglobin() {
    let backend = LocalBackend::new();
    let donor_id = backend.insert_donor(donor("Ama Mensah", BloodType::OPos, true));
    let store = DonationStore::new(Arc::new(backend));

    let safe = store
        .create(
            donor_id,
            &NewDonation {
                collection_site: "Central Clinic".into(),
                volume_ml: 450.0,
                hemoglobin_g_dl: Some(13.0),
            },
        )
        .await
        .unwrap();
    assert_eq!(safe.screening_result, Some(ScreeningResult::Safe));
    assert_eq!(
        safe.donor.as_ref().map(|d| d.full_name.as_str()),
        Some("Ama Mensah")
    );

    let out_of_range = store
        .create(
            donor_id,
            &NewDonation {
                collection_site: "Central Clinic".into(),
                volume_ml: 900.0,
                hemoglobin_g_dl: None,
            },
        )
        .await;
    assert!(matches!(out_of_range, Err(BackendError::Validation(_))));
}

#[tokio::test]
async fn donation_search_matches_donor_and_site() {
    let backend = LocalBackend::new();
    let donor_id = backend.insert_donor(donor("Ama Mensah", BloodType::OPos, true));
    let store = DonationStore::new(Arc::new(backend));
    store
        .create(
            donor_id,
            &NewDonation {
                collection_site: "Central Clinic".into(),
                volume_ml: 450.0,
                hemoglobin_g_dl: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(store.search("central").await.unwrap().len(), 1);
    assert_eq!(store.search("mensah").await.unwrap().len(), 1);
    assert_eq!(store.search("nothing-here").await.unwrap().len(), 0);
}

#[tokio::test]
async fn donation_fetch_scopes_to_donor() {
    let backend = LocalBackend::new();
    let first = backend.insert_donor(donor("Ama Mensah", BloodType::OPos, true));
    let second = backend.insert_donor(donor("Kofi Asante", BloodType::ANeg, true));
    let store = DonationStore::new(Arc::new(backend));
    for donor_id in [first, first, second] {
        store
            .create(
                donor_id,
                &NewDonation {
                    collection_site: "Central Clinic".into(),
                    volume_ml: 450.0,
                    hemoglobin_g_dl: None,
                },
            )
            .await
            .unwrap();
    }

    let scoped = store
        .fetch(DonationFilterOverrides {
            donor_id: Some(first),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(scoped.len(), 2);
    assert!(scoped.iter().all(|d| d.donor_id == first));
}

#[tokio::test]
async fn stock_status_shortcuts_patch_local_state() {
    let backend = LocalBackend::new();
    let id = backend.insert_stock(stock(BloodType::OPos, StockStatus::Available, "Douala"));
    let store = StockStore::new(Arc::new(backend));
    store.fetch().await.unwrap();

    store.reserve(id).await.unwrap();
    assert_eq!(store.snapshot().items[0].status, StockStatus::Reserved);
    store.mark_used(id).await.unwrap();
    assert_eq!(store.snapshot().items[0].status, StockStatus::Used);
}

#[tokio::test]
async fn stock_filter_treats_unset_fields_as_wildcards() {
    let backend = LocalBackend::new();
    backend.insert_stock(stock(BloodType::OPos, StockStatus::Available, "Douala"));
    backend.insert_stock(stock(BloodType::OPos, StockStatus::Reserved, "Douala"));
    backend.insert_stock(stock(BloodType::ANeg, StockStatus::Available, "Yaounde"));
    let store = StockStore::new(Arc::new(backend));
    store.fetch().await.unwrap();

    assert_eq!(store.filtered(&StockFilter::default()).len(), 3);
    assert_eq!(
        store
            .filtered(&StockFilter {
                blood_type: Some(BloodType::OPos),
                status: Some(StockStatus::Available),
                location: None,
            })
            .len(),
        1
    );
    assert_eq!(
        store
            .filtered(&StockFilter {
                location: Some("doua".into()),
                ..Default::default()
            })
            .len(),
        2
    );
}

#[tokio::test]
async fn manager_register_validates_then_appends() {
    let backend = LocalBackend::new();
    backend.insert_manager(Manager {
        id: 0,
        full_name: "First Manager".into(),
        email: "first@bank.org".into(),
        phone_number: "+237 651 111 111".into(),
        created_at: None,
    });
    let store = ManagerStore::new(Arc::new(backend));
    store.fetch().await.unwrap();

    let draft = NewManager {
        email: "second@bank.org".into(),
        full_name: "Second Manager".into(),
        phone_number: "+237 652 222 222".into(),
        password: "long-enough".into(),
    };
    assert!(matches!(
        store.register(&draft, "mismatch").await,
        Err(BackendError::Validation(_))
    ));

    let created = store.register(&draft, "long-enough").await.unwrap();
    let state = store.snapshot();
    assert_eq!(state.items.last().map(|m| m.id), Some(created.id));
    assert_eq!(state.items.len(), 2);
}

#[tokio::test]
async fn forecast_latest_publishes_and_clears() {
    let backend = LocalBackend::new();
    backend.set_forecast(Forecast::from_value(
        ForecastPeriod::OneDay,
        &json!({"O+": 1200.0, "A-": 300.0}),
    ));
    let store = ForecastStore::new(Arc::new(backend));

    let published = store
        .fetch_latest(ForecastPeriod::OneDay)
        .await
        .unwrap()
        .unwrap();
    assert!(!published.is_empty());
    assert_eq!(store.summary().highest_demand, Some(BloodType::OPos));

    store.clear_data();
    assert!(store.snapshot().current.is_none());
}

#[tokio::test]
async fn forecast_predict_routes_on_period() {
    let backend = LocalBackend::new();
    backend.set_forecast(Forecast::from_value(
        ForecastPeriod::OneDay,
        &json!({"B+": 480.0}),
    ));
    backend.set_forecast(Forecast::from_value(
        ForecastPeriod::SevenDays,
        &json!([{"date": "2026-08-28", "blood_type": "B+", "predicted_volume": 700.0}]),
    ));
    let store = ForecastStore::new(Arc::new(backend));

    let daily = store.predict(ForecastPeriod::OneDay).await.unwrap().unwrap();
    assert_eq!(daily.period(), ForecastPeriod::OneDay);
    let weekly = store
        .predict(ForecastPeriod::SevenDays)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(weekly.period(), ForecastPeriod::SevenDays);
    assert_eq!(store.snapshot().period, ForecastPeriod::SevenDays);
}

#[tokio::test]
async fn optimization_run_publishes_the_result() {
    let backend = LocalBackend::new();
    backend.set_optimization(
        ForecastPeriod::OneDay,
        Optimization::from_value(&json!({
            "status": "success",
            "data": {"O-": {"recommended_order_bags": 3.0, "total_cost_xaf": 36000.0}}
        })),
    );
    let store = OptimizeStore::new(Arc::new(backend));

    let published = store.run(ForecastPeriod::OneDay).await.unwrap().unwrap();
    assert!(published.has_meaningful_data());
    assert_eq!(store.summary().total_cost_xaf, 36000.0);
}

#[tokio::test]
async fn forecast_failure_records_error_and_keeps_nothing_stale() {
    let backend = LocalBackend::new();
    backend.set_healthy(false);
    let store = ForecastStore::new(Arc::new(backend));

    assert!(store.fetch_latest(ForecastPeriod::OneDay).await.is_err());
    let state = store.snapshot();
    assert!(state.error.is_some());
    assert!(!state.is_loading);
}

#[tokio::test]
async fn optimization_summary_follows_the_active_period() {
    let backend = LocalBackend::new();
    backend.set_optimization(
        ForecastPeriod::SevenDays,
        Optimization::from_value(&json!({
            "status": "success",
            "data": {
                "O+": {"recommended_order_bags": 5.0, "emergency_needed_bags": 2.0, "total_cost_xaf": 60000.0},
                "total_week_cost_xaf": 420000.0
            }
        })),
    );
    let store = OptimizeStore::new(Arc::new(backend));

    store
        .fetch_latest(ForecastPeriod::SevenDays)
        .await
        .unwrap();
    let summary = store.summary();
    assert_eq!(summary.total_cost_xaf, 420000.0);
    assert_eq!(summary.total_emergency_bags, 2.0);
    assert_eq!(summary.critical, vec![(BloodType::OPos, 2.0)]);
}
