//! Operational console for the blood-bank dashboard core.
//!
//! Logs in, validates the session, fetches every resource and prints the
//! derived dashboard summaries. Useful for smoke-testing a deployment
//! without the browser UI.
//!
//! # Usage
//!
//! ```bash
//! BLOODLINK_AUTH_URL=http://localhost:8001/auth \
//! BLOODLINK_MANAGER_URL=http://localhost:8001/blood-managers \
//! BLOODLINK_DONOR_URL=http://localhost:8002/donors \
//! BLOODLINK_DONATION_URL=http://localhost:8003/donations \
//! BLOODLINK_STOCK_URL=http://localhost:8004/stocks \
//! BLOODLINK_FORECAST_URL=http://localhost:8005 \
//! BLOODLINK_OPTIMIZE_URL=http://localhost:8006 \
//! BLOODLINK_EMAIL=admin@example.com \
//! BLOODLINK_PASSWORD=... \
//!   cargo run --bin bloodlink-console
//! ```
//!
//! # Environment Variables
//!
//! - `BLOODLINK_*_URL`: one base URL per backend service (required)
//! - `BLOODLINK_EMAIL` / `BLOODLINK_PASSWORD`: login credentials (required)
//! - `BLOODLINK_ROLE`: `admin` (default) or `blood_manager`
//! - `BLOODLINK_TOKEN_FILE`: persist the session token to this path
//! - `RUST_LOG`: log filter (default: info)

use std::env;

use tracing::info;
use tracing_subscriber::EnvFilter;

use bloodlink::models::{
    Credentials, DonationFilterOverrides, DonorFilterOverrides, ForecastPeriod, Role,
};
use bloodlink::services::combined_metrics;
use bloodlink::App;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(true)
        .init();

    let app = App::from_env()?;

    let credentials = Credentials {
        email: env::var("BLOODLINK_EMAIL")
            .map_err(|_| anyhow::anyhow!("BLOODLINK_EMAIL is not set"))?,
        password: env::var("BLOODLINK_PASSWORD")
            .map_err(|_| anyhow::anyhow!("BLOODLINK_PASSWORD is not set"))?,
        role: match env::var("BLOODLINK_ROLE").as_deref() {
            Ok("blood_manager") => Role::BloodManager,
            _ => Role::Admin,
        },
    };

    let user = app.session.login(&credentials).await?;
    info!(email = %user.email, role = ?user.role, "logged in");

    // Round-trip the persisted token the way a page reload would.
    app.session.initialize().await?;

    let donors = app.donors.fetch(DonorFilterOverrides::default()).await?;
    let donations = app
        .donations
        .fetch(DonationFilterOverrides::default())
        .await?;
    let stocks = app.stocks.fetch().await?;
    let managers = app.managers.fetch().await?;
    println!(
        "{} donors, {} donations, {} stock units, {} managers",
        donors.len(),
        donations.len(),
        stocks.len(),
        managers.len()
    );

    let donor_stats = app.donors.stats();
    println!(
        "donors: {} eligible / {} ineligible",
        donor_stats.eligible, donor_stats.ineligible
    );
    let stock_stats = app.stocks.stats();
    println!(
        "stock: {} available, {} reserved, {} near expiry, {} expired, {} used",
        stock_stats.available,
        stock_stats.reserved,
        stock_stats.near_to_expiry,
        stock_stats.expired,
        stock_stats.used
    );
    for unit in app.stocks.expiring_soon() {
        println!(
            "  expiring soon: unit {} ({}) at {}",
            unit.id,
            unit.blood_type,
            unit.location.as_deref().unwrap_or("unknown")
        );
    }

    let period = ForecastPeriod::SevenDays;
    let forecast = app.forecast.fetch_latest(period).await?;
    let optimization = app.optimize.fetch_latest(period).await?;

    let summary = app.forecast.summary();
    println!(
        "forecast ({}): total {} ml, highest demand {}",
        period,
        summary.total_predicted_ml,
        summary
            .highest_demand
            .map(|bt| bt.to_string())
            .unwrap_or_else(|| "N/A".into())
    );

    let metrics = combined_metrics(
        forecast.as_ref(),
        optimization.as_ref(),
        &stocks,
        period,
    );
    println!(
        "combined: cost {} XAF, adequacy {:.0}%, risk {:?}",
        metrics.optimization_cost_xaf, metrics.stock_adequacy_pct, metrics.risk
    );

    app.session.logout();
    info!("logged out");
    Ok(())
}
