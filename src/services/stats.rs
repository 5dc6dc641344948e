//! Aggregate counts for the donor and stock dashboards.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{BloodType, Donor, Gender, StockStatus, StockUnit};

/// Headline counters for the donor list page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DonorStats {
    pub total: usize,
    pub eligible: usize,
    pub ineligible: usize,
    pub by_blood_type: BTreeMap<BloodType, usize>,
    pub male: usize,
    pub female: usize,
}

pub fn donor_stats(donors: &[Donor]) -> DonorStats {
    let mut stats = DonorStats {
        total: donors.len(),
        ..DonorStats::default()
    };
    for donor in donors {
        if donor.is_eligible {
            stats.eligible += 1;
        } else {
            stats.ineligible += 1;
        }
        *stats.by_blood_type.entry(donor.blood_type).or_default() += 1;
        match donor.gender {
            Gender::Male => stats.male += 1,
            Gender::Female => stats.female += 1,
        }
    }
    stats
}

/// Headline counters for the stock page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StockStats {
    pub total: usize,
    pub available: usize,
    pub reserved: usize,
    pub near_to_expiry: usize,
    pub expired: usize,
    pub used: usize,
    /// Per blood type, count of units in each status.
    pub by_blood_type: BTreeMap<BloodType, BTreeMap<StockStatus, usize>>,
}

pub fn stock_stats(stocks: &[StockUnit]) -> StockStats {
    let mut stats = StockStats {
        total: stocks.len(),
        ..StockStats::default()
    };
    for unit in stocks {
        match unit.status {
            StockStatus::Available => stats.available += 1,
            StockStatus::Reserved => stats.reserved += 1,
            StockStatus::NearToExpiry => stats.near_to_expiry += 1,
            StockStatus::Expired => stats.expired += 1,
            StockStatus::Used => stats.used += 1,
        }
        *stats
            .by_blood_type
            .entry(unit.blood_type)
            .or_default()
            .entry(unit.status)
            .or_default() += 1;
    }
    stats
}

/// Units whose expiry date falls within the next `days` days, soonest first.
/// Already expired or used units never count.
pub fn expiring_stocks(stocks: &[StockUnit], now: DateTime<Utc>, days: i64) -> Vec<StockUnit> {
    let mut expiring: Vec<StockUnit> = stocks
        .iter()
        .filter(|unit| unit.expires_within(now, days))
        .cloned()
        .collect();
    expiring.sort_by_key(|unit| unit.expiry_date);
    expiring
}
