//! Blood-type enumeration and the shared clinical constraint constants.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// One of the 8 ABO/Rh combinations.
///
/// The backends are inconsistent about the wire encoding: most endpoints use
/// the display form (`"A+"`), the prediction services occasionally emit the
/// underscore form (`"A_pos"`). Deserialization accepts both; serialization
/// always emits the display form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BloodType {
    APos,
    ANeg,
    BPos,
    BNeg,
    AbPos,
    AbNeg,
    OPos,
    ONeg,
}

impl BloodType {
    /// All 8 blood types in display order.
    pub const ALL: [BloodType; 8] = [
        BloodType::APos,
        BloodType::ANeg,
        BloodType::BPos,
        BloodType::BNeg,
        BloodType::AbPos,
        BloodType::AbNeg,
        BloodType::OPos,
        BloodType::ONeg,
    ];

    /// Canonical display form, e.g. `"AB-"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            BloodType::APos => "A+",
            BloodType::ANeg => "A-",
            BloodType::BPos => "B+",
            BloodType::BNeg => "B-",
            BloodType::AbPos => "AB+",
            BloodType::AbNeg => "AB-",
            BloodType::OPos => "O+",
            BloodType::ONeg => "O-",
        }
    }
}

impl fmt::Display for BloodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BloodType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A+" | "A_pos" => Ok(BloodType::APos),
            "A-" | "A_neg" => Ok(BloodType::ANeg),
            "B+" | "B_pos" => Ok(BloodType::BPos),
            "B-" | "B_neg" => Ok(BloodType::BNeg),
            "AB+" | "AB_pos" => Ok(BloodType::AbPos),
            "AB-" | "AB_neg" => Ok(BloodType::AbNeg),
            "O+" | "O_pos" => Ok(BloodType::OPos),
            "O-" | "O_neg" => Ok(BloodType::ONeg),
            other => Err(format!("unknown blood type '{}'", other)),
        }
    }
}

impl Serialize for BloodType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BloodType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Donor gender as recorded by the registry backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

/// Post-donation safety classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreeningResult {
    Safe,
    Unsafe,
    Pending,
}

/// Lifecycle status of a stored stock unit.
///
/// `NearToExpiry` and `Expired` are computed server-side from the expiry
/// date; the client only ever sets `Available`, `Reserved`, `Used` and
/// `Expired` through explicit user actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StockStatus {
    #[serde(rename = "available")]
    Available,
    #[serde(rename = "reserved")]
    Reserved,
    #[serde(rename = "near to expiry")]
    NearToExpiry,
    #[serde(rename = "expired")]
    Expired,
    #[serde(rename = "used")]
    Used,
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StockStatus::Available => "available",
            StockStatus::Reserved => "reserved",
            StockStatus::NearToExpiry => "near to expiry",
            StockStatus::Expired => "expired",
            StockStatus::Used => "used",
        };
        f.write_str(s)
    }
}

/// Minimum donor age accepted by the registry.
pub const MIN_DONOR_AGE: u32 = 18;
/// Maximum donor age accepted by the registry.
pub const MAX_DONOR_AGE: u32 = 65;

/// Minimum donation volume in milliliters.
pub const MIN_VOLUME_ML: f64 = 200.0;
/// Maximum donation volume in milliliters.
pub const MAX_VOLUME_ML: f64 = 500.0;
/// Volume assumed for a stock unit that does not report one.
pub const STANDARD_BAG_VOLUME_ML: f64 = 450.0;

/// Lowest representable hemoglobin reading, g/dL.
pub const MIN_HEMOGLOBIN_G_DL: f64 = 0.0;
/// Highest representable hemoglobin reading, g/dL.
pub const MAX_HEMOGLOBIN_G_DL: f64 = 20.0;
/// Hemoglobin threshold at or above which a donation is classified safe.
pub const SAFE_HEMOGLOBIN_G_DL: f64 = 12.5;

/// Default pagination window for list endpoints.
pub const DEFAULT_SKIP: u32 = 0;
pub const DEFAULT_LIMIT: u32 = 20;

/// Days-ahead window used by the expiring-soon stock selection.
pub const EXPIRY_WARNING_DAYS: i64 = 7;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_display_encoding() {
        assert_eq!("O+".parse::<BloodType>().unwrap(), BloodType::OPos);
        assert_eq!("AB-".parse::<BloodType>().unwrap(), BloodType::AbNeg);
    }

    #[test]
    fn parses_underscore_encoding() {
        assert_eq!("O_pos".parse::<BloodType>().unwrap(), BloodType::OPos);
        assert_eq!("A_neg".parse::<BloodType>().unwrap(), BloodType::ANeg);
        assert_eq!("AB_pos".parse::<BloodType>().unwrap(), BloodType::AbPos);
    }

    #[test]
    fn rejects_unknown_encoding() {
        assert!("C+".parse::<BloodType>().is_err());
        assert!("".parse::<BloodType>().is_err());
    }

    #[test]
    fn serializes_canonical_form() {
        let json = serde_json::to_string(&BloodType::AbPos).unwrap();
        assert_eq!(json, "\"AB+\"");
        // Round-trips through the underscore form too.
        let back: BloodType = serde_json::from_str("\"AB_pos\"").unwrap();
        assert_eq!(back, BloodType::AbPos);
    }

    #[test]
    fn stock_status_wire_names() {
        let near: StockStatus = serde_json::from_str("\"near to expiry\"").unwrap();
        assert_eq!(near, StockStatus::NearToExpiry);
        assert_eq!(
            serde_json::to_string(&StockStatus::NearToExpiry).unwrap(),
            "\"near to expiry\""
        );
    }
}
