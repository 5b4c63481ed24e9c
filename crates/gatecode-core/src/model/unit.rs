// ── Rental unit domain types ──

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ids::{SiteId, UnitId};

/// Rental / lock state of a unit as reported by the directory.
///
/// `Overlock`, `Gatelock` and `Prelet` are blocking: access codes for the
/// unit must not change while it sits in one of them. Unknown values are
/// preserved verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RentalState {
    Rented,
    Vacant,
    Reserved,
    Delinquent,
    Overlock,
    Gatelock,
    Prelet,
    Other(String),
}

impl RentalState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Rented => "rented",
            Self::Vacant => "vacant",
            Self::Reserved => "reserved",
            Self::Delinquent => "delinquent",
            Self::Overlock => "overlock",
            Self::Gatelock => "gatelock",
            Self::Prelet => "prelet",
            Self::Other(raw) => raw,
        }
    }

    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::Overlock | Self::Gatelock | Self::Prelet)
    }
}

impl From<String> for RentalState {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "rented" => Self::Rented,
            "vacant" => Self::Vacant,
            "reserved" => Self::Reserved,
            "delinquent" => Self::Delinquent,
            "overlock" => Self::Overlock,
            "gatelock" => Self::Gatelock,
            "prelet" => Self::Prelet,
            _ => Self::Other(raw),
        }
    }
}

impl From<&str> for RentalState {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_owned())
    }
}

impl From<RentalState> for String {
    fn from(state: RentalState) -> Self {
        match state {
            RentalState::Other(raw) => raw,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for RentalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rental unit at a site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub unit_id: UnitId,
    pub site_id: SiteId,
    pub rental_state: RentalState,
}
