use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// `fixed` sites are permanent offices eligible for ordinary daily
/// check-in; `travel` sites only qualify through a duty assignment.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum SiteKind {
    #[strum(serialize = "fixed")]
    Fixed,
    #[strum(serialize = "travel")]
    Travel,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "name": "Kantor Pusat",
    "address": "Jl. Medan Merdeka Selatan No. 1, Jakarta",
    "latitude": -6.2000,
    "longitude": 106.8160,
    "radius_m": 100.0,
    "kind": "fixed",
    "status": "active"
}))]
pub struct Site {
    pub id: u64,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_m: f64,
    #[schema(example = "fixed")]
    pub kind: String,
    #[schema(example = "active")]
    pub status: String,
}

impl Site {
    /// Parsed kind; `None` for an unrecognized value (the site is then
    /// ineligible for any geofence match).
    pub fn kind(&self) -> Option<SiteKind> {
        SiteKind::from_str(&self.kind).ok()
    }

    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("active")
    }
}
