use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Closed raw-status vocabulary for an attendance row.
///
/// Historical spellings from older clients ("Mangkir", "Alpha",
/// "Dinas Luar", "Perjalanan Dinas", mixed casing) are accepted on parse and
/// normalized here, once, instead of being string-compared at call sites.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(ascii_case_insensitive)]
pub enum RawStatus {
    #[strum(serialize = "hadir")]
    Hadir,
    #[strum(serialize = "terlambat")]
    Terlambat,
    #[strum(to_string = "tidak_hadir", serialize = "tidak hadir", serialize = "mangkir", serialize = "alpha")]
    TidakHadir,
    #[strum(serialize = "izin")]
    Izin,
    #[strum(serialize = "sakit")]
    Sakit,
    #[strum(serialize = "cuti")]
    Cuti,
    #[strum(to_string = "pulang_cepat", serialize = "pulang cepat")]
    PulangCepat,
    #[strum(
        to_string = "dinas",
        serialize = "dinas_luar",
        serialize = "dinas luar",
        serialize = "perjalanan_dinas",
        serialize = "perjalanan dinas"
    )]
    Dinas,
}

/// One row per (employee, date); UNIQUE key in the database enforces that.
/// Check-out columns stay NULL until the employee checks out.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Attendance {
    pub id: u64,
    pub employee_id: u64,
    #[schema(example = "2026-08-06", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "08:35:00", value_type = String, nullable = true)]
    pub check_in: Option<NaiveTime>,
    pub check_in_lat: Option<f64>,
    pub check_in_lng: Option<f64>,
    pub check_in_site_id: Option<u64>,
    pub check_in_photo: Option<String>,
    #[schema(example = "17:05:00", value_type = String, nullable = true)]
    pub check_out: Option<NaiveTime>,
    pub check_out_lat: Option<f64>,
    pub check_out_lng: Option<f64>,
    pub check_out_site_id: Option<u64>,
    pub check_out_photo: Option<String>,
    pub is_late: bool,
    #[schema(example = "hadir")]
    pub status: String,
}

impl Attendance {
    /// Normalized raw status. An unrecognized spelling folds to
    /// `TidakHadir` so corrupt rows never read as present.
    pub fn raw_status(&self) -> RawStatus {
        RawStatus::from_str(&self.status).unwrap_or(RawStatus::TidakHadir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn historical_spellings_normalize() {
        assert_eq!(RawStatus::from_str("Mangkir").unwrap(), RawStatus::TidakHadir);
        assert_eq!(RawStatus::from_str("alpha").unwrap(), RawStatus::TidakHadir);
        assert_eq!(RawStatus::from_str("Dinas Luar").unwrap(), RawStatus::Dinas);
        assert_eq!(RawStatus::from_str("perjalanan_dinas").unwrap(), RawStatus::Dinas);
        assert_eq!(RawStatus::from_str("HADIR").unwrap(), RawStatus::Hadir);
    }

    #[test]
    fn canonical_form_round_trips() {
        assert_eq!(RawStatus::TidakHadir.to_string(), "tidak_hadir");
        assert_eq!(RawStatus::Dinas.as_ref(), "dinas");
        assert_eq!(
            RawStatus::from_str(RawStatus::PulangCepat.as_ref()).unwrap(),
            RawStatus::PulangCepat
        );
    }
}
