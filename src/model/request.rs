use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::model::attendance::RawStatus;

/// Closed vocabulary of employee applications (pengajuan). Fixed and
/// finite: this is not a general workflow engine.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum RequestKind {
    Sakit,
    CutiTahunan,
    Izin,
    PulangCepatTerencana,
    PulangCepatMendadak,
    KoreksiAbsen,
    LemburHariKerja,
    LemburAkhirPekan,
    LemburHariLibur,
    DinasDalamKota,
    DinasLuarKota,
    DinasLuarNegeri,
}

impl RequestKind {
    /// The raw attendance status an approved application of this kind
    /// writes onto the covered days. Overtime and duty-travel kinds have no
    /// direct attendance effect.
    pub fn attendance_status(&self) -> Option<RawStatus> {
        match self {
            RequestKind::Sakit => Some(RawStatus::Sakit),
            RequestKind::CutiTahunan => Some(RawStatus::Cuti),
            RequestKind::Izin => Some(RawStatus::Izin),
            RequestKind::PulangCepatTerencana | RequestKind::PulangCepatMendadak => {
                Some(RawStatus::PulangCepat)
            }
            _ => None,
        }
    }
}

/// A leave/overtime/travel application. `status` is decided exactly once;
/// `rejection_reason` is non-empty exactly when status is `rejected`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Request {
    pub id: u64,
    pub employee_id: u64,
    #[schema(example = "cuti_tahunan")]
    pub kind: String,
    #[schema(example = "2026-08-10", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-08-12", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "13:00:00", value_type = Option<String>, nullable = true)]
    pub start_time: Option<NaiveTime>,
    #[schema(example = "15:00:00", value_type = Option<String>, nullable = true)]
    pub end_time: Option<NaiveTime>,
    #[schema(example = "Acara keluarga")]
    pub reason: String,
    pub document: Option<String>,
    #[schema(example = "pending")]
    pub status: String,
    pub rejection_reason: Option<String>,
    pub is_retroactive: bool,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub decided_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn kinds_parse_from_snake_case() {
        assert_eq!(RequestKind::from_str("cuti_tahunan").unwrap(), RequestKind::CutiTahunan);
        assert_eq!(
            RequestKind::from_str("lembur_hari_libur").unwrap(),
            RequestKind::LemburHariLibur
        );
        assert_eq!(RequestKind::DinasLuarNegeri.as_ref(), "dinas_luar_negeri");
    }
}
