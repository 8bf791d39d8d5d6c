use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::auth::validate;

/// Position held by a member of a branch's personnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Jabatan {
    KetuaPondok,
    WakilKetuaPondok,
    PinisepuhPondok,
    Bendahara,
    Sekretaris,
    GuruPondok,
}

impl Jabatan {
    pub const ALL: [Jabatan; 6] = [
        Jabatan::KetuaPondok,
        Jabatan::WakilKetuaPondok,
        Jabatan::PinisepuhPondok,
        Jabatan::Bendahara,
        Jabatan::Sekretaris,
        Jabatan::GuruPondok,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Jabatan::KetuaPondok => "ketua_pondok",
            Jabatan::WakilKetuaPondok => "wakil_ketua_pondok",
            Jabatan::PinisepuhPondok => "pinisepuh_pondok",
            Jabatan::Bendahara => "bendahara",
            Jabatan::Sekretaris => "sekretaris",
            Jabatan::GuruPondok => "guru_pondok",
        }
    }
}

impl FromStr for Jabatan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Jabatan::ALL
            .into_iter()
            .find(|j| j.as_str() == s)
            .ok_or_else(|| format!("Unknown jabatan '{s}'"))
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Pengurus {
    pub id: i64,
    pub pondok_id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub jabatan: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PengurusForm {
    pub name: String,
    #[serde(default)]
    pub phone: String,
    pub jabatan: Jabatan,
}

impl PengurusForm {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(validate::validate_required(&self.name, "Name", 100));
        errors.extend(validate::validate_phone(&self.phone));
        errors
    }
}
