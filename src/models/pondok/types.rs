use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::validate;

/// A branch organization and its profile.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Pondok {
    pub id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub provinsi_id: Option<i64>,
    pub kota_id: Option<i64>,
    pub kecamatan_id: Option<i64>,
    pub kelurahan_id: Option<i64>,
    pub kode_pos: Option<String>,
    pub daerah_sambung_id: Option<i64>,
    pub updated_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
}

impl Pondok {
    /// Verified by a central admin and carrying the location data submissions need.
    pub fn is_profile_complete(&self) -> bool {
        self.accepted_at.is_some()
            && self.provinsi_id.is_some()
            && self.kota_id.is_some()
            && self
                .address
                .as_deref()
                .map(|a| !a.trim().is_empty())
                .unwrap_or(false)
    }

    /// Edited by the branch and not yet re-verified.
    pub fn is_pending_verification(&self) -> bool {
        self.accepted_at.is_none()
    }
}

/// Branch-editable profile fields.
#[derive(Debug, Clone, Deserialize)]
pub struct PondokForm {
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    pub provinsi_id: Option<i64>,
    pub kota_id: Option<i64>,
    pub kecamatan_id: Option<i64>,
    pub kelurahan_id: Option<i64>,
    #[serde(default)]
    pub kode_pos: String,
    pub daerah_sambung_id: Option<i64>,
}

impl PondokForm {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(validate::validate_required(&self.name, "Name", 200));
        errors.extend(validate::validate_required(&self.address, "Address", 500));
        errors.extend(validate::validate_phone(&self.phone));
        errors.extend(validate::validate_kode_pos(&self.kode_pos));
        errors
    }
}

/// Registration of a new branch by a central admin, with its first branch admin.
#[derive(Debug, Clone, Deserialize)]
pub struct PondokRegistration {
    pub name: String,
    pub admin_email: String,
    pub admin_password: String,
    #[serde(default)]
    pub admin_name: String,
    #[serde(default)]
    pub admin_phone: String,
}

impl PondokRegistration {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(validate::validate_required(&self.name, "Name", 200));
        errors.extend(validate::validate_email(&self.admin_email));
        errors.extend(validate::validate_password(&self.admin_password));
        errors.extend(validate::validate_optional(&self.admin_name, "Admin name", 100));
        errors.extend(validate::validate_phone(&self.admin_phone));
        errors
    }
}

/// Empty strings are stored as NULL.
pub(crate) fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn complete() -> Pondok {
        Pondok {
            id: 1,
            name: "Pondok Al-Hikmah".into(),
            phone: Some("0812 3456".into()),
            address: Some("Jl. Merdeka 1".into()),
            provinsi_id: Some(32),
            kota_id: Some(3273),
            kecamatan_id: None,
            kelurahan_id: None,
            kode_pos: Some("40115".into()),
            daerah_sambung_id: None,
            updated_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            accepted_at: Some(Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap()),
        }
    }

    #[test]
    fn complete_profile_needs_verification_location_and_address() {
        assert!(complete().is_profile_complete());

        let mut p = complete();
        p.accepted_at = None;
        assert!(!p.is_profile_complete());
        assert!(p.is_pending_verification());

        let mut p = complete();
        p.kota_id = None;
        assert!(!p.is_profile_complete());

        let mut p = complete();
        p.address = Some("   ".into());
        assert!(!p.is_profile_complete());
    }

    #[test]
    fn form_validation_collects_all_errors() {
        let form = PondokForm {
            name: "".into(),
            phone: "abc".into(),
            address: "".into(),
            provinsi_id: None,
            kota_id: None,
            kecamatan_id: None,
            kelurahan_id: None,
            kode_pos: "123".into(),
            daerah_sambung_id: None,
        };
        assert_eq!(form.validate().len(), 4);
        assert_eq!(non_empty("  "), None);
        assert_eq!(non_empty(" 40115 ").as_deref(), Some("40115"));
    }
}
