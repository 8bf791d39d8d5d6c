//! Object keys and public URLs for proof documents.
//!
//! File bytes live in an external object store; this service only names the
//! objects and records the resulting URL on the RAB or LPJ.

use serde::Serialize;

use crate::models::workflow::SubmissionKind;

/// Where a branch should upload a proof document, and the URL it will be served from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadTarget {
    pub key: String,
    pub public_url: String,
}

/// `{kind}/{kind}-{periodeId}-{pondokId}-{pondokName}.{ext}` with whitespace in the name replaced by `_`.
pub fn proof_object_key(
    kind: SubmissionKind,
    periode_id: &str,
    pondok_id: i64,
    pondok_name: &str,
    ext: &str,
) -> String {
    let name: String = pondok_name
        .trim()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");
    let ext = ext.trim().trim_start_matches('.').to_ascii_lowercase();
    let kind = kind.as_str();
    format!("{kind}/{kind}-{periode_id}-{pondok_id}-{name}.{ext}")
}

pub fn public_url(base_url: &str, key: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), key)
}

/// Validate a file extension: 1-10 ASCII alphanumerics, optional leading dot.
pub fn validate_extension(ext: &str) -> Option<String> {
    let ext = ext.trim().trim_start_matches('.');
    if ext.is_empty() || ext.len() > 10 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Some("File extension must be 1-10 letters or digits".to_string());
    }
    None
}

pub fn upload_target(
    base_url: &str,
    kind: SubmissionKind,
    periode_id: &str,
    pondok_id: i64,
    pondok_name: &str,
    ext: &str,
) -> UploadTarget {
    let key = proof_object_key(kind, periode_id, pondok_id, pondok_name, ext);
    let public_url = public_url(base_url, &key);
    UploadTarget { key, public_url }
}
