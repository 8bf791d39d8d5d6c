use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status of a persisted RAB or LPJ. A missing row is the implicit "belum" state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Diajukan,
    Revisi,
    Diterima,
}

impl SubmissionStatus {
    pub const ALL: [SubmissionStatus; 3] = [
        SubmissionStatus::Diajukan,
        SubmissionStatus::Revisi,
        SubmissionStatus::Diterima,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Diajukan => "diajukan",
            SubmissionStatus::Revisi => "revisi",
            SubmissionStatus::Diterima => "diterima",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SubmissionStatus::Diajukan => "Diajukan",
            SubmissionStatus::Revisi => "Revisi",
            SubmissionStatus::Diterima => "Diterima",
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "diajukan" => Ok(SubmissionStatus::Diajukan),
            "revisi" => Ok(SubmissionStatus::Revisi),
            "diterima" => Ok(SubmissionStatus::Diterima),
            other => Err(format!("Unknown submission status '{other}'")),
        }
    }
}

/// Wire form of a status including the implicit "belum" for absent records.
pub fn status_code_or_belum(status: Option<SubmissionStatus>) -> &'static str {
    status.map(|s| s.as_str()).unwrap_or("belum")
}

/// Which document a record is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionKind {
    Rab,
    Lpj,
}

impl SubmissionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionKind::Rab => "rab",
            SubmissionKind::Lpj => "lpj",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SubmissionKind::Rab => "RAB",
            SubmissionKind::Lpj => "LPJ",
        }
    }
}

impl fmt::Display for SubmissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SubmissionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rab" => Ok(SubmissionKind::Rab),
            "lpj" => Ok(SubmissionKind::Lpj),
            other => Err(format!("Unknown submission kind '{other}'")),
        }
    }
}
