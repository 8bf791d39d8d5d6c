use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::validate;
use crate::errors::AppError;
use crate::models::workflow::{
    LpjLedger, ReviewState, SubmissionStatus, check_amount, check_item_total, derive_expenditure,
    parse_status,
};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LpjRow {
    pub id: i64,
    pub pondok_id: i64,
    pub periode_id: String,
    pub rab_id: i64,
    pub status: String,
    pub submitted_at: Option<DateTime<Utc>>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub saldo_awal: i64,
    pub total_pemasukan: i64,
    pub total_pengeluaran: i64,
    pub sisa_saldo: i64,
    pub proof_url: Option<String>,
    pub revision_message: Option<String>,
}

/// A branch's expenditure report for one period, paired with its accepted RAB.
#[derive(Debug, Clone, Serialize)]
pub struct Lpj {
    pub id: i64,
    pub pondok_id: i64,
    pub periode_id: String,
    pub rab_id: i64,
    pub status: SubmissionStatus,
    pub submitted_at: Option<DateTime<Utc>>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub saldo_awal: i64,
    pub total_pemasukan: i64,
    pub total_pengeluaran: i64,
    pub sisa_saldo: i64,
    pub proof_url: Option<String>,
    pub revision_message: Option<String>,
}

impl TryFrom<LpjRow> for Lpj {
    type Error = AppError;

    fn try_from(r: LpjRow) -> Result<Self, Self::Error> {
        Ok(Lpj {
            id: r.id,
            pondok_id: r.pondok_id,
            periode_id: r.periode_id,
            rab_id: r.rab_id,
            status: parse_status(&r.status)?,
            submitted_at: r.submitted_at,
            accepted_at: r.accepted_at,
            saldo_awal: r.saldo_awal,
            total_pemasukan: r.total_pemasukan,
            total_pengeluaran: r.total_pengeluaran,
            sisa_saldo: r.sisa_saldo,
            proof_url: r.proof_url,
            revision_message: r.revision_message,
        })
    }
}

impl Lpj {
    pub fn review_state(&self) -> ReviewState {
        ReviewState {
            status: self.status,
            submitted_at: self.submitted_at,
            accepted_at: self.accepted_at,
            revision_message: self.revision_message.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LpjItem {
    pub id: i64,
    pub lpj_id: i64,
    pub position: i32,
    pub kategori: String,
    pub deskripsi: String,
    pub anggaran: i64,
    pub realisasi: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LpjItemInput {
    pub kategori: String,
    pub deskripsi: String,
    #[serde(default)]
    pub anggaran: i64,
    pub realisasi: i64,
}

/// Branch input for creating or resubmitting an LPJ. The opening balance is
/// not part of the input: it is locked to the paired RAB's closing balance.
#[derive(Debug, Clone, Deserialize)]
pub struct LpjForm {
    #[serde(default)]
    pub total_pemasukan: i64,
    #[serde(default)]
    pub total_pengeluaran: i64,
    pub proof_url: Option<String>,
    #[serde(default)]
    pub items: Vec<LpjItemInput>,
}

impl LpjForm {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        check_amount(self.total_pemasukan, "Total pemasukan", &mut errors);
        if self.items.is_empty() {
            check_amount(self.total_pengeluaran, "Total pengeluaran", &mut errors);
        }
        if let Some(url) = &self.proof_url {
            errors.extend(validate::validate_optional(url, "Proof URL", 2048));
        }
        for (i, item) in self.items.iter().enumerate() {
            let n = i + 1;
            errors.extend(validate::validate_required(&item.kategori, &format!("Item {n} kategori"), 100));
            errors.extend(validate::validate_required(&item.deskripsi, &format!("Item {n} deskripsi"), 500));
            check_amount(item.anggaran, &format!("Item {n} anggaran"), &mut errors);
            check_amount(item.realisasi, &format!("Item {n} realisasi"), &mut errors);
        }
        if errors.is_empty() && !self.items.is_empty() {
            check_item_total(self.items.iter().map(|i| i.realisasi), &mut errors);
        }
        errors
    }

    /// Realisasi sum when items are present; the declared total otherwise.
    pub fn total_pengeluaran(&self) -> i64 {
        derive_expenditure(self.total_pengeluaran, self.items.iter().map(|i| i.realisasi))
    }

    /// Balances of this input on top of a locked opening balance.
    pub fn ledger(&self, saldo_awal: i64) -> Result<LpjLedger, AppError> {
        let mut ledger = LpjLedger::new(saldo_awal, 0, 0)?;
        ledger.set_total_pemasukan(self.total_pemasukan)?;
        ledger.set_total_pengeluaran(self.total_pengeluaran())?;
        Ok(ledger)
    }

    pub fn proof_url(&self) -> Option<String> {
        self.proof_url.as_deref().and_then(crate::models::pondok::non_empty)
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LpjListRow {
    #[sqlx(flatten)]
    pub lpj: LpjRow,
    pub pondok_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LpjListItem {
    #[serde(flatten)]
    pub lpj: Lpj,
    pub pondok_name: String,
}

impl TryFrom<LpjListRow> for LpjListItem {
    type Error = AppError;

    fn try_from(r: LpjListRow) -> Result<Self, Self::Error> {
        Ok(LpjListItem { lpj: Lpj::try_from(r.lpj)?, pondok_name: r.pondok_name })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LpjDetail {
    #[serde(flatten)]
    pub lpj: Lpj,
    pub pondok_name: String,
    pub items: Vec<LpjItem>,
}
