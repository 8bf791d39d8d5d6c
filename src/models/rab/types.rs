use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::validate;
use crate::errors::AppError;
use crate::models::workflow::{
    ReviewState, SubmissionStatus, check_amount, check_item_total, closing_balance, derive_expenditure,
    parse_status,
};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RabRow {
    pub id: i64,
    pub pondok_id: i64,
    pub periode_id: String,
    pub status: String,
    pub submitted_at: Option<DateTime<Utc>>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub saldo_awal: i64,
    pub total_pemasukan: i64,
    pub total_pengeluaran: i64,
    pub proof_url: Option<String>,
    pub revision_message: Option<String>,
}

/// A branch's budget plan for one period.
#[derive(Debug, Clone, Serialize)]
pub struct Rab {
    pub id: i64,
    pub pondok_id: i64,
    pub periode_id: String,
    pub status: SubmissionStatus,
    pub submitted_at: Option<DateTime<Utc>>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub saldo_awal: i64,
    pub total_pemasukan: i64,
    pub total_pengeluaran: i64,
    pub proof_url: Option<String>,
    pub revision_message: Option<String>,
}

impl TryFrom<RabRow> for Rab {
    type Error = AppError;

    fn try_from(r: RabRow) -> Result<Self, Self::Error> {
        Ok(Rab {
            id: r.id,
            pondok_id: r.pondok_id,
            periode_id: r.periode_id,
            status: parse_status(&r.status)?,
            submitted_at: r.submitted_at,
            accepted_at: r.accepted_at,
            saldo_awal: r.saldo_awal,
            total_pemasukan: r.total_pemasukan,
            total_pengeluaran: r.total_pengeluaran,
            proof_url: r.proof_url,
            revision_message: r.revision_message,
        })
    }
}

impl Rab {
    pub fn review_state(&self) -> ReviewState {
        ReviewState {
            status: self.status,
            submitted_at: self.submitted_at,
            accepted_at: self.accepted_at,
            revision_message: self.revision_message.clone(),
        }
    }

    /// Planned balance at period end; becomes the LPJ's opening balance.
    pub fn closing_balance(&self) -> Result<i64, AppError> {
        closing_balance(self.saldo_awal, self.total_pemasukan, self.total_pengeluaran)
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RabItem {
    pub id: i64,
    pub rab_id: i64,
    pub position: i32,
    pub kategori: String,
    pub deskripsi: String,
    pub jumlah: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RabItemInput {
    pub kategori: String,
    pub deskripsi: String,
    pub jumlah: i64,
}

/// Branch input for creating or resubmitting a RAB.
#[derive(Debug, Clone, Deserialize)]
pub struct RabForm {
    #[serde(default)]
    pub saldo_awal: i64,
    #[serde(default)]
    pub total_pemasukan: i64,
    #[serde(default)]
    pub total_pengeluaran: i64,
    pub proof_url: Option<String>,
    #[serde(default)]
    pub items: Vec<RabItemInput>,
}

impl RabForm {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        check_amount(self.saldo_awal, "Saldo awal", &mut errors);
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
            check_amount(item.jumlah, &format!("Item {n} jumlah"), &mut errors);
        }
        if errors.is_empty() && !self.items.is_empty() {
            check_item_total(self.items.iter().map(|i| i.jumlah), &mut errors);
        }
        errors
    }

    /// Item sum when items are present; the declared total otherwise.
    pub fn total_pengeluaran(&self) -> i64 {
        derive_expenditure(self.total_pengeluaran, self.items.iter().map(|i| i.jumlah))
    }

    pub fn proof_url(&self) -> Option<String> {
        self.proof_url.as_deref().and_then(crate::models::pondok::non_empty)
    }
}

/// A RAB listed with its branch name.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RabListRow {
    #[sqlx(flatten)]
    pub rab: RabRow,
    pub pondok_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RabListItem {
    #[serde(flatten)]
    pub rab: Rab,
    pub pondok_name: String,
}

impl TryFrom<RabListRow> for RabListItem {
    type Error = AppError;

    fn try_from(r: RabListRow) -> Result<Self, Self::Error> {
        Ok(RabListItem { rab: Rab::try_from(r.rab)?, pondok_name: r.pondok_name })
    }
}

/// A RAB with its items, for detail views.
#[derive(Debug, Clone, Serialize)]
pub struct RabDetail {
    #[serde(flatten)]
    pub rab: Rab,
    pub pondok_name: String,
    pub items: Vec<RabItem>,
}
