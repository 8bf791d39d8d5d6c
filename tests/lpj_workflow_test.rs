//! LPJ lifecycle: pairing with an accepted RAB, locked opening balance, ledger arithmetic.

mod common;

use anggaran::errors::AppError;
use anggaran::models::lpj::{self, LpjForm, LpjItemInput};
use anggaran::models::rab::{RabForm, RabItemInput};
use anggaran::models::user::Role;
use anggaran::models::workflow::{Ineligible, SubmissionKind, SubmissionStatus};
use anggaran::submissions::{self, review};
use common::*;
use sqlx::PgPool;

struct Branch {
    pondok_id: i64,
    user_id: i64,
    pusat_id: i64,
}

async fn branch(pool: &PgPool) -> Branch {
    seed_period_202501(pool).await;
    let pusat_id = seed_pusat_admin(pool).await;
    let pondok_id = seed_verified_pondok(pool, "Al Hikmah").await;
    let user_id = seed_user(pool, "hikmah@test.local", Role::AdminPondok, Some(pondok_id)).await;
    Branch { pondok_id, user_id, pusat_id }
}

/// RAB closing balance: 1_000_000 + 5_000_000 - 3_500_000 = 2_500_000.
async fn submit_rab(pool: &PgPool, b: &Branch) -> i64 {
    let form = RabForm {
        saldo_awal: 1_000_000,
        total_pemasukan: 5_000_000,
        total_pengeluaran: 0,
        proof_url: None,
        items: vec![RabItemInput {
            kategori: "Operasional".to_string(),
            deskripsi: "Listrik, air, konsumsi".to_string(),
            jumlah: 3_500_000,
        }],
    };
    submissions::rab::create(pool, &registry(), b.user_id, b.pondok_id, &form, rab_time())
        .await
        .expect("create rab")
        .rab
        .id
}

fn lpj_form() -> LpjForm {
    LpjForm {
        total_pemasukan: 4_000_000,
        total_pengeluaran: 0,
        proof_url: None,
        items: vec![
            LpjItemInput {
                kategori: "Operasional".to_string(),
                deskripsi: "Listrik dan air".to_string(),
                anggaran: 1_500_000,
                realisasi: 1_200_000,
            },
            LpjItemInput {
                kategori: "Konsumsi".to_string(),
                deskripsi: "Makan santri".to_string(),
                anggaran: 2_000_000,
                realisasi: 2_300_000,
            },
        ],
    }
}

#[tokio::test]
async fn test_lpj_requires_accepted_rab() {
    let Some(db) = setup_test_db().await else { return };
    let pool = db.pool();
    let b = branch(pool).await;

    // No RAB at all
    let err = submissions::lpj::create(pool, &registry(), b.user_id, b.pondok_id, &lpj_form(), lpj_time())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Ineligible(Ineligible::RabNotAccepted { rab_status: None })));

    // RAB submitted but not reviewed
    let rab_id = submit_rab(pool, &b).await;
    let err = submissions::lpj::create(pool, &registry(), b.user_id, b.pondok_id, &lpj_form(), lpj_time())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Ineligible(Ineligible::RabNotAccepted { rab_status: Some(SubmissionStatus::Diajukan) })
    ));

    // RAB in revision
    review::request_revision(pool, b.pusat_id, SubmissionKind::Rab, rab_id, "Rincian belum lengkap", rab_time())
        .await
        .unwrap();
    let err = submissions::lpj::create(pool, &registry(), b.user_id, b.pondok_id, &lpj_form(), lpj_time())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Ineligible(Ineligible::RabNotAccepted { rab_status: Some(SubmissionStatus::Revisi) })
    ));
    assert!(lpj::find_by_pondok_and_periode(pool, b.pondok_id, "202501").await.unwrap().is_none());
}

#[tokio::test]
async fn test_lpj_opening_balance_comes_from_rab() {
    let Some(db) = setup_test_db().await else { return };
    let pool = db.pool();
    let b = branch(pool).await;
    let rab_id = submit_rab(pool, &b).await;
    review::approve(pool, b.pusat_id, SubmissionKind::Rab, rab_id, rab_time()).await.unwrap();

    let detail = submissions::lpj::create(pool, &registry(), b.user_id, b.pondok_id, &lpj_form(), lpj_time())
        .await
        .expect("create lpj");

    assert_eq!(detail.lpj.status, SubmissionStatus::Diajukan);
    assert_eq!(detail.lpj.rab_id, rab_id);
    assert_eq!(detail.lpj.saldo_awal, 2_500_000);
    assert_eq!(detail.lpj.total_pemasukan, 4_000_000);
    // Realisasi sum, not the anggaran sum
    assert_eq!(detail.lpj.total_pengeluaran, 3_500_000);
    assert_eq!(detail.lpj.sisa_saldo, 2_500_000 + 4_000_000 - 3_500_000);
    assert_eq!(detail.items.len(), 2);
    assert_eq!(detail.items[1].realisasi, 2_300_000);
}

#[tokio::test]
async fn test_lpj_window_and_duplicate() {
    let Some(db) = setup_test_db().await else { return };
    let pool = db.pool();
    let b = branch(pool).await;
    let rab_id = submit_rab(pool, &b).await;
    review::approve(pool, b.pusat_id, SubmissionKind::Rab, rab_id, rab_time()).await.unwrap();

    let err = submissions::lpj::create(pool, &registry(), b.user_id, b.pondok_id, &lpj_form(), rab_time())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Ineligible(Ineligible::WindowClosed { kind: SubmissionKind::Lpj })));

    submissions::lpj::create(pool, &registry(), b.user_id, b.pondok_id, &lpj_form(), lpj_time())
        .await
        .expect("first lpj");
    let err = submissions::lpj::create(pool, &registry(), b.user_id, b.pondok_id, &lpj_form(), lpj_time())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Ineligible(Ineligible::AlreadySubmitted { kind: SubmissionKind::Lpj, .. })
    ));
}

#[tokio::test]
async fn test_lpj_resubmit_keeps_opening_balance() {
    let Some(db) = setup_test_db().await else { return };
    let pool = db.pool();
    let b = branch(pool).await;
    let rab_id = submit_rab(pool, &b).await;
    review::approve(pool, b.pusat_id, SubmissionKind::Rab, rab_id, rab_time()).await.unwrap();
    let created = submissions::lpj::create(pool, &registry(), b.user_id, b.pondok_id, &lpj_form(), lpj_time())
        .await
        .unwrap();

    review::request_revision(pool, b.pusat_id, SubmissionKind::Lpj, created.lpj.id, "Nota konsumsi tidak terbaca", lpj_time())
        .await
        .unwrap();

    let corrected = LpjForm {
        total_pemasukan: 4_500_000,
        total_pengeluaran: 3_000_000,
        proof_url: Some("https://files.example/lpj/lpj-202501-1-Al_Hikmah.pdf".to_string()),
        items: Vec::new(),
    };
    let resubmitted_at = at(2025, 1, 28, 16, 0);
    let detail = submissions::lpj::resubmit(pool, &registry(), b.user_id, b.pondok_id, created.lpj.id, &corrected, resubmitted_at)
        .await
        .expect("resubmit");

    assert_eq!(detail.lpj.status, SubmissionStatus::Diajukan);
    assert_eq!(detail.lpj.revision_message, None);
    assert_eq!(detail.lpj.submitted_at, Some(resubmitted_at));
    assert_eq!(detail.lpj.saldo_awal, 2_500_000);
    // Without items the declared expenditure is used
    assert_eq!(detail.lpj.total_pengeluaran, 3_000_000);
    assert_eq!(detail.lpj.sisa_saldo, 2_500_000 + 4_500_000 - 3_000_000);
    assert!(detail.items.is_empty());
    assert!(detail.lpj.proof_url.is_some());

    let accepted = review::approve(pool, b.pusat_id, SubmissionKind::Lpj, created.lpj.id, resubmitted_at)
        .await
        .unwrap();
    assert_eq!(accepted.state.status, SubmissionStatus::Diterima);
    assert_eq!(accepted.state.accepted_at, Some(resubmitted_at));
}
