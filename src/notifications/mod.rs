pub mod poller;

pub use poller::{SessionPollers, UnreadPoller, UnreadSource};

use sqlx::PgPool;

use crate::models::notification::{self, NotificationTopic};
use crate::models::user::{self, Role};
use crate::models::workflow::{SubmissionKind, SubmissionStatus};

pub fn submitted_message(kind: SubmissionKind, pondok_name: &str, periode_id: &str, resubmitted: bool) -> String {
    if resubmitted {
        format!("{pondok_name} mengajukan ulang {kind} periode {periode_id} setelah revisi")
    } else {
        format!("{pondok_name} mengajukan {kind} periode {periode_id}")
    }
}

pub fn reviewed_message(kind: SubmissionKind, periode_id: &str, status: SubmissionStatus) -> String {
    match status {
        SubmissionStatus::Diterima => format!("{kind} periode {periode_id} telah diterima"),
        SubmissionStatus::Revisi => format!("{kind} periode {periode_id} perlu direvisi"),
        SubmissionStatus::Diajukan => format!("{kind} periode {periode_id} sedang ditinjau"),
    }
}

pub fn verified_message(pondok_name: &str) -> String {
    format!("Profil {pondok_name} telah diverifikasi")
}

/// Notify every central admin. Failures are logged; the caller's write already succeeded.
pub async fn notify_central_admins(pool: &PgPool, topic: NotificationTopic, entity_id: &str, message: &str) {
    let recipients = match user::ids_by_role(pool, Role::AdminPusat).await {
        Ok(ids) => ids,
        Err(e) => {
            log::error!("Could not load central admins for notification: {e}");
            return;
        }
    };
    deliver(pool, &recipients, topic, entity_id, message).await;
}

/// Notify every user of one branch.
pub async fn notify_pondok_users(
    pool: &PgPool,
    pondok_id: i64,
    topic: NotificationTopic,
    entity_id: &str,
    message: &str,
) {
    let recipients = match user::ids_for_pondok(pool, pondok_id).await {
        Ok(ids) => ids,
        Err(e) => {
            log::error!("Could not load users of pondok {pondok_id} for notification: {e}");
            return;
        }
    };
    deliver(pool, &recipients, topic, entity_id, message).await;
}

async fn deliver(pool: &PgPool, recipients: &[i64], topic: NotificationTopic, entity_id: &str, message: &str) {
    match notification::create_for_users(pool, recipients, topic, Some(entity_id), message).await {
        Ok(n) => log::debug!("Sent {} notification to {n} users: {message}", topic.as_str()),
        Err(e) => log::error!("Notification delivery failed ({}): {e}", topic.as_str()),
    }
}
