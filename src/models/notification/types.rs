use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::models::workflow::SubmissionKind;

/// What a notification refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationTopic {
    Pondok,
    Rab,
    Lpj,
}

impl NotificationTopic {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationTopic::Pondok => "pondok",
            NotificationTopic::Rab => "rab",
            NotificationTopic::Lpj => "lpj",
        }
    }
}

impl From<SubmissionKind> for NotificationTopic {
    fn from(kind: SubmissionKind) -> Self {
        match kind {
            SubmissionKind::Rab => NotificationTopic::Rab,
            SubmissionKind::Lpj => NotificationTopic::Lpj,
        }
    }
}

impl FromStr for NotificationTopic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pondok" => Ok(NotificationTopic::Pondok),
            "rab" => Ok(NotificationTopic::Rab),
            "lpj" => Ok(NotificationTopic::Lpj),
            other => Err(format!("Unknown notification type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub topic: String,
    pub entity_id: Option<String>,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_follows_submission_kind() {
        assert_eq!(NotificationTopic::from(SubmissionKind::Lpj), NotificationTopic::Lpj);
        assert_eq!("pondok".parse::<NotificationTopic>().unwrap().as_str(), "pondok");
        assert!("rapat".parse::<NotificationTopic>().is_err());
    }
}
