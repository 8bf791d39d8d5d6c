use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use super::types::SubmissionStatus;

pub const MIN_REVISION_MESSAGE_CHARS: usize = 10;

/// The review-relevant part of a RAB or LPJ record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewState {
    pub status: SubmissionStatus,
    pub submitted_at: Option<DateTime<Utc>>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub revision_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewAction {
    /// Central admin accepts the document.
    Approve,
    /// Central admin sends the document back with a message.
    RequestRevision(String),
    /// Branch admin submits a revised document.
    Resubmit,
}

impl ReviewAction {
    pub fn name(&self) -> &'static str {
        match self {
            ReviewAction::Approve => "approve",
            ReviewAction::RequestRevision(_) => "request_revision",
            ReviewAction::Resubmit => "resubmit",
        }
    }

    /// The status a record must be in for this action to apply.
    pub fn required_status(&self) -> SubmissionStatus {
        match self {
            ReviewAction::Approve | ReviewAction::RequestRevision(_) => SubmissionStatus::Diajukan,
            ReviewAction::Resubmit => SubmissionStatus::Revisi,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    NotAllowed { from: SubmissionStatus, action: &'static str },
    RevisionMessageTooShort { min: usize, actual: usize },
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionError::NotAllowed { from, action } => {
                write!(f, "cannot {action} a document with status '{from}'")
            }
            TransitionError::RevisionMessageTooShort { min, actual } => {
                write!(f, "revision message must be at least {min} characters (got {actual})")
            }
        }
    }
}

/// Trim a revision message and enforce the minimum length (counted in characters).
pub fn validate_revision_message(message: &str) -> Result<String, TransitionError> {
    let trimmed = message.trim();
    let actual = trimmed.chars().count();
    if actual < MIN_REVISION_MESSAGE_CHARS {
        return Err(TransitionError::RevisionMessageTooShort {
            min: MIN_REVISION_MESSAGE_CHARS,
            actual,
        });
    }
    Ok(trimmed.to_string())
}

impl ReviewState {
    /// State of a freshly created record.
    pub fn submitted(now: DateTime<Utc>) -> Self {
        ReviewState {
            status: SubmissionStatus::Diajukan,
            submitted_at: Some(now),
            accepted_at: None,
            revision_message: None,
        }
    }

    /// Compute the state after `action`. The receiver is left untouched.
    ///
    /// ```text
    /// diajukan --Approve--> diterima          (accepted_at = now, message cleared)
    /// diajukan --RequestRevision(m)--> revisi (message = m)
    /// revisi   --Resubmit--> diajukan         (submitted_at = now, message cleared)
    /// ```
    pub fn apply(&self, action: &ReviewAction, now: DateTime<Utc>) -> Result<ReviewState, TransitionError> {
        if self.status != action.required_status() {
            return Err(TransitionError::NotAllowed { from: self.status, action: action.name() });
        }

        let next = match action {
            ReviewAction::Approve => ReviewState {
                status: SubmissionStatus::Diterima,
                submitted_at: self.submitted_at,
                accepted_at: Some(now),
                revision_message: None,
            },
            ReviewAction::RequestRevision(message) => {
                let message = validate_revision_message(message)?;
                ReviewState {
                    status: SubmissionStatus::Revisi,
                    submitted_at: self.submitted_at,
                    accepted_at: self.accepted_at,
                    revision_message: Some(message),
                }
            }
            ReviewAction::Resubmit => ReviewState {
                status: SubmissionStatus::Diajukan,
                submitted_at: Some(now),
                accepted_at: self.accepted_at,
                revision_message: None,
            },
        };
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 5, h, 0, 0).unwrap()
    }

    #[test]
    fn approve_sets_accepted_at_and_clears_message() {
        let mut state = ReviewState::submitted(at(1));
        state.revision_message = Some("stale message".into());
        let next = state.apply(&ReviewAction::Approve, at(2)).unwrap();
        assert_eq!(next.status, SubmissionStatus::Diterima);
        assert_eq!(next.accepted_at, Some(at(2)));
        assert_eq!(next.revision_message, None);
        assert_eq!(next.submitted_at, Some(at(1)));
    }

    #[test]
    fn request_revision_stores_trimmed_message() {
        let state = ReviewState::submitted(at(1));
        let next = state
            .apply(&ReviewAction::RequestRevision("  Please itemize expenses ".into()), at(2))
            .unwrap();
        assert_eq!(next.status, SubmissionStatus::Revisi);
        assert_eq!(next.revision_message.as_deref(), Some("Please itemize expenses"));
        assert_eq!(next.accepted_at, None);
    }

    #[test]
    fn short_revision_message_is_rejected() {
        let state = ReviewState::submitted(at(1));
        let err = state.apply(&ReviewAction::RequestRevision("too short".into()), at(2)).unwrap_err();
        assert_eq!(err, TransitionError::RevisionMessageTooShort { min: 10, actual: 9 });
        assert!(validate_revision_message("exactly10!").is_ok());
    }

    #[test]
    fn resubmit_resets_to_diajukan_with_fresh_timestamp() {
        let state = ReviewState::submitted(at(1))
            .apply(&ReviewAction::RequestRevision("Please itemize expenses".into()), at(2))
            .unwrap();
        let next = state.apply(&ReviewAction::Resubmit, at(5)).unwrap();
        assert_eq!(next.status, SubmissionStatus::Diajukan);
        assert_eq!(next.submitted_at, Some(at(5)));
        assert_eq!(next.revision_message, None);
    }

    #[test]
    fn transitions_outside_the_graph_are_rejected() {
        let accepted = ReviewState::submitted(at(1)).apply(&ReviewAction::Approve, at(2)).unwrap();
        assert!(matches!(
            accepted.apply(&ReviewAction::Approve, at(3)),
            Err(TransitionError::NotAllowed { from: SubmissionStatus::Diterima, action: "approve" })
        ));
        assert!(accepted.apply(&ReviewAction::Resubmit, at(3)).is_err());

        let submitted = ReviewState::submitted(at(1));
        assert!(submitted.apply(&ReviewAction::Resubmit, at(2)).is_err());

        let revisi = submitted
            .apply(&ReviewAction::RequestRevision("Please itemize expenses".into()), at(2))
            .unwrap();
        assert!(revisi.apply(&ReviewAction::Approve, at(3)).is_err());
    }
}
