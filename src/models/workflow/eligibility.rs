//! Eligibility gate: pure decisions over the period registry and existing records.
//!
//! Every write path consults the `check_*` functions before persisting. The
//! `can_*` forms exist for read-only callers (dashboards, client affordances).

use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;

use super::types::{SubmissionKind, SubmissionStatus};
use crate::models::periode::Periode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Ineligible {
    NoCurrentPeriod,
    ProfileIncomplete,
    WindowClosed { kind: SubmissionKind },
    AlreadySubmitted { kind: SubmissionKind, status: SubmissionStatus },
    RabNotAccepted { rab_status: Option<SubmissionStatus> },
    NotInRevision { kind: SubmissionKind, status: SubmissionStatus },
}

impl fmt::Display for Ineligible {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ineligible::NoCurrentPeriod => write!(f, "there is no active period"),
            Ineligible::ProfileIncomplete => {
                write!(f, "branch profile is incomplete or awaiting verification")
            }
            Ineligible::WindowClosed { kind } => write!(f, "the {kind} submission window is closed"),
            Ineligible::AlreadySubmitted { kind, status } => {
                write!(f, "a {kind} already exists for this period (status '{status}')")
            }
            Ineligible::RabNotAccepted { rab_status } => write!(
                f,
                "the RAB for this period must be accepted first (status '{}')",
                super::types::status_code_or_belum(*rab_status)
            ),
            Ineligible::NotInRevision { kind, status } => {
                write!(f, "the {kind} can only be edited while in revision (status '{status}')")
            }
        }
    }
}

fn require_period(period: Option<&Periode>) -> Result<&Periode, Ineligible> {
    period.ok_or(Ineligible::NoCurrentPeriod)
}

fn require_window(period: &Periode, kind: SubmissionKind, now: NaiveDateTime) -> Result<(), Ineligible> {
    if period.is_within_window(kind, now) {
        Ok(())
    } else {
        Err(Ineligible::WindowClosed { kind })
    }
}

fn require_absent(kind: SubmissionKind, existing: Option<SubmissionStatus>) -> Result<(), Ineligible> {
    match existing {
        Some(status) => Err(Ineligible::AlreadySubmitted { kind, status }),
        None => Ok(()),
    }
}

/// profile complete AND rab window open AND no RAB yet for (branch, period).
pub fn check_create_rab<'p>(
    profile_complete: bool,
    period: Option<&'p Periode>,
    existing_rab: Option<SubmissionStatus>,
    now: NaiveDateTime,
) -> Result<&'p Periode, Ineligible> {
    let period = require_period(period)?;
    if !profile_complete {
        return Err(Ineligible::ProfileIncomplete);
    }
    require_window(period, SubmissionKind::Rab, now)?;
    require_absent(SubmissionKind::Rab, existing_rab)?;
    Ok(period)
}

/// profile complete AND lpj window open AND RAB accepted AND no LPJ yet.
pub fn check_create_lpj<'p>(
    profile_complete: bool,
    period: Option<&'p Periode>,
    rab_status: Option<SubmissionStatus>,
    existing_lpj: Option<SubmissionStatus>,
    now: NaiveDateTime,
) -> Result<&'p Periode, Ineligible> {
    let period = require_period(period)?;
    if !profile_complete {
        return Err(Ineligible::ProfileIncomplete);
    }
    if rab_status != Some(SubmissionStatus::Diterima) {
        return Err(Ineligible::RabNotAccepted { rab_status });
    }
    require_window(period, SubmissionKind::Lpj, now)?;
    require_absent(SubmissionKind::Lpj, existing_lpj)?;
    Ok(period)
}

/// record in revisi AND the window of the record's own period open.
pub fn check_edit_submission(
    kind: SubmissionKind,
    status: SubmissionStatus,
    period: &Periode,
    now: NaiveDateTime,
) -> Result<(), Ineligible> {
    if status != SubmissionStatus::Revisi {
        return Err(Ineligible::NotInRevision { kind, status });
    }
    require_window(period, kind, now)
}

pub fn can_create_rab(
    profile_complete: bool,
    period: Option<&Periode>,
    existing_rab: Option<SubmissionStatus>,
    now: NaiveDateTime,
) -> bool {
    check_create_rab(profile_complete, period, existing_rab, now).is_ok()
}

pub fn can_create_lpj(
    profile_complete: bool,
    period: Option<&Periode>,
    rab_status: Option<SubmissionStatus>,
    existing_lpj: Option<SubmissionStatus>,
    now: NaiveDateTime,
) -> bool {
    check_create_lpj(profile_complete, period, rab_status, existing_lpj, now).is_ok()
}

pub fn can_edit_submission(
    kind: SubmissionKind,
    status: SubmissionStatus,
    period: &Periode,
    now: NaiveDateTime,
) -> bool {
    check_edit_submission(kind, status, period, now).is_ok()
}

/// What a branch may do right now, for the branch dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct EligibilitySummary {
    pub periode_id: Option<String>,
    pub profile_complete: bool,
    pub rab_window_open: bool,
    pub lpj_window_open: bool,
    pub rab_status: &'static str,
    pub lpj_status: &'static str,
    pub can_create_rab: bool,
    pub can_edit_rab: bool,
    pub can_create_lpj: bool,
    pub can_edit_lpj: bool,
    pub rab_blocked_by: Option<Ineligible>,
    pub lpj_blocked_by: Option<Ineligible>,
}

pub fn summarize(
    profile_complete: bool,
    period: Option<&Periode>,
    rab_status: Option<SubmissionStatus>,
    lpj_status: Option<SubmissionStatus>,
    now: NaiveDateTime,
) -> EligibilitySummary {
    let window_open = |kind| period.map(|p| p.is_within_window(kind, now)).unwrap_or(false);
    let can_edit = |kind, status: Option<SubmissionStatus>| match (period, status) {
        (Some(p), Some(s)) => can_edit_submission(kind, s, p, now),
        _ => false,
    };

    let rab_check = check_create_rab(profile_complete, period, rab_status, now);
    let lpj_check = check_create_lpj(profile_complete, period, rab_status, lpj_status, now);

    EligibilitySummary {
        periode_id: period.map(|p| p.id.clone()),
        profile_complete,
        rab_window_open: window_open(SubmissionKind::Rab),
        lpj_window_open: window_open(SubmissionKind::Lpj),
        rab_status: super::types::status_code_or_belum(rab_status),
        lpj_status: super::types::status_code_or_belum(lpj_status),
        can_create_rab: rab_check.is_ok(),
        can_edit_rab: can_edit(SubmissionKind::Rab, rab_status),
        can_create_lpj: lpj_check.is_ok(),
        can_edit_lpj: can_edit(SubmissionKind::Lpj, lpj_status),
        rab_blocked_by: rab_check.err(),
        lpj_blocked_by: lpj_check.err(),
    }
}
