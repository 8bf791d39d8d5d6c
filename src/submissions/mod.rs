//! Write paths for RAB and LPJ documents.
//!
//! Every operation re-checks eligibility against the stored state before it
//! writes, then notifies the other side and records an audit entry. `now` is
//! passed in so callers (and tests) control the clock.

pub mod lpj;
pub mod rab;
pub mod review;

use crate::errors::AppError;

fn validated(errors: Vec<String>) -> Result<(), AppError> {
    if errors.is_empty() { Ok(()) } else { Err(AppError::Validation(errors)) }
}
