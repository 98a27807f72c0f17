//! # Transition Function
//!
//! Pure decisions over (stored state, observed provider state). The services
//! perform the I/O; these functions decide what the I/O should be.

use super::errors::VerificationError;
use super::record::VerificationRecord;
use shared_types::VerificationStatus;

/// Outcome of comparing the stored status with the provider's.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Nothing to persist.
    Unchanged,
    /// Session just became verified; fetch the report and persist it.
    BecameVerified,
    /// Status moved to a non-verified value; persist the status only.
    Changed(VerificationStatus),
}

/// Decide how a poll result affects a stored record.
///
/// Terminal statuses are permanent: whatever the provider reports for a
/// `verified` or `canceled` record, the result is `Unchanged`.
pub fn reconcile(stored: Option<VerificationStatus>, observed: VerificationStatus) -> Transition {
    match stored {
        Some(current) if current.is_terminal() => Transition::Unchanged,
        Some(current) if current == observed => Transition::Unchanged,
        _ if observed == VerificationStatus::Verified => Transition::BecameVerified,
        _ => Transition::Changed(observed),
    }
}

/// What a session request should do for the record it found.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionAction {
    /// No record yet: admit, insert, open a session.
    CreateRecord,
    /// Record exists but never got a session: open one without re-admitting.
    OpenSession(VerificationRecord),
    /// Re-fetch the existing session instead of opening another.
    Resume {
        record: VerificationRecord,
        session_id: String,
    },
}

/// Decide how to serve a session request given the existing record.
pub fn session_action(
    existing: Option<VerificationRecord>,
) -> Result<SessionAction, VerificationError> {
    let Some(record) = existing else {
        return Ok(SessionAction::CreateRecord);
    };

    match record.status {
        None | Some(VerificationStatus::RequiresInput) => Ok(match record.session_id.clone() {
            Some(session_id) => SessionAction::Resume { record, session_id },
            None => SessionAction::OpenSession(record),
        }),
        Some(_) => Err(VerificationError::AlreadyCompleted),
    }
}
