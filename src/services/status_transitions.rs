use thiserror::Error;

use crate::db::types::ComplaintStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Actor {
    Admin,
    Owner,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum TransitionError {
    #[error("Only the owner can cancel a complaint")]
    AdminCannotCancel,
    #[error("Students can only cancel their complaints")]
    OwnerCannotSet,
    #[error("Cannot change a {from} complaint to {to}")]
    NotAllowed { from: &'static str, to: &'static str },
}

/// Statuses a complaint may currently be in for `actor` to move it to `target`.
/// Staying in the same active status is allowed so staff can update notes.
pub(crate) fn allowed_sources(
    actor: Actor,
    target: ComplaintStatus,
) -> Result<&'static [ComplaintStatus], TransitionError> {
    use ComplaintStatus::{Cancelled, InProgress, Pending, Resolved};

    match (actor, target) {
        (Actor::Admin, Pending) => Ok(&[Pending]),
        (Actor::Admin, InProgress) => Ok(&[Pending, InProgress]),
        (Actor::Admin, Resolved) => Ok(&[Pending, InProgress]),
        (Actor::Admin, Cancelled) => Err(TransitionError::AdminCannotCancel),
        (Actor::Owner, Cancelled) => Ok(&[Pending]),
        (Actor::Owner, _) => Err(TransitionError::OwnerCannotSet),
    }
}

pub(crate) fn check_transition(
    actor: Actor,
    from: ComplaintStatus,
    to: ComplaintStatus,
) -> Result<&'static [ComplaintStatus], TransitionError> {
    let sources = allowed_sources(actor, to)?;
    if sources.contains(&from) {
        Ok(sources)
    } else {
        Err(TransitionError::NotAllowed { from: from.as_str(), to: to.as_str() })
    }
}
