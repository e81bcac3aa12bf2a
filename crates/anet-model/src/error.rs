//! Error types for the report model
//!
//! Provides error handling for:
//! - Attendee edits refused by a role rule (surfaced as user warnings)
//! - Illegal lifecycle transitions
//! - Field-scoped validation failures

use crate::state_machine::ReportAction;
use crate::types::{ReportField, ReportState};

/// An attendee edit that was refused
///
/// The attendee list is left unchanged; the message is meant for the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttendeeWarning {
    /// The acting user tried to drop their own authorship
    #[error("You cannot remove yourself from authors list")]
    RemovingSelfAuthor,

    /// The last remaining author would be removed
    #[error("You must provide at least 1 author for a report")]
    RemovingLastAuthor,

    /// The primary attendee must be replaced before it stops attending
    #[error("Select a primary first to remove this person")]
    RemovingPrimaryAttendee,

    /// Interlocutors can never be authors
    #[error("An interlocutor cannot be an author")]
    InterlocutorCannotBeAuthor,

    /// Only attendees can be primary
    #[error("Only attending people can be primary")]
    NotAttending,

    /// The acting user cannot remove themselves from the report
    #[error("You cannot remove yourself from the report")]
    RemovingSelf,

    /// The person is not attached to the report
    #[error("person {0} is not part of this report")]
    UnknownPerson(String),
}

impl AttendeeWarning {
    /// Stable identifier, used to de-duplicate repeated warnings
    #[must_use]
    pub fn id(&self) -> &'static str {
        match self {
            Self::RemovingSelfAuthor => "removingSelfAuthor",
            Self::RemovingPrimaryAttendee => "removingPrimaryAttendee",
            Self::RemovingLastAuthor => "removingLastAuthor",
            Self::InterlocutorCannotBeAuthor => "interlocutorAuthor",
            Self::NotAttending => "nonAttendingPrimary",
            Self::RemovingSelf => "removingSelf",
            Self::UnknownPerson(_) => "unknownPerson",
        }
    }
}

/// Illegal lifecycle transition
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot {action:?} a report in state {from:?}")]
pub struct TransitionError {
    pub from: ReportState,
    pub action: ReportAction,
}

/// A single field-scoped validation failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: ReportField,
    pub message: String,
}

impl ValidationError {
    #[inline]
    pub fn new(field: ReportField, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Any model-level failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error(transparent)]
    Attendee(#[from] AttendeeWarning),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("report has {} validation error(s)", .0.len())]
    Invalid(Vec<ValidationError>),
}
