//! User-facing notices emitted by the editor

use chrono::{DateTime, Utc};
use std::time::Duration;

use anet_model::AttendeeWarning;

/// Something the UI should show
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// Final save went through
    Saved { message: String },
    /// Background save went through (transient toast)
    Autosaved { at: DateTime<Utc>, message: String },
    /// Background save failed and will be retried
    AutosaveFailed { retry_in: Duration, message: String },
    /// Stale write; blocks until the user decides
    Conflict { message: String },
    /// An attendee edit was refused
    Warning(AttendeeWarning),
    /// Final save failed; nothing is retried
    SaveFailed { message: String },
    /// Leave the form for this path
    Navigate { path: String },
}

impl Notice {
    /// Text shown to the user, if any
    #[must_use]
    pub fn message(&self) -> Option<String> {
        match self {
            Notice::Saved { message }
            | Notice::Autosaved { message, .. }
            | Notice::AutosaveFailed { message, .. }
            | Notice::Conflict { message }
            | Notice::SaveFailed { message } => Some(message.clone()),
            Notice::Warning(w) => Some(w.to_string()),
            Notice::Navigate { .. } => None,
        }
    }

    /// Requires an explicit decision before editing continues
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        matches!(self, Notice::Conflict { .. })
    }
}
