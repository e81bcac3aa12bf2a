//! ANET report model
//!
//! Domain types shared by the draft engine and the workload simulator:
//! - Report and report people types
//! - Attendee role rules
//! - Report lifecycle state machine
//! - Field validation and the save payload

#![allow(missing_docs)]

pub mod attendees;
pub mod error;
pub mod input;
pub mod state_machine;
pub mod types;
pub mod validation;

use chrono::{DateTime, Utc};

pub use attendees::{
    enforce_role_invariants, force_only_attending_person_per_role_to_primary,
    normalize_report_people, normalize_report_person, primary_attendee, remove_person,
    set_primary, toggle_attendee, toggle_author, toggle_interlocutor,
};
pub use error::{AttendeeWarning, ModelError, TransitionError, ValidationError};
pub use input::{ReportInput, ReportPersonRef};
pub use state_machine::ReportAction;
pub use types::*;
pub use validation::{validate_field, validate_report};

/// Whether an engagement lies after the end of `now`'s (UTC) day
#[must_use]
pub fn is_future(engagement_date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    engagement_date.is_some_and(|d| d.date_naive() > now.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn later_today_is_not_future() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let tonight = Utc.with_ymd_and_hms(2024, 5, 1, 23, 30, 0).unwrap();
        let tomorrow = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 1).unwrap();
        assert!(!is_future(Some(tonight), now));
        assert!(is_future(Some(tomorrow), now));
        assert!(!is_future(None, now));
    }
}
