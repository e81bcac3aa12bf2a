//! Field validation for reports
//!
//! Each field yields at most one message. Validation never blocks
//! autosave; the form only uses it to gate the final submit.

use chrono::{DateTime, Utc};

use crate::attendees::primary_attendee;
use crate::error::ValidationError;
use crate::types::{Report, ReportField, Role, Status};

/// Validate a single field of `report`
#[must_use]
pub fn validate_field(report: &Report, field: ReportField, now: DateTime<Utc>) -> Option<ValidationError> {
    let future = report.is_future(now);
    let cancelled = report.cancelled;
    let fail = |message: &str| Some(ValidationError::new(field, message));

    match field {
        ReportField::Intent if report.intent.trim().is_empty() => {
            fail("You must provide the Intent")
        }
        ReportField::EngagementDate if report.engagement_date.is_none() => {
            fail("You must provide the Engagement date")
        }
        ReportField::CancelledReason if cancelled && report.cancelled_reason.is_none() => {
            fail("You must provide a reason for cancellation")
        }
        ReportField::Atmosphere if !cancelled && !future && report.atmosphere.is_none() => {
            fail("You must provide the overall Atmosphere of the engagement")
        }
        ReportField::Location if report.location.is_none() => fail("You must provide the Location"),
        ReportField::ReportPeople if !cancelled => {
            report_people_message(report, now).map(|m| ValidationError::new(field, m))
        }
        ReportField::Tasks if report.tasks.is_empty() => fail("You must provide at least one task"),
        ReportField::ReportText if !cancelled && report.report_text.trim().is_empty() => {
            fail("You must provide the Report text")
        }
        ReportField::NextSteps if !future && report.next_steps.trim().is_empty() => {
            fail("You must provide the Next steps")
        }
        ReportField::KeyOutcomes
            if !cancelled && !future && report.key_outcomes.trim().is_empty() =>
        {
            fail("You must provide the Key outcomes")
        }
        _ => None,
    }
}

/// Validate every field, in form order
#[must_use]
pub fn validate_report(report: &Report, now: DateTime<Utc>) -> Vec<ValidationError> {
    ReportField::ALL
        .iter()
        .filter_map(|f| validate_field(report, *f, now))
        .collect()
}

fn report_people_message(report: &Report, now: DateTime<Utc>) -> Option<String> {
    let people = &report.report_people;

    for role in [Role::Advisor, Role::Interlocutor] {
        let label = role.name();
        let Some(primary) = primary_attendee(people, role) else {
            return Some(format!(
                "No primary {label} has been provided for the Engagement"
            ));
        };
        let name = &primary.name;
        if primary.status != Status::Active {
            return Some(format!(
                "The primary {label} - {name} - needs to have an active profile"
            ));
        }
        if primary.end_of_tour_date.is_some_and(|d| d < now) {
            return Some(format!(
                "The primary {label}'s - {name} - end of tour date has passed"
            ));
        }
        match &primary.position {
            None => {
                return Some(format!(
                    "The primary {label} - {name} - needs to be assigned to a position"
                ))
            }
            Some(pos) if pos.status != Status::Active => {
                return Some(format!(
                    "The primary {label} - {name} - needs to be in an active position"
                ))
            }
            Some(_) => {}
        }
    }

    if !people.iter().any(|p| p.author) {
        return Some("You must provide at least 1 author".into());
    }
    if !people.iter().any(|p| p.author && p.attendee) {
        return Some("You must provide at least 1 attending author(s)".into());
    }
    if people.iter().any(|p| !p.author && !p.attendee) {
        return Some(
            "You must remove the people who have no involvement (neither attending nor author) before submitting"
                .into(),
        );
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn blank_report_flags_required_fields() {
        let now = Utc::now();
        let errors = validate_report(&Report::new(), now);
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert!(fields.contains(&ReportField::Intent));
        assert!(fields.contains(&ReportField::EngagementDate));
        assert!(fields.contains(&ReportField::ReportPeople));
        assert!(!fields.contains(&ReportField::CancelledReason));
    }

    #[test]
    fn future_engagement_relaxes_outcome_fields() {
        let now = Utc::now();
        let mut report = Report::new();
        report.engagement_date = Some(now + Duration::days(3));
        assert!(validate_field(&report, ReportField::Atmosphere, now).is_none());
        assert!(validate_field(&report, ReportField::NextSteps, now).is_none());
        assert!(validate_field(&report, ReportField::KeyOutcomes, now).is_none());
        assert!(validate_field(&report, ReportField::ReportText, now).is_some());
    }

    #[test]
    fn cancelled_requires_a_reason() {
        let now = Utc::now();
        let mut report = Report::new();
        report.cancelled = true;
        let err = validate_field(&report, ReportField::CancelledReason, now).unwrap();
        assert_eq!(err.message, "You must provide a reason for cancellation");
        assert!(validate_field(&report, ReportField::ReportPeople, now).is_none());
    }
}
