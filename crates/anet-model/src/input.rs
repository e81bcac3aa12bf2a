//! Save payload sent to the backend
//!
//! Fields that make no sense for the engagement's situation are cleared
//! here so the server never stores stale outcome data for a future or
//! cancelled engagement.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Atmosphere, CancelledReason, EntityRef, Report, ReportPerson, SensitiveInformation};

/// Report person as sent to the server: a reference plus plain role flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPersonRef {
    pub uuid: String,
    pub author: bool,
    pub attendee: bool,
    pub primary: bool,
    pub interlocutor: bool,
}

impl From<&ReportPerson> for ReportPersonRef {
    fn from(p: &ReportPerson) -> Self {
        Self {
            uuid: p.uuid.clone(),
            author: p.author,
            attendee: p.attendee,
            primary: p.primary,
            interlocutor: p.interlocutor,
        }
    }
}

/// `ReportInput` of the GraphQL API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    pub intent: String,
    pub engagement_date: Option<DateTime<Utc>>,
    pub duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_reason: Option<CancelledReason>,
    pub atmosphere: Option<Atmosphere>,
    pub atmosphere_details: String,
    pub location: Option<EntityRef>,
    pub report_people: Vec<ReportPersonRef>,
    pub tasks: Vec<EntityRef>,
    pub report_text: String,
    pub next_steps: String,
    pub key_outcomes: String,
    /// Last server timestamp seen; lets the server detect stale writes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_sensitive_information: Option<SensitiveInformation>,
}

impl ReportInput {
    /// Build the payload for `report` as of `now`
    #[must_use]
    pub fn from_report(report: &Report, now: DateTime<Utc>) -> Self {
        let mut input = Self {
            uuid: report.uuid.clone(),
            intent: report.intent.clone(),
            engagement_date: report.engagement_date,
            duration: report.duration,
            cancelled_reason: report.cancelled_reason,
            atmosphere: report.atmosphere,
            atmosphere_details: report.atmosphere_details.clone(),
            location: report.location.as_ref().map(|l| EntityRef::new(l.uuid.clone())),
            report_people: report.report_people.iter().map(ReportPersonRef::from).collect(),
            tasks: report.tasks.iter().map(|t| EntityRef::new(t.uuid.clone())).collect(),
            report_text: report.report_text.clone(),
            next_steps: report.next_steps.clone(),
            key_outcomes: report.key_outcomes.clone(),
            updated_at: report.updated_at,
            report_sensitive_information: None,
        };

        if report.is_future(now) {
            input.atmosphere = None;
            input.atmosphere_details.clear();
            input.next_steps.clear();
            input.key_outcomes.clear();
            input.cancelled_reason = None;
        } else if !report.cancelled {
            input.cancelled_reason = None;
        } else {
            input.atmosphere = None;
            input.atmosphere_details.clear();
            input.key_outcomes.clear();
        }

        let sensitive = &report.sensitive_information;
        if sensitive.uuid.is_some() || sensitive.text.as_deref().is_some_and(|t| !t.is_empty()) {
            input.report_sensitive_information = Some(sensitive.clone());
        }
        input
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn filled() -> Report {
        let mut r = Report::new();
        r.intent = "Meet".into();
        r.atmosphere = Some(Atmosphere::Positive);
        r.atmosphere_details = "calm".into();
        r.next_steps = "follow up".into();
        r.key_outcomes = "agreed".into();
        r.cancelled_reason = Some(CancelledReason::CancelledByAdvisor);
        r
    }

    #[test]
    fn future_engagement_clears_outcomes() {
        let now = Utc::now();
        let mut r = filled();
        r.engagement_date = Some(now + Duration::days(2));
        let input = ReportInput::from_report(&r, now);
        assert_eq!(input.atmosphere, None);
        assert!(input.next_steps.is_empty());
        assert!(input.key_outcomes.is_empty());
        assert_eq!(input.cancelled_reason, None);
    }

    #[test]
    fn reason_dropped_unless_cancelled() {
        let now = Utc::now();
        let mut r = filled();
        r.engagement_date = Some(now - Duration::days(1));
        let input = ReportInput::from_report(&r, now);
        assert_eq!(input.cancelled_reason, None);
        assert_eq!(input.next_steps, "follow up");

        r.cancelled = true;
        let input = ReportInput::from_report(&r, now);
        assert_eq!(input.cancelled_reason, Some(CancelledReason::CancelledByAdvisor));
        assert_eq!(input.atmosphere, None);
        assert!(input.key_outcomes.is_empty());
        assert_eq!(input.next_steps, "follow up");
    }
}
