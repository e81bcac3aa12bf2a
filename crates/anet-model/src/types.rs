//! Core types for the report domain
//!
//! Defines the data carried by a report being edited:
//! - Report lifecycle state and engagement metadata
//! - Report people (attendees) and their role flags
//! - Typed field edits used by the form layer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Treat an explicit `null` like a missing field
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Report lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportState {
    /// Being written, not yet submitted
    #[default]
    Draft,
    /// Submitted, waiting in the approval chain
    PendingApproval,
    /// Fully approved, waiting for publication
    Approved,
    /// Published
    Published,
    /// Sent back to the authors for changes
    Rejected,
    /// Engagement did not take place
    Cancelled,
}

impl ReportState {
    /// All states, in workflow order
    pub const ALL: [ReportState; 6] = [
        ReportState::Draft,
        ReportState::PendingApproval,
        ReportState::Approved,
        ReportState::Published,
        ReportState::Rejected,
        ReportState::Cancelled,
    ];

    /// Human readable label
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            ReportState::Draft => "Draft",
            ReportState::PendingApproval => "Pending Approval",
            ReportState::Approved => "Approved",
            ReportState::Published => "Published",
            ReportState::Rejected => "Changes requested",
            ReportState::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for ReportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Entity status shared by people, positions, organizations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    #[default]
    Active,
    Inactive,
}

/// Overall atmosphere of an engagement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Atmosphere {
    Positive,
    Neutral,
    Negative,
}

impl Atmosphere {
    pub const ALL: [Atmosphere; 3] = [Atmosphere::Positive, Atmosphere::Neutral, Atmosphere::Negative];
}

/// Reason an engagement was cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CancelledReason {
    CancelledByAdvisor,
    CancelledByInterlocutor,
    CancelledDueToTransportation,
    CancelledDueToForceProtection,
    CancelledDueToRoutes,
    CancelledDueToThreat,
    CancelledDueToAvailabilityOfInterpreters,
    CancelledDueToNetworkIssues,
}

impl CancelledReason {
    pub const ALL: [CancelledReason; 8] = [
        CancelledReason::CancelledByAdvisor,
        CancelledReason::CancelledByInterlocutor,
        CancelledReason::CancelledDueToTransportation,
        CancelledReason::CancelledDueToForceProtection,
        CancelledReason::CancelledDueToRoutes,
        CancelledReason::CancelledDueToThreat,
        CancelledReason::CancelledDueToAvailabilityOfInterpreters,
        CancelledReason::CancelledDueToNetworkIssues,
    ];
}

/// Reference to another entity by uuid
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub uuid: String,
}

impl EntityRef {
    #[inline]
    #[must_use]
    pub fn new(uuid: impl Into<String>) -> Self {
        Self { uuid: uuid.into() }
    }
}

/// Organization summary attached to a position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationRef {
    pub uuid: String,
    #[serde(default)]
    pub short_name: Option<String>,
}

/// Position summary attached to a report person
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionRef {
    pub uuid: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub organization: Option<OrganizationRef>,
}

/// Which side of the engagement a person attends for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Advisor-side attendees (authors live here)
    Advisor,
    /// Interlocutor-side attendees
    Interlocutor,
}

impl Role {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Role::Advisor => "advisor",
            Role::Interlocutor => "interlocutor",
        }
    }
}

/// A person attached to a report with fully resolved role flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPerson {
    pub uuid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rank: Option<String>,
    #[serde(default)]
    pub status: Status,
    /// Whether this person has an account on the system
    #[serde(default, rename = "user")]
    pub is_user: bool,
    #[serde(default)]
    pub end_of_tour_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub position: Option<PositionRef>,
    pub author: bool,
    pub attendee: bool,
    pub primary: bool,
    pub interlocutor: bool,
}

impl ReportPerson {
    /// Same person, regardless of flags
    #[inline]
    #[must_use]
    pub fn is_same(&self, uuid: &str) -> bool {
        self.uuid == uuid
    }

    /// Role side of this person
    #[inline]
    #[must_use]
    pub fn role(&self) -> Role {
        if self.interlocutor {
            Role::Interlocutor
        } else {
            Role::Advisor
        }
    }

    /// Partition this person counts towards for primary selection
    ///
    /// Non-attendees are in no partition.
    #[inline]
    #[must_use]
    pub fn partition(&self) -> Option<Role> {
        self.attendee.then(|| self.role())
    }
}

/// A report person as it arrives from a picker, with flags possibly unset
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPersonInput {
    pub uuid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rank: Option<String>,
    #[serde(default)]
    pub status: Status,
    #[serde(default, rename = "user")]
    pub is_user: bool,
    #[serde(default)]
    pub end_of_tour_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub position: Option<PositionRef>,
    #[serde(default)]
    pub author: Option<bool>,
    #[serde(default)]
    pub attendee: Option<bool>,
    #[serde(default)]
    pub primary: Option<bool>,
    #[serde(default)]
    pub interlocutor: Option<bool>,
}

impl ReportPersonInput {
    /// Fresh pick with every flag left to its default
    #[must_use]
    pub fn new(uuid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn user(mut self, is_user: bool) -> Self {
        self.is_user = is_user;
        self
    }

    #[must_use]
    pub fn with_author(mut self, author: bool) -> Self {
        self.author = Some(author);
        self
    }

    #[must_use]
    pub fn with_attendee(mut self, attendee: bool) -> Self {
        self.attendee = Some(attendee);
        self
    }

    #[must_use]
    pub fn with_primary(mut self, primary: bool) -> Self {
        self.primary = Some(primary);
        self
    }

    #[must_use]
    pub fn with_interlocutor(mut self, interlocutor: bool) -> Self {
        self.interlocutor = Some(interlocutor);
        self
    }

    #[must_use]
    pub fn with_position(mut self, position: PositionRef) -> Self {
        self.position = Some(position);
        self
    }
}

impl From<ReportPerson> for ReportPersonInput {
    fn from(p: ReportPerson) -> Self {
        Self {
            uuid: p.uuid,
            name: p.name,
            rank: p.rank,
            status: p.status,
            is_user: p.is_user,
            end_of_tour_date: p.end_of_tour_date,
            position: p.position,
            author: Some(p.author),
            attendee: Some(p.attendee),
            primary: Some(p.primary),
            interlocutor: Some(p.interlocutor),
        }
    }
}

/// Sensitive information block of a report
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SensitiveInformation {
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

/// A report (engagement record)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Report {
    pub uuid: Option<String>,
    pub state: ReportState,
    #[serde(deserialize_with = "nullable")]
    pub intent: String,
    pub engagement_date: Option<DateTime<Utc>>,
    /// Duration in minutes
    pub duration: Option<u32>,
    /// Client-side flag, derived from the presence of a cancelled reason
    pub cancelled: bool,
    pub cancelled_reason: Option<CancelledReason>,
    pub atmosphere: Option<Atmosphere>,
    #[serde(deserialize_with = "nullable")]
    pub atmosphere_details: String,
    pub location: Option<EntityRef>,
    #[serde(deserialize_with = "nullable")]
    pub report_people: Vec<ReportPerson>,
    #[serde(deserialize_with = "nullable")]
    pub tasks: Vec<EntityRef>,
    #[serde(deserialize_with = "nullable")]
    pub report_text: String,
    #[serde(deserialize_with = "nullable")]
    pub next_steps: String,
    #[serde(deserialize_with = "nullable")]
    pub key_outcomes: String,
    pub updated_at: Option<DateTime<Utc>>,
    pub released_at: Option<DateTime<Utc>>,
    #[serde(rename = "reportSensitiveInformation", deserialize_with = "nullable")]
    pub sensitive_information: SensitiveInformation,
}

impl Report {
    /// Blank template for a new report
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the report has been persisted at least once
    #[inline]
    #[must_use]
    pub fn is_saved(&self) -> bool {
        self.uuid.is_some()
    }

    /// Whether the engagement lies after the end of `now`'s day
    #[inline]
    #[must_use]
    pub fn is_future(&self, now: DateTime<Utc>) -> bool {
        crate::is_future(self.engagement_date, now)
    }

    /// Apply a typed field edit
    pub fn apply(&mut self, change: FieldChange) {
        match change {
            FieldChange::Intent(v) => self.intent = v,
            FieldChange::EngagementDate(v) => self.engagement_date = v,
            FieldChange::Duration(v) => self.duration = v,
            FieldChange::Cancelled(v) => self.cancelled = v,
            FieldChange::CancelledReason(v) => self.cancelled_reason = v,
            FieldChange::Atmosphere(v) => self.atmosphere = v,
            FieldChange::AtmosphereDetails(v) => self.atmosphere_details = v,
            FieldChange::Location(v) => self.location = v,
            FieldChange::Tasks(v) => self.tasks = v,
            FieldChange::ReportText(v) => self.report_text = v,
            FieldChange::NextSteps(v) => self.next_steps = v,
            FieldChange::KeyOutcomes(v) => self.key_outcomes = v,
            FieldChange::SensitiveText(v) => self.sensitive_information.text = v,
        }
    }
}

/// Editable report field, used for touched bookkeeping and validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReportField {
    Intent,
    EngagementDate,
    Duration,
    Cancelled,
    CancelledReason,
    Atmosphere,
    AtmosphereDetails,
    Location,
    ReportPeople,
    Tasks,
    ReportText,
    NextSteps,
    KeyOutcomes,
    SensitiveInformation,
}

impl ReportField {
    pub const ALL: [ReportField; 14] = [
        ReportField::Intent,
        ReportField::EngagementDate,
        ReportField::Duration,
        ReportField::Cancelled,
        ReportField::CancelledReason,
        ReportField::Atmosphere,
        ReportField::AtmosphereDetails,
        ReportField::Location,
        ReportField::ReportPeople,
        ReportField::Tasks,
        ReportField::ReportText,
        ReportField::NextSteps,
        ReportField::KeyOutcomes,
        ReportField::SensitiveInformation,
    ];

    /// Wire name of the field
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ReportField::Intent => "intent",
            ReportField::EngagementDate => "engagementDate",
            ReportField::Duration => "duration",
            ReportField::Cancelled => "cancelled",
            ReportField::CancelledReason => "cancelledReason",
            ReportField::Atmosphere => "atmosphere",
            ReportField::AtmosphereDetails => "atmosphereDetails",
            ReportField::Location => "location",
            ReportField::ReportPeople => "reportPeople",
            ReportField::Tasks => "tasks",
            ReportField::ReportText => "reportText",
            ReportField::NextSteps => "nextSteps",
            ReportField::KeyOutcomes => "keyOutcomes",
            ReportField::SensitiveInformation => "reportSensitiveInformation",
        }
    }
}

impl fmt::Display for ReportField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed edit of a single report field
///
/// Report people are not edited through this type; they go through the
/// attendee rules in [`crate::attendees`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldChange {
    Intent(String),
    EngagementDate(Option<DateTime<Utc>>),
    Duration(Option<u32>),
    Cancelled(bool),
    CancelledReason(Option<CancelledReason>),
    Atmosphere(Option<Atmosphere>),
    AtmosphereDetails(String),
    Location(Option<EntityRef>),
    Tasks(Vec<EntityRef>),
    ReportText(String),
    NextSteps(String),
    KeyOutcomes(String),
    SensitiveText(Option<String>),
}

impl FieldChange {
    /// The field this edit touches
    #[must_use]
    pub fn field(&self) -> ReportField {
        match self {
            FieldChange::Intent(_) => ReportField::Intent,
            FieldChange::EngagementDate(_) => ReportField::EngagementDate,
            FieldChange::Duration(_) => ReportField::Duration,
            FieldChange::Cancelled(_) => ReportField::Cancelled,
            FieldChange::CancelledReason(_) => ReportField::CancelledReason,
            FieldChange::Atmosphere(_) => ReportField::Atmosphere,
            FieldChange::AtmosphereDetails(_) => ReportField::AtmosphereDetails,
            FieldChange::Location(_) => ReportField::Location,
            FieldChange::Tasks(_) => ReportField::Tasks,
            FieldChange::ReportText(_) => ReportField::ReportText,
            FieldChange::NextSteps(_) => ReportField::NextSteps,
            FieldChange::KeyOutcomes(_) => ReportField::KeyOutcomes,
            FieldChange::SensitiveText(_) => ReportField::SensitiveInformation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_state_serializes_screaming_snake() {
        let json = serde_json::to_string(&ReportState::PendingApproval).unwrap();
        assert_eq!(json, "\"PENDING_APPROVAL\"");
    }

    #[test]
    fn field_change_names_its_field() {
        let mut report = Report::new();
        let change = FieldChange::Intent("Discuss logistics".into());
        assert_eq!(change.field(), ReportField::Intent);

        report.apply(change);
        assert_eq!(report.intent, "Discuss logistics");
    }

    #[test]
    fn person_partition_follows_attendance() {
        let mut person = ReportPerson {
            uuid: "p1".into(),
            name: "Jane".into(),
            rank: None,
            status: Status::Active,
            is_user: true,
            end_of_tour_date: None,
            position: None,
            author: false,
            attendee: true,
            primary: false,
            interlocutor: true,
        };
        assert_eq!(person.partition(), Some(Role::Interlocutor));

        person.attendee = false;
        assert_eq!(person.partition(), None);
    }

    #[test]
    fn null_text_fields_read_as_empty() {
        let report: Report = serde_json::from_str(
            r#"{"uuid":"r1","intent":null,"keyOutcomes":null,"reportSensitiveInformation":null}"#,
        )
        .unwrap();
        assert_eq!(report.uuid.as_deref(), Some("r1"));
        assert!(report.intent.is_empty());
        assert_eq!(report.sensitive_information, SensitiveInformation::default());
    }

    #[test]
    fn report_people_flags_use_user_wire_name() {
        let input: ReportPersonInput =
            serde_json::from_str(r#"{"uuid":"x","user":true,"primary":true}"#).unwrap();
        assert!(input.is_user);
        assert_eq!(input.primary, Some(true));
        assert_eq!(input.attendee, None);
    }
}
