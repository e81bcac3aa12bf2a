//! Report stories: create, update, submit and approve drafts

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};
use std::collections::HashSet;

use anet_client::Credential;
use anet_model::{
    normalize_report_people, Atmosphere, CancelledReason, EntityRef, Report, ReportInput,
    ReportPersonInput, ReportState, Status,
};

use super::{mutate, uuid_of, ListQuery, StoryArgs, StoryOutcome, StoryRunnable};
use crate::error::StoryError;
use crate::gateway::SimContext;
use crate::kinds::PersonRole;
use crate::lorem;
use crate::populate::{Frequency, Populate};
use crate::probability::GrowGate;
use crate::users::SimUser;

const CREATE_REPORT: &str =
    "mutation ($report: ReportInput!) { createReport(report: $report) { uuid } }";
const UPDATE_REPORT: &str = "mutation ($report: ReportInput!) { \
    updateReport(report: $report, sendEditEmail: false) { uuid } }";
const SUBMIT_REPORT: &str = "mutation ($uuid: String!) { submitReport(uuid: $uuid) { uuid } }";
const APPROVE_REPORT: &str = "mutation ($uuid: String!) { approveReport(uuid: $uuid) { uuid } }";

const DRAFT_FIELDS: &str = "uuid intent engagementDate duration keyOutcomes nextSteps \
    cancelledReason atmosphere atmosphereDetails updatedAt \
    reportPeople { uuid author attendee primary interlocutor }";

/// Entities a synthetic report links to
#[derive(Debug, Clone, Default)]
pub struct ReportRefs {
    pub locations: Vec<String>,
    pub tasks: Vec<String>,
    pub advisors: Vec<String>,
    pub principals: Vec<String>,
}

impl ReportRefs {
    /// Whether a complete report can be built from these
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !(self.locations.is_empty()
            || self.tasks.is_empty()
            || self.advisors.is_empty()
            || self.principals.is_empty())
    }

    async fn load(ctx: &SimContext, cred: &Credential) -> Result<Self, StoryError> {
        let active = json!({ "status": Status::Active });
        let uuids = |list: Vec<Value>| -> Vec<String> {
            list.iter().filter_map(uuid_of).map(str::to_string).collect()
        };
        Ok(Self {
            locations: uuids(ListQuery::LOCATIONS.all(ctx, cred, &active, "uuid").await?),
            tasks: uuids(ListQuery::TASKS.all(ctx, cred, &active, "uuid").await?),
            advisors: assigned_people(ctx, cred, PersonRole::Advisor).await?,
            principals: assigned_people(ctx, cred, PersonRole::Principal).await?,
        })
    }
}

/// People of `role` currently holding an active position
async fn assigned_people(
    ctx: &SimContext,
    cred: &Credential,
    role: PersonRole,
) -> Result<Vec<String>, StoryError> {
    let people = ListQuery::PEOPLE
        .all(ctx, cred, &json!({ "role": role }), "uuid position { uuid status }")
        .await?;
    Ok(people
        .iter()
        .filter(|p| p.pointer("/position/status") == Some(&json!(Status::Active)))
        .filter_map(uuid_of)
        .map(str::to_string)
        .collect())
}

/// Between one and five distinct attendees of one side, the first primary
fn pick_attendees<R: Rng + ?Sized>(
    rng: &mut R,
    pool: &[String],
    interlocutor: bool,
) -> Vec<ReportPersonInput> {
    let wanted = rng.gen_range(1..=5);
    let mut seen = HashSet::new();
    let mut picked = Vec::new();
    for _ in 0..wanted {
        if let Some(uuid) = pool.choose(rng) {
            if seen.insert(uuid.clone()) {
                picked.push(
                    ReportPersonInput::new(uuid.clone(), "")
                        .with_attendee(true)
                        .with_primary(picked.is_empty())
                        .with_interlocutor(interlocutor),
                );
            }
        }
    }
    picked
}

/// Overwrite `report` with random content referencing `refs`
pub fn fill_report<R: Rng + ?Sized>(report: &mut Report, refs: &ReportRefs, rng: &mut R) {
    Populate::new(report, rng)
        .field(Frequency::Always, |r, rng| r.intent = lorem::paragraph(rng))
        .field(Frequency::Always, |r, rng| {
            r.engagement_date = Some(Utc::now() - Duration::seconds(rng.gen_range(0..86_400)));
        })
        .field(Frequency::Often, |r, rng| r.duration = Some(rng.gen_range(1..=480)))
        .field(Frequency::Often, |r, rng| {
            r.cancelled = true;
            r.cancelled_reason = CancelledReason::ALL.choose(rng).copied();
        })
        .field(Frequency::Always, |r, rng| {
            r.atmosphere = Atmosphere::ALL.choose(rng).copied();
        })
        .field(Frequency::Always, |r, rng| r.atmosphere_details = lorem::sentence(rng))
        .field(Frequency::Always, |r, rng| {
            r.location = refs.locations.choose(rng).map(EntityRef::new);
        })
        .field(Frequency::Always, |r, rng| {
            let mut people = pick_attendees(rng, &refs.advisors, false);
            people.extend(pick_attendees(rng, &refs.principals, true));
            r.report_people = normalize_report_people(people);
        })
        .field(Frequency::Always, |r, rng| {
            let wanted = rng.gen_range(1..=3);
            let mut tasks: Vec<EntityRef> = Vec::new();
            for _ in 0..wanted {
                if let Some(uuid) = refs.tasks.choose(rng) {
                    if !tasks.iter().any(|t| &t.uuid == uuid) {
                        tasks.push(EntityRef::new(uuid.clone()));
                    }
                }
            }
            r.tasks = tasks;
        })
        .field(Frequency::Always, |r, rng| r.report_text = lorem::paragraphs(rng))
        .field(Frequency::Always, |r, rng| r.next_steps = lorem::sentence(rng))
        .field(Frequency::Always, |r, rng| r.key_outcomes = lorem::sentence(rng));
}

/// Draft reports authored by `user`
async fn own_drafts(
    ctx: &SimContext,
    cred: &Credential,
    person_uuid: &str,
    fields: &str,
) -> Result<Vec<Value>, StoryError> {
    let filter = json!({ "state": [ReportState::Draft], "authorUuid": person_uuid });
    ListQuery::REPORTS.all(ctx, cred, &filter, fields).await
}

/// Create a report with random content
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateReport;

#[async_trait]
impl StoryRunnable for CreateReport {
    async fn run(
        &self,
        ctx: &SimContext,
        user: &SimUser,
        _gate: &GrowGate,
        _args: &StoryArgs,
    ) -> Result<StoryOutcome, StoryError> {
        let cred = user.credential();
        let refs = ReportRefs::load(ctx, &cred).await?;
        if !refs.is_complete() {
            return Ok(StoryOutcome::Nop(
                "no active locations, tasks or assigned people".into(),
            ));
        }
        let mut report = Report::new();
        fill_report(&mut report, &refs, &mut StdRng::from_entropy());
        let input = ReportInput::from_report(&report, Utc::now());
        mutate(ctx, &cred, CREATE_REPORT, "createReport", json!({ "report": input })).await
    }
}

/// Rewrite one of the user's drafts
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateDraftReport;

#[async_trait]
impl StoryRunnable for UpdateDraftReport {
    async fn run(
        &self,
        ctx: &SimContext,
        user: &SimUser,
        _gate: &GrowGate,
        _args: &StoryArgs,
    ) -> Result<StoryOutcome, StoryError> {
        let Some(person) = user.person_uuid.as_deref() else {
            return Ok(StoryOutcome::Nop("user has no person record".into()));
        };
        let cred = user.credential();
        let drafts = own_drafts(ctx, &cred, person, DRAFT_FIELDS).await?;
        let Some(draft) = drafts.choose(&mut rand::thread_rng()).cloned() else {
            return Ok(StoryOutcome::Nop("no draft report".into()));
        };
        let mut report: Report = serde_json::from_value(draft)
            .map_err(|e| StoryError::MissingField(format!("report: {e}")))?;

        let refs = ReportRefs::load(ctx, &cred).await?;
        if !refs.is_complete() {
            return Ok(StoryOutcome::Nop(
                "no active locations, tasks or assigned people".into(),
            ));
        }
        fill_report(&mut report, &refs, &mut StdRng::from_entropy());
        let input = ReportInput::from_report(&report, Utc::now());
        mutate(ctx, &cred, UPDATE_REPORT, "updateReport", json!({ "report": input })).await
    }
}

/// Submit one of the user's drafts for approval
#[derive(Debug, Clone, Copy, Default)]
pub struct SubmitDraftReport;

#[async_trait]
impl StoryRunnable for SubmitDraftReport {
    async fn run(
        &self,
        ctx: &SimContext,
        user: &SimUser,
        _gate: &GrowGate,
        _args: &StoryArgs,
    ) -> Result<StoryOutcome, StoryError> {
        let Some(person) = user.person_uuid.as_deref() else {
            return Ok(StoryOutcome::Nop("user has no person record".into()));
        };
        let cred = user.credential();
        let drafts = own_drafts(ctx, &cred, person, "uuid").await?;
        let Some(uuid) = drafts.choose(&mut rand::thread_rng()).and_then(uuid_of).map(str::to_string) else {
            return Ok(StoryOutcome::Nop("no draft report".into()));
        };
        mutate(ctx, &cred, SUBMIT_REPORT, "submitReport", json!({ "uuid": uuid })).await
    }
}

/// Approve a report waiting on the user
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproveReport;

#[async_trait]
impl StoryRunnable for ApproveReport {
    async fn run(
        &self,
        ctx: &SimContext,
        user: &SimUser,
        _gate: &GrowGate,
        _args: &StoryArgs,
    ) -> Result<StoryOutcome, StoryError> {
        let Some(person) = user.person_uuid.as_deref() else {
            return Ok(StoryOutcome::Nop("user has no person record".into()));
        };
        let cred = user.credential();
        let pending = ListQuery::REPORTS
            .all(ctx, &cred, &json!({ "pendingApprovalOf": person }), "uuid")
            .await?;
        let Some(uuid) = pending.choose(&mut rand::thread_rng()).and_then(uuid_of).map(str::to_string) else {
            return Ok(StoryOutcome::Nop("no report pending approval".into()));
        };
        mutate(ctx, &cred, APPROVE_REPORT, "approveReport", json!({ "uuid": uuid })).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anet_model::Role;

    fn refs() -> ReportRefs {
        ReportRefs {
            locations: vec!["loc".into()],
            tasks: vec!["t1".into(), "t2".into()],
            advisors: vec!["a1".into(), "a2".into(), "a3".into()],
            principals: vec!["p1".into(), "p2".into()],
        }
    }

    #[test]
    fn filled_report_has_one_primary_per_side() {
        let mut rng = StdRng::seed_from_u64(17);
        for _ in 0..20 {
            let mut report = Report::new();
            fill_report(&mut report, &refs(), &mut rng);
            for role in [Role::Advisor, Role::Interlocutor] {
                let primaries = report
                    .report_people
                    .iter()
                    .filter(|p| p.partition() == Some(role) && p.primary)
                    .count();
                assert_eq!(primaries, 1, "{role:?}");
            }
            assert!(!report.tasks.is_empty() && report.tasks.len() <= 2);
            assert_eq!(report.location, Some(EntityRef::new("loc")));
            assert_eq!(report.cancelled, report.cancelled_reason.is_some());
        }
    }

    #[test]
    fn incomplete_refs_are_detected() {
        let mut partial = refs();
        partial.tasks.clear();
        assert!(!partial.is_complete());
        assert!(refs().is_complete());
    }
}
