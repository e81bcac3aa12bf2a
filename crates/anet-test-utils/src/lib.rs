//! Testing utilities for the ANET workspace
//!
//! Shared fixtures and scripted collaborators:
//! - an in-memory [`ReportStore`] with scripted failures and conflicts
//! - a scripted [`GraphQl`] backend for simulator stories
//! - a fixed [`UserProvider`] and a recording [`StoryRunnable`]

#![allow(missing_docs)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::Value;

use anet_client::{ClientError, Credential};
use anet_draft::{ReportStore, SaveError, SavedReport, UpdateOptions};
use anet_model::{
    EntityRef, Report, ReportInput, ReportPerson, ReportPersonInput, ReportState, Status,
};
use anet_sim::{
    GraphQl, GrowGate, SimContext, SimUser, StoryArgs, StoryError, StoryOutcome, StoryRunnable,
    UserProvider,
};

// ---------------------------------------------------------------------------
// Report store
// ---------------------------------------------------------------------------

/// Outcome forced on the next store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scripted {
    Fail(String),
    Conflict(String),
}

/// One call the store received
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Create(ReportInput),
    Update(ReportInput, UpdateOptions),
    Fetch(String),
}

#[derive(Debug, Clone)]
struct Stored {
    input: ReportInput,
    state: ReportState,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct StoreState {
    reports: DashMap<String, Stored>,
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<StoreCall>>,
    revision: AtomicU64,
    latency: Mutex<Duration>,
}

/// [`ReportStore`] keeping reports in memory
///
/// Timestamps advance one second per write from a fixed origin, so they are
/// independent of the clock. Updates carrying an `updated_at` older than the
/// stored one are refused as conflicts unless forced.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReportStore {
    state: Arc<StoreState>,
}

pub const CONFLICT_MESSAGE: &str =
    "Saving these changes would overwrite later updates made by someone else";

impl InMemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call by `latency`
    pub fn with_latency(self, latency: Duration) -> Self {
        *self.state.latency.lock() = latency;
        self
    }

    /// Fail the next `n` calls with a server error
    pub fn fail_next(&self, n: usize) {
        let mut script = self.state.script.lock();
        for _ in 0..n {
            script.push_back(Scripted::Fail("backend unavailable".to_string()));
        }
    }

    /// Refuse the next call as a stale write
    pub fn conflict_next(&self) {
        self.state
            .script
            .lock()
            .push_back(Scripted::Conflict(CONFLICT_MESSAGE.to_string()));
    }

    fn next_timestamp(&self) -> DateTime<Utc> {
        let revision = self.state.revision.fetch_add(1, Ordering::SeqCst) + 1;
        let origin = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap_or_default();
        origin + chrono::Duration::seconds(revision as i64)
    }

    /// Store `report` as if saved by someone; returns it with server fields
    pub fn seed(&self, mut report: Report) -> Report {
        let uuid = report
            .uuid
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let updated_at = self.next_timestamp();
        report.uuid = Some(uuid.clone());
        report.updated_at = Some(updated_at);
        let mut input = ReportInput::from_report(&report, Utc::now());
        input.uuid = Some(uuid.clone());
        self.state.reports.insert(
            uuid,
            Stored {
                input,
                state: report.state,
                updated_at,
            },
        );
        report
    }

    /// Someone else saved the report in the meantime
    pub fn bump(&self, uuid: &str) {
        let updated_at = self.next_timestamp();
        if let Some(mut stored) = self.state.reports.get_mut(uuid) {
            stored.updated_at = updated_at;
            stored.input.intent.push_str(" (edited elsewhere)");
        }
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.state.calls.lock().clone()
    }

    /// Inputs of create and update calls, in order
    pub fn saves(&self) -> Vec<ReportInput> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::Create(input) | StoreCall::Update(input, _) => Some(input),
                StoreCall::Fetch(_) => None,
            })
            .collect()
    }

    pub fn report_count(&self) -> usize {
        self.state.reports.len()
    }

    /// Last stored input of `uuid`
    pub fn stored(&self, uuid: &str) -> Option<ReportInput> {
        self.state.reports.get(uuid).map(|s| s.input.clone())
    }

    async fn enter(&self, call: StoreCall) -> Result<(), SaveError> {
        self.state.calls.lock().push(call);
        let latency = *self.state.latency.lock();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        let scripted = self.state.script.lock().pop_front();
        match scripted {
            Some(Scripted::Fail(message)) => Err(SaveError::Server(message)),
            Some(Scripted::Conflict(message)) => Err(SaveError::Conflict(message)),
            None => Ok(()),
        }
    }

    fn saved(uuid: String, stored: &Stored) -> SavedReport {
        SavedReport {
            uuid,
            updated_at: Some(stored.updated_at),
            state: stored.state,
            ..SavedReport::default()
        }
    }
}

fn person_from_ref(p: &anet_model::ReportPersonRef) -> ReportPerson {
    ReportPerson {
        uuid: p.uuid.clone(),
        name: String::new(),
        rank: None,
        status: Status::Active,
        is_user: false,
        end_of_tour_date: None,
        position: None,
        author: p.author,
        attendee: p.attendee,
        primary: p.primary,
        interlocutor: p.interlocutor,
    }
}

#[async_trait]
impl ReportStore for InMemoryReportStore {
    async fn create_report(&self, input: ReportInput) -> Result<SavedReport, SaveError> {
        self.enter(StoreCall::Create(input.clone())).await?;
        let uuid = uuid::Uuid::new_v4().to_string();
        let mut input = input;
        input.uuid = Some(uuid.clone());
        let stored = Stored {
            input,
            state: ReportState::Draft,
            updated_at: self.next_timestamp(),
        };
        let saved = Self::saved(uuid.clone(), &stored);
        self.state.reports.insert(uuid, stored);
        Ok(saved)
    }

    async fn update_report(
        &self,
        input: ReportInput,
        options: UpdateOptions,
    ) -> Result<SavedReport, SaveError> {
        self.enter(StoreCall::Update(input.clone(), options)).await?;
        let uuid = input
            .uuid
            .clone()
            .ok_or_else(|| SaveError::Server("update without uuid".to_string()))?;
        let updated_at = self.next_timestamp();
        let mut stored = self
            .state
            .reports
            .get_mut(&uuid)
            .ok_or_else(|| SaveError::Server(format!("no report {uuid}")))?;
        if !options.force && input.updated_at.is_some_and(|seen| seen < stored.updated_at) {
            return Err(SaveError::Conflict(CONFLICT_MESSAGE.to_string()));
        }
        stored.input = input;
        stored.updated_at = updated_at;
        Ok(Self::saved(uuid, &stored))
    }

    async fn fetch_report(&self, uuid: &str) -> Result<Report, SaveError> {
        self.enter(StoreCall::Fetch(uuid.to_string())).await?;
        let stored = self
            .state
            .reports
            .get(uuid)
            .ok_or_else(|| SaveError::Server(format!("no report {uuid}")))?;
        let input = &stored.input;
        Ok(Report {
            uuid: Some(uuid.to_string()),
            state: stored.state,
            intent: input.intent.clone(),
            engagement_date: input.engagement_date,
            duration: input.duration,
            cancelled: input.cancelled_reason.is_some(),
            cancelled_reason: input.cancelled_reason,
            atmosphere: input.atmosphere,
            atmosphere_details: input.atmosphere_details.clone(),
            location: input.location.clone(),
            report_people: input.report_people.iter().map(person_from_ref).collect(),
            tasks: input.tasks.clone(),
            report_text: input.report_text.clone(),
            next_steps: input.next_steps.clone(),
            key_outcomes: input.key_outcomes.clone(),
            updated_at: Some(stored.updated_at),
            ..Report::default()
        })
    }
}

// ---------------------------------------------------------------------------
// Report fixtures
// ---------------------------------------------------------------------------

pub fn advisor(uuid: &str, name: &str) -> ReportPersonInput {
    ReportPersonInput::new(uuid, name).with_interlocutor(false)
}

pub fn interlocutor(uuid: &str, name: &str) -> ReportPersonInput {
    ReportPersonInput::new(uuid, name).with_interlocutor(true)
}

/// Past report with every required field set
pub fn complete_report() -> Report {
    let mut report = Report::new();
    report.intent = "Discuss logistics".to_string();
    report.engagement_date = Some(Utc::now() - chrono::Duration::days(1));
    report.atmosphere = Some(anet_model::Atmosphere::Positive);
    report.location = Some(EntityRef::new("location-1"));
    report.tasks = vec![EntityRef::new("task-1")];
    report.report_text = "Met with the team".to_string();
    report.next_steps = "Follow up".to_string();
    report.key_outcomes = "Agreed on a plan".to_string();
    report.report_people = anet_model::normalize_report_people(vec![
        advisor("advisor-1", "ADVISOR, Ann").with_author(true).user(true),
        interlocutor("principal-1", "PRINCIPAL, Paul"),
    ]);
    report
}

// ---------------------------------------------------------------------------
// Scripted GraphQL backend
// ---------------------------------------------------------------------------

/// One request the scripted backend received
#[derive(Debug, Clone, PartialEq)]
pub struct GraphQlCall {
    pub username: String,
    pub query: String,
    pub variables: Value,
}

#[derive(Debug)]
struct Rule {
    fragments: Vec<String>,
    response: Result<Value, String>,
}

/// [`GraphQl`] answering from canned responses
///
/// A response applies to queries containing all of its fragments; the
/// first rule added wins.
#[derive(Debug, Default)]
pub struct ScriptedGraphQl {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<GraphQlCall>>,
}

impl ScriptedGraphQl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer queries containing every fragment with `data`
    pub fn on(self, fragments: &[&str], data: Value) -> Self {
        self.push(fragments, Ok(data));
        self
    }

    /// Fail queries containing every fragment with a GraphQL error
    pub fn failing(self, fragments: &[&str], message: &str) -> Self {
        self.push(fragments, Err(message.to_string()));
        self
    }

    fn push(&self, fragments: &[&str], response: Result<Value, String>) {
        self.rules.lock().push(Rule {
            fragments: fragments.iter().map(ToString::to_string).collect(),
            response,
        });
    }

    pub fn calls(&self) -> Vec<GraphQlCall> {
        self.calls.lock().clone()
    }

    /// Calls whose query contains `fragment`
    pub fn calls_to(&self, fragment: &str) -> Vec<GraphQlCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.query.contains(fragment))
            .collect()
    }

    /// Context over this backend with `admin` as the special user
    pub fn context(self: &Arc<Self>, admin: &str) -> SimContext {
        SimContext::new(self.clone(), Credential::new(admin, admin))
    }
}

#[async_trait]
impl GraphQl for ScriptedGraphQl {
    async fn execute(
        &self,
        credential: &Credential,
        query: &str,
        variables: Value,
    ) -> Result<Value, ClientError> {
        self.calls.lock().push(GraphQlCall {
            username: credential.username.clone(),
            query: query.to_string(),
            variables,
        });
        let rules = self.rules.lock();
        let rule = rules
            .iter()
            .find(|r| r.fragments.iter().all(|f| query.contains(f.as_str())));
        match rule.map(|r| r.response.clone()) {
            Some(Ok(data)) => Ok(data),
            Some(Err(message)) => Err(ClientError::GraphQl(message)),
            None => Err(ClientError::GraphQl(format!("no scripted response for {query}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Simulator collaborators
// ---------------------------------------------------------------------------

/// [`UserProvider`] always handing out the same user, or none
#[derive(Debug, Default)]
pub struct StaticUserProvider {
    user: Option<SimUser>,
    calls: AtomicU64,
}

impl StaticUserProvider {
    pub fn new(user: SimUser) -> Self {
        Self {
            user: Some(user),
            calls: AtomicU64::new(0),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserProvider for StaticUserProvider {
    async fn user(&self, _ctx: &SimContext) -> Result<Option<SimUser>, StoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.user.clone())
    }
}

/// One run seen by a [`RecordingStory`]
#[derive(Debug, Clone, PartialEq)]
pub struct StoryRun {
    pub user: String,
    pub gate: GrowGate,
    pub args: StoryArgs,
}

/// [`StoryRunnable`] recording its runs
#[derive(Debug, Default)]
pub struct RecordingStory {
    runs: Mutex<Vec<StoryRun>>,
    fail: bool,
}

impl RecordingStory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every run returns an error after being recorded
    pub fn failing() -> Self {
        Self {
            runs: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn runs(&self) -> Vec<StoryRun> {
        self.runs.lock().clone()
    }

    pub fn run_count(&self) -> usize {
        self.runs.lock().len()
    }
}

#[async_trait]
impl StoryRunnable for RecordingStory {
    async fn run(
        &self,
        _ctx: &SimContext,
        user: &SimUser,
        gate: &GrowGate,
        args: &StoryArgs,
    ) -> Result<StoryOutcome, StoryError> {
        self.runs.lock().push(StoryRun {
            user: user.name.clone(),
            gate: *gate,
            args: args.clone(),
        });
        if self.fail {
            return Err(StoryError::MissingField("scripted failure".to_string()));
        }
        Ok(StoryOutcome::Done(Value::Null))
    }
}
