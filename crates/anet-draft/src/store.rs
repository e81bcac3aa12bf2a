//! Report persistence
//!
//! The editor only talks to a [`ReportStore`]. The production store runs
//! the report mutations through the GraphQL client.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use anet_client::{Credential, GraphQlClient};
use anet_model::{EntityRef, Report, ReportInput, ReportState, SensitiveInformation};

use crate::error::SaveError;

/// Options of an update mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateOptions {
    /// Notify the other authors of the edit
    pub send_edit_email: bool,
    /// Skip the stale-write check
    pub force: bool,
}

/// Fields the server returns after a create or update
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SavedReport {
    pub uuid: String,
    pub updated_at: Option<DateTime<Utc>>,
    pub state: ReportState,
    pub released_at: Option<DateTime<Utc>>,
    pub authors: Vec<EntityRef>,
    pub report_sensitive_information: Option<SensitiveInformation>,
}

impl SavedReport {
    /// Copy the server-assigned fields into `report`
    pub fn splice_into(&self, report: &mut Report) {
        report.uuid = Some(self.uuid.clone());
        report.updated_at = self.updated_at;
        report.state = self.state;
        report.released_at = self.released_at;
        match &self.report_sensitive_information {
            Some(info) => report.sensitive_information.uuid = info.uuid.clone(),
            // empty sensitive text was deleted on the server
            None => report.sensitive_information = SensitiveInformation::default(),
        }
    }
}

/// Backend of the report editor
#[async_trait]
pub trait ReportStore: Send + Sync + 'static {
    /// Persist a report for the first time
    async fn create_report(&self, input: ReportInput) -> Result<SavedReport, SaveError>;

    /// Persist changes to an existing report
    async fn update_report(
        &self,
        input: ReportInput,
        options: UpdateOptions,
    ) -> Result<SavedReport, SaveError>;

    /// Current server version of a report
    async fn fetch_report(&self, uuid: &str) -> Result<Report, SaveError>;
}

const SAVED_FIELDS: &str = "uuid updatedAt state releasedAt authors { uuid } reportSensitiveInformation { uuid text }";

fn create_mutation() -> String {
    format!("mutation ($report: ReportInput!) {{ createReport(report: $report) {{ {SAVED_FIELDS} }} }}")
}

fn update_mutation() -> String {
    format!(
        "mutation ($report: ReportInput!, $sendEditEmail: Boolean!, $force: Boolean) {{ \
         updateReport(report: $report, sendEditEmail: $sendEditEmail, force: $force) {{ {SAVED_FIELDS} }} }}"
    )
}

const REPORT_QUERY: &str = "query ($uuid: String!) { report(uuid: $uuid) { \
    uuid state intent engagementDate duration cancelledReason atmosphere atmosphereDetails \
    location { uuid } tasks { uuid } reportText nextSteps keyOutcomes updatedAt releasedAt \
    reportPeople { uuid name rank status user endOfTourDate author attendee primary interlocutor \
      position { uuid status organization { uuid shortName } } } \
    reportSensitiveInformation { uuid text } } }";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateResponse {
    create_report: SavedReport,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateResponse {
    update_report: SavedReport,
}

#[derive(Debug, Deserialize)]
struct ReportResponse {
    report: Report,
}

/// [`ReportStore`] over the GraphQL API, acting as one user
#[derive(Debug, Clone)]
pub struct GraphQlReportStore {
    client: GraphQlClient,
    credential: Credential,
}

impl GraphQlReportStore {
    #[must_use]
    pub fn new(client: GraphQlClient, credential: Credential) -> Self {
        Self { client, credential }
    }

    fn encode(input: &ReportInput) -> Result<serde_json::Value, SaveError> {
        serde_json::to_value(input).map_err(|e| SaveError::Server(e.to_string()))
    }
}

#[async_trait]
impl ReportStore for GraphQlReportStore {
    async fn create_report(&self, input: ReportInput) -> Result<SavedReport, SaveError> {
        let variables = json!({ "report": Self::encode(&input)? });
        let response: CreateResponse = self
            .client
            .query(&self.credential, &create_mutation(), variables)
            .await?;
        Ok(response.create_report)
    }

    async fn update_report(
        &self,
        input: ReportInput,
        options: UpdateOptions,
    ) -> Result<SavedReport, SaveError> {
        let variables = json!({
            "report": Self::encode(&input)?,
            "sendEditEmail": options.send_edit_email,
            "force": options.force,
        });
        let response: UpdateResponse = self
            .client
            .query(&self.credential, &update_mutation(), variables)
            .await?;
        Ok(response.update_report)
    }

    async fn fetch_report(&self, uuid: &str) -> Result<Report, SaveError> {
        let response: ReportResponse = self
            .client
            .query(&self.credential, REPORT_QUERY, json!({ "uuid": uuid }))
            .await?;
        let mut report = response.report;
        report.cancelled = report.cancelled_reason.is_some();
        Ok(report)
    }
}
