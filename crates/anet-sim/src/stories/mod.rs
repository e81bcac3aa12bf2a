//! Synthetic stories
//!
//! Every story is a [`StoryRunnable`] run as one simulated user. Stories
//! that grow or shrink a population count it first and ask the grow gate:
//! - growth stories run when the gate says grow
//! - shrink stories run when it says not to grow
//!
//! A story that finds nothing to act on returns [`StoryOutcome::Nop`], one
//! held back by its gate returns [`StoryOutcome::Skipped`].

use async_trait::async_trait;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::fmt;

use anet_client::Credential;

use crate::error::StoryError;
use crate::gateway::{count_at, list_at, SimContext};
use crate::probability::GrowGate;
use crate::users::SimUser;

pub mod location;
pub mod note;
pub mod organization;
pub mod person;
pub mod position;
pub mod report;

pub use location::CreateLocation;
pub use note::CreateNote;
pub use organization::CreateHierarchy;
pub use person::{CreatePerson, DeletePerson, UpdatePerson};
pub use position::{
    AssociatePositions, CreatePosition, DeletePosition, DissociatePositions, PutPersonInPosition,
    RemovePersonFromPosition, UpdatePosition,
};
pub use report::{ApproveReport, CreateReport, SubmitDraftReport, UpdateDraftReport};

/// Result of one story run
#[derive(Debug, Clone, PartialEq)]
pub enum StoryOutcome {
    /// The story changed something; the mutation result
    Done(Value),
    /// The grow gate held the story back
    Skipped(String),
    /// Nothing to act on
    Nop(String),
}

impl StoryOutcome {
    #[must_use]
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }
}

impl fmt::Display for StoryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Done(value) => write!(f, "{value}"),
            Self::Skipped(reason) => write!(f, "(skipped) {reason}"),
            Self::Nop(reason) => write!(f, "(nop) {reason}"),
        }
    }
}

/// Free-form arguments of a buildup step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoryArgs(Map<String, Value>);

impl StoryArgs {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an argument; values that do not serialize are stored as `null`
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.0.insert(key.into(), value);
        self
    }

    /// Typed argument, `None` when absent or of another shape
    #[must_use]
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.0
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    #[must_use]
    pub fn flag(&self, key: &str) -> bool {
        self.get::<bool>(key).unwrap_or(false)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One kind of synthetic work
#[async_trait]
pub trait StoryRunnable: Send + Sync + fmt::Debug {
    /// Run once as `user`
    async fn run(
        &self,
        ctx: &SimContext,
        user: &SimUser,
        gate: &GrowGate,
        args: &StoryArgs,
    ) -> Result<StoryOutcome, StoryError>;
}

/// A list query over one entity type
#[derive(Debug, Clone, Copy)]
pub(crate) struct ListQuery {
    /// Query field, e.g. `positionList`
    pub(crate) list: &'static str,
    /// Type of its argument, e.g. `PositionSearchQueryInput`
    pub(crate) input: &'static str,
}

impl ListQuery {
    pub(crate) const LOCATIONS: Self = Self::new("locationList", "LocationSearchQueryInput");
    pub(crate) const ORGANIZATIONS: Self = Self::new("organizationList", "OrganizationSearchQueryInput");
    pub(crate) const PEOPLE: Self = Self::new("personList", "PersonSearchQueryInput");
    pub(crate) const POSITIONS: Self = Self::new("positionList", "PositionSearchQueryInput");
    pub(crate) const REPORTS: Self = Self::new("reportList", "ReportSearchQueryInput");
    pub(crate) const TASKS: Self = Self::new("taskList", "TaskSearchQueryInput");

    pub(crate) const fn new(list: &'static str, input: &'static str) -> Self {
        Self { list, input }
    }

    fn document(&self, selection: &str) -> String {
        format!(
            "query ($query: {input}) {{ {list}(query: $query) {{ {selection} }} }}",
            input = self.input,
            list = self.list,
        )
    }

    fn page(filter: &Value, page_num: u64, page_size: u64) -> Value {
        let mut query = filter.as_object().cloned().unwrap_or_default();
        query.insert("pageNum".into(), json!(page_num));
        query.insert("pageSize".into(), json!(page_size));
        json!({ "query": query })
    }

    /// Number of entities matching `filter`
    pub(crate) async fn count(
        &self,
        ctx: &SimContext,
        cred: &Credential,
        filter: &Value,
    ) -> Result<u64, StoryError> {
        let data = ctx
            .query(cred, &self.document("totalCount"), Self::page(filter, 0, 1))
            .await?;
        count_at(&data, &format!("/{}/totalCount", self.list))
    }

    /// Every entity matching `filter`, with the given fields
    pub(crate) async fn all(
        &self,
        ctx: &SimContext,
        cred: &Credential,
        filter: &Value,
        fields: &str,
    ) -> Result<Vec<Value>, StoryError> {
        let selection = format!("list {{ {fields} }}");
        let data = ctx
            .query(cred, &self.document(&selection), Self::page(filter, 0, 0))
            .await?;
        list_at(&data, &format!("/{}/list", self.list))
    }

    /// One random entity matching `filter`, `None` when there is none
    pub(crate) async fn random(
        &self,
        ctx: &SimContext,
        cred: &Credential,
        filter: &Value,
        fields: &str,
    ) -> Result<Option<Value>, StoryError> {
        let total = self.count(ctx, cred, filter).await?;
        if total == 0 {
            return Ok(None);
        }
        let page_num = rand::thread_rng().gen_range(0..total);
        let selection = format!("list {{ {fields} }}");
        let data = ctx
            .query(cred, &self.document(&selection), Self::page(filter, page_num, 1))
            .await?;
        Ok(list_at(&data, &format!("/{}/list", self.list))?.into_iter().next())
    }
}

/// Run a mutation and return the value of its single field
pub(crate) async fn mutate(
    ctx: &SimContext,
    cred: &Credential,
    document: &str,
    field: &str,
    variables: Value,
) -> Result<StoryOutcome, StoryError> {
    let data = ctx.query(cred, document, variables).await?;
    let result = data
        .get(field)
        .cloned()
        .ok_or_else(|| StoryError::MissingField(field.to_string()))?;
    Ok(StoryOutcome::Done(result))
}

/// `uuid` of an entity returned by a list query
pub(crate) fn uuid_of(entity: &Value) -> Option<&str> {
    entity.get("uuid").and_then(Value::as_str)
}
