//! Backend access for stories
//!
//! Stories never hold a concrete client; they go through [`GraphQl`] so a
//! scripted backend can stand in for the real one.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use anet_client::{ClientError, Credential, GraphQlClient};

use crate::error::StoryError;

/// Executes GraphQL documents on behalf of a user
#[async_trait]
pub trait GraphQl: Send + Sync + fmt::Debug {
    /// Run `query` as `credential` and return the `data` object
    async fn execute(
        &self,
        credential: &Credential,
        query: &str,
        variables: Value,
    ) -> Result<Value, ClientError>;
}

#[async_trait]
impl GraphQl for GraphQlClient {
    async fn execute(
        &self,
        credential: &Credential,
        query: &str,
        variables: Value,
    ) -> Result<Value, ClientError> {
        GraphQlClient::execute(self, credential, query, variables).await
    }
}

/// What every story run gets to work with
#[derive(Debug, Clone)]
pub struct SimContext {
    gql: Arc<dyn GraphQl>,
    admin: Credential,
}

impl SimContext {
    /// `admin` is the special user that looks up the simulated users
    #[must_use]
    pub fn new(gql: Arc<dyn GraphQl>, admin: Credential) -> Self {
        Self { gql, admin }
    }

    #[inline]
    #[must_use]
    pub fn admin(&self) -> &Credential {
        &self.admin
    }

    /// Run `query` as `credential`
    ///
    /// # Errors
    /// The client failure, wrapped
    pub async fn query(
        &self,
        credential: &Credential,
        query: &str,
        variables: Value,
    ) -> Result<Value, StoryError> {
        tracing::trace!(user = %credential.username, "graphql");
        Ok(self.gql.execute(credential, query, variables).await?)
    }
}

/// Value at a JSON pointer of a response, e.g. `/positionList/totalCount`
///
/// # Errors
/// `MissingField` when nothing lives there
pub fn at<'a>(data: &'a Value, pointer: &str) -> Result<&'a Value, StoryError> {
    data.pointer(pointer)
        .ok_or_else(|| StoryError::MissingField(pointer.to_string()))
}

/// Count at a JSON pointer
///
/// # Errors
/// `MissingField` when absent or not a number
pub fn count_at(data: &Value, pointer: &str) -> Result<u64, StoryError> {
    at(data, pointer)?
        .as_u64()
        .ok_or_else(|| StoryError::MissingField(pointer.to_string()))
}

/// List at a JSON pointer; `null` reads as empty
///
/// # Errors
/// `MissingField` when absent or not a list
pub fn list_at(data: &Value, pointer: &str) -> Result<Vec<Value>, StoryError> {
    match at(data, pointer)? {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(items.clone()),
        _ => Err(StoryError::MissingField(pointer.to_string())),
    }
}
