//! Simulated users
//!
//! Each user type of a scenario has a provider handing out a user for one
//! story run. Simulated accounts use their login name as password.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde::Deserialize;
use serde_json::json;
use std::fmt;

use anet_client::Credential;
use anet_model::Status;

use crate::error::StoryError;
use crate::gateway::{list_at, SimContext};
use crate::kinds::PositionType;
use crate::lorem;

/// A user a story runs as
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimUser {
    pub name: String,
    pub password: String,
    /// Person record behind the account, when known
    pub person_uuid: Option<String>,
}

impl SimUser {
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            password: password.into(),
            person_uuid: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_person(mut self, uuid: impl Into<String>) -> Self {
        self.person_uuid = Some(uuid.into());
        self
    }

    #[must_use]
    pub fn credential(&self) -> Credential {
        Credential::new(self.name.clone(), self.password.clone())
    }
}

/// Hands out users of one user type
#[async_trait]
pub trait UserProvider: Send + Sync + fmt::Debug {
    /// A user for one story run; `None` when no such user exists right now
    async fn user(&self, ctx: &SimContext) -> Result<Option<SimUser>, StoryError>;
}

/// A brand new account name on every call
#[derive(Debug, Clone, Copy, Default)]
pub struct NewUser;

#[async_trait]
impl UserProvider for NewUser {
    async fn user(&self, _ctx: &SimContext) -> Result<Option<SimUser>, StoryError> {
        let name = lorem::user_name(&mut rand::thread_rng());
        Ok(Some(SimUser::new(name.clone(), name)))
    }
}

const FILLED_POSITIONS: &str = "query ($positionsQuery: PositionSearchQueryInput) { \
    positionList(query: $positionsQuery) { list { uuid type person { uuid name domainUsername } } } }";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Holder {
    uuid: String,
    #[serde(default)]
    domain_username: Option<String>,
}

/// A random person holding an active position of one of the given types
#[derive(Debug, Clone)]
pub struct ExistingPositionHolder {
    types: Vec<PositionType>,
}

impl ExistingPositionHolder {
    #[must_use]
    pub fn new(types: impl IntoIterator<Item = PositionType>) -> Self {
        Self {
            types: types.into_iter().collect(),
        }
    }
}

#[async_trait]
impl UserProvider for ExistingPositionHolder {
    async fn user(&self, ctx: &SimContext) -> Result<Option<SimUser>, StoryError> {
        let variables = json!({
            "positionsQuery": {
                "pageNum": 0,
                "pageSize": 0,
                "status": Status::Active,
                "isFilled": true,
                "type": self.types,
            }
        });
        let data = ctx.query(ctx.admin(), FILLED_POSITIONS, variables).await?;
        let holders: Vec<Holder> = list_at(&data, "/positionList/list")?
            .into_iter()
            .filter_map(|position| serde_json::from_value(position.get("person")?.clone()).ok())
            .filter(|h: &Holder| h.domain_username.as_deref().is_some_and(|n| !n.is_empty()))
            .collect();

        let Some(holder) = holders.choose(&mut rand::thread_rng()) else {
            return Ok(None);
        };
        let name = holder.domain_username.clone().unwrap_or_default();
        Ok(Some(
            SimUser::new(name.clone(), name).with_person(holder.uuid.clone()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_carries_login() {
        let user = SimUser::new("erin", "erin").with_person("p1");
        let cred = user.credential();
        assert_eq!(cred.username, "erin");
        assert_eq!(user.person_uuid.as_deref(), Some("p1"));
    }
}
