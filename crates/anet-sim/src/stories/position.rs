//! Position stories
//!
//! Positions tie people to organizations. Creation and deactivation are
//! gated on the total number of positions; the other stories reshuffle who
//! holds what and which advisor positions advise which principals.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::{json, Map, Value};

use anet_client::Credential;
use anet_model::Status;

use super::{mutate, uuid_of, ListQuery, StoryArgs, StoryOutcome, StoryRunnable};
use crate::error::StoryError;
use crate::gateway::{at, SimContext};
use crate::kinds::{OrganizationType, PersonRole, PositionType};
use crate::lorem;
use crate::populate::{Frequency, Populate};
use crate::probability::{with_probability, GrowGate};
use crate::users::SimUser;

const CREATE_POSITION: &str =
    "mutation ($position: PositionInput!) { createPosition(position: $position) { uuid } }";
const UPDATE_POSITION: &str =
    "mutation ($position: PositionInput!) { updatePosition(position: $position) }";
const PUT_PERSON: &str = "mutation ($uuid: String!, $person: PersonInput!) { \
    putPersonInPosition(uuid: $uuid, person: $person) }";
const REMOVE_PERSON: &str =
    "mutation ($uuid: String!) { deletePersonFromPosition(uuid: $uuid) }";
const UPDATE_ASSOCIATIONS: &str =
    "mutation ($position: PositionInput!) { updateAssociatedPosition(position: $position) }";
const POSITION_DETAIL: &str = "query ($uuid: String!) { position(uuid: $uuid) { \
    uuid name code status type location { uuid } associatedPositions { uuid } \
    organization { uuid } person { uuid } } }";

const ASSOCIATION_FIELDS: &str =
    "uuid name code status type associatedPositions { uuid name } organization { uuid }";

/// Active positions are created nine times out of ten
fn random_status<R: Rng + ?Sized>(rng: &mut R) -> Status {
    if with_probability(rng, 0.9) {
        Status::Active
    } else {
        Status::Inactive
    }
}

fn random_side<R: Rng + ?Sized>(rng: &mut R) -> PositionType {
    PositionType::SIDES
        .choose(rng)
        .copied()
        .unwrap_or(PositionType::Advisor)
}

async fn count_positions(ctx: &SimContext, cred: &Credential) -> Result<u64, StoryError> {
    ListQuery::POSITIONS.count(ctx, cred, &json!({})).await
}

/// Full record of one position, ready to send back as `PositionInput`
async fn position_detail(
    ctx: &SimContext,
    cred: &Credential,
    uuid: &str,
) -> Result<Map<String, Value>, StoryError> {
    let data = ctx.query(cred, POSITION_DETAIL, json!({ "uuid": uuid })).await?;
    match at(&data, "/position")? {
        Value::Object(position) => Ok(position.clone()),
        _ => Err(StoryError::MissingField("/position".into())),
    }
}

/// Create a position in a random organization, while the population is
/// below its target
#[derive(Debug, Clone, Copy, Default)]
pub struct CreatePosition;

#[async_trait]
impl StoryRunnable for CreatePosition {
    async fn run(
        &self,
        ctx: &SimContext,
        user: &SimUser,
        gate: &GrowGate,
        _args: &StoryArgs,
    ) -> Result<StoryOutcome, StoryError> {
        let cred = user.credential();
        let count = count_positions(ctx, &cred).await?;
        if !gate.grow(count) {
            tracing::debug!(count, "skipping create position");
            return Ok(StoryOutcome::Skipped(format!("{count} positions exist")));
        }

        let Some(organization) = ListQuery::ORGANIZATIONS
            .random(ctx, &cred, &json!({ "status": Status::Active }), "uuid type")
            .await?
        else {
            return Ok(StoryOutcome::Nop("no active organization".into()));
        };
        let org_type: OrganizationType = organization
            .get("type")
            .and_then(|t| serde_json::from_value(t.clone()).ok())
            .unwrap_or(OrganizationType::PrincipalOrg);

        let admin = ctx.admin().username.clone();
        let person = ListQuery::PEOPLE
            .random(ctx, &cred, &json!({ "role": org_type.person_role() }), "uuid domainUsername")
            .await?
            .filter(|p| {
                uuid_of(p) != user.person_uuid.as_deref()
                    && p.get("domainUsername").and_then(Value::as_str) != Some(admin.as_str())
            });
        let location = ListQuery::LOCATIONS
            .random(ctx, &cred, &json!({ "status": Status::Active }), "uuid")
            .await?;

        let mut position = Map::new();
        Populate::new(&mut position, &mut StdRng::from_entropy())
            .field(Frequency::Always, |p, rng| {
                p.insert("name".into(), json!(lorem::job_title(rng)));
            })
            .field(Frequency::Sometimes, |p, rng| {
                p.insert("code".into(), json!(lorem::slug(rng)));
            })
            .field(Frequency::Always, |p, rng| {
                p.insert("type".into(), json!(PositionType::random_for(org_type, rng)));
            })
            .field(Frequency::Always, |p, rng| {
                p.insert("status".into(), json!(random_status(rng)));
            })
            .field(Frequency::Always, |p, _| {
                p.insert("person".into(), person.map_or(Value::Null, |v| json!({ "uuid": uuid_of(&v) })));
            })
            .field(Frequency::Always, |p, _| {
                p.insert("organization".into(), json!({ "uuid": uuid_of(&organization) }));
            })
            .field(Frequency::Always, |p, _| {
                p.insert("location".into(), location.map_or(Value::Null, |v| json!({ "uuid": uuid_of(&v) })));
            });
        tracing::debug!(name = ?position.get("name"), "creating position");
        mutate(ctx, &cred, CREATE_POSITION, "createPosition", json!({ "position": position })).await
    }
}

/// Deactivate a random empty position, while the population is above its
/// target
#[derive(Debug, Clone, Copy, Default)]
pub struct DeletePosition;

#[async_trait]
impl StoryRunnable for DeletePosition {
    async fn run(
        &self,
        ctx: &SimContext,
        user: &SimUser,
        gate: &GrowGate,
        _args: &StoryArgs,
    ) -> Result<StoryOutcome, StoryError> {
        let cred = user.credential();
        let count = count_positions(ctx, &cred).await?;
        if gate.grow(count) {
            tracing::debug!(count, "skipping delete position");
            return Ok(StoryOutcome::Skipped(format!("{count} positions exist")));
        }

        let side = random_side(&mut rand::thread_rng());
        let filter = json!({ "isFilled": false, "status": Status::Active, "type": [side] });
        let Some(uuid) = ListQuery::POSITIONS
            .random(ctx, &cred, &filter, "uuid name")
            .await?
            .as_ref()
            .and_then(uuid_of)
            .map(str::to_string)
        else {
            return Ok(StoryOutcome::Nop(format!("no active empty {} position", side.name())));
        };
        let mut position = position_detail(ctx, &cred, &uuid).await?;
        position.insert("status".into(), json!(Status::Inactive));
        mutate(ctx, &cred, UPDATE_POSITION, "updatePosition", json!({ "position": position })).await
    }
}

/// Change a few details of a random empty position
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdatePosition;

#[async_trait]
impl StoryRunnable for UpdatePosition {
    async fn run(
        &self,
        ctx: &SimContext,
        user: &SimUser,
        _gate: &GrowGate,
        _args: &StoryArgs,
    ) -> Result<StoryOutcome, StoryError> {
        let cred = user.credential();
        let side = random_side(&mut rand::thread_rng());
        let filter = json!({ "isFilled": false, "type": [side] });
        let Some(uuid) = ListQuery::POSITIONS
            .random(ctx, &cred, &filter, "uuid name")
            .await?
            .as_ref()
            .and_then(uuid_of)
            .map(str::to_string)
        else {
            return Ok(StoryOutcome::Nop("no position to update".into()));
        };
        let organization = ListQuery::ORGANIZATIONS
            .random(ctx, &cred, &json!({ "status": Status::Active }), "uuid type")
            .await?;
        let mut position = position_detail(ctx, &cred, &uuid).await?;

        Populate::new(&mut position, &mut StdRng::from_entropy())
            .field(Frequency::Sometimes, |p, rng| {
                p.insert("name".into(), json!(lorem::job_title(rng)));
            })
            .field(Frequency::Often, |p, rng| {
                p.insert("status".into(), json!(random_status(rng)));
            })
            .field(Frequency::Rarely, |p, _| {
                // only move to an organization of the matching side
                let matches = organization
                    .as_ref()
                    .and_then(|o| o.get("type"))
                    .and_then(|t| serde_json::from_value::<OrganizationType>(t.clone()).ok())
                    .is_some_and(|t| t.person_role().position_type() == side);
                if let (true, Some(org)) = (matches, organization.as_ref()) {
                    p.insert("organization".into(), json!({ "uuid": uuid_of(org) }));
                }
            })
            .field(Frequency::Sometimes, |p, rng| {
                p.insert("code".into(), json!(lorem::slug(rng)));
            });
        mutate(ctx, &cred, UPDATE_POSITION, "updatePosition", json!({ "position": position })).await
    }
}

/// Put a person without a position into a random empty position
#[derive(Debug, Clone, Copy, Default)]
pub struct PutPersonInPosition;

#[async_trait]
impl StoryRunnable for PutPersonInPosition {
    async fn run(
        &self,
        ctx: &SimContext,
        user: &SimUser,
        _gate: &GrowGate,
        _args: &StoryArgs,
    ) -> Result<StoryOutcome, StoryError> {
        let cred = user.credential();
        let role = PersonRole::ALL
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(PersonRole::Advisor);
        let free: Vec<Value> = ListQuery::PEOPLE
            .all(ctx, &cred, &json!({ "role": role }), "uuid name position { uuid }")
            .await?
            .into_iter()
            .filter(|p| p.get("position").map_or(true, Value::is_null))
            .collect();
        let filter = json!({ "isFilled": false, "type": [role.position_type()] });
        let position = ListQuery::POSITIONS.random(ctx, &cred, &filter, "uuid name").await?;

        let Some(position) = position.as_ref().and_then(uuid_of) else {
            return Ok(StoryOutcome::Nop("no positions to fill available".into()));
        };
        let Some(person) = free.choose(&mut rand::thread_rng()).and_then(uuid_of).map(str::to_string) else {
            return Ok(StoryOutcome::Nop("no person available to fill the position".into()));
        };
        let variables = json!({ "uuid": position, "person": { "uuid": person } });
        mutate(ctx, &cred, PUT_PERSON, "putPersonInPosition", variables).await
    }
}

/// Take a person out of a random filled position
///
/// Administrator positions and the special user stay put.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemovePersonFromPosition;

#[async_trait]
impl StoryRunnable for RemovePersonFromPosition {
    async fn run(
        &self,
        ctx: &SimContext,
        user: &SimUser,
        _gate: &GrowGate,
        _args: &StoryArgs,
    ) -> Result<StoryOutcome, StoryError> {
        let cred = user.credential();
        let side = random_side(&mut rand::thread_rng());
        let admin = ctx.admin().username.clone();
        let filled: Vec<Value> = ListQuery::POSITIONS
            .all(
                ctx,
                &cred,
                &json!({ "isFilled": true, "type": [side] }),
                "uuid name type person { domainUsername name }",
            )
            .await?
            .into_iter()
            .filter(|p| {
                p.get("person").is_some_and(|person| !person.is_null())
                    && p.pointer("/person/domainUsername").and_then(Value::as_str) != Some(admin.as_str())
                    && p.get("type") != Some(&json!(PositionType::Administrator))
            })
            .collect();
        let Some(uuid) = filled.choose(&mut rand::thread_rng()).and_then(uuid_of).map(str::to_string) else {
            return Ok(StoryOutcome::Nop("no filled position".into()));
        };
        mutate(ctx, &cred, REMOVE_PERSON, "deletePersonFromPosition", json!({ "uuid": uuid })).await
    }
}

/// Make a random advisor position advise a random principal position
#[derive(Debug, Clone, Copy, Default)]
pub struct AssociatePositions;

#[async_trait]
impl StoryRunnable for AssociatePositions {
    async fn run(
        &self,
        ctx: &SimContext,
        user: &SimUser,
        _gate: &GrowGate,
        _args: &StoryArgs,
    ) -> Result<StoryOutcome, StoryError> {
        let cred = user.credential();
        let filled = rand::thread_rng().gen::<bool>();
        let principals = ListQuery::POSITIONS
            .all(ctx, &cred, &json!({ "isFilled": filled, "type": [PositionType::Principal] }), ASSOCIATION_FIELDS)
            .await?;
        let advisors = ListQuery::POSITIONS
            .all(ctx, &cred, &json!({ "isFilled": filled, "type": [PositionType::Advisor] }), ASSOCIATION_FIELDS)
            .await?;

        let (principal, advisor) = {
            let mut rng = rand::thread_rng();
            (principals.choose(&mut rng).cloned(), advisors.choose(&mut rng).cloned())
        };
        let (Some(principal), Some(Value::Object(mut advisor))) = (principal, advisor) else {
            return Ok(StoryOutcome::Nop(
                "no appropriate principal and advisor positions".into(),
            ));
        };
        let Some(principal_uuid) = uuid_of(&principal) else {
            return Err(StoryError::MissingField("position uuid".into()));
        };
        let mut associated = match advisor.remove("associatedPositions") {
            Some(Value::Array(list)) => list,
            _ => Vec::new(),
        };
        associated.push(json!({ "uuid": principal_uuid }));
        advisor.insert("associatedPositions".into(), Value::Array(associated));
        mutate(ctx, &cred, UPDATE_ASSOCIATIONS, "updateAssociatedPosition", json!({ "position": advisor })).await
    }
}

/// Drop one association of a random position
#[derive(Debug, Clone, Copy, Default)]
pub struct DissociatePositions;

#[async_trait]
impl StoryRunnable for DissociatePositions {
    async fn run(
        &self,
        ctx: &SimContext,
        user: &SimUser,
        _gate: &GrowGate,
        _args: &StoryArgs,
    ) -> Result<StoryOutcome, StoryError> {
        let cred = user.credential();
        let (side, filled) = {
            let mut rng = rand::thread_rng();
            (random_side(&mut rng), rng.gen::<bool>())
        };
        let associated: Vec<Value> = ListQuery::POSITIONS
            .all(ctx, &cred, &json!({ "isFilled": filled, "type": [side] }), ASSOCIATION_FIELDS)
            .await?
            .into_iter()
            .filter(|p| {
                p.get("associatedPositions")
                    .and_then(Value::as_array)
                    .is_some_and(|a| !a.is_empty())
            })
            .collect();

        let picked = {
            let mut rng = rand::thread_rng();
            associated.choose(&mut rng).cloned().map(|p| {
                let len = p
                    .get("associatedPositions")
                    .and_then(Value::as_array)
                    .map_or(0, Vec::len);
                (p, rng.gen_range(0..len.max(1)))
            })
        };
        let Some((Value::Object(mut position), index)) = picked else {
            return Ok(StoryOutcome::Nop("no position with associations".into()));
        };
        if let Some(Value::Array(list)) = position.get_mut("associatedPositions") {
            if index < list.len() {
                list.remove(index);
            }
        }
        mutate(ctx, &cred, UPDATE_ASSOCIATIONS, "updateAssociatedPosition", json!({ "position": position })).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_mostly_active() {
        let mut rng = StdRng::seed_from_u64(12);
        let active = (0..1_000)
            .filter(|_| random_status(&mut rng) == Status::Active)
            .count();
        assert!((850..=950).contains(&active), "active = {active}");
    }

    #[test]
    fn sides_are_advisor_or_principal() {
        let mut rng = StdRng::seed_from_u64(12);
        for _ in 0..20 {
            assert!(PositionType::SIDES.contains(&random_side(&mut rng)));
        }
    }
}
