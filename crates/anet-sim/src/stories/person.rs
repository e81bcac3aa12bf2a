//! Person stories

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::{json, Map, Value};

use anet_model::Status;

use super::{mutate, ListQuery, StoryArgs, StoryOutcome, StoryRunnable};
use crate::error::StoryError;
use crate::gateway::SimContext;
use crate::kinds::PersonRole;
use crate::lorem;
use crate::populate::{Frequency, Populate};
use crate::probability::GrowGate;
use crate::users::SimUser;

const CREATE_PERSON: &str =
    "mutation ($person: PersonInput!) { createPerson(person: $person) { uuid } }";
const UPDATE_PERSON: &str = "mutation ($person: PersonInput!) { updatePerson(person: $person) }";

const PERSON_FIELDS: &str = "uuid name role status rank domainUsername emailAddress \
    phoneNumber biography endOfTourDate position { uuid }";

/// Random person fields for a new record
pub fn random_person<R: Rng + ?Sized>(
    role: PersonRole,
    status: Status,
    rng: &mut R,
) -> Map<String, Value> {
    let mut person = Map::new();
    person.insert("role".into(), json!(role));
    person.insert("status".into(), json!(status));
    Populate::new(&mut person, rng)
        .field(Frequency::Always, |p, rng| {
            p.insert("name".into(), json!(lorem::person_name(rng)));
        })
        .field(Frequency::Always, |p, rng| {
            p.insert("rank".into(), json!(lorem::RANKS.choose(rng)));
        })
        .field(Frequency::Often, |p, rng| {
            let login = lorem::user_name(rng);
            p.insert("emailAddress".into(), json!(format!("{login}@example.com")));
            p.insert("domainUsername".into(), json!(login));
        })
        .field(Frequency::Sometimes, |p, rng| {
            p.insert("phoneNumber".into(), json!(format!("+93 {}", rng.gen_range(100_000_000..999_999_999))));
        })
        .field(Frequency::Rarely, |p, rng| {
            p.insert("biography".into(), json!(lorem::paragraph(rng)));
        });
    if role == PersonRole::Advisor {
        let tour = Utc::now() + Duration::days(StdRng::from_entropy().gen_range(30..720));
        person.insert("endOfTourDate".into(), json!(tour));
    }
    person
}

async fn count_people(ctx: &SimContext, user: &SimUser) -> Result<u64, StoryError> {
    ListQuery::PEOPLE
        .count(ctx, &user.credential(), &json!({ "status": Status::Active }))
        .await
}

/// Create a person, while the population is below its target
///
/// Arguments: `role` and `status`; a random role and active status otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreatePerson;

#[async_trait]
impl StoryRunnable for CreatePerson {
    async fn run(
        &self,
        ctx: &SimContext,
        user: &SimUser,
        gate: &GrowGate,
        args: &StoryArgs,
    ) -> Result<StoryOutcome, StoryError> {
        let count = count_people(ctx, user).await?;
        if !gate.grow(count) {
            return Ok(StoryOutcome::Skipped(format!("{count} people exist")));
        }
        let mut rng = StdRng::from_entropy();
        let role = args
            .get::<PersonRole>("role")
            .or_else(|| PersonRole::ALL.choose(&mut rng).copied())
            .unwrap_or(PersonRole::Advisor);
        let status = args.get::<Status>("status").unwrap_or(Status::Active);
        let person = random_person(role, status, &mut rng);
        tracing::debug!(?role, ?status, "creating person");
        mutate(ctx, &user.credential(), CREATE_PERSON, "createPerson", json!({ "person": person })).await
    }
}

/// Random active person, other than the special user
async fn random_active_person(ctx: &SimContext, user: &SimUser) -> Result<Option<Value>, StoryError> {
    let role = PersonRole::ALL.choose(&mut rand::thread_rng()).copied();
    let filter = json!({ "status": Status::Active, "role": role });
    let person = ListQuery::PEOPLE
        .random(ctx, &user.credential(), &filter, PERSON_FIELDS)
        .await?;
    let admin = ctx.admin().username.as_str();
    Ok(person.filter(|p| p.get("domainUsername").and_then(Value::as_str) != Some(admin)))
}

/// Change a few details of a random person
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdatePerson;

#[async_trait]
impl StoryRunnable for UpdatePerson {
    async fn run(
        &self,
        ctx: &SimContext,
        user: &SimUser,
        _gate: &GrowGate,
        _args: &StoryArgs,
    ) -> Result<StoryOutcome, StoryError> {
        let Some(Value::Object(mut person)) = random_active_person(ctx, user).await? else {
            return Ok(StoryOutcome::Nop("no person to update".into()));
        };
        person.remove("position");
        Populate::new(&mut person, &mut StdRng::from_entropy())
            .field(Frequency::Sometimes, |p, rng| {
                p.insert("rank".into(), json!(lorem::RANKS.choose(rng)));
            })
            .field(Frequency::Sometimes, |p, rng| {
                p.insert("phoneNumber".into(), json!(format!("+93 {}", rng.gen_range(100_000_000..999_999_999))));
            })
            .field(Frequency::Rarely, |p, rng| {
                p.insert("biography".into(), json!(lorem::paragraph(rng)));
            });
        mutate(ctx, &user.credential(), UPDATE_PERSON, "updatePerson", json!({ "person": person })).await
    }
}

/// Deactivate a person without a position, while the population is above
/// its target
#[derive(Debug, Clone, Copy, Default)]
pub struct DeletePerson;

#[async_trait]
impl StoryRunnable for DeletePerson {
    async fn run(
        &self,
        ctx: &SimContext,
        user: &SimUser,
        gate: &GrowGate,
        _args: &StoryArgs,
    ) -> Result<StoryOutcome, StoryError> {
        let count = count_people(ctx, user).await?;
        if gate.grow(count) {
            return Ok(StoryOutcome::Skipped(format!("{count} people exist")));
        }
        let Some(Value::Object(mut person)) = random_active_person(ctx, user).await? else {
            return Ok(StoryOutcome::Nop("no person to deactivate".into()));
        };
        if person.get("position").is_some_and(|p| !p.is_null()) {
            return Ok(StoryOutcome::Nop("picked person holds a position".into()));
        }
        person.remove("position");
        person.insert("status".into(), json!(Status::Inactive));
        mutate(ctx, &user.credential(), UPDATE_PERSON, "updatePerson", json!({ "person": person })).await
    }
}
