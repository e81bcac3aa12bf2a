//! Organization stories
//!
//! Organizations are created as whole hierarchies: a top organization with
//! up to three levels of sub-organizations, named after their path
//! (`ARH 2.1` is the first child of the second child of `ARH`).

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};

use anet_model::Status;

use super::{uuid_of, ListQuery, StoryArgs, StoryOutcome, StoryRunnable};
use crate::error::StoryError;
use crate::gateway::{at, SimContext};
use crate::kinds::OrganizationType;
use crate::lorem;
use crate::probability::GrowGate;
use crate::users::SimUser;

const CREATE_ORGANIZATION: &str = "mutation ($organization: OrganizationInput!) { \
    createOrganization(organization: $organization) { uuid } }";

/// Names of second level organizations
const SERVICES: &[&str] = &[
    "ICT Service",
    "Facility Service",
    "Legal Service",
    "Financial Service",
    "Training Service",
    "Development Service",
    "Research & Development Service",
    "Planning Programming Service",
    "Operations Service",
    "Support Service",
    "Logistics & Transport Service",
    "Marketing & Communication Service",
    "Compliance Service",
    "Human Resources Service",
    "Commissioning Service",
    "Quality Service",
    "Engineering Service",
    "Administration Service",
];

/// Relative weights of 0, 1, 2, ... children, per level
const CHILD_WEIGHTS: &[&[u32]] = &[&[1, 5, 3, 2, 1, 1], &[3, 5, 2, 1], &[4, 2, 1], &[1]];

/// Number of sub-organizations to create below an organization at `level`
pub fn sub_org_count<R: Rng + ?Sized>(level: usize, rng: &mut R) -> usize {
    let Some(weights) = CHILD_WEIGHTS.get(level) else {
        return 0;
    };
    let total: u32 = weights.iter().sum();
    let mut roll = rng.gen_range(0..total);
    for (children, weight) in weights.iter().enumerate() {
        if roll < *weight {
            return children;
        }
        roll -= weight;
    }
    0
}

/// One organization still to create
#[derive(Debug)]
struct Pending {
    parent: Option<String>,
    path: Vec<usize>,
}

/// Create an organization hierarchy, while the population is below its
/// target
///
/// Arguments: `type` (principal organization by default), `status` (active
/// by default) and `subOrgs` (whether to create sub-organizations).
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateHierarchy;

#[async_trait]
impl StoryRunnable for CreateHierarchy {
    async fn run(
        &self,
        ctx: &SimContext,
        user: &SimUser,
        gate: &GrowGate,
        args: &StoryArgs,
    ) -> Result<StoryOutcome, StoryError> {
        let cred = user.credential();
        let count = ListQuery::ORGANIZATIONS.count(ctx, &cred, &json!({})).await?;
        if !gate.grow(count) {
            tracing::debug!(count, "skipping create organization hierarchy");
            return Ok(StoryOutcome::Skipped(format!("{count} organizations exist")));
        }

        let org_type = args
            .get::<OrganizationType>("type")
            .unwrap_or(OrganizationType::PrincipalOrg);
        let status = args.get::<Status>("status").unwrap_or(Status::Active);
        let with_children = args.flag("subOrgs");

        let mut rng = StdRng::from_entropy();
        let long_name = lorem::company_name(&mut rng);
        let short_name = lorem::abbreviate(&long_name);
        let mut unused_services: Vec<&str> = SERVICES.to_vec();
        tracing::debug!(?org_type, %long_name, %short_name, "creating organization hierarchy");

        let mut top: Option<Value> = None;
        let mut queue = vec![Pending {
            parent: None,
            path: Vec::new(),
        }];
        while let Some(Pending { parent, path }) = queue.pop() {
            let level = path.len();
            let suffix = path.iter().map(ToString::to_string).collect::<Vec<_>>().join(".");
            let mut org = json!({
                "shortName": format!("{short_name} {suffix}").trim(),
                "identificationCode": lorem::letters(&mut rng, 6),
                "type": org_type,
                "status": status,
                "parentOrg": parent.as_ref().map(|uuid| json!({ "uuid": uuid })),
            });
            match level {
                0 => org["longName"] = json!(long_name),
                1 => {
                    unused_services.shuffle(&mut rng);
                    if let Some(service) = unused_services.pop() {
                        org["longName"] = json!(service);
                    }
                }
                _ => {}
            }

            let data = ctx
                .query(&cred, CREATE_ORGANIZATION, json!({ "organization": org }))
                .await?;
            let created = at(&data, "/createOrganization")?.clone();
            let Some(uuid) = uuid_of(&created).map(str::to_string) else {
                return Err(StoryError::MissingField("/createOrganization/uuid".into()));
            };
            top.get_or_insert(created);

            if with_children {
                // pushed in reverse so children are created in order
                for child in (1..=sub_org_count(level, &mut rng)).rev() {
                    let mut child_path = path.clone();
                    child_path.push(child);
                    queue.push(Pending {
                        parent: Some(uuid.clone()),
                        path: child_path,
                    });
                }
            }
        }
        Ok(StoryOutcome::Done(top.unwrap_or(Value::Null)))
    }
}
