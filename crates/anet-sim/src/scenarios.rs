//! Predefined scenarios
//!
//! - `default`: a light buildup followed by a mixed workload of report,
//!   person, organization and position stories
//! - `lotsOfData`: a heavy buildup seeding a large database, no stories

use std::sync::Arc;
use std::time::Duration;

use anet_model::Status;

use crate::error::SimError;
use crate::kinds::{NoteTarget, OrganizationType, PersonRole, PositionType};
use crate::scenario::{BuildupStep, Scenario, Story, UserType};
use crate::stories::{
    ApproveReport, AssociatePositions, CreateHierarchy, CreateLocation, CreateNote, CreatePerson,
    CreatePosition, CreateReport, DeletePerson, DeletePosition, DissociatePositions,
    PutPersonInPosition, RemovePersonFromPosition, StoryArgs, SubmitDraftReport,
    UpdateDraftReport, UpdatePerson, UpdatePosition,
};
use crate::users::{ExistingPositionHolder, NewUser};

const NEW_USER: &str = "newUser";
const ADVISOR: &str = "existingAdvisor";
const SUPER_USER: &str = "existingSuperUser";
const ADMIN: &str = "existingAdmin";

/// Names accepted by [`scenario`]
#[must_use]
pub fn known_scenarios() -> Vec<String> {
    vec!["default".to_string(), "lotsOfData".to_string()]
}

/// Scenario by name
///
/// # Errors
/// `UnknownScenario` with the list of known names
pub fn scenario(name: &str) -> Result<Scenario, SimError> {
    match name {
        "default" => Ok(default_scenario()),
        "lotsOfData" => Ok(lots_of_data()),
        _ => Err(SimError::UnknownScenario {
            name: name.to_string(),
            known: known_scenarios(),
        }),
    }
}

fn user_types() -> Vec<UserType> {
    vec![
        UserType::new(NEW_USER, 30.0, Arc::new(NewUser)),
        UserType::new(
            ADVISOR,
            1.0,
            Arc::new(ExistingPositionHolder::new([PositionType::Advisor])),
        ),
        UserType::new(
            SUPER_USER,
            1.0,
            Arc::new(ExistingPositionHolder::new([
                PositionType::SuperUser,
                PositionType::Administrator,
            ])),
        ),
        UserType::new(
            ADMIN,
            1.0,
            Arc::new(ExistingPositionHolder::new([PositionType::Administrator])),
        ),
    ]
}

fn with_user_types(mut scenario: Scenario) -> Scenario {
    for user_type in user_types() {
        scenario = scenario.with_user_type(user_type);
    }
    scenario
}

/// Light buildup and a mixed workload
#[must_use]
pub fn default_scenario() -> Scenario {
    let buildup = [
        BuildupStep::new("Create person", 100, Arc::new(CreatePerson)),
        BuildupStep::new("Create organization", 50, Arc::new(CreateHierarchy)),
        BuildupStep::new("Create position", 50, Arc::new(CreatePosition)),
        BuildupStep::new("Put person in position", 50, Arc::new(PutPersonInPosition)),
        BuildupStep::new(
            "Associated advisor position with principal position",
            750,
            Arc::new(AssociatePositions),
        ),
    ];

    let stories = [
        Story::new("Create Report", 10.0, Arc::new(CreateReport)).with_users([ADVISOR]),
        Story::new("Update Draft Report", 40.0, Arc::new(UpdateDraftReport)).with_users([ADVISOR]),
        Story::new("Submit Draft Report", 10.0, Arc::new(SubmitDraftReport)).with_users([ADVISOR]),
        Story::new("Approve Report", 10.0, Arc::new(ApproveReport)).with_users([ADVISOR]),
        Story::new("Create profile", 1.0, Arc::new(CreateReport)).with_users([NEW_USER]),
        Story::new("Create person", 1.0, Arc::new(CreatePerson))
            .with_target(125.0, 10.0)
            .with_users([SUPER_USER]),
        Story::new("Update person", 0.1, Arc::new(UpdatePerson)).with_users([SUPER_USER]),
        Story::new("Delete person", 1.0, Arc::new(DeletePerson))
            .with_target(125.0, 10.0)
            .with_users([SUPER_USER]),
        Story::new("Create organization", 0.1, Arc::new(CreateHierarchy))
            .with_target(100.0, 0.1)
            .with_users([ADMIN]),
        Story::new("Create position", 0.1, Arc::new(CreatePosition))
            .with_target(75.0, 20.0)
            .with_users([ADMIN]),
        Story::new("Activate position", 0.1, Arc::new(CreatePosition))
            .with_target(75.0, 20.0)
            .with_users([ADMIN]),
        Story::new("Delete position", 0.01, Arc::new(DeletePosition))
            .with_target(75.0, 20.0)
            .with_users([ADMIN]),
        Story::new("Put person in position", 1.0, Arc::new(PutPersonInPosition)).with_users([ADMIN]),
        Story::new(
            "Associated advisor position with principal position",
            1.0,
            Arc::new(AssociatePositions),
        )
        .with_users([ADMIN]),
        Story::new(
            "Remove advisor position from principal position",
            1.0,
            Arc::new(DissociatePositions),
        )
        .with_users([ADMIN]),
        Story::new("Remove person from position", 0.02, Arc::new(RemovePersonFromPosition))
            .with_users([ADMIN]),
        Story::new("Update position", 1.0, Arc::new(UpdatePosition)).with_users([ADMIN]),
    ];

    let mut scenario = with_user_types(Scenario::new(
        "default",
        "Simple scenario with a few of each story",
    ));
    for step in buildup {
        scenario = scenario.with_buildup(step.with_users([ADMIN]));
    }
    for story in stories {
        scenario = scenario.with_story(story);
    }
    scenario
}

fn person_step(name: &str, number: u64, role: PersonRole, status: Status) -> BuildupStep {
    BuildupStep::new(name, number, Arc::new(CreatePerson))
        .with_arguments(StoryArgs::new().with("role", role).with("status", status))
}

fn hierarchy_step(name: &str, number: u64, org_type: OrganizationType) -> BuildupStep {
    BuildupStep::new(name, number, Arc::new(CreateHierarchy)).with_arguments(
        StoryArgs::new()
            .with("type", org_type)
            .with("status", Status::Active)
            .with("subOrgs", true),
    )
}

fn note_step(name: &str, number: u64, target: NoteTarget, pre_delay_secs: u64) -> BuildupStep {
    BuildupStep::new(name, number, Arc::new(CreateNote))
        .with_pre_delay(Duration::from_secs(pre_delay_secs))
        .with_arguments(StoryArgs::new().with("relatedObjectType", target))
}

/// Seed a large database
#[must_use]
pub fn lots_of_data() -> Scenario {
    let mut steps = vec![
        BuildupStep::new("Create location", 500, Arc::new(CreateLocation)),
        person_step("Create active advisor", 2_000, PersonRole::Advisor, Status::Active),
        person_step("Create inactive advisor", 10_000, PersonRole::Advisor, Status::Inactive),
        person_step("Create active principal", 10_000, PersonRole::Principal, Status::Active),
        person_step("Create inactive principal", 10_000, PersonRole::Principal, Status::Inactive),
        hierarchy_step("Create advisor organization", 20, OrganizationType::AdvisorOrg),
        hierarchy_step("Create principal organization", 100, OrganizationType::PrincipalOrg),
        BuildupStep::new("Create position", 20_000, Arc::new(CreatePosition))
            .with_pre_delay(Duration::from_secs(300)),
    ];
    steps.extend((1..=8).map(|i| {
        BuildupStep::new(format!("Create published report #{i}"), 25_000, Arc::new(CreateReport))
            .with_pre_delay(Duration::from_secs(600))
            .with_arguments(StoryArgs::new().with("state", "PUBLISHED"))
    }));
    steps.extend([
        note_step("Create authorizationGroup note", 25, NoteTarget::AuthorizationGroups, 60),
        note_step("Create location note", 1_000, NoteTarget::Locations, 60),
        note_step("Create organization note", 1_500, NoteTarget::Organizations, 60),
        note_step("Create person note", 1_000, NoteTarget::People, 60),
        note_step("Create position note", 1_000, NoteTarget::Positions, 600),
        note_step("Create task note", 100, NoteTarget::Tasks, 60),
    ]);
    steps.extend(
        (1..=8).map(|i| note_step(&format!("Create report note #{i}"), 1_000, NoteTarget::Reports, 900)),
    );

    let mut scenario = with_user_types(Scenario::new(
        "lotsOfData",
        "Buildup of a large amount of data",
    ));
    for step in steps {
        scenario = scenario.with_buildup(step.with_users([ADMIN]));
    }
    scenario
}
