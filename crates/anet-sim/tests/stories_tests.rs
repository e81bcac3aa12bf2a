//! Stories and buildup against a scripted GraphQL backend

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;

use anet_model::Status;
use anet_sim::stories::{CreateHierarchy, CreateLocation, CreateNote, CreatePerson, DeletePerson, PutPersonInPosition};
use anet_sim::{
    run_buildup, BuildupStep, ExistingPositionHolder, GrowGate, NoteTarget, OrganizationType, PersonRole,
    PositionType, Scenario, SimUser, StoryArgs, StoryOutcome, StoryRunnable, UserProvider, UserType,
};
use anet_test_utils::{RecordingStory, ScriptedGraphQl, StaticUserProvider};

fn erin() -> SimUser {
    SimUser::new("erin", "erin")
}

#[tokio::test]
async fn create_person_skips_when_population_is_large() {
    let gql = Arc::new(ScriptedGraphQl::new().on(&["personList", "totalCount"], json!({ "personList": { "totalCount": 1000 } })));
    let ctx = gql.context("admin");
    let gate = GrowGate::for_target(Some(125.0), Some(10.0));

    let outcome = CreatePerson.run(&ctx, &erin(), &gate, &StoryArgs::new()).await.unwrap();
    assert_eq!(outcome, StoryOutcome::Skipped("1000 people exist".into()));
    assert!(gql.calls_to("createPerson").is_empty());
}

#[tokio::test]
async fn create_person_uses_the_requested_role() {
    let gql = Arc::new(
        ScriptedGraphQl::new()
            .on(&["personList", "totalCount"], json!({ "personList": { "totalCount": 3 } }))
            .on(&["createPerson"], json!({ "createPerson": { "uuid": "p-1" } })),
    );
    let ctx = gql.context("admin");
    let args = StoryArgs::new()
        .with("role", PersonRole::Principal)
        .with("status", Status::Inactive);

    let outcome = CreatePerson.run(&ctx, &erin(), &GrowGate::Always, &args).await.unwrap();
    assert_eq!(outcome, StoryOutcome::Done(json!({ "uuid": "p-1" })));

    let calls = gql.calls_to("createPerson");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].username, "erin");
    let person = &calls[0].variables["person"];
    assert_eq!(person["role"], json!(PersonRole::Principal));
    assert_eq!(person["status"], json!(Status::Inactive));
    assert!(person["name"].as_str().is_some_and(|n| !n.is_empty()));
    // principals have no tour of duty
    assert!(person.get("endOfTourDate").is_none());
}

#[tokio::test]
async fn delete_person_only_runs_when_shrinking() {
    let gql = Arc::new(ScriptedGraphQl::new().on(&["personList", "totalCount"], json!({ "personList": { "totalCount": 10 } })));
    let ctx = gql.context("admin");

    let outcome = DeletePerson.run(&ctx, &erin(), &GrowGate::Always, &StoryArgs::new()).await.unwrap();
    assert!(matches!(outcome, StoryOutcome::Skipped(_)));
    assert_eq!(gql.calls().len(), 1);
    assert!(gql.calls_to("updatePerson").is_empty());
}

#[tokio::test]
async fn create_location_honours_the_status_argument() {
    let gql = Arc::new(
        ScriptedGraphQl::new()
            .on(&["locationList", "totalCount"], json!({ "locationList": { "totalCount": 0 } }))
            .on(&["createLocation"], json!({ "createLocation": { "uuid": "loc-1" } })),
    );
    let ctx = gql.context("admin");
    let args = StoryArgs::new().with("status", Status::Inactive);

    let outcome = CreateLocation.run(&ctx, &erin(), &GrowGate::Always, &args).await.unwrap();
    assert!(outcome.is_done());
    let location = &gql.calls_to("createLocation")[0].variables["location"];
    assert_eq!(location["status"], json!(Status::Inactive));
    assert!(location["name"].is_string());
}

#[tokio::test]
async fn create_note_without_targets_is_a_nop() {
    let gql = Arc::new(ScriptedGraphQl::new().on(&["locationList", "totalCount"], json!({ "locationList": { "totalCount": 0 } })));
    let ctx = gql.context("admin");
    let args = StoryArgs::new().with("relatedObjectType", NoteTarget::Locations);

    let outcome = CreateNote.run(&ctx, &erin(), &GrowGate::Always, &args).await.unwrap();
    assert_eq!(outcome, StoryOutcome::Nop("no locations to attach a note to".into()));
}

#[tokio::test]
async fn create_note_links_a_random_target() {
    let gql = Arc::new(
        ScriptedGraphQl::new()
            .on(&["reportList", "totalCount"], json!({ "reportList": { "totalCount": 4 } }))
            .on(&["reportList", "list {"], json!({ "reportList": { "list": [{ "uuid": "r-9" }] } }))
            .on(&["createNote"], json!({ "createNote": { "uuid": "n-1" } })),
    );
    let ctx = gql.context("admin");

    let outcome = CreateNote.run(&ctx, &erin(), &GrowGate::Always, &StoryArgs::new()).await.unwrap();
    assert_eq!(outcome, StoryOutcome::Done(json!({ "uuid": "n-1" })));

    let page = &gql.calls_to("list {")[0].variables["query"];
    assert_eq!(page["pageSize"], json!(1));
    assert!(page["pageNum"].as_u64().is_some_and(|n| n < 4));

    let note = &gql.calls_to("createNote")[0].variables["note"];
    assert_eq!(note["type"], json!("FREE_TEXT"));
    assert_eq!(
        note["noteRelatedObjects"],
        json!([{ "relatedObjectType": "reports", "relatedObjectUuid": "r-9" }])
    );
}

#[tokio::test]
async fn put_person_in_position_picks_someone_without_a_position() {
    let gql = Arc::new(
        ScriptedGraphQl::new()
            .on(
                &["personList", "list {"],
                json!({ "personList": { "list": [
                    { "uuid": "p-1", "name": "Free", "position": null },
                    { "uuid": "p-2", "name": "Busy", "position": { "uuid": "x" } },
                ] } }),
            )
            .on(&["positionList", "totalCount"], json!({ "positionList": { "totalCount": 1 } }))
            .on(&["positionList", "list {"], json!({ "positionList": { "list": [{ "uuid": "pos-1", "name": "Empty" }] } }))
            .on(&["putPersonInPosition"], json!({ "putPersonInPosition": 1 })),
    );
    let ctx = gql.context("admin");

    let outcome = PutPersonInPosition
        .run(&ctx, &erin(), &GrowGate::Always, &StoryArgs::new())
        .await
        .unwrap();
    assert_eq!(outcome, StoryOutcome::Done(json!(1)));
    assert_eq!(
        gql.calls_to("putPersonInPosition")[0].variables,
        json!({ "uuid": "pos-1", "person": { "uuid": "p-1" } })
    );
}

#[tokio::test]
async fn hierarchy_without_sub_orgs_creates_one_organization() {
    let gql = Arc::new(
        ScriptedGraphQl::new()
            .on(&["organizationList", "totalCount"], json!({ "organizationList": { "totalCount": 0 } }))
            .on(&["createOrganization"], json!({ "createOrganization": { "uuid": "o-1", "shortName": "TOP" } })),
    );
    let ctx = gql.context("admin");
    let args = StoryArgs::new().with("type", OrganizationType::AdvisorOrg);

    let outcome = CreateHierarchy.run(&ctx, &erin(), &GrowGate::Always, &args).await.unwrap();
    assert_eq!(outcome, StoryOutcome::Done(json!({ "uuid": "o-1", "shortName": "TOP" })));

    let calls = gql.calls_to("createOrganization");
    assert_eq!(calls.len(), 1);
    let org = &calls[0].variables["organization"];
    assert_eq!(org["type"], json!(OrganizationType::AdvisorOrg));
    assert_eq!(org["status"], json!(Status::Active));
    assert_eq!(org["parentOrg"], json!(null));
    let short = org["shortName"].as_str().unwrap();
    assert_eq!(short, short.trim());
    assert!(org["longName"].is_string());
}

#[tokio::test]
async fn failing_mutation_surfaces_as_story_error() {
    let gql = Arc::new(
        ScriptedGraphQl::new()
            .on(&["locationList", "totalCount"], json!({ "locationList": { "totalCount": 0 } }))
            .failing(&["createLocation"], "Duplicate location"),
    );
    let ctx = gql.context("admin");

    let err = CreateLocation
        .run(&ctx, &erin(), &GrowGate::Always, &StoryArgs::new())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Duplicate location"));
}

#[tokio::test]
async fn position_holder_needs_a_login() {
    let gql = Arc::new(ScriptedGraphQl::new().on(
        &["positionList", "domainUsername"],
        json!({ "positionList": { "list": [
            { "uuid": "pos-1", "type": "ADVISOR", "person": { "uuid": "p-1", "name": "Erin", "domainUsername": "erin" } },
            { "uuid": "pos-2", "type": "ADVISOR", "person": { "uuid": "p-2", "name": "Nobody", "domainUsername": "" } },
            { "uuid": "pos-3", "type": "ADVISOR", "person": null },
        ] } }),
    ));
    let ctx = gql.context("arthur");

    let user = ExistingPositionHolder::new([PositionType::Advisor])
        .user(&ctx)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.name, "erin");
    assert_eq!(user.person_uuid.as_deref(), Some("p-1"));

    let calls = gql.calls();
    assert_eq!(calls[0].username, "arthur");
    assert_eq!(calls[0].variables["positionsQuery"]["isFilled"], json!(true));
}

#[tokio::test]
async fn position_holder_is_none_without_candidates() {
    let gql = Arc::new(ScriptedGraphQl::new().on(&["positionList"], json!({ "positionList": { "list": [] } })));
    let ctx = gql.context("arthur");
    let user = ExistingPositionHolder::new(PositionType::SIDES).user(&ctx).await.unwrap();
    assert!(user.is_none());
}

fn buildup_scenario(step: BuildupStep, provider: Arc<StaticUserProvider>) -> Scenario {
    Scenario::new("test", "buildup only")
        .with_user_type(UserType::new("existingAdmin", 1.0, provider))
        .with_buildup(step.with_users(["existingAdmin"]))
}

#[tokio::test(start_paused = true)]
async fn buildup_runs_each_step_number_times_after_its_delay() {
    let story = Arc::new(RecordingStory::new());
    let provider = Arc::new(StaticUserProvider::new(erin()));
    let args = StoryArgs::new().with("role", PersonRole::Advisor);
    let step = BuildupStep::new("Create person", 3, story.clone())
        .with_pre_delay(Duration::from_secs(300))
        .with_arguments(args.clone());
    let scenario = buildup_scenario(step, provider.clone());
    let ctx = Arc::new(ScriptedGraphQl::new()).context("admin");

    let started = tokio::time::Instant::now();
    let reports = run_buildup(&ctx, &scenario).await;
    assert!(started.elapsed() >= Duration::from_secs(300));

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].to_string(), "Executed 'Create person' 3 times");
    assert_eq!(provider.calls(), 1);
    let runs = story.runs();
    assert_eq!(runs.len(), 3);
    assert!(runs.iter().all(|r| r.user == "erin" && r.gate == GrowGate::Always && r.args == args));
}

#[tokio::test]
async fn buildup_counts_failures_and_carries_on() {
    let story = Arc::new(RecordingStory::failing());
    let provider = Arc::new(StaticUserProvider::new(erin()));
    let scenario = buildup_scenario(BuildupStep::new("Create report", 4, story.clone()), provider);
    let ctx = Arc::new(ScriptedGraphQl::new()).context("admin");

    let reports = run_buildup(&ctx, &scenario).await;
    assert_eq!(story.run_count(), 4);
    assert_eq!(reports[0].failed, 4);
    assert_eq!(reports[0].to_string(), "Executed 'Create report' 4 times (4 failed)");
}

#[tokio::test]
async fn buildup_step_without_user_is_skipped() {
    let story = Arc::new(RecordingStory::new());
    let scenario = buildup_scenario(
        BuildupStep::new("Create report", 4, story.clone()),
        Arc::new(StaticUserProvider::empty()),
    );
    let ctx = Arc::new(ScriptedGraphQl::new()).context("admin");

    let reports = run_buildup(&ctx, &scenario).await;
    assert!(reports[0].skipped);
    assert_eq!(story.run_count(), 0);
}
