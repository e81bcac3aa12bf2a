//! Scheduler behaviour against recording collaborators

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use anet_sim::{GrowGate, SimContext, SimUser, Story, TickOutcome, UserType, WorkloadScheduler};
use anet_test_utils::{RecordingStory, ScriptedGraphQl, StaticUserProvider};

const ADVISOR: &str = "existingAdvisor";

fn context() -> SimContext {
    Arc::new(ScriptedGraphQl::new()).context("admin")
}

fn advisors(provider: Arc<StaticUserProvider>) -> Vec<UserType> {
    vec![UserType::new(ADVISOR, 1.0, provider)]
}

fn scheduler(user_types: Vec<UserType>, stories: &[Story], seed: u64) -> WorkloadScheduler {
    WorkloadScheduler::with_rng(
        context(),
        user_types,
        stories,
        Duration::from_secs(180),
        StdRng::seed_from_u64(seed),
    )
    .with_role_delay(Duration::ZERO)
}

#[tokio::test]
async fn period_spaced_ticks_fire_the_story_repeatedly() {
    let story = Arc::new(RecordingStory::new());
    let provider = Arc::new(StaticUserProvider::new(SimUser::new("erin", "erin")));
    let stories = [Story::new("Create report", 10.0, story.clone()).with_users([ADVISOR])];
    let mut scheduler = scheduler(advisors(provider), &stories, 11);

    let period = scheduler.runs()[0].period;
    assert!((period - 18_000.0).abs() < 1e-9);

    let mut spawned = 0;
    let mut not_due = 0;
    for k in 1..=20 {
        for outcome in scheduler.tick(f64::from(k) * period).await {
            match outcome {
                TickOutcome::Spawned { user, .. } => {
                    assert_eq!(user, "erin");
                    spawned += 1;
                }
                TickOutcome::NotDue { .. } => not_due += 1,
                other => panic!("unexpected outcome {other:?}"),
            }
        }
    }
    scheduler.drain().await;

    assert_eq!(spawned + not_due, 20);
    // the first tick always fires: the start phase lies within one period
    assert!(spawned >= 10, "spawned = {spawned}");
    let stats = scheduler.runs()[0].statistics;
    assert_eq!(stats.n, spawned);
    assert_eq!(story.run_count() as u64, spawned);
    assert_eq!(scheduler.in_flight(), 0);
}

#[tokio::test]
async fn ineligible_user_types_never_run_the_story() {
    let story = Arc::new(RecordingStory::new());
    let provider = Arc::new(StaticUserProvider::new(SimUser::new("erin", "erin")));
    let stories = [Story::new("Admin only", 10.0, story.clone()).with_users(["existingAdmin"])];
    let mut scheduler = scheduler(advisors(provider.clone()), &stories, 3);

    let outcomes = scheduler.tick(1_000_000.0).await;
    assert_eq!(
        outcomes,
        vec![TickOutcome::NotEligible {
            story: "Admin only".into(),
            user_type: ADVISOR.into(),
        }]
    );
    assert_eq!(provider.calls(), 0);
    assert_eq!(scheduler.runs()[0].statistics.n, 0);
}

#[tokio::test]
async fn missing_user_still_advances_the_schedule() {
    let story = Arc::new(RecordingStory::new());
    let provider = Arc::new(StaticUserProvider::empty());
    let stories = [Story::new("Create report", 10.0, story.clone()).with_users([ADVISOR])];
    let mut scheduler = scheduler(advisors(provider.clone()), &stories, 5);

    let outcomes = scheduler.tick(20_000.0).await;
    assert_eq!(
        outcomes,
        vec![TickOutcome::NoUser {
            story: "Create report".into(),
            user_type: ADVISOR.into(),
        }]
    );
    assert_eq!(provider.calls(), 1);
    let run = &scheduler.runs()[0];
    assert_eq!(run.statistics.n, 1);
    assert!(run.next_execute_ms != 20_000.0);
    scheduler.drain().await;
    assert_eq!(story.run_count(), 0);
}

#[tokio::test]
async fn target_stories_get_their_gate() {
    let gated = Arc::new(RecordingStory::new());
    let open = Arc::new(RecordingStory::new());
    let provider = Arc::new(StaticUserProvider::new(SimUser::new("erin", "erin")));
    let stories = [
        Story::new("Create person", 10.0, gated.clone())
            .with_users([ADVISOR])
            .with_target(125.0, 10.0),
        Story::new("Approve report", 10.0, open.clone()).with_users([ADVISOR]),
    ];
    let mut scheduler = scheduler(advisors(provider), &stories, 9);

    // both become due within the first period; keep ticking until each ran
    let mut now = 20_000.0;
    while gated.run_count() == 0 || open.run_count() == 0 {
        scheduler.tick(now).await;
        scheduler.drain().await;
        now += 20_000.0;
        assert!(now < 2_000_000.0, "stories never ran");
    }

    let gate = gated.runs()[0].gate;
    assert!(matches!(gate, GrowGate::Target(n) if n.mean == 125.0 && n.stddev == 10.0));
    assert_eq!(open.runs()[0].gate, GrowGate::Always);
    assert!(open.runs()[0].args.is_empty());
}

#[tokio::test]
async fn failing_story_keeps_its_schedule() {
    let story = Arc::new(RecordingStory::failing());
    let provider = Arc::new(StaticUserProvider::new(SimUser::new("erin", "erin")));
    let stories = [Story::new("Broken", 10.0, story.clone()).with_users([ADVISOR])];
    let mut scheduler = scheduler(advisors(provider), &stories, 13);

    let outcomes = scheduler.tick(18_000.0).await;
    assert!(matches!(outcomes.as_slice(), [TickOutcome::Spawned { .. }]));
    scheduler.drain().await;
    assert_eq!(story.run_count(), 1);

    // the next run was scheduled before the failure
    let next = scheduler.runs()[0].next_execute_ms;
    assert!(next.is_finite());
    assert_eq!(
        scheduler.tick(next).await,
        vec![TickOutcome::NotDue { story: "Broken".into() }]
    );
}

#[tokio::test(start_paused = true)]
async fn run_ticks_until_the_running_time_is_over() {
    let story = Arc::new(RecordingStory::new());
    let provider = Arc::new(StaticUserProvider::new(SimUser::new("erin", "erin")));
    let stories = [
        Story::new("Create report", 10.0, story.clone()).with_users([ADVISOR]),
        Story::new("Never", 0.0, Arc::new(RecordingStory::new())).with_users([ADVISOR]),
    ];
    let mut scheduler = WorkloadScheduler::with_rng(
        context(),
        advisors(provider),
        &stories,
        Duration::from_secs(60),
        StdRng::seed_from_u64(17),
    );

    scheduler.run(Duration::from_secs(60)).await;

    let n = scheduler.runs()[0].statistics.n;
    assert!(n > 0);
    assert_eq!(story.run_count() as u64, n);
    assert_eq!(scheduler.in_flight(), 0);

    let summary = scheduler.summary();
    assert_eq!(summary.len(), 2);
    assert!(summary[0].starts_with(&format!("Executed Create report {n} times (mean: ")));
    assert_eq!(summary[1], "Executed Never 0 times (mean: - s, stddev: - s)");
}
