//! Report editor behaviour over virtual time

use std::time::Duration;

use chrono::Utc;
use pretty_assertions::assert_eq;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::sleep;

use anet_draft::{AutosaveConfig, ConflictResolution, Notice, ReportEditor};
use anet_model::{AttendeeWarning, Atmosphere, FieldChange, Report, ReportField};
use anet_test_utils::{advisor, complete_report, interlocutor, InMemoryReportStore, StoreCall};

fn drain(notices: &mut UnboundedReceiver<Notice>) -> Vec<Notice> {
    let mut out = Vec::new();
    while let Ok(notice) = notices.try_recv() {
        out.push(notice);
    }
    out
}

fn editor(
    store: &InMemoryReportStore,
    report: Report,
) -> (ReportEditor<InMemoryReportStore>, UnboundedReceiver<Notice>) {
    let (editor, notices) =
        ReportEditor::new(store.clone(), report, "advisor-1", AutosaveConfig::default());
    editor.mount();
    (editor, notices)
}

#[tokio::test(start_paused = true)]
async fn edit_is_autosaved_after_the_interval() {
    let store = InMemoryReportStore::new();
    let (editor, mut notices) = editor(&store, complete_report());

    editor.apply_field_change(FieldChange::Intent("Review the budget".into()), false);
    sleep(Duration::from_secs(29)).await;
    assert!(store.saves().is_empty());

    sleep(Duration::from_secs(2)).await;
    let saves = store.saves();
    assert_eq!(saves.len(), 1);
    assert_eq!(saves[0].intent, "Review the budget");
    assert!(!editor.is_dirty());
    assert!(editor.values().uuid.is_some());
    assert!(editor.last_autosaved_at().is_some());

    let notices = drain(&mut notices);
    assert!(matches!(
        notices.as_slice(),
        [Notice::Autosaved { message, .. }] if message == "Your report has been automatically saved"
    ));
}

#[tokio::test(start_paused = true)]
async fn clean_form_is_not_saved() {
    let store = InMemoryReportStore::new();
    let (_editor, _notices) = editor(&store, complete_report());
    sleep(Duration::from_secs(200)).await;
    assert!(store.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn burst_of_edits_yields_one_save() {
    let store = InMemoryReportStore::new();
    let (editor, _notices) = editor(&store, complete_report());

    for i in 0..5 {
        editor.apply_field_change(FieldChange::Intent(format!("Draft {i}")), false);
        sleep(Duration::from_secs(2)).await;
    }
    sleep(Duration::from_secs(25)).await;
    assert_eq!(store.saves().len(), 1);
    assert_eq!(store.saves()[0].intent, "Draft 4");

    // nothing new to save afterwards
    sleep(Duration::from_secs(90)).await;
    assert_eq!(store.saves().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn failures_back_off_and_success_resets() {
    let store = InMemoryReportStore::new();
    store.fail_next(3);
    let (editor, mut notices) = editor(&store, complete_report());
    editor.apply_field_change(FieldChange::NextSteps("Call back".into()), false);

    // fires at 30, 90, 210 and 450 seconds
    sleep(Duration::from_secs(31)).await;
    assert_eq!(store.saves().len(), 1);
    assert_eq!(editor.autosave_interval(), Duration::from_secs(60));
    let first = drain(&mut notices);
    assert_eq!(
        first,
        vec![Notice::AutosaveFailed {
            retry_in: Duration::from_secs(60),
            message: "There was an error autosaving your report; we'll try again in a minute".into(),
        }]
    );

    sleep(Duration::from_secs(60)).await;
    assert_eq!(store.saves().len(), 2);
    assert_eq!(editor.autosave_interval(), Duration::from_secs(120));

    sleep(Duration::from_secs(120)).await;
    assert_eq!(store.saves().len(), 3);
    assert_eq!(editor.autosave_interval(), Duration::from_secs(240));
    assert!(editor.is_dirty());

    sleep(Duration::from_secs(238)).await;
    assert_eq!(store.saves().len(), 3);
    sleep(Duration::from_secs(2)).await;
    assert_eq!(store.saves().len(), 4);
    assert_eq!(editor.autosave_interval(), Duration::from_secs(30));
    assert!(!editor.is_dirty());
}

#[tokio::test(start_paused = true)]
async fn edits_during_a_save_stay_dirty() {
    let store = InMemoryReportStore::new().with_latency(Duration::from_secs(5));
    let (editor, _notices) = editor(&store, complete_report());
    editor.apply_field_change(FieldChange::Intent("First".into()), false);

    // save runs from 30 to 35 seconds
    sleep(Duration::from_secs(32)).await;
    editor.apply_field_change(FieldChange::ReportText("Second".into()), false);
    sleep(Duration::from_secs(4)).await;

    assert_eq!(store.saves().len(), 1);
    assert!(editor.values().uuid.is_some());
    assert_eq!(editor.values().report_text, "Second");
    assert!(editor.is_dirty());
    assert!(editor.with_form(|f| f.touched().contains(&ReportField::ReportText)));

    // next round picks up the in-flight edit
    sleep(Duration::from_secs(40)).await;
    let saves = store.saves();
    assert_eq!(saves.len(), 2);
    assert_eq!(saves[1].report_text, "Second");
    assert!(!editor.is_dirty());
}

#[tokio::test(start_paused = true)]
async fn conflict_parks_until_discarded() {
    let store = InMemoryReportStore::new();
    let report = store.seed(complete_report());
    let uuid = report.uuid.clone().unwrap();
    let (editor, mut notices) = editor(&store, report);

    store.bump(&uuid);
    editor.apply_field_change(FieldChange::Intent("Mine".into()), false);
    sleep(Duration::from_secs(31)).await;
    assert!(editor.has_conflict());
    let conflict = drain(&mut notices);
    assert_eq!(conflict.len(), 1);
    assert!(conflict[0].is_blocking());

    // parked: no retries
    sleep(Duration::from_secs(600)).await;
    assert_eq!(store.saves().len(), 1);

    editor.resolve_conflict(ConflictResolution::Discard).await.unwrap();
    assert!(!editor.has_conflict());
    assert!(!editor.is_dirty());
    assert!(editor.values().intent.ends_with("(edited elsewhere)"));
    assert!(matches!(store.calls().last(), Some(StoreCall::Fetch(u)) if *u == uuid));

    editor.apply_field_change(FieldChange::Intent("Mine again".into()), false);
    sleep(Duration::from_secs(31)).await;
    assert_eq!(store.saves().len(), 2);
    assert_eq!(store.stored(&uuid).unwrap().intent, "Mine again");
}

#[tokio::test(start_paused = true)]
async fn conflict_can_be_overwritten() {
    let store = InMemoryReportStore::new();
    let report = store.seed(complete_report());
    let uuid = report.uuid.clone().unwrap();
    let (editor, _notices) = editor(&store, report);

    store.bump(&uuid);
    editor.apply_field_change(FieldChange::Intent("Mine".into()), false);
    sleep(Duration::from_secs(31)).await;
    assert!(editor.has_conflict());

    editor
        .resolve_conflict(ConflictResolution::ForceOverwrite)
        .await
        .unwrap();
    assert!(!editor.has_conflict());
    assert_eq!(store.stored(&uuid).unwrap().intent, "Mine");
    assert!(matches!(
        store.calls().last(),
        Some(StoreCall::Update(_, options)) if options.force
    ));
}

#[tokio::test(start_paused = true)]
async fn autosave_resumes_once_after_overwrite() {
    let store = InMemoryReportStore::new();
    let report = store.seed(complete_report());
    let uuid = report.uuid.clone().unwrap();
    let (editor, _notices) = editor(&store, report);

    store.bump(&uuid);
    editor.apply_field_change(FieldChange::Intent("Mine".into()), false);
    sleep(Duration::from_secs(31)).await;
    editor
        .resolve_conflict(ConflictResolution::ForceOverwrite)
        .await
        .unwrap();
    assert_eq!(store.saves().len(), 2);

    editor.apply_field_change(FieldChange::Intent("Mine, later".into()), false);
    sleep(Duration::from_secs(31)).await;
    assert_eq!(store.saves().len(), 3);
    assert_eq!(store.stored(&uuid).unwrap().intent, "Mine, later");

    // a single timer keeps running: clean ticks save nothing
    sleep(Duration::from_secs(300)).await;
    assert_eq!(store.saves().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn stopped_editor_never_saves() {
    let store = InMemoryReportStore::new();
    let (editor, _notices) = editor(&store, complete_report());
    editor.apply_field_change(FieldChange::Intent("Unsaved".into()), false);
    editor.stop();
    sleep(Duration::from_secs(120)).await;
    assert!(store.calls().is_empty());
    assert!(editor.should_warn_before_leaving());
}

#[tokio::test(start_paused = true)]
async fn submit_saves_and_navigates() {
    let store = InMemoryReportStore::new();
    let report = store.seed(complete_report());
    let uuid = report.uuid.clone().unwrap();
    let (editor, mut notices) = editor(&store, report);

    editor.apply_field_change(FieldChange::KeyOutcomes("Signed".into()), false);
    assert!(editor.should_warn_before_leaving());
    let saved = editor.submit(false).await.unwrap();
    assert_eq!(saved.uuid, uuid);

    assert!(matches!(
        store.calls().last(),
        Some(StoreCall::Update(_, options)) if options.send_edit_email && !options.force
    ));
    assert!(!editor.should_warn_before_leaving());
    assert_eq!(
        drain(&mut notices),
        vec![
            Notice::Saved { message: "Report saved".into() },
            Notice::Navigate { path: format!("/reports/{uuid}") },
        ]
    );

    // the loop is torn down after a submit
    editor.apply_field_change(FieldChange::KeyOutcomes("Later".into()), false);
    sleep(Duration::from_secs(120)).await;
    assert_eq!(store.saves().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_submit_keeps_the_leave_warning() {
    let store = InMemoryReportStore::new();
    store.fail_next(1);
    let (editor, mut notices) = editor(&store, complete_report());
    editor.apply_field_change(FieldChange::Intent("Submit me".into()), false);

    let err = editor.submit(false).await.unwrap_err();
    assert!(!err.is_conflict());
    assert!(editor.should_warn_before_leaving());
    assert!(matches!(drain(&mut notices).as_slice(), [Notice::SaveFailed { .. }]));
}

#[tokio::test(start_paused = true)]
async fn planned_engagement_drops_outcome_fields() {
    let store = InMemoryReportStore::new();
    let mut report = complete_report();
    report.engagement_date = Some(Utc::now() + chrono::Duration::days(10));
    report.atmosphere = Some(Atmosphere::Neutral);
    let (editor, mut notices) = editor(&store, report);

    editor.apply_field_change(FieldChange::Intent("Plan the visit".into()), false);
    sleep(Duration::from_secs(31)).await;

    let saves = store.saves();
    assert_eq!(saves.len(), 1);
    assert_eq!(saves[0].atmosphere, None);
    assert!(saves[0].key_outcomes.is_empty());
    assert!(saves[0].next_steps.is_empty());
    assert_eq!(
        drain(&mut notices)[0].message().as_deref(),
        Some("Your planned engagement has been automatically saved")
    );
}

#[tokio::test(start_paused = true)]
async fn validation_waits_for_typing_to_settle() {
    let store = InMemoryReportStore::new();
    let (editor, _notices) = editor(&store, Report::new());

    editor.apply_field_change(FieldChange::Intent(String::new()), true);
    sleep(Duration::from_millis(300)).await;
    assert!(editor.with_form(|f| f.error(ReportField::Intent).is_none()));

    sleep(Duration::from_millis(200)).await;
    assert!(editor.with_form(|f| f.error(ReportField::Intent).is_some()));

    editor.apply_field_change(FieldChange::Intent("x".into()), true);
    sleep(Duration::from_millis(200)).await;
    editor.apply_field_change(FieldChange::Intent("Meet the minister".into()), true);
    sleep(Duration::from_millis(300)).await;
    // still the previous verdict: the window restarted
    assert!(editor.with_form(|f| f.error(ReportField::Intent).is_some()));
    sleep(Duration::from_millis(200)).await;
    assert!(editor.with_form(|f| f.error(ReportField::Intent).is_none()));
}

#[tokio::test(start_paused = true)]
async fn accepted_attendee_edit_is_autosaved() {
    let store = InMemoryReportStore::new();
    let (editor, mut notices) = editor(&store, complete_report());

    editor.update_attendees(vec![
        advisor("advisor-1", "ADVISOR, Ann").with_author(true).user(true),
        interlocutor("principal-1", "PRINCIPAL, Paul"),
        advisor("advisor-2", "ADVISOR, Bob"),
    ]);
    editor.toggle_author("advisor-2").unwrap();

    assert!(editor.is_dirty());
    assert!(editor.with_form(|f| f.touched().contains(&ReportField::ReportPeople)));
    let bob = editor
        .values()
        .report_people
        .into_iter()
        .find(|p| p.uuid == "advisor-2")
        .unwrap();
    assert!(bob.author && bob.attendee && !bob.interlocutor);

    sleep(Duration::from_secs(31)).await;
    let saves = store.saves();
    assert_eq!(saves.len(), 1);
    let people = &saves[0].report_people;
    assert_eq!(people.len(), 3);
    assert!(people.iter().any(|p| p.uuid == "advisor-2" && p.author));
    assert!(!editor.is_dirty());
    assert!(matches!(drain(&mut notices).as_slice(), [Notice::Autosaved { .. }]));
}

#[tokio::test(start_paused = true)]
async fn refused_attendee_edit_warns_and_keeps_the_list() {
    let store = InMemoryReportStore::new();
    let (editor, mut notices) = editor(&store, complete_report());
    let before = editor.values().report_people;

    let err = editor.toggle_author("advisor-1").unwrap_err();
    assert_eq!(err, AttendeeWarning::RemovingSelfAuthor);
    assert_eq!(
        drain(&mut notices),
        vec![Notice::Warning(AttendeeWarning::RemovingSelfAuthor)]
    );
    assert_eq!(editor.values().report_people, before);
    assert!(!editor.is_dirty());
    assert!(editor.with_form(|f| !f.touched().contains(&ReportField::ReportPeople)));

    assert_eq!(editor.remove_person("advisor-1"), Err(AttendeeWarning::RemovingSelf));
    assert_eq!(drain(&mut notices), vec![Notice::Warning(AttendeeWarning::RemovingSelf)]);
    assert_eq!(editor.values().report_people, before);

    sleep(Duration::from_secs(90)).await;
    assert!(store.saves().is_empty());
}

#[tokio::test(start_paused = true)]
async fn primary_attendee_must_be_replaced_before_leaving() {
    let store = InMemoryReportStore::new();
    let (editor, mut notices) = editor(&store, complete_report());
    editor.update_attendees(vec![
        advisor("advisor-1", "ADVISOR, Ann").with_author(true).user(true),
        interlocutor("principal-1", "PRINCIPAL, Paul").with_primary(true),
        interlocutor("principal-2", "PRINCIPAL, Pia"),
    ]);
    let primary = |uuid: &str| {
        editor
            .values()
            .report_people
            .iter()
            .any(|p| p.uuid == uuid && p.primary)
    };
    assert!(primary("principal-1"));

    assert_eq!(
        editor.toggle_attendee("principal-1"),
        Err(AttendeeWarning::RemovingPrimaryAttendee)
    );
    assert_eq!(
        drain(&mut notices),
        vec![Notice::Warning(AttendeeWarning::RemovingPrimaryAttendee)]
    );

    editor.set_primary("principal-2").unwrap();
    assert!(primary("principal-2") && !primary("principal-1"));
    editor.toggle_attendee("principal-1").unwrap();
    editor.remove_person("principal-1").unwrap();
    editor.toggle_interlocutor("principal-2").unwrap();
    assert!(drain(&mut notices).is_empty());

    let people = editor.values().report_people;
    assert_eq!(people.len(), 2);
    assert!(people.iter().all(|p| !p.interlocutor));

    sleep(Duration::from_secs(31)).await;
    assert_eq!(store.saves().len(), 1);
    assert_eq!(store.saves()[0].report_people.len(), 2);
}
