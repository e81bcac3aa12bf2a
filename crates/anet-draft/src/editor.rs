//! Report editor driver
//!
//! Ties the form, the autosave session and the store together:
//! - every mutation re-renders, which refreshes the session snapshot and
//!   arms the autosave timer when none is pending
//! - field validation runs behind a debouncer
//! - autosave failures back off, conflicts park the loop until resolved
//! - user-facing outcomes are sent as [`Notice`]s

use chrono::Utc;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use anet_model::{
    AttendeeWarning, FieldChange, Report, ReportField, ReportInput, ReportPersonInput,
    ValidationError,
};

use crate::config::AutosaveConfig;
use crate::debounce::Debouncer;
use crate::error::{EditorError, SaveError};
use crate::form::{FormSnapshot, ReportForm};
use crate::humanize::humanize;
use crate::notice::Notice;
use crate::session::{AutosaveAction, AutosaveSession};
use crate::store::{ReportStore, SavedReport, UpdateOptions};

/// Canonical view path of a report
#[must_use]
pub fn report_path(uuid: &str) -> String {
    format!("/reports/{uuid}")
}

fn noun(report: &Report) -> &'static str {
    if report.is_future(Utc::now()) {
        "planned engagement"
    } else {
        "report"
    }
}

/// How to get out of a stale-write conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictResolution {
    /// Drop local edits and reload the server version
    Discard,
    /// Save local edits, overwriting the later server updates
    ForceOverwrite,
}

struct Shared<S> {
    store: S,
    acting_user: String,
    form: Mutex<ReportForm>,
    session: Mutex<AutosaveSession>,
    timer: Mutex<Option<JoinHandle<()>>>,
    notices: mpsc::UnboundedSender<Notice>,
    submitting: AtomicBool,
}

impl<S: ReportStore> Shared<S> {
    fn notify(&self, notice: Notice) {
        // the UI may be gone; nothing to do then
        let _ = self.notices.send(notice);
    }

    fn render(self: &Arc<Self>) {
        let snapshot = self.form.lock().snapshot();
        let delay = self.session.lock().schedule(snapshot);
        if let Some(delay) = delay {
            self.arm(delay);
        }
    }

    fn arm(self: &Arc<Self>, delay: Duration) {
        tracing::trace!(delay_ms = delay.as_millis() as u64, "autosave armed");
        let weak = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(shared) = weak.upgrade() {
                shared.autosave().await;
            }
        });
        if let Some(previous) = self.timer.lock().replace(handle) {
            previous.abort();
        }
    }

    fn disarm(&self) {
        if let Some(pending) = self.timer.lock().take() {
            pending.abort();
        }
    }

    async fn persist(&self, values: &Report, options: UpdateOptions) -> Result<SavedReport, SaveError> {
        let input = ReportInput::from_report(values, Utc::now());
        if values.is_saved() {
            self.store.update_report(input, options).await
        } else {
            self.store.create_report(input).await
        }
    }

    fn accept_saved(&self, snapshot: &FormSnapshot, saved: &SavedReport) -> Option<Duration> {
        let mut form = self.form.lock();
        form.reconcile_saved(snapshot, saved);
        let mut session = self.session.lock();
        session.on_success(Utc::now());
        session.update(form.snapshot());
        session.rearm()
    }

    async fn autosave(self: Arc<Self>) {
        // this task is the timer; forget its handle so rearming cannot abort it
        drop(self.timer.lock().take());

        let action = self.session.lock().fire();
        let snapshot = match action {
            AutosaveAction::Stopped => {
                tracing::debug!("autosave skipped: session stopped");
                return;
            }
            AutosaveAction::Reschedule(delay) => {
                tracing::trace!("autosave skipped: nothing to save");
                self.arm(delay);
                return;
            }
            AutosaveAction::Save(snapshot) => snapshot,
        };

        let noun = noun(&snapshot.values);
        match self.persist(&snapshot.values, UpdateOptions::default()).await {
            Ok(saved) => {
                let delay = self.accept_saved(&snapshot, &saved);
                tracing::info!(uuid = %saved.uuid, "report autosaved");
                self.notify(Notice::Autosaved {
                    at: Utc::now(),
                    message: format!("Your {noun} has been automatically saved"),
                });
                if let Some(delay) = delay {
                    self.arm(delay);
                }
            }
            Err(err) if err.is_conflict() => {
                self.session.lock().on_conflict();
                tracing::warn!(error = %err, "autosave hit a conflict, waiting for the user");
                self.notify(Notice::Conflict {
                    message: err.to_string(),
                });
            }
            Err(err) => {
                let (retry_in, delay) = {
                    let mut session = self.session.lock();
                    let retry_in = session.on_failure();
                    (retry_in, session.rearm())
                };
                tracing::warn!(
                    error = %err,
                    retry_in_ms = retry_in.as_millis() as u64,
                    "autosave failed"
                );
                self.notify(Notice::AutosaveFailed {
                    retry_in,
                    message: format!(
                        "There was an error autosaving your {noun}; we'll try again in {}",
                        humanize(retry_in)
                    ),
                });
                if let Some(delay) = delay {
                    self.arm(delay);
                }
            }
        }
    }
}

/// Controller of one mounted report form
pub struct ReportEditor<S> {
    shared: Arc<Shared<S>>,
    validator: Debouncer<ReportField>,
}

impl<S: ReportStore> ReportEditor<S> {
    /// Editor over `report`, acting as `acting_user`
    ///
    /// Returns the receiving end of the notice channel. Call [`Self::mount`]
    /// from within a tokio runtime to start autosaving.
    pub fn new(
        store: S,
        report: Report,
        acting_user: impl Into<String>,
        config: AutosaveConfig,
    ) -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            store,
            acting_user: acting_user.into(),
            form: Mutex::new(ReportForm::new(report)),
            session: Mutex::new(AutosaveSession::new(config.interval())),
            timer: Mutex::new(None),
            notices: tx,
            submitting: AtomicBool::new(false),
        });

        let weak = Arc::downgrade(&shared);
        let validator = Debouncer::new(config.validation_debounce(), move |field| {
            if let Some(shared) = weak.upgrade() {
                shared.form.lock().validate_field(field, Utc::now());
            }
        });

        (Self { shared, validator }, rx)
    }

    /// Start the autosave loop
    pub fn mount(&self) {
        self.shared.session.lock().start();
        self.shared.render();
    }

    /// Tear the autosave loop down; nothing is rescheduled afterwards
    pub fn stop(&self) {
        self.shared.session.lock().stop();
        self.shared.disarm();
        self.validator.cancel();
    }

    /// Read access to the form
    pub fn with_form<R>(&self, f: impl FnOnce(&ReportForm) -> R) -> R {
        f(&self.shared.form.lock())
    }

    /// Current values of the form
    #[must_use]
    pub fn values(&self) -> Report {
        self.shared.form.lock().values().clone()
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.shared.form.lock().is_dirty()
    }

    /// Current autosave interval, grown by failures
    #[must_use]
    pub fn autosave_interval(&self) -> Duration {
        self.shared.session.lock().interval()
    }

    /// Whether autosave waits for a conflict decision
    #[must_use]
    pub fn has_conflict(&self) -> bool {
        self.shared.session.lock().is_parked()
    }

    #[must_use]
    pub fn last_autosaved_at(&self) -> Option<chrono::DateTime<Utc>> {
        self.shared.session.lock().last_saved_at()
    }

    /// Unsaved changes would be lost by leaving now
    #[must_use]
    pub fn should_warn_before_leaving(&self) -> bool {
        self.is_dirty() && !self.shared.submitting.load(Ordering::SeqCst)
    }

    /// Apply a field edit, optionally validating it once typing settles
    pub fn apply_field_change(&self, change: FieldChange, should_validate: bool) {
        let field = self.shared.form.lock().apply(change);
        self.shared.render();
        if should_validate {
            self.validator.call(field);
        }
    }

    /// Replace the attendees with a freshly picked list
    pub fn update_attendees(&self, raw: Vec<ReportPersonInput>) {
        self.shared.form.lock().update_attendees(raw);
        self.shared.render();
        self.validator.call(ReportField::ReportPeople);
    }

    fn edit_people(
        &self,
        edit: impl FnOnce(&mut ReportForm, &str) -> Result<(), AttendeeWarning>,
    ) -> Result<(), AttendeeWarning> {
        let result = {
            let mut form = self.shared.form.lock();
            edit(&mut *form, &self.shared.acting_user)
        };
        match result {
            Ok(()) => {
                self.shared.render();
                self.validator.call(ReportField::ReportPeople);
                Ok(())
            }
            Err(warning) => {
                tracing::debug!(warning = warning.id(), "attendee edit refused");
                self.shared.notify(Notice::Warning(warning.clone()));
                Err(warning)
            }
        }
    }

    /// # Errors
    /// The refused edit's warning, also sent as a notice
    pub fn toggle_author(&self, uuid: &str) -> Result<(), AttendeeWarning> {
        self.edit_people(|form, acting| form.toggle_author(acting, uuid))
    }

    /// # Errors
    /// The refused edit's warning, also sent as a notice
    pub fn toggle_attendee(&self, uuid: &str) -> Result<(), AttendeeWarning> {
        self.edit_people(|form, _| form.toggle_attendee(uuid))
    }

    /// # Errors
    /// `UnknownPerson` only
    pub fn toggle_interlocutor(&self, uuid: &str) -> Result<(), AttendeeWarning> {
        self.edit_people(|form, _| form.toggle_interlocutor(uuid))
    }

    /// # Errors
    /// `NotAttending` for a non-attendee
    pub fn set_primary(&self, uuid: &str) -> Result<(), AttendeeWarning> {
        self.edit_people(|form, _| form.set_primary(uuid))
    }

    /// # Errors
    /// The refused edit's warning, also sent as a notice
    pub fn remove_person(&self, uuid: &str) -> Result<(), AttendeeWarning> {
        self.edit_people(|form, acting| form.remove_person(acting, uuid))
    }

    /// Validate every field now; the final submit is allowed when empty
    pub fn validate_all(&self) -> Vec<ValidationError> {
        self.shared.form.lock().validate_all(Utc::now())
    }

    /// Final save, regardless of the dirty flag
    ///
    /// On success the editor stops and a navigation notice is sent. On
    /// failure the error is surfaced and nothing is retried.
    ///
    /// # Errors
    /// The save failure
    pub async fn submit(&self, force: bool) -> Result<SavedReport, SaveError> {
        let shared = &self.shared;
        shared.submitting.store(true, Ordering::SeqCst);
        let snapshot = shared.form.lock().snapshot();
        let noun = noun(&snapshot.values);

        let options = UpdateOptions {
            send_edit_email: true,
            force,
        };
        match shared.persist(&snapshot.values, options).await {
            Ok(saved) => {
                {
                    let mut form = shared.form.lock();
                    form.reconcile_saved(&snapshot, &saved);
                    form.reset_after_submit();
                    shared.session.lock().update(form.snapshot());
                }
                self.stop();
                tracing::info!(uuid = %saved.uuid, force, "report saved");
                let mut title = noun.to_string();
                if let Some(first) = title.get_mut(..1) {
                    first.make_ascii_uppercase();
                }
                shared.notify(Notice::Saved {
                    message: format!("{title} saved"),
                });
                shared.notify(Notice::Navigate {
                    path: report_path(&saved.uuid),
                });
                Ok(saved)
            }
            Err(err) => {
                shared.submitting.store(false, Ordering::SeqCst);
                tracing::warn!(error = %err, "report save failed");
                let notice = if err.is_conflict() {
                    Notice::Conflict {
                        message: err.to_string(),
                    }
                } else {
                    Notice::SaveFailed {
                        message: err.to_string(),
                    }
                };
                shared.notify(notice);
                Err(err)
            }
        }
    }

    /// Leave a conflict and resume autosaving
    ///
    /// # Errors
    /// - `NotSaved` when discarding edits of a report never saved
    /// - `Save` when reloading or overwriting fails; the conflict stays open
    pub async fn resolve_conflict(&self, resolution: ConflictResolution) -> Result<(), EditorError> {
        let shared = &self.shared;
        let pending = match resolution {
            ConflictResolution::Discard => {
                let uuid = shared
                    .form
                    .lock()
                    .values()
                    .uuid
                    .clone()
                    .ok_or(EditorError::NotSaved)?;
                let report = shared.store.fetch_report(&uuid).await?;
                shared.form.lock().replace(report);
                tracing::info!(%uuid, "local edits discarded after conflict");
                None
            }
            ConflictResolution::ForceOverwrite => {
                let snapshot = shared.form.lock().snapshot();
                let options = UpdateOptions {
                    send_edit_email: false,
                    force: true,
                };
                let saved = shared.persist(&snapshot.values, options).await?;
                let delay = shared.accept_saved(&snapshot, &saved);
                tracing::info!(uuid = %saved.uuid, "later updates overwritten after conflict");
                shared.notify(Notice::Saved {
                    message: format!("Your {} has been saved", noun(&snapshot.values)),
                });
                delay
            }
        };
        let delay = {
            let form = shared.form.lock();
            let mut session = shared.session.lock();
            session.resolve();
            session.schedule(form.snapshot()).or(pending)
        };
        if let Some(delay) = delay {
            shared.arm(delay);
        }
        Ok(())
    }
}

impl<S> Drop for ReportEditor<S> {
    fn drop(&mut self) {
        self.shared.session.lock().stop();
        if let Some(pending) = self.shared.timer.lock().take() {
            pending.abort();
        }
    }
}

impl<S> fmt::Debug for ReportEditor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportEditor")
            .field("acting_user", &self.shared.acting_user)
            .field("dirty", &self.shared.form.lock().is_dirty())
            .finish_non_exhaustive()
    }
}
