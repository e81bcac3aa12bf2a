//! Autosave session state machine
//!
//! Pure bookkeeping, no timers of its own. The editor asks the session
//! whether to arm a timer and what to do when it fires:
//! - at most one timer is armed at a time; a save in flight counts as one
//! - a stopped session never asks for another timer
//! - failures double the interval, a success resets it
//! - a conflict parks the session until the user resolves it

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::form::FormSnapshot;

/// What to do when the autosave timer fires
#[derive(Debug, Clone, PartialEq)]
pub enum AutosaveAction {
    /// Session ended or parked; do nothing
    Stopped,
    /// Nothing to save; wait another interval
    Reschedule(Duration),
    /// Persist this snapshot
    Save(FormSnapshot),
}

/// Autosave state of one mounted form
#[derive(Debug, Clone)]
pub struct AutosaveSession {
    default_interval: Duration,
    interval: Duration,
    active: bool,
    armed: bool,
    parked: bool,
    snapshot: Option<FormSnapshot>,
    last_saved_at: Option<DateTime<Utc>>,
}

impl AutosaveSession {
    /// Inactive session saving every `default_interval`
    #[must_use]
    pub fn new(default_interval: Duration) -> Self {
        Self {
            default_interval,
            interval: default_interval,
            active: false,
            armed: false,
            parked: false,
            snapshot: None,
            last_saved_at: None,
        }
    }

    /// Form mounted
    pub fn start(&mut self) {
        self.active = true;
        self.parked = false;
    }

    /// Form unmounted; no further rescheduling
    pub fn stop(&mut self) {
        self.active = false;
        self.armed = false;
    }

    /// Mounted and not stopped
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Waiting for the user to resolve a conflict
    #[inline]
    #[must_use]
    pub fn is_parked(&self) -> bool {
        self.parked
    }

    /// A timer or a save is pending
    #[inline]
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Current delay, doubled by each failed save
    #[inline]
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Time of the last successful autosave
    #[inline]
    #[must_use]
    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.last_saved_at
    }

    /// Record the latest form state without arming
    pub fn update(&mut self, snapshot: FormSnapshot) {
        self.snapshot = Some(snapshot);
    }

    /// Record the latest form state and arm the timer if none is pending
    ///
    /// Returns the delay of a newly armed timer; `None` when a timer is
    /// already pending or the session cannot autosave.
    pub fn schedule(&mut self, snapshot: FormSnapshot) -> Option<Duration> {
        self.update(snapshot);
        self.rearm()
    }

    /// Arm a timer for the current interval if none is pending
    pub fn rearm(&mut self) -> Option<Duration> {
        if !self.active || self.parked || self.armed {
            return None;
        }
        self.armed = true;
        Some(self.interval)
    }

    /// The armed timer elapsed
    pub fn fire(&mut self) -> AutosaveAction {
        self.armed = false;
        if !self.active || self.parked {
            return AutosaveAction::Stopped;
        }
        // either the save or the next timer is now pending
        self.armed = true;
        match &self.snapshot {
            Some(snapshot) if snapshot.dirty => AutosaveAction::Save(snapshot.clone()),
            _ => AutosaveAction::Reschedule(self.interval),
        }
    }

    /// A save went through
    pub fn on_success(&mut self, at: DateTime<Utc>) {
        self.armed = false;
        self.interval = self.default_interval;
        self.last_saved_at = Some(at);
    }

    /// A save failed; returns the doubled interval until the retry
    pub fn on_failure(&mut self) -> Duration {
        self.armed = false;
        self.interval = self.interval.saturating_add(self.interval);
        self.interval
    }

    /// A save hit a stale-write conflict
    pub fn on_conflict(&mut self) {
        self.parked = true;
        self.armed = false;
    }

    /// The user resolved the conflict
    pub fn resolve(&mut self) {
        self.parked = false;
    }
}
