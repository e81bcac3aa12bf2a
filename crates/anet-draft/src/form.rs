//! Report form state
//!
//! Holds the live values being edited next to the baseline last persisted,
//! plus touched fields and the current validation messages.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};

use anet_model::attendees;
use anet_model::{
    AttendeeWarning, FieldChange, Report, ReportField, ReportPerson, ReportPersonInput,
    ValidationError,
};

use crate::store::SavedReport;

/// What the autosave loop knows of the form at one render
#[derive(Debug, Clone, PartialEq)]
pub struct FormSnapshot {
    pub values: Report,
    /// Fields the user has edited
    pub touched: BTreeSet<ReportField>,
    /// Values differ from the last saved baseline
    pub dirty: bool,
}

/// Editable report form
#[derive(Debug, Clone)]
pub struct ReportForm {
    values: Report,
    baseline: Report,
    touched: BTreeSet<ReportField>,
    errors: BTreeMap<ReportField, ValidationError>,
}

impl ReportForm {
    /// Form hydrated from a fetched report or a blank template
    #[must_use]
    pub fn new(mut report: Report) -> Self {
        report.cancelled = report.cancelled || report.cancelled_reason.is_some();
        Self {
            baseline: report.clone(),
            values: report,
            touched: BTreeSet::new(),
            errors: BTreeMap::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn values(&self) -> &Report {
        &self.values
    }

    #[inline]
    #[must_use]
    pub fn baseline(&self) -> &Report {
        &self.baseline
    }

    #[inline]
    #[must_use]
    pub fn touched(&self) -> &BTreeSet<ReportField> {
        &self.touched
    }

    /// Unsaved changes since the last save
    #[inline]
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.values != self.baseline
    }

    #[must_use]
    pub fn snapshot(&self) -> FormSnapshot {
        FormSnapshot {
            values: self.values.clone(),
            touched: self.touched.clone(),
            dirty: self.is_dirty(),
        }
    }

    /// Apply a typed edit and mark its field touched
    pub fn apply(&mut self, change: FieldChange) -> ReportField {
        let field = change.field();
        self.values.apply(change);
        self.touched.insert(field);
        field
    }

    /// Replace the attendee list with a normalized version of `raw`
    pub fn update_attendees(&mut self, raw: Vec<ReportPersonInput>) {
        self.values.report_people = attendees::normalize_report_people(raw);
        self.touched.insert(ReportField::ReportPeople);
    }

    fn edit_people(
        &mut self,
        edit: impl FnOnce(&[ReportPerson]) -> Result<Vec<ReportPerson>, AttendeeWarning>,
    ) -> Result<(), AttendeeWarning> {
        self.values.report_people = edit(&self.values.report_people)?;
        self.touched.insert(ReportField::ReportPeople);
        Ok(())
    }

    /// # Errors
    /// The guard warning; the attendee list is left unchanged.
    pub fn toggle_author(&mut self, acting_user: &str, uuid: &str) -> Result<(), AttendeeWarning> {
        self.edit_people(|people| attendees::toggle_author(people, acting_user, uuid))
    }

    /// # Errors
    /// The guard warning; the attendee list is left unchanged.
    pub fn toggle_attendee(&mut self, uuid: &str) -> Result<(), AttendeeWarning> {
        self.edit_people(|people| attendees::toggle_attendee(people, uuid))
    }

    /// # Errors
    /// `UnknownPerson` only.
    pub fn toggle_interlocutor(&mut self, uuid: &str) -> Result<(), AttendeeWarning> {
        self.edit_people(|people| attendees::toggle_interlocutor(people, uuid))
    }

    /// # Errors
    /// `NotAttending` for a non-attendee.
    pub fn set_primary(&mut self, uuid: &str) -> Result<(), AttendeeWarning> {
        self.edit_people(|people| attendees::set_primary(people, uuid))
    }

    /// # Errors
    /// The guard warning; the attendee list is left unchanged.
    pub fn remove_person(&mut self, acting_user: &str, uuid: &str) -> Result<(), AttendeeWarning> {
        self.edit_people(|people| attendees::remove_person(people, acting_user, uuid))
    }

    /// Re-validate one field, returning its current message
    pub fn validate_field(&mut self, field: ReportField, now: DateTime<Utc>) -> Option<&ValidationError> {
        match anet_model::validate_field(&self.values, field, now) {
            Some(err) => {
                self.errors.insert(field, err);
            }
            None => {
                self.errors.remove(&field);
            }
        }
        self.errors.get(&field)
    }

    /// Re-validate every field
    pub fn validate_all(&mut self, now: DateTime<Utc>) -> Vec<ValidationError> {
        let errors = anet_model::validate_report(&self.values, now);
        self.errors = errors.iter().map(|e| (e.field, e.clone())).collect();
        errors
    }

    /// Messages of touched fields, the ones shown inline
    #[must_use]
    pub fn visible_errors(&self) -> Vec<&ValidationError> {
        self.errors
            .iter()
            .filter(|(field, _)| self.touched.contains(*field))
            .map(|(_, err)| err)
            .collect()
    }

    #[must_use]
    pub fn error(&self, field: ReportField) -> Option<&ValidationError> {
        self.errors.get(&field)
    }

    /// Splice server-assigned fields into the form after a save of `saved_from`
    ///
    /// The baseline becomes what was sent; edits made while the request was
    /// in flight stay in the live values and keep the form dirty.
    pub fn reconcile_saved(&mut self, saved_from: &FormSnapshot, saved: &SavedReport) {
        self.baseline = saved_from.values.clone();
        saved.splice_into(&mut self.baseline);
        saved.splice_into(&mut self.values);
    }

    /// Accept the current values as persisted after a final submit
    ///
    /// Touched entries are kept so visible messages stay visible.
    pub fn reset_after_submit(&mut self) {
        self.baseline = self.values.clone();
        self.errors.clear();
    }

    /// Throw away local edits in favour of `report`
    pub fn replace(&mut self, report: Report) {
        *self = Self::new(report);
    }
}
