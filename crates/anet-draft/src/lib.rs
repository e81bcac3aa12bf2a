//! ANET draft reconciliation engine
//!
//! Keeps a report being edited in sync with the backend:
//! - periodic autosave with exponential back-off on failure
//! - debounced field validation
//! - attendee role rules applied on every attendee edit
//! - conflict-aware save and resubmit

#![allow(missing_docs)]

pub mod config;
pub mod debounce;
pub mod editor;
pub mod error;
pub mod form;
pub mod humanize;
pub mod notice;
pub mod session;
pub mod store;

pub use config::AutosaveConfig;
pub use debounce::Debouncer;
pub use editor::{report_path, ConflictResolution, ReportEditor};
pub use error::{EditorError, SaveError};
pub use form::{FormSnapshot, ReportForm};
pub use humanize::humanize;
pub use notice::Notice;
pub use session::{AutosaveAction, AutosaveSession};
pub use store::{GraphQlReportStore, ReportStore, SavedReport, UpdateOptions};
