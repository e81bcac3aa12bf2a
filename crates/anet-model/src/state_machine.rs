use crate::error::TransitionError;
use crate::types::ReportState;

/// Workflow action applied to a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportAction {
    /// Submit a draft, or resubmit after changes were requested
    Submit,
    /// Approve one step of the chain; `final_step` completes the chain
    Approve { final_step: bool },
    /// Request changes
    Reject,
    /// Publish an approved report
    Publish,
    /// Admin-only: send a published report back to draft
    Unpublish,
    /// Mark the engagement as cancelled
    Cancel,
}

impl ReportState {
    /// Apply a workflow action, returning the next state
    ///
    /// # Errors
    /// `TransitionError` when the action is not allowed from this state
    pub fn apply(self, action: ReportAction) -> Result<ReportState, TransitionError> {
        use ReportAction::*;
        use ReportState::*;

        let next = match (self, action) {
            (Draft | Rejected, Submit) => PendingApproval,
            (PendingApproval, Approve { final_step: true }) => Approved,
            (PendingApproval, Approve { final_step: false }) => PendingApproval,
            (PendingApproval, Reject) => Rejected,
            (Approved, Publish) => Published,
            (Published, Unpublish) => Draft,
            (Draft | PendingApproval | Approved | Published, Cancel) => Cancelled,
            (from, action) => return Err(TransitionError { from, action }),
        };
        Ok(next)
    }

    /// Actions that may be applied from this state
    #[must_use]
    pub fn allowed_actions(self) -> Vec<ReportAction> {
        use ReportAction::*;

        [
            Submit,
            Approve { final_step: false },
            Approve { final_step: true },
            Reject,
            Publish,
            Unpublish,
            Cancel,
        ]
        .into_iter()
        .filter(|a| self.apply(*a).is_ok())
        .collect()
    }

    /// Whether authors may still edit the report
    #[must_use]
    pub fn is_editable(self) -> bool {
        matches!(
            self,
            ReportState::Draft | ReportState::Rejected | ReportState::PendingApproval
        )
    }

    /// Whether the approval workflow panel is relevant
    #[must_use]
    pub fn shows_workflow(self) -> bool {
        self != ReportState::Draft
    }

    /// End of the normal flow
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, ReportState::Published | ReportState::Cancelled)
    }
}
