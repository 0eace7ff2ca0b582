//! Proposal/confirmation gate.
//!
//! Nothing proposed by the model is executed until an explicit confirm signal
//! arrives. The gate itself is a plain state machine; across the HTTP boundary
//! its state is reconstructed each turn from the proposal the client echoes
//! back, so the server stays stateless between turns.

use crate::action::ActionProposal;

/// Sentinel message the client sends to confirm the pending proposal.
pub const CONFIRM_PROPOSAL: &str = "USER_CONFIRMED_PROPOSAL";
/// Sentinel message the client sends to discard the pending proposal.
pub const CANCEL_PROPOSAL: &str = "USER_CANCELLED_PROPOSAL";

#[derive(Debug, Clone, PartialEq)]
pub enum GateState {
    Idle,
    AwaitingConfirmation(ActionProposal),
}

#[derive(Debug, Clone, PartialEq)]
pub enum GateSignal {
    Message(String),
    Confirm,
    Cancel,
}

impl GateSignal {
    pub fn from_message(message: &str) -> GateSignal {
        match message.trim() {
            CONFIRM_PROPOSAL => GateSignal::Confirm,
            CANCEL_PROPOSAL => GateSignal::Cancel,
            other => GateSignal::Message(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    /// Free text while idle: run the full pipeline.
    RunPipeline(String),
    /// Confirm on a pending proposal: execute it, exactly once.
    Execute(ActionProposal),
    /// Cancel: the proposal (if any) is discarded unexecuted.
    Cancelled,
    /// Confirm arrived with nothing pending.
    NothingPending,
    /// Free text while a proposal is pending is rejected, never queued over
    /// or silently replacing the held proposal.
    RejectedPending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProposalGate {
    state: GateState,
}

impl Default for ProposalGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ProposalGate {
    pub fn new() -> Self {
        Self {
            state: GateState::Idle,
        }
    }

    pub fn with_pending(proposal: ActionProposal) -> Self {
        Self {
            state: GateState::AwaitingConfirmation(proposal),
        }
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    /// Transition into `AwaitingConfirmation` after the pipeline produced a
    /// proposal.
    pub fn hold(&mut self, proposal: ActionProposal) {
        self.state = GateState::AwaitingConfirmation(proposal);
    }

    pub fn handle(&mut self, signal: GateSignal) -> GateOutcome {
        let state = std::mem::replace(&mut self.state, GateState::Idle);
        match (state, signal) {
            (GateState::Idle, GateSignal::Message(message)) => GateOutcome::RunPipeline(message),
            (GateState::Idle, GateSignal::Confirm) => GateOutcome::NothingPending,
            (GateState::Idle, GateSignal::Cancel) => GateOutcome::Cancelled,
            (GateState::AwaitingConfirmation(proposal), GateSignal::Confirm) => {
                GateOutcome::Execute(proposal)
            }
            (GateState::AwaitingConfirmation(_), GateSignal::Cancel) => GateOutcome::Cancelled,
            (GateState::AwaitingConfirmation(proposal), GateSignal::Message(_)) => {
                // Keep holding; the caller must confirm or cancel first.
                self.state = GateState::AwaitingConfirmation(proposal);
                GateOutcome::RejectedPending
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionProposal, TaskOperation};

    fn proposal() -> ActionProposal {
        ActionProposal::TaskOperations {
            operations: vec![TaskOperation::Delete {
                task_identifier: "stale task".to_string(),
            }],
            response_text: "Delete it?".to_string(),
        }
    }

    #[test]
    fn confirm_executes_exactly_once() {
        let mut gate = ProposalGate::with_pending(proposal());
        let first = gate.handle(GateSignal::Confirm);
        assert!(matches!(first, GateOutcome::Execute(_)));

        // The proposal is gone; a second confirm has nothing to run.
        let second = gate.handle(GateSignal::Confirm);
        assert_eq!(second, GateOutcome::NothingPending);
    }

    #[test]
    fn cancel_never_executes() {
        let mut gate = ProposalGate::with_pending(proposal());
        let outcome = gate.handle(GateSignal::Cancel);
        assert_eq!(outcome, GateOutcome::Cancelled);
        assert_eq!(gate.state(), &GateState::Idle);

        let after = gate.handle(GateSignal::Confirm);
        assert_eq!(after, GateOutcome::NothingPending);
    }

    #[test]
    fn free_text_while_pending_is_rejected_and_proposal_kept() {
        let mut gate = ProposalGate::with_pending(proposal());
        let outcome = gate.handle(GateSignal::Message("do something else".to_string()));
        assert_eq!(outcome, GateOutcome::RejectedPending);
        assert!(matches!(gate.state(), GateState::AwaitingConfirmation(_)));

        // The held proposal still confirms afterwards.
        assert!(matches!(gate.handle(GateSignal::Confirm), GateOutcome::Execute(_)));
    }

    #[test]
    fn idle_message_runs_pipeline_and_hold_arms_the_gate() {
        let mut gate = ProposalGate::new();
        let outcome = gate.handle(GateSignal::from_message("create a task"));
        assert_eq!(outcome, GateOutcome::RunPipeline("create a task".to_string()));

        gate.hold(proposal());
        assert!(matches!(gate.state(), GateState::AwaitingConfirmation(_)));
    }

    #[test]
    fn sentinels_map_to_signals() {
        assert_eq!(GateSignal::from_message(CONFIRM_PROPOSAL), GateSignal::Confirm);
        assert_eq!(GateSignal::from_message(CANCEL_PROPOSAL), GateSignal::Cancel);
        assert_eq!(
            GateSignal::from_message("hello"),
            GateSignal::Message("hello".to_string())
        );
    }
}
