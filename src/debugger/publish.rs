//! Edit publication protocol.
//!
//! An edit committed by the operator is captured here (`Idle -> PendingWrite`) and the debugee
//! is asked to stop. On the next stop the pending write is applied exactly once
//! (`PendingWrite -> Idle`), strictly before the variable tree is rebuilt and debugee resumed.

use crate::debugger::error::Error;
use crate::debugger::inspector::{
    DebugInspector, InspectedFrame, InspectedThread, InspectedValue, StableId, VariableFilter,
};
use crate::debugger::variable::{edit, expression, Forest, NodeId};
use log::{info, warn};
use std::mem;

/// Edit waiting for the next debugee stop.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingEdit {
    /// Identity of the root variable, used to find a frame for evaluation.
    pub root_id: StableId,
    /// Qualified name of the edited node.
    pub target: String,
    /// Qualified value to write.
    pub value: String,
}

impl PendingEdit {
    pub fn expression(&self) -> String {
        format!("{} = {}", self.target, self.value)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum PublishState {
    #[default]
    Idle,
    PendingWrite(PendingEdit),
}

/// Result of a write attempt.
#[derive(Debug)]
pub enum WriteOutcome {
    /// Debugee evaluator accepted assignment.
    Applied { expression: String, result: String },
    /// Root variable not found at this stop, write dropped.
    Skipped(Error),
    /// Debugee evaluator rejected assignment, write dropped.
    Failed(Error),
}

impl WriteOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, WriteOutcome::Applied { .. })
    }

    fn report(&self) {
        match self {
            WriteOutcome::Applied { expression, result } => {
                info!(target: "hook", "`{expression}` applied, new value: {result}")
            }
            WriteOutcome::Skipped(e) | WriteOutcome::Failed(e) => warn!(target: "hook", "{e:#}"),
        }
    }
}

#[derive(Debug, Default)]
pub struct EditPublisher {
    state: PublishState,
}

impl EditPublisher {
    pub fn state(&self) -> &PublishState {
        &self.state
    }

    pub fn pending(&self) -> Option<&PendingEdit> {
        match &self.state {
            PublishState::Idle => None,
            PublishState::PendingWrite(edit) => Some(edit),
        }
    }

    /// Capture operator edit of a node. A previously captured but not yet applied edit
    /// is replaced (last write wins).
    ///
    /// # Arguments
    ///
    /// * `forest`: currently published forest
    /// * `node`: edited node
    /// * `text`: new value text
    pub fn capture(&mut self, forest: &Forest, node: NodeId, text: &str) -> Result<(), Error> {
        let target = forest.get(node)?;
        let text = edit::validate(target, text)?;

        let edit = PendingEdit {
            root_id: forest.root_of(node)?.stable_id,
            target: expression::qualified_name(forest, node)?,
            value: expression::write_value(target, &text),
        };

        if let PublishState::PendingWrite(replaced) = &self.state {
            info!(
                target: "hook",
                "pending edit `{}` replaced by `{}`",
                replaced.expression(),
                edit.expression()
            );
        }

        self.state = PublishState::PendingWrite(edit);
        Ok(())
    }

    /// Drop pending edit without applying.
    pub fn discard(&mut self) -> Option<PendingEdit> {
        match mem::take(&mut self.state) {
            PublishState::Idle => None,
            PublishState::PendingWrite(edit) => Some(edit),
        }
    }

    /// Apply pending edit, debugee must be stopped. Return `None` if there is nothing to apply.
    /// Publisher is idle after the call whatever the outcome is.
    pub fn apply<I: DebugInspector>(
        &mut self,
        inspector: &I,
        filter: VariableFilter,
    ) -> Option<WriteOutcome> {
        let edit = self.discard()?;
        let outcome = write(inspector, filter, &edit);
        outcome.report();
        Some(outcome)
    }
}

/// Locate a frame owning the root variable and evaluate assignment in it.
fn write<I: DebugInspector>(
    inspector: &I,
    filter: VariableFilter,
    edit: &PendingEdit,
) -> WriteOutcome {
    let expression = edit.expression();

    let frame = inspector.selected_thread().and_then(|thread| {
        thread.frames().into_iter().find(|frame| {
            frame
                .variables(filter)
                .iter()
                .any(|var| var.stable_id() == edit.root_id)
        })
    });

    let Some(frame) = frame else {
        return WriteOutcome::Skipped(Error::WriteTargetNotFound {
            root: edit.root_id,
            expression,
        });
    };

    match frame.evaluate(&expression) {
        Ok(result) => WriteOutcome::Applied { expression, result },
        Err(e) => WriteOutcome::Failed(Error::EvaluationFailed {
            expression,
            reason: e.message,
        }),
    }
}
