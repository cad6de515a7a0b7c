//! Debugger backend boundary.
//!
//! The engine never talks to a concrete debugger; it walks threads, frames and values through
//! the traits below. A backend hands out cheap handles, every handle is only meaningful while
//! the debugee stays in the stop in which it was obtained.

pub mod scripted;

use crate::debugger::error::Error;
use serde::Deserialize;
use std::fmt::{Display, Formatter};

/// Identity of a live value, supplied by backend.
/// Valid only within one stopped snapshot of the debugee, must be re-resolved after resume.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct StableId(pub u64);

impl Display for StableId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{:#x}", self.0))
    }
}

/// Debugee process state.
#[derive(Clone, Copy, PartialEq, Eq, Debug, strum_macros::Display)]
pub enum ProcessState {
    #[strum(serialize = "stopped")]
    Stopped,
    #[strum(serialize = "running")]
    Running,
    #[strum(serialize = "exited")]
    Exited,
}

/// Process state transition, delivered through [`DebugInspector::poll_next`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ProcessEvent {
    pub state: ProcessState,
}

impl ProcessEvent {
    pub fn new(state: ProcessState) -> Self {
        Self { state }
    }
}

/// Basic (builtin) type of scalar value.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BasicType {
    Bool,
    UnsignedChar,
    Int,
    Other,
}

/// Type class of a value as backend sees it. Typedef chains are not resolved here.
#[derive(Clone, PartialEq, Eq, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeClass {
    Structure,
    Class,
    Union,
    Array,
    Enumeration,
    Basic(BasicType),
    Typedef(Box<TypeClass>),
    Other,
}

/// Which variables of a frame should be listed.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize)]
#[serde(default)]
pub struct VariableFilter {
    pub arguments: bool,
    pub locals: bool,
    pub statics: bool,
    pub in_scope_only: bool,
}

impl Default for VariableFilter {
    fn default() -> Self {
        Self {
            arguments: true,
            locals: true,
            statics: true,
            in_scope_only: true,
        }
    }
}

/// Expression rejected by debugee evaluator.
#[derive(Clone, PartialEq, Debug)]
pub struct EvaluationError {
    pub message: String,
}

impl EvaluationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Single debugee process with one thread of interest.
pub trait DebugInspector {
    type Thread: InspectedThread<Frame = Self::Frame>;
    type Frame: InspectedFrame<Value = Self::Value>;
    type Value: InspectedValue;

    /// Return currently selected thread, `None` if there is no thread to inspect.
    fn selected_thread(&self) -> Option<Self::Thread>;

    /// Ask debugee to stop. Stop is asynchronous, completion arrives as a `Stopped` event.
    fn stop(&mut self) -> Result<(), Error>;

    /// Resume debugee execution.
    fn continue_execution(&mut self) -> Result<(), Error>;

    fn state(&self) -> ProcessState;

    /// Take next event from the event queue, never blocks.
    fn poll_next(&mut self) -> Option<ProcessEvent>;
}

pub trait InspectedThread {
    type Frame: InspectedFrame;

    /// Stack frames, innermost first.
    fn frames(&self) -> Vec<Self::Frame>;
}

pub trait InspectedFrame {
    type Value: InspectedValue;

    fn function_name(&self) -> String;

    fn variables(&self, filter: VariableFilter) -> Vec<Self::Value>;

    /// Evaluate an expression in the context of this frame, return textual result.
    fn evaluate(&self, expression: &str) -> Result<String, EvaluationError>;
}

pub trait InspectedValue: Sized {
    /// Declared name or subscript label like `[3]`.
    fn name(&self) -> String;

    fn type_class(&self) -> TypeClass;

    /// Canonical type name.
    fn type_name(&self) -> String;

    fn stable_id(&self) -> StableId;

    /// Current value text, `None` if value is not readable at this moment (optimized out, etc.).
    fn current_text(&self) -> Option<String>;

    /// Members or elements of an aggregate value.
    fn children(&self) -> Vec<Self>;

    /// Enumerator names of an enumeration type, empty for other types.
    fn enum_members(&self) -> Vec<String>;
}
