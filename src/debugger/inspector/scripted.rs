//! In-memory inspector backend driven by a TOML script.
//!
//! A script is a sequence of stack stages. Every resume moves debugee to the next stage (the
//! last stage repeats forever), so a test or a demo can model a program whose stack changes
//! between stops. Example:
//!
//! ```toml
//! exit_after = 10
//!
//! [[stage]]
//! [[stage.frame]]
//! function = "main"
//! [[stage.frame.var]]
//! name = "counter"
//! type_class = { basic = "int" }
//! type_name = "int"
//! value = "41"
//! ```

use crate::debugger::error::Error;
use crate::debugger::inspector::{
    DebugInspector, EvaluationError, InspectedFrame, InspectedThread, InspectedValue,
    ProcessEvent, ProcessState, StableId, TypeClass, VariableFilter,
};
use crate::debugger::variable::ValueKind;
use serde::Deserialize;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::rc::Rc;

/// Where a variable is declared.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarScope {
    Argument,
    #[default]
    Local,
    Static,
}

#[derive(Deserialize)]
struct ScriptDef {
    #[serde(default)]
    exit_after: Option<usize>,
    #[serde(rename = "stage")]
    stages: Vec<StageDef>,
}

#[derive(Deserialize)]
struct StageDef {
    #[serde(default)]
    no_thread: bool,
    #[serde(default, rename = "frame")]
    frames: Vec<FrameDef>,
    #[serde(default, rename = "global")]
    globals: Vec<VariableDef>,
}

#[derive(Deserialize)]
struct FrameDef {
    function: String,
    #[serde(default, rename = "var")]
    variables: Vec<VariableDef>,
}

fn in_scope_default() -> bool {
    true
}

#[derive(Deserialize)]
struct VariableDef {
    name: String,
    #[serde(default)]
    scope: VarScope,
    #[serde(default = "in_scope_default")]
    in_scope: bool,
    type_class: TypeClass,
    #[serde(default)]
    type_name: String,
    #[serde(default)]
    value: Option<String>,
    #[serde(default, rename = "member")]
    members: Vec<VariableDef>,
    #[serde(default)]
    enum_members: Vec<String>,
}

struct VariableData {
    id: StableId,
    name: String,
    scope: VarScope,
    in_scope: bool,
    type_class: TypeClass,
    type_name: String,
    value: Option<String>,
    members: Vec<VariableData>,
    enum_members: Vec<String>,
}

impl VariableData {
    fn from_def(def: VariableDef, last_id: &mut u64) -> Self {
        *last_id += 1;
        let id = StableId(*last_id);
        Self {
            id,
            name: def.name,
            scope: def.scope,
            in_scope: def.in_scope,
            type_class: def.type_class,
            type_name: def.type_name,
            value: def.value,
            members: def
                .members
                .into_iter()
                .map(|m| VariableData::from_def(m, last_id))
                .collect(),
            enum_members: def.enum_members,
        }
    }

    fn by_path(&self, path: &[usize]) -> Option<&VariableData> {
        path.iter()
            .try_fold(self, |var, &idx| var.members.get(idx))
    }

    fn visible(&self, filter: VariableFilter) -> bool {
        let scope_match = match self.scope {
            VarScope::Argument => filter.arguments,
            VarScope::Local => filter.locals,
            VarScope::Static => filter.statics,
        };
        scope_match && (self.in_scope || !filter.in_scope_only)
    }

    fn assign(&mut self, text: &str) -> Result<String, EvaluationError> {
        let new_value = match ValueKind::classify(&self.type_class) {
            ValueKind::Aggregate => {
                return Err(EvaluationError::new(format!(
                    "cannot assign to aggregate `{}`",
                    self.name
                )))
            }
            ValueKind::Enumeration => {
                let member = match text.rsplit_once("::") {
                    Some((ty, member)) if ty == self.type_name => member,
                    Some((ty, _)) => {
                        return Err(EvaluationError::new(format!(
                            "no enum `{ty}` in scope of `{}`",
                            self.name
                        )))
                    }
                    None => text,
                };
                if !self.enum_members.is_empty() && !self.enum_members.iter().any(|m| m == member)
                {
                    return Err(EvaluationError::new(format!(
                        "no member named `{member}` in `{}`",
                        self.type_name
                    )));
                }
                member.to_string()
            }
            ValueKind::Boolean => match text {
                "true" | "false" => text.to_string(),
                _ => return Err(EvaluationError::new(format!("`{text}` is not a bool"))),
            },
            ValueKind::UnsignedByte => text
                .parse::<u8>()
                .map_err(|e| EvaluationError::new(format!("`{text}`: {e}")))?
                .to_string(),
            ValueKind::SignedInt => text
                .parse::<i32>()
                .map_err(|e| EvaluationError::new(format!("`{text}`: {e}")))?
                .to_string(),
            ValueKind::Opaque => text.to_string(),
        };

        self.value = Some(new_value.clone());
        Ok(new_value)
    }
}

struct FrameData {
    function: String,
    variables: Vec<VariableData>,
}

struct StageData {
    no_thread: bool,
    frames: Vec<FrameData>,
    globals: Vec<VariableData>,
}

impl StageData {
    fn variable(&self, root: Root, path: &[usize]) -> Option<&VariableData> {
        let var = match root {
            Root::Local { frame, var } => self.frames.get(frame)?.variables.get(var)?,
            Root::Global(var) => self.globals.get(var)?,
        };
        var.by_path(path)
    }

    fn lookup_mut(
        &mut self,
        frame: usize,
        root: &str,
        members: &[String],
    ) -> Option<&mut VariableData> {
        let frame = self.frames.get_mut(frame)?;
        let var = match frame
            .variables
            .iter_mut()
            .find(|v| v.in_scope && v.name == root)
        {
            Some(var) => var,
            None => self.globals.iter_mut().find(|v| v.name == root)?,
        };

        members.iter().try_fold(var, |var, name| {
            var.members.iter_mut().find(|m| &m.name == name)
        })
    }
}

struct State {
    stages: Vec<StageData>,
    cursor: usize,
    process: ProcessState,
    events: VecDeque<ProcessEvent>,
    resumes: usize,
    exit_after: Option<usize>,
    evaluations: Vec<String>,
}

impl State {
    fn emit(&mut self, state: ProcessState) {
        self.process = state;
        self.events.push_back(ProcessEvent::new(state));
    }
}

/// Scripted debugee. Cloned handles share the same process.
#[derive(Clone)]
pub struct ScriptedInspector {
    state: Rc<RefCell<State>>,
}

impl ScriptedInspector {
    /// Create an inspector from script source. Debugee starts in stopped state
    /// (as just attached process).
    pub fn from_toml(source: &str) -> Result<Self, Error> {
        let script: ScriptDef = toml::from_str(source)?;
        if script.stages.is_empty() {
            return Err(Error::Script("script must contain at least one stage".to_string()));
        }

        let mut last_id = 0;
        let stages = script
            .stages
            .into_iter()
            .map(|stage| StageData {
                no_thread: stage.no_thread,
                frames: stage
                    .frames
                    .into_iter()
                    .map(|frame| FrameData {
                        function: frame.function,
                        variables: frame
                            .variables
                            .into_iter()
                            .map(|v| VariableData::from_def(v, &mut last_id))
                            .collect(),
                    })
                    .collect(),
                globals: stage
                    .globals
                    .into_iter()
                    .map(|v| VariableData::from_def(v, &mut last_id))
                    .collect(),
            })
            .collect();

        Ok(Self {
            state: Rc::new(RefCell::new(State {
                stages,
                cursor: 0,
                process: ProcessState::Stopped,
                events: VecDeque::new(),
                resumes: 0,
                exit_after: script.exit_after,
                evaluations: vec![],
            })),
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let source = fs::read_to_string(path)?;
        Self::from_toml(&source)
    }

    /// Kill debugee.
    pub fn terminate(&self) {
        let mut state = self.state.borrow_mut();
        if state.process != ProcessState::Exited {
            state.emit(ProcessState::Exited);
        }
    }

    /// All expressions evaluated so far, in evaluation order.
    pub fn evaluations(&self) -> Vec<String> {
        self.state.borrow().evaluations.clone()
    }

    /// Index of the current stack stage.
    pub fn stage(&self) -> usize {
        self.state.borrow().cursor
    }

    /// Number of resumes since attach.
    pub fn resumes(&self) -> usize {
        self.state.borrow().resumes
    }
}

impl DebugInspector for ScriptedInspector {
    type Thread = ScriptedThread;
    type Frame = ScriptedFrame;
    type Value = ScriptedValue;

    fn selected_thread(&self) -> Option<Self::Thread> {
        let state = self.state.borrow();
        if state.process == ProcessState::Exited {
            return None;
        }
        let stage = state.stages.get(state.cursor)?;
        if stage.no_thread {
            return None;
        }
        Some(ScriptedThread {
            state: self.state.clone(),
            stage: state.cursor,
        })
    }

    fn stop(&mut self) -> Result<(), Error> {
        let mut state = self.state.borrow_mut();
        match state.process {
            ProcessState::Running => state.emit(ProcessState::Stopped),
            ProcessState::Stopped => {}
            ProcessState::Exited => return Err(Error::ProcessControl("stop an exited process")),
        }
        Ok(())
    }

    fn continue_execution(&mut self) -> Result<(), Error> {
        let mut state = self.state.borrow_mut();
        match state.process {
            ProcessState::Stopped => {
                state.resumes += 1;
                if state.exit_after.is_some_and(|n| state.resumes >= n) {
                    state.emit(ProcessState::Exited);
                    return Ok(());
                }
                let next = (state.cursor + 1).min(state.stages.len() - 1);
                state.cursor = next;
                state.emit(ProcessState::Running);
            }
            ProcessState::Running => {}
            ProcessState::Exited => {
                return Err(Error::ProcessControl("continue an exited process"))
            }
        }
        Ok(())
    }

    fn state(&self) -> ProcessState {
        self.state.borrow().process
    }

    fn poll_next(&mut self) -> Option<ProcessEvent> {
        self.state.borrow_mut().events.pop_front()
    }
}

pub struct ScriptedThread {
    state: Rc<RefCell<State>>,
    stage: usize,
}

impl InspectedThread for ScriptedThread {
    type Frame = ScriptedFrame;

    fn frames(&self) -> Vec<Self::Frame> {
        let frame_cnt = self
            .state
            .borrow()
            .stages
            .get(self.stage)
            .map(|s| s.frames.len())
            .unwrap_or_default();

        (0..frame_cnt)
            .map(|frame| ScriptedFrame {
                state: self.state.clone(),
                stage: self.stage,
                frame,
            })
            .collect()
    }
}

pub struct ScriptedFrame {
    state: Rc<RefCell<State>>,
    stage: usize,
    frame: usize,
}

impl ScriptedFrame {
    fn value(&self, root: Root) -> ScriptedValue {
        ScriptedValue {
            state: self.state.clone(),
            stage: self.stage,
            root,
            path: vec![],
        }
    }
}

impl InspectedFrame for ScriptedFrame {
    type Value = ScriptedValue;

    fn function_name(&self) -> String {
        self.state
            .borrow()
            .stages
            .get(self.stage)
            .and_then(|s| s.frames.get(self.frame))
            .map(|f| f.function.clone())
            .unwrap_or_default()
    }

    fn variables(&self, filter: VariableFilter) -> Vec<Self::Value> {
        let state = self.state.borrow();
        let Some(stage) = state.stages.get(self.stage) else {
            return vec![];
        };
        let Some(frame) = stage.frames.get(self.frame) else {
            return vec![];
        };

        let mut variables: Vec<_> = frame
            .variables
            .iter()
            .enumerate()
            .filter(|(_, var)| var.visible(filter))
            .map(|(var, _)| {
                self.value(Root::Local {
                    frame: self.frame,
                    var,
                })
            })
            .collect();

        if filter.statics {
            variables.extend(
                stage
                    .globals
                    .iter()
                    .enumerate()
                    .filter(|(_, var)| var.in_scope || !filter.in_scope_only)
                    .map(|(var, _)| self.value(Root::Global(var))),
            );
        }

        variables
    }

    fn evaluate(&self, expression: &str) -> Result<String, EvaluationError> {
        let state = &mut *self.state.borrow_mut();
        state.evaluations.push(expression.to_string());
        log::debug!(target: "hook", "scripted evaluation: {expression}");

        if state.process != ProcessState::Stopped {
            return Err(EvaluationError::new("process is not stopped"));
        }
        if state.cursor != self.stage {
            return Err(EvaluationError::new("frame is no longer valid"));
        }

        let (target, new_value) = match expression.split_once('=') {
            Some((lhs, rhs)) => (lhs.trim(), Some(rhs.trim())),
            None => (expression.trim(), None),
        };
        let (root, members) = parse_path(target)
            .ok_or_else(|| EvaluationError::new(format!("invalid expression `{target}`")))?;

        let var = state
            .stages
            .get_mut(self.stage)
            .and_then(|stage| stage.lookup_mut(self.frame, &root, &members))
            .ok_or_else(|| {
                EvaluationError::new(format!("use of undeclared identifier `{target}`"))
            })?;

        match new_value {
            Some(text) => var.assign(text),
            None => var
                .value
                .clone()
                .ok_or_else(|| EvaluationError::new(format!("`{target}` has no value"))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Root {
    Local { frame: usize, var: usize },
    Global(usize),
}

pub struct ScriptedValue {
    state: Rc<RefCell<State>>,
    stage: usize,
    root: Root,
    path: Vec<usize>,
}

impl ScriptedValue {
    fn with<T>(&self, f: impl FnOnce(&VariableData) -> T) -> Option<T> {
        let state = self.state.borrow();
        state
            .stages
            .get(self.stage)
            .and_then(|stage| stage.variable(self.root, &self.path))
            .map(f)
    }
}

impl InspectedValue for ScriptedValue {
    fn name(&self) -> String {
        self.with(|v| v.name.clone()).unwrap_or_default()
    }

    fn type_class(&self) -> TypeClass {
        self.with(|v| v.type_class.clone())
            .unwrap_or(TypeClass::Other)
    }

    fn type_name(&self) -> String {
        self.with(|v| v.type_name.clone()).unwrap_or_default()
    }

    fn stable_id(&self) -> StableId {
        self.with(|v| v.id).unwrap_or(StableId(0))
    }

    fn current_text(&self) -> Option<String> {
        self.with(|v| v.value.clone()).flatten()
    }

    fn children(&self) -> Vec<Self> {
        let member_cnt = self.with(|v| v.members.len()).unwrap_or_default();
        (0..member_cnt)
            .map(|idx| {
                let mut path = self.path.clone();
                path.push(idx);
                ScriptedValue {
                    state: self.state.clone(),
                    stage: self.stage,
                    root: self.root,
                    path,
                }
            })
            .collect()
    }

    fn enum_members(&self) -> Vec<String> {
        self.with(|v| {
            v.enum_members
                .iter()
                .filter(|m| !m.is_empty())
                .cloned()
                .collect()
        })
        .unwrap_or_default()
    }
}

/// Split an expression like `::a.b[2].c` into a root name (`::a`)
/// and member names (`b`, `[2]`, `c`).
fn parse_path(expr: &str) -> Option<(String, Vec<String>)> {
    let (scope, rest) = match expr.strip_prefix("::") {
        Some(rest) => ("::", rest),
        None => ("", expr),
    };

    let root_end = rest.find(['.', '[']).unwrap_or(rest.len());
    let root = &rest[..root_end];
    if root.is_empty() {
        return None;
    }

    let mut members = vec![];
    let mut tail = &rest[root_end..];
    while !tail.is_empty() {
        if let Some(after_dot) = tail.strip_prefix('.') {
            let end = after_dot.find(['.', '[']).unwrap_or(after_dot.len());
            if end == 0 {
                return None;
            }
            members.push(after_dot[..end].to_string());
            tail = &after_dot[end..];
        } else if tail.starts_with('[') {
            let end = tail.find(']')? + 1;
            members.push(tail[..end].to_string());
            tail = &tail[end..];
        } else {
            return None;
        }
    }

    Some((format!("{scope}{root}"), members))
}
