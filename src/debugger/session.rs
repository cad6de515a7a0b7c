use crate::debugger::error::Error;
use crate::debugger::inspector::{DebugInspector, ProcessState, VariableFilter};
use crate::debugger::publish::{EditPublisher, PendingEdit, WriteOutcome};
use crate::debugger::variable::builder::ForestBuilder;
use crate::debugger::variable::{Forest, NodeId};
use crate::weak_error;
use log::{debug, info, warn};

#[derive(Clone, Copy, PartialEq, Eq, Debug, strum_macros::Display)]
pub enum SessionState {
    #[strum(serialize = "active")]
    Active,
    /// Debugee exited, no more polling, rebuilds or writes.
    #[strum(serialize = "terminated")]
    Terminated,
}

/// What happened during one [`Session::tick`].
#[derive(Debug, Default)]
pub struct Tick {
    /// Number of drained events.
    pub events: usize,
    pub rebuilds: usize,
    pub writes: Vec<WriteOutcome>,
    pub terminated: bool,
}

/// Inspection session over a single attached debugee.
///
/// Owns the inspector handle, the currently published forest and the edit publication state.
/// All work happens in [`Session::tick`], which presentation layer calls once per frame.
pub struct Session<I: DebugInspector> {
    inspector: I,
    builder: ForestBuilder,
    forest: Forest,
    publisher: EditPublisher,
    state: SessionState,
    snapshot: u64,
}

impl<I: DebugInspector> Session<I> {
    /// Start a session over a just attached (stopped) debugee: build initial forest and resume.
    pub fn attach(inspector: I, filter: VariableFilter) -> Self {
        let mut session = Self {
            inspector,
            builder: ForestBuilder::new(filter),
            forest: Forest::default(),
            publisher: EditPublisher::default(),
            state: SessionState::Active,
            snapshot: 0,
        };

        if session.inspector.state() == ProcessState::Exited {
            session.terminate();
            return session;
        }

        session.rebuild();
        session.resume();
        session
    }

    /// Latest published forest.
    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_terminated(&self) -> bool {
        self.state == SessionState::Terminated
    }

    pub fn inspector(&self) -> &I {
        &self.inspector
    }

    pub fn pending_edit(&self) -> Option<&PendingEdit> {
        self.publisher.pending()
    }

    /// Commit an operator edit of a node from the current forest and ask debugee to stop.
    /// The write is applied at the next stop event. If debugee refuses to stop, the edit is
    /// dropped and the error is returned.
    pub fn commit_edit(&mut self, node: NodeId, text: &str) -> Result<(), Error> {
        if self.is_terminated() {
            return Err(Error::SessionTerminated);
        }

        self.publisher.capture(&self.forest, node, text)?;
        if let Err(e) = self.inspector.stop() {
            if let Some(edit) = self.publisher.discard() {
                warn!(target: "hook", "edit `{}` dropped: {e:#}", edit.expression());
            }
            return Err(e);
        }
        Ok(())
    }

    /// Ask debugee to stop, the forest is refreshed at the next stop event.
    pub fn request_stop(&mut self) -> Result<(), Error> {
        if self.is_terminated() {
            return Err(Error::SessionTerminated);
        }
        self.inspector.stop()
    }

    /// Drain inspector event queue, events are processed in arrival order.
    pub fn tick(&mut self) -> Tick {
        let mut tick = Tick::default();

        if !self.is_terminated() {
            while let Some(event) = self.inspector.poll_next() {
                tick.events += 1;
                debug!(target: "hook", "debugee is {}", event.state);

                match event.state {
                    ProcessState::Stopped => self.on_stop(&mut tick),
                    ProcessState::Running => {}
                    ProcessState::Exited => {
                        self.terminate();
                        break;
                    }
                }
            }
        }

        tick.terminated = self.is_terminated();
        tick
    }

    fn on_stop(&mut self, tick: &mut Tick) {
        if let Some(outcome) = self.publisher.apply(&self.inspector, self.builder.filter()) {
            tick.writes.push(outcome);
        }
        self.rebuild();
        tick.rebuilds += 1;
        self.resume();
    }

    fn rebuild(&mut self) {
        self.snapshot += 1;
        self.forest = match self.builder.build(&self.inspector, self.snapshot) {
            Ok(forest) => forest,
            Err(e) => {
                warn!(target: "hook", "variable tree rebuild: {e:#}");
                Forest::empty(self.snapshot)
            }
        };
    }

    fn resume(&mut self) {
        weak_error!(self.inspector.continue_execution(), "resume debugee:");
    }

    fn terminate(&mut self) {
        info!(target: "hook", "debugee exited, session terminated");
        if let Some(edit) = self.publisher.discard() {
            warn!(target: "hook", "pending edit `{}` dropped", edit.expression());
        }
        self.state = SessionState::Terminated;
    }
}
