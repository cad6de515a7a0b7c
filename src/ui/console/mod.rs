mod command;
pub mod view;

use crate::debugger::inspector::DebugInspector;
use crate::debugger::publish::WriteOutcome;
use crate::debugger::variable::edit::EditorHint;
use crate::debugger::variable::expression;
use crate::debugger::{Error, Session, Tick};
use crate::muted_error;
use crate::ui::config::Config;
use command::{Command, HELP};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::thread;
use view::ForestView;

const PROMPT: &str = "(hook) ";

enum Flow {
    Continue,
    Exit,
}

/// Console presentation layer: renders the forest and turns commands into edits.
///
/// Every input line is one presentation tick, debugee events are processed before a command is
/// handled.
pub struct ConsoleApplication<I: DebugInspector> {
    session: Session<I>,
    config: Config,
    editor: DefaultEditor,
    kill_switch: Option<Box<dyn Fn()>>,
}

impl<I: DebugInspector> ConsoleApplication<I> {
    pub fn new(session: Session<I>, config: Config) -> anyhow::Result<Self> {
        Ok(Self {
            session,
            config,
            editor: DefaultEditor::new()?,
            kill_switch: None,
        })
    }

    /// Set a way to kill debugee (used by `kill` command).
    pub fn with_kill_switch(mut self, kill: impl Fn() + 'static) -> Self {
        self.kill_switch = Some(Box::new(kill));
        self
    }

    pub fn run(mut self) -> anyhow::Result<()> {
        let history = self.config.history_path();
        if let Some(path) = history.as_ref() {
            muted_error!(self.editor.load_history(path));
        }

        print!("{}", ForestView(self.session.forest()));
        if self.session.is_terminated() {
            println!("session {}", self.session.state());
        }

        loop {
            let line = match self.editor.readline(PROMPT) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            };
            muted_error!(self.editor.add_history_entry(line.as_str()));

            let tick = self.session.tick();
            self.report(&tick);

            let command = match Command::parse(&line) {
                Ok(command) => command,
                Err(e) => {
                    println!("{e:#}");
                    continue;
                }
            };

            if let Flow::Exit = self.handle(command) {
                break;
            }
        }

        if let Some(path) = history.as_ref() {
            muted_error!(self.editor.save_history(path));
        }
        Ok(())
    }

    fn handle(&mut self, command: Command) -> Flow {
        match command {
            Command::Vars => print!("{}", ForestView(self.session.forest())),
            Command::Set { target, value } => self.set(&target, &value),
            Command::Stop => match self.session.request_stop() {
                Ok(()) => {
                    let tick = self.session.tick();
                    self.report(&tick);
                    print!("{}", ForestView(self.session.forest()));
                }
                Err(e) => println!("{e:#}"),
            },
            Command::Watch(ticks) => {
                for _ in 0..ticks {
                    let tick = self.session.tick();
                    self.report(&tick);
                    if tick.terminated {
                        break;
                    }
                    thread::sleep(self.config.tick());
                }
                print!("{}", ForestView(self.session.forest()));
            }
            Command::Diag => crate::log::diagnostics()
                .iter()
                .for_each(|line| println!("{line}")),
            Command::Kill => match self.kill_switch.as_ref() {
                Some(kill) => {
                    kill();
                    let tick = self.session.tick();
                    self.report(&tick);
                }
                None => println!("debugee can't be killed from here"),
            },
            Command::Help => println!("{HELP}"),
            Command::Quit => return Flow::Exit,
        }
        Flow::Continue
    }

    fn set(&mut self, target: &str, value: &str) {
        let forest = self.session.forest();
        let Some(node) = expression::find(forest, target) else {
            println!("variable `{target}` not found");
            return;
        };
        let hint = forest.node(node).map(EditorHint::for_node);

        match self.session.commit_edit(node, value) {
            Ok(()) => {
                let tick = self.session.tick();
                self.report(&tick);
                print!("{}", ForestView(self.session.forest()));
            }
            Err(e @ Error::InvalidEditValue { .. }) => {
                println!("{e}");
                if let Some(hint) = hint {
                    println!("expected: {hint}");
                }
            }
            Err(e) if e.is_fatal() => println!("{e:#}, type `quit` to exit"),
            Err(e) => println!("{e:#}"),
        }
    }

    fn report(&self, tick: &Tick) {
        for outcome in &tick.writes {
            match outcome {
                WriteOutcome::Applied { expression, .. } => println!("{expression}: ok"),
                WriteOutcome::Skipped(e) | WriteOutcome::Failed(e) => println!("{e}"),
            }
        }
        // announce only the tick in which exit event arrived
        if tick.terminated && tick.events > 0 {
            println!("debugee exited, session {}", self.session.state());
        }
    }
}
