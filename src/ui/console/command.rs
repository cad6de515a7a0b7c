use anyhow::{anyhow, bail};
use strum_macros::EnumString;

pub const HELP: &str = "\
vars                      show variables
set <name> <value>        write a new value, name is a qualified name like `bar.foo.a` or `arr[2]`
stop                      stop debugee and refresh variables
watch <ticks>             poll debugee for a number of ticks, then show variables
diag                      show diagnostic log
kill                      kill debugee
help                      show this help
quit                      exit";

#[derive(Debug, PartialEq)]
pub enum Command {
    Vars,
    Set { target: String, value: String },
    Stop,
    Watch(usize),
    Diag,
    Kill,
    Help,
    Quit,
}

#[derive(Clone, Copy, Debug, PartialEq, EnumString)]
enum Keyword {
    #[strum(serialize = "vars", serialize = "v")]
    Vars,
    #[strum(serialize = "set")]
    Set,
    #[strum(serialize = "stop", serialize = "s")]
    Stop,
    #[strum(serialize = "watch", serialize = "w")]
    Watch,
    #[strum(serialize = "diag")]
    Diag,
    #[strum(serialize = "kill")]
    Kill,
    #[strum(serialize = "help", serialize = "h")]
    Help,
    #[strum(serialize = "quit", serialize = "q")]
    Quit,
}

impl Command {
    pub fn parse(input: &str) -> anyhow::Result<Self> {
        let input = input.trim();
        let (cmd, args) = input.split_once(char::is_whitespace).unwrap_or((input, ""));
        let args = args.trim();

        let no_args = |cmd: Command| {
            if args.is_empty() {
                Ok(cmd)
            } else {
                Err(anyhow!("unexpected arguments: {args}"))
            }
        };

        if cmd.is_empty() {
            bail!("empty command");
        }
        let keyword: Keyword = cmd.parse().map_err(|_: strum::ParseError| {
            anyhow!("unknown command `{cmd}`, type `help` for a list of commands")
        })?;

        match keyword {
            Keyword::Vars => no_args(Command::Vars),
            Keyword::Stop => no_args(Command::Stop),
            Keyword::Diag => no_args(Command::Diag),
            Keyword::Kill => no_args(Command::Kill),
            Keyword::Help => no_args(Command::Help),
            Keyword::Quit => no_args(Command::Quit),
            Keyword::Set => {
                let Some((target, value)) = args.split_once(char::is_whitespace) else {
                    bail!("usage: set <name> <value>");
                };
                Ok(Command::Set {
                    target: target.to_string(),
                    value: value.trim().to_string(),
                })
            }
            Keyword::Watch => {
                let ticks = if args.is_empty() { 1 } else { args.parse()? };
                Ok(Command::Watch(ticks))
            }
        }
    }
}
