use anyhow::Context;
use clap::Parser;
use livehook::debugger::inspector::scripted::ScriptedInspector;
use livehook::debugger::Session;
use livehook::ui::config::Config;
use livehook::ui::console::ConsoleApplication;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to config file (default is ~/.config/hook/config.toml)
    #[arg(long)]
    config: Option<String>,

    /// Duplicate diagnostic log into stderr
    #[arg(long, default_value_t = false)]
    log_stderr: bool,

    /// Inspector script describing debugee stack
    script: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    livehook::log::init(args.log_stderr);

    let config = Config::load(args.config.as_deref());
    let inspector = ScriptedInspector::from_file(&args.script)
        .with_context(|| format!("load inspector script `{}`", args.script))?;
    let kill_switch = inspector.clone();

    let session = Session::attach(inspector, config.variables);
    ConsoleApplication::new(session, config)?
        .with_kill_switch(move || kill_switch.terminate())
        .run()
}
