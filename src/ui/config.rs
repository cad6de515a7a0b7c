use crate::debugger::inspector::VariableFilter;
use crate::{muted_error, weak_error};
use log::error;
use serde::Deserialize;
use std::fs::read_to_string;
use std::path::PathBuf;
use std::time::Duration;

/// Console interface settings.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Pause between ticks of `watch` command, in milliseconds.
    pub tick_ms: u64,
    /// Save command history in a regular file.
    pub save_history: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            tick_ms: 16,
            save_history: false,
        }
    }
}

/// Application config.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which variables of a stack frame are shown.
    pub variables: VariableFilter,
    pub console: ConsoleConfig,
}

impl Config {
    const DEFAULT_PATH: &'static str = ".config/hook/config.toml";
    const HISTORY_PATH: &'static str = ".config/hook/history";

    /// Load config from file, default location is used if path is `None`.
    /// Return [`None`] on errors.
    pub fn from_file(path: Option<&str>) -> Option<Self> {
        let data = match path {
            None => {
                let path = home::home_dir()?.join(Self::DEFAULT_PATH);
                muted_error!(read_to_string(path))?
            }
            Some(path) => match read_to_string(path) {
                Ok(data) => data,
                Err(err) => {
                    error!(target: "hook", "Error while load config file: {err}");
                    return None;
                }
            },
        };

        weak_error!(toml::from_str(&data), "config:")
    }

    /// Same as [`Config::from_file`], but fallback to default config.
    pub fn load(path: Option<&str>) -> Self {
        Self::from_file(path).unwrap_or_default()
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.console.tick_ms)
    }

    /// Location of the command history file, `None` if history is not saved.
    pub fn history_path(&self) -> Option<PathBuf> {
        if !self.console.save_history {
            return None;
        }
        home::home_dir().map(|home| home.join(Self::HISTORY_PATH))
    }
}
