use crate::debugger::inspector::StableId;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // --------------------------------- generic errors --------------------------------------------
    #[error(transparent)]
    IO(#[from] std::io::Error),

    // --------------------------------- stack entity not found ------------------------------------
    #[error("no active thread in debugee")]
    NoActiveThread,
    #[error("selected thread has no stack frames")]
    NoActiveFrame,
    #[error("value of `{0}` is unreadable")]
    ValueUnreadable(String),
    #[error("node {0} not found in current variable tree")]
    NodeNotFound(usize),

    // --------------------------------- write-back errors -----------------------------------------
    #[error("write target not found (root id {root}), expression `{expression}` skipped")]
    WriteTargetNotFound { root: StableId, expression: String },
    #[error("evaluation of `{expression}` failed: {reason}")]
    EvaluationFailed { expression: String, reason: String },
    #[error("invalid value `{value}` for {kind} variable: {reason}")]
    InvalidEditValue {
        kind: &'static str,
        value: String,
        reason: &'static str,
    },

    // --------------------------------- debugee process errors ------------------------------------
    #[error("process control: {0}")]
    ProcessControl(&'static str),
    #[error("debugee session terminated")]
    SessionTerminated,

    // --------------------------------- scripted inspector errors ---------------------------------
    #[error("inspector script parsing error: {0}")]
    ScriptParse(#[from] toml::de::Error),
    #[error("inspector script: {0}")]
    Script(String),
}

impl Error {
    /// Return a hint to an interface - continue the session after error or stop whole process.
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::IO(_) => false,
            Error::NoActiveThread => false,
            Error::NoActiveFrame => false,
            Error::ValueUnreadable(_) => false,
            Error::NodeNotFound(_) => false,
            Error::WriteTargetNotFound { .. } => false,
            Error::EvaluationFailed { .. } => false,
            Error::InvalidEditValue { .. } => false,
            Error::ProcessControl(_) => false,
            Error::ScriptParse(_) => false,
            Error::Script(_) => false,

            // debugee is gone, nothing to inspect anymore
            Error::SessionTerminated => true,
        }
    }
}

#[macro_export]
macro_rules! _error {
    ($log_fn: path, $res: expr) => {
        match $res {
            Ok(value) => Some(value),
            Err(e) => {
                $log_fn!(target: "hook", "{:#}", e);
                None
            }
        }
    };
    ($log_fn: path, $res: expr, $msg: tt) => {
        match $res {
            Ok(value) => Some(value),
            Err(e) => {
                $log_fn!(target: "hook", concat!($msg, " {:#}"), e);
                None
            }
        }
    };
}

/// Transforms `Result` into `Option` and logs an error if it occurs.
#[macro_export]
macro_rules! weak_error {
    ($res: expr) => {
        $crate::_error!(log::warn, $res)
    };
    ($res: expr, $msg: tt) => {
        $crate::_error!(log::warn, $res, $msg)
    };
}

/// Transforms `Result` into `Option` and put error into debug logs if it occurs.
#[macro_export]
macro_rules! muted_error {
    ($res: expr) => {
        $crate::_error!(log::debug, $res)
    };
    ($res: expr, $msg: tt) => {
        $crate::_error!(log::debug, $res, $msg)
    };
}
