pub mod error;
pub mod inspector;
pub mod publish;
pub mod session;
pub mod variable;

pub use error::Error;
pub use session::{Session, SessionState, Tick};
