//! Session identifiers, the session registry and its sweeper

pub mod id;
pub mod registry;
pub mod sweeper;

pub use id::{OsRngGenerator, SessionId};
pub use registry::{Session, SessionRegistry};
pub use sweeper::SessionSweeper;
