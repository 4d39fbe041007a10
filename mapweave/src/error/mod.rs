//! Error types produced while resolving plans and mapping values.

mod attempts;
mod constructors;
mod types;

pub use attempts::FactoryAttempts;
pub use types::{AccessError, ErrorKind, MapError};
