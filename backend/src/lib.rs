//! Climate Policy Maker - backend services
//!
//! Wires the pure policy core to the outside world: configuration, the
//! reloadable rule catalog, report export and the optional LLM elaboration.

pub mod config;
pub mod error;
pub mod external;
pub mod services;

pub use config::Config;
pub use error::{AppError, AppResult};
