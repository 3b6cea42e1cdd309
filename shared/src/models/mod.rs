//! Domain models for the Climate Policy Maker

mod policy;
mod report;
mod rule;
mod weather;

pub use policy::*;
pub use report::*;
pub use rule::*;
pub use weather::*;
