//! External API integrations

pub mod policy_llm;

pub use policy_llm::{PolicyLlmClient, PolicyNarrative};
