//! Policy core for the Climate Policy Maker
//!
//! Pure, synchronous building blocks shared by the backend binary and the
//! WASM bindings. The pipeline composes as
//! `assemble(&evaluate(&normalize(&payload)?, &catalog)?, &charts)`.

pub mod assembler;
pub mod catalog;
pub mod engine;
pub mod error;
pub mod models;
pub mod normalizer;
pub mod render;
pub mod types;
pub mod validation;

pub use assembler::{assemble, embed_chart};
pub use catalog::{RuleCatalog, BUILTIN_CATALOG};
pub use engine::{evaluate, evaluate_at, render_template};
pub use error::{PolicyError, PolicyResult};
pub use models::*;
pub use normalizer::{normalize, normalize_forecast};
pub use render::render_markdown;
pub use types::*;
pub use validation::*;
