//! Services for the Climate Policy Maker backend

pub mod catalog_store;
pub mod export;
pub mod policy;

pub use catalog_store::CatalogStore;
pub use export::ExportFormat;
pub use policy::{PolicyReport, PolicyService};
