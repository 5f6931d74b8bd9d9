//! Common types and errors shared by all aggregates

pub mod entity_metadata;
pub mod error;

// Re-exports
pub use entity_metadata::EntityMetadata;
pub use error::WorkflowError;
