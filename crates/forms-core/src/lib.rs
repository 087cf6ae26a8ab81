//! # Forms Core
//!
//! Core types for declaring forms and resolving their records.
//!
//! This crate provides the fundamental building blocks:
//! - [`EntityDefinition`] - Typed entity a form is derived from
//! - [`FormSchema`] - Wire description of a form
//! - [`Resolved`] - A value or a deferred marker
//! - [`FormError`] - Error types

pub mod entity;
pub mod error;
pub mod schema;
pub mod types;

// Re-exports for convenience
pub use entity::{
    Attribute, DefaultExpr, Entity, EntityBuilder, EntityCatalog, EntityDefinition,
    TypeDescriptor, BASE_ENTITY,
};
pub use error::{FormError, Result};
pub use schema::{AttributeSpec, FormSchema};
pub use types::*;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::entity::{Entity, EntityCatalog, EntityDefinition, TypeDescriptor};
    pub use crate::error::{FormError, Result};
    pub use crate::schema::{AttributeSpec, FormSchema};
    pub use crate::types::{Fields, Record, RecordId, Resolved, UnknownValue, Value};
}
