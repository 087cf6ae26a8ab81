//! # Forms Plugin
//!
//! Declares forms from entity types and resolves their records while a
//! model is being compiled.
//!
//! - [`FormResolver::get`] - one field of one record
//! - [`FormResolver::instances`] - ids of all records of a form
//! - [`FormResolver::all`] - fields of all records of a form
//! - [`FormResolver::one`] - one field of a singleton form
//! - [`FormResolver::report`] - submit an output value

pub mod config;
pub mod report;
pub mod resolver;

pub use config::PluginConfig;
pub use resolver::FormResolver;

/// Prelude module for common imports.
pub mod prelude {
    pub use crate::config::PluginConfig;
    pub use crate::resolver::FormResolver;
    pub use forms_core::prelude::*;
    pub use forms_sdk::{FormStore, HttpFormStore, InMemoryFormStore};
    pub use forms_state::{CompileSession, Convergence, PassDriver};
}
