//! # Forms State
//!
//! Record cache and deferred parameter registry of a compilation run.

pub mod cache;
pub mod session;
pub mod unknown;

pub use cache::{CachedRecord, RecordCache};
pub use session::{CompileSession, Convergence, PassDriver, PassOutcome};
pub use unknown::{UnknownMetadata, UnknownOrigin, UnknownParameter, UnknownRegistry};
