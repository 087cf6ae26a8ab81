//! # Forms SDK
//!
//! Access to the remote store that holds forms, records and parameters.

pub mod client;
pub mod memory;
pub mod store;

pub use client::{HttpFormStore, StoreClientConfig};
pub use memory::{InMemoryFormStore, StoreCalls, StoreOperation, StoredParam};
pub use store::{FormStore, RecordEnvelope, RecordList, RecordSummary, StoreResponse};
