//! # LeadFlow Storage
//!
//! Durable, key-scoped storage for the automation run.
//!
//! Four independently addressable entries are kept:
//! - `automation_state` - the [`RunState`](leadflow_protocols::RunState) record
//! - `automation_leads` - the pending lead queue
//! - `automation_logs` - a bounded, FIFO-trimmed event log
//! - `automation_config` - the user-editable settings record
//!
//! [`RunStorage`] is the single boundary through which the orchestrator reads
//! and patches them.

pub mod error;
pub mod kv;
pub mod run_storage;

pub use error::StorageError;
pub use kv::{FileKvStore, KeyValueStore, MemoryKvStore};
pub use run_storage::{RunStorage, DEFAULT_LOG_CAPACITY};
