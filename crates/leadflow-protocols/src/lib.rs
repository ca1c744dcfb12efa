//! # LeadFlow Protocols
//!
//! Shared data model and collaborator traits for the LeadFlow automation core.
//! Contains only types and interface definitions - no I/O.
//!
//! ## Core Traits
//!
//! - [`LeadStore`] - Spreadsheet-backed source of leads
//! - [`FormDriver`] - Page-embedded agent that fills one lead into the CRM
//! - [`TargetManager`] - Owner of the browser tab hosting the CRM
//! - [`LogSink`] - Receiver for driver-originated log lines

pub mod command;
pub mod driver;
pub mod error;
pub mod event;
pub mod lead;
pub mod lead_store;
pub mod outcome;
pub mod run;
pub mod target;
pub mod validate;

pub use command::{Command, CommandResponse};
pub use driver::{DriverLog, DriverReply, DriverRequest, FormDriver, LogSink};
pub use error::{DriverError, LeadStoreError, TargetError};
pub use event::{AutomationEvent, LogEntry, LogLevel};
pub use lead::{LeadRecord, NewLead};
pub use lead_store::{LeadStore, SheetSummary};
pub use outcome::FillOutcome;
pub use run::{AutomationSettings, RunPhase, RunState, SettingsPatch, TargetHandle};
pub use target::TargetManager;
