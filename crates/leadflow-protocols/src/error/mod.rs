//! Error types for the collaborator contracts.

mod driver;
mod lead_store;
mod target;

pub use driver::*;
pub use lead_store::*;
pub use target::*;
