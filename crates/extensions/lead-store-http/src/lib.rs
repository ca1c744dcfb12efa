//! Lead Store backends for LeadFlow.
//!
//! Provides [`HttpLeadStore`], a client for the spreadsheet web app, and
//! [`MemoryLeadStore`], an in-process sheet with the same row semantics.

mod client;
mod memory;
mod response;

pub use client::HttpLeadStore;
pub use memory::MemoryLeadStore;
