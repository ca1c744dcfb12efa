//! Chrome instance the CRM tab lives in.
//!
//! Launches Chrome with a persistent profile when nothing is listening on the
//! debugging port, so the CRM login survives restarts.

mod chrome;
mod core;
mod types;

pub use self::core::CdpBrowser;
pub use self::types::{BrowserError, CdpBrowserConfig};

#[cfg(test)]
#[path = "browser_tests.rs"]
mod tests;
