//! CRM browser integration for LeadFlow.
//!
//! Speaks the Chrome DevTools Protocol directly:
//! - [`CdpBrowser`] launches or connects to Chrome and caches page sessions
//! - [`CdpTargetManager`] finds, reloads and focuses the CRM tab
//! - [`CdpFormDriver`] relays driver messages to the agent script in the page

pub mod browser;
pub mod cdp;
mod driver;
mod target;

pub use browser::{BrowserError, CdpBrowser, CdpBrowserConfig};
pub use driver::{agent_probe, dispatch_expression, CdpFormDriver, AGENT_GLOBAL};
pub use target::{select_target, CdpTargetManager, CrmLocation};
