//! Minimal Chrome DevTools Protocol client.
//!
//! Wraps only what the CRM tab needs: target listing and activation,
//! page load control, and `Runtime.evaluate`.

mod client;
mod error;
mod protocol;
mod session;

pub use client::CdpClient;
pub use error::CdpError;
pub use protocol::TargetInfo;
pub use session::PageSession;
