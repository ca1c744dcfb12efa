//! # LeadFlow API
//!
//! Control surface over an [`Orchestrator`](leadflow_orchestrator::Orchestrator):
//!
//! ```text
//! POST /api/commands  - any run-control command, answered with {success, ...}
//! GET  /api/state     - current run state and phase
//! GET  /api/logs      - persisted run log
//! GET  /api/config    - automation settings
//! GET  /api/events    - WebSocket stream of AutomationEvents
//! GET  /health        - liveness and version
//! ```

pub mod error;
pub mod handlers;
pub mod monitoring;
pub mod routes;
pub mod server;
pub mod state;
pub mod websocket;

pub use error::ApiError;
pub use routes::create_router;
pub use server::{ApiServer, ServerConfig};
pub use state::ApiState;
