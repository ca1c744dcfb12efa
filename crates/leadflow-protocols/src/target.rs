//! Target lifecycle contract.

use async_trait::async_trait;

use crate::error::TargetError;
use crate::run::TargetHandle;

/// Owner of the browser tab hosting the CRM.
#[async_trait]
pub trait TargetManager: Send + Sync {
    /// Find or open the CRM tab, reload it to a clean state and return its handle.
    async fn acquire(&self) -> Result<TargetHandle, TargetError>;

    /// Whether the tab still exists and has finished loading.
    async fn validate(&self, target: &TargetHandle) -> bool;

    /// Bring the tab to the foreground.
    async fn focus(&self, target: &TargetHandle) -> Result<(), TargetError>;
}
