//! Lead Store contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LeadStoreError;
use crate::lead::{LeadRecord, NewLead};

/// Shape of the store's backing sheet, returned by the connectivity probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetSummary {
    pub sheet_name: String,
    pub last_row: u32,
    pub last_column: u32,
}

impl SheetSummary {
    /// Number of leads below the header row.
    pub fn lead_count(&self) -> u32 {
        self.last_row.saturating_sub(1)
    }
}

/// Spreadsheet-backed source of leads.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Whether the store knows where to send requests.
    fn is_configured(&self) -> bool {
        true
    }

    /// Point the store at a new endpoint. Stores without a remote endpoint ignore this.
    fn set_endpoint(&self, _endpoint: &str) -> Result<(), LeadStoreError> {
        Ok(())
    }

    /// Leads with no processed marker.
    async fn unprocessed_leads(&self) -> Result<Vec<LeadRecord>, LeadStoreError>;

    async fn all_leads(&self) -> Result<Vec<LeadRecord>, LeadStoreError>;

    async fn lead(&self, row_index: u32) -> Result<LeadRecord, LeadStoreError>;

    /// Write a processed timestamp for `row_index`.
    async fn mark_processed(&self, row_index: u32) -> Result<(), LeadStoreError>;

    /// Append a lead and return its row index.
    async fn add_lead(&self, lead: &NewLead) -> Result<u32, LeadStoreError>;

    async fn probe(&self) -> Result<SheetSummary, LeadStoreError>;
}
