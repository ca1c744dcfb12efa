//! In-process Lead Store with spreadsheet row semantics.

use async_trait::async_trait;
use chrono::{Local, Utc};
use parking_lot::RwLock;

use leadflow_protocols::{LeadRecord, LeadStore, LeadStoreError, NewLead, SheetSummary};

/// Rows above the first lead: column labels plus the form's field-name row.
const HEADER_ROWS: u32 = 2;
const LEAD_COLUMNS: u32 = 14;

/// Lead Store held in memory.
///
/// Row indices follow the sheet: the first lead is row 2, `lastRow` counts
/// the header rows, and a row index is accepted when it lies in
/// `1..=lastRow-1`.
pub struct MemoryLeadStore {
    sheet_name: String,
    rows: RwLock<Vec<LeadRecord>>,
}

impl MemoryLeadStore {
    pub fn new() -> Self {
        Self {
            sheet_name: "Data".to_string(),
            rows: RwLock::new(Vec::new()),
        }
    }

    /// Seed the sheet with leads, renumbering them in append order.
    pub fn with_leads(leads: impl IntoIterator<Item = LeadRecord>) -> Self {
        let store = Self::new();
        {
            let mut rows = store.rows.write();
            for mut lead in leads {
                lead.row_index = HEADER_ROWS + rows.len() as u32;
                rows.push(lead);
            }
        }
        store
    }

    fn last_row(rows: &[LeadRecord]) -> u32 {
        HEADER_ROWS + rows.len() as u32
    }

    /// Position in `rows` for a row index, or the store's error text.
    fn slot(rows: &[LeadRecord], row_index: u32) -> Result<usize, LeadStoreError> {
        let last_row = Self::last_row(rows);
        if row_index < 1 || row_index > last_row - 1 {
            return Err(LeadStoreError::Api("Invalid row index".to_string()));
        }
        if row_index < HEADER_ROWS {
            return Err(LeadStoreError::Api(format!(
                "Row {} is a header row",
                row_index
            )));
        }
        Ok((row_index - HEADER_ROWS) as usize)
    }
}

impl Default for MemoryLeadStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LeadStore for MemoryLeadStore {
    async fn unprocessed_leads(&self) -> Result<Vec<LeadRecord>, LeadStoreError> {
        Ok(self
            .rows
            .read()
            .iter()
            .filter(|lead| !lead.is_processed())
            .cloned()
            .collect())
    }

    async fn all_leads(&self) -> Result<Vec<LeadRecord>, LeadStoreError> {
        Ok(self.rows.read().clone())
    }

    async fn lead(&self, row_index: u32) -> Result<LeadRecord, LeadStoreError> {
        let rows = self.rows.read();
        let slot = Self::slot(&rows, row_index)?;
        Ok(rows[slot].clone())
    }

    async fn mark_processed(&self, row_index: u32) -> Result<(), LeadStoreError> {
        let mut rows = self.rows.write();
        let slot = Self::slot(&rows, row_index)?;
        rows[slot].processed = Some(Utc::now().to_rfc3339());
        Ok(())
    }

    async fn add_lead(&self, lead: &NewLead) -> Result<u32, LeadStoreError> {
        let mut rows = self.rows.write();
        let row_index = Self::last_row(&rows);
        rows.push(lead.clone().into_record(row_index, Local::now().date_naive()));
        Ok(row_index)
    }

    async fn probe(&self) -> Result<SheetSummary, LeadStoreError> {
        let rows = self.rows.read();
        let has_processed = rows.iter().any(LeadRecord::is_processed);
        Ok(SheetSummary {
            sheet_name: self.sheet_name.clone(),
            last_row: Self::last_row(&rows),
            last_column: if has_processed {
                LEAD_COLUMNS + 1
            } else {
                LEAD_COLUMNS
            },
        })
    }
}
