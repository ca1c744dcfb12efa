//! Wire shapes returned by the spreadsheet web app.

use serde::Deserialize;
use serde_json::Value;

use leadflow_protocols::{LeadRecord, LeadStoreError};

/// `getLeads` / `getUnprocessedLeads`.
#[derive(Debug, Deserialize)]
pub(crate) struct LeadsResponse {
    #[serde(default)]
    pub leads: Vec<LeadRecord>,
}

/// `getLead`.
#[derive(Debug, Deserialize)]
pub(crate) struct LeadResponse {
    pub lead: LeadRecord,
}

/// `markLeadProcessed`.
#[derive(Debug, Deserialize)]
pub(crate) struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// `addLead`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddLeadResponse {
    pub row_index: u32,
}

/// Split an application-level failure out of a 200 response body.
///
/// The web app reports failures as `{"error": "..."}` with a 200 status,
/// occasionally as `{"success": false}` with no text.
pub(crate) fn check_body(body: Value) -> Result<Value, LeadStoreError> {
    if let Some(error) = body.get("error") {
        let message = match error {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Err(LeadStoreError::Api(message));
    }

    if body.get("success").and_then(Value::as_bool) == Some(false) {
        return Err(LeadStoreError::Api("Request failed".to_string()));
    }

    Ok(body)
}
