//! HTTP client for the spreadsheet web app.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use leadflow_protocols::{LeadRecord, LeadStore, LeadStoreError, NewLead, SheetSummary};

use crate::response::{
    check_body, AddLeadResponse, LeadResponse, LeadsResponse, MessageResponse,
};

/// Lead Store backed by the spreadsheet web app.
///
/// Every call is a GET with an `action` query parameter. The endpoint can be
/// swapped at runtime when the operator updates the settings.
pub struct HttpLeadStore {
    client: Client,
    endpoint: RwLock<Option<Url>>,
}

impl HttpLeadStore {
    /// Create an unconfigured store with the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self, LeadStoreError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("LeadFlow/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LeadStoreError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: RwLock::new(None),
        })
    }

    /// Builder form of [`LeadStore::set_endpoint`].
    pub fn with_endpoint(self, endpoint: &str) -> Result<Self, LeadStoreError> {
        self.set_endpoint(endpoint)?;
        Ok(self)
    }

    pub fn endpoint(&self) -> Option<Url> {
        self.endpoint.read().clone()
    }

    async fn request<T: DeserializeOwned>(
        &self,
        action: &str,
        params: &[(&str, &str)],
    ) -> Result<T, LeadStoreError> {
        let endpoint = self.endpoint().ok_or(LeadStoreError::NotConfigured)?;

        debug!("Lead store request: action={}", action);

        let response = self
            .client
            .get(endpoint)
            .query(&[("action", action)])
            .query(params)
            .send()
            .await
            .map_err(|e| LeadStoreError::Http(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LeadStoreError::Status(status.as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| LeadStoreError::InvalidResponse(e.to_string()))?;

        let body = check_body(body)?;
        serde_json::from_value(body).map_err(|e| LeadStoreError::InvalidResponse(e.to_string()))
    }
}

fn parse_endpoint(endpoint: &str) -> Result<Url, LeadStoreError> {
    let url = Url::parse(endpoint)
        .map_err(|e| LeadStoreError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(LeadStoreError::InvalidEndpoint(format!(
            "{}: scheme must be http or https",
            endpoint
        )));
    }

    Ok(url)
}

#[async_trait]
impl LeadStore for HttpLeadStore {
    fn is_configured(&self) -> bool {
        self.endpoint.read().is_some()
    }

    fn set_endpoint(&self, endpoint: &str) -> Result<(), LeadStoreError> {
        let endpoint = endpoint.trim();
        if endpoint.is_empty() {
            *self.endpoint.write() = None;
            info!("Lead store endpoint cleared");
            return Ok(());
        }

        let url = parse_endpoint(endpoint)?;
        info!("Lead store endpoint set to {}", url);
        *self.endpoint.write() = Some(url);
        Ok(())
    }

    async fn unprocessed_leads(&self) -> Result<Vec<LeadRecord>, LeadStoreError> {
        let response: LeadsResponse = self.request("getUnprocessedLeads", &[]).await?;
        Ok(response.leads)
    }

    async fn all_leads(&self) -> Result<Vec<LeadRecord>, LeadStoreError> {
        let response: LeadsResponse = self.request("getLeads", &[]).await?;
        Ok(response.leads)
    }

    async fn lead(&self, row_index: u32) -> Result<LeadRecord, LeadStoreError> {
        let row = row_index.to_string();
        let response: LeadResponse = self.request("getLead", &[("rowIndex", &row)]).await?;
        Ok(response.lead)
    }

    async fn mark_processed(&self, row_index: u32) -> Result<(), LeadStoreError> {
        let row = row_index.to_string();
        let response: MessageResponse = self
            .request("markLeadProcessed", &[("rowIndex", &row)])
            .await?;
        debug!(
            "Row {} marked processed: {}",
            row_index,
            response.message.unwrap_or_default()
        );
        Ok(())
    }

    async fn add_lead(&self, lead: &NewLead) -> Result<u32, LeadStoreError> {
        let response: AddLeadResponse = self.request("addLead", &lead.query_pairs()).await?;
        Ok(response.row_index)
    }

    async fn probe(&self) -> Result<SheetSummary, LeadStoreError> {
        self.request("getSheetData", &[]).await
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
