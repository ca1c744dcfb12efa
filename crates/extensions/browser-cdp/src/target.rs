//! CRM tab lifecycle over CDP.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};
use url::Url;

use leadflow_protocols::{TargetError, TargetHandle, TargetManager};

use crate::browser::{BrowserError, CdpBrowser};
use crate::cdp::TargetInfo;

/// Where the CRM lives and how long a fresh load needs to settle.
#[derive(Debug, Clone)]
pub struct CrmLocation {
    /// Scheme and host, e.g. `https://portal.redraincorp.com`.
    pub origin: String,
    /// Path of the page the driver works on, e.g. `/enquiriesSummary`.
    pub entry_path: String,
    pub settle_delay: Duration,
}

impl CrmLocation {
    pub fn entry_url(&self) -> String {
        format!("{}{}", self.origin.trim_end_matches('/'), self.entry_path)
    }
}

/// Pick the tab to reuse: a CRM tab on the entry path, else any CRM tab.
///
/// A tab belongs to the CRM only when its scheme, host and port all match.
pub fn select_target<'a>(targets: &'a [TargetInfo], location: &CrmLocation) -> Option<&'a TargetInfo> {
    let origin = match Url::parse(&location.origin) {
        Ok(url) => url.origin(),
        Err(e) => {
            warn!("Invalid CRM origin {}: {}", location.origin, e);
            return None;
        }
    };
    let mut candidates = targets.iter().filter(|t| {
        t.is_page() && Url::parse(&t.url).is_ok_and(|url| url.origin() == origin)
    });

    let first = candidates.next()?;
    if first.url.contains(&location.entry_path) {
        return Some(first);
    }
    Some(
        candidates
            .find(|t| t.url.contains(&location.entry_path))
            .unwrap_or(first),
    )
}

/// [`TargetManager`] driving a real Chrome tab.
pub struct CdpTargetManager {
    browser: Arc<CdpBrowser>,
    location: CrmLocation,
}

impl CdpTargetManager {
    pub fn new(browser: Arc<CdpBrowser>, location: CrmLocation) -> Self {
        Self { browser, location }
    }

    async fn settle(&self) {
        tokio::time::sleep(self.location.settle_delay).await;
    }

    async fn reuse(&self, target: &TargetInfo) -> Result<(), BrowserError> {
        info!("Reloading existing CRM tab {}", target.target_id);
        let session = self.browser.session(&target.target_id).await?;
        session.reload().await?;
        self.settle().await;

        if !target.url.contains(&self.location.entry_path) {
            debug!("CRM tab is on {}, navigating to entry page", target.url);
            session.navigate(&self.location.entry_url()).await?;
            self.settle().await;
        }
        Ok(())
    }

    async fn open(&self) -> Result<String, BrowserError> {
        let url = self.location.entry_url();
        info!("No CRM tab found, opening {}", url);
        let session = self.browser.open_page(&url).await?;
        session.wait_for_load().await?;
        self.settle().await;
        Ok(session.target_id().to_string())
    }
}

fn unavailable(e: BrowserError) -> TargetError {
    TargetError::Unavailable(e.to_string())
}

#[async_trait]
impl TargetManager for CdpTargetManager {
    async fn acquire(&self) -> Result<TargetHandle, TargetError> {
        let targets = self.browser.page_targets().await.map_err(unavailable)?;

        let target_id = match select_target(&targets, &self.location) {
            Some(target) => {
                self.reuse(target).await.map_err(unavailable)?;
                target.target_id.clone()
            }
            None => self.open().await.map_err(unavailable)?,
        };

        Ok(TargetHandle::new(target_id))
    }

    async fn validate(&self, target: &TargetHandle) -> bool {
        let targets = match self.browser.page_targets().await {
            Ok(targets) => targets,
            Err(e) => {
                warn!("Target validation failed: {}", e);
                return false;
            }
        };

        if !targets.iter().any(|t| t.target_id == target.as_str()) {
            self.browser.forget_session(target.as_str()).await;
            return false;
        }

        match self.browser.session(target.as_str()).await {
            Ok(session) => session.is_loaded().await.unwrap_or(false),
            Err(e) => {
                debug!("Could not attach to {}: {}", target, e);
                false
            }
        }
    }

    async fn focus(&self, target: &TargetHandle) -> Result<(), TargetError> {
        self.browser
            .focus(target.as_str())
            .await
            .map_err(|e| match e {
                BrowserError::TabGone(id) => TargetError::NotFound(id),
                other => unavailable(other),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn location() -> CrmLocation {
        CrmLocation {
            origin: "https://portal.redraincorp.com".to_string(),
            entry_path: "/enquiriesSummary".to_string(),
            settle_delay: Duration::from_millis(0),
        }
    }

    fn target(id: &str, kind: &str, url: &str) -> TargetInfo {
        serde_json::from_value(json!({
            "targetId": id,
            "type": kind,
            "title": "",
            "url": url
        }))
        .unwrap()
    }

    #[test]
    fn test_entry_url() {
        let mut loc = location();
        assert_eq!(loc.entry_url(), "https://portal.redraincorp.com/enquiriesSummary");
        loc.origin.push('/');
        assert_eq!(loc.entry_url(), "https://portal.redraincorp.com/enquiriesSummary");
    }

    #[test]
    fn test_select_prefers_entry_path() {
        let targets = vec![
            target("A", "page", "https://example.com/"),
            target("B", "page", "https://portal.redraincorp.com/dashboard"),
            target("C", "page", "https://portal.redraincorp.com/enquiriesSummary?x=1"),
        ];
        let picked = select_target(&targets, &location()).unwrap();
        assert_eq!(picked.target_id, "C");
    }

    #[test]
    fn test_select_falls_back_to_first_crm_tab() {
        let targets = vec![
            target("A", "page", "https://example.com/"),
            target("B", "page", "https://portal.redraincorp.com/dashboard"),
            target("C", "page", "https://portal.redraincorp.com/contacts"),
        ];
        let picked = select_target(&targets, &location()).unwrap();
        assert_eq!(picked.target_id, "B");
    }

    #[test]
    fn test_select_rejects_lookalike_hosts() {
        let targets = vec![
            target("A", "page", "https://portal.redraincorp.com.evil.example/enquiriesSummary"),
            target("B", "page", "https://portal.redraincorp.com@evil.example/enquiriesSummary"),
            target("C", "page", "http://portal.redraincorp.com/enquiriesSummary"),
            target("D", "page", "https://portal.redraincorp.com:8443/enquiriesSummary"),
        ];
        assert!(select_target(&targets, &location()).is_none());

        let mut with_crm = targets;
        with_crm.push(target("E", "page", "https://portal.redraincorp.com/dashboard"));
        assert_eq!(select_target(&with_crm, &location()).unwrap().target_id, "E");
    }

    #[test]
    fn test_select_with_invalid_origin_finds_nothing() {
        let mut loc = location();
        loc.origin = "not a url".to_string();
        let targets = vec![target("A", "page", "https://portal.redraincorp.com/")];
        assert!(select_target(&targets, &loc).is_none());
    }

    #[test]
    fn test_select_ignores_non_pages_and_other_origins() {
        let targets = vec![
            target("W", "service_worker", "https://portal.redraincorp.com/enquiriesSummary"),
            target("A", "page", "https://evil.example/?u=https://portal.redraincorp.com"),
        ];
        assert!(select_target(&targets, &location()).is_none());
    }
}
