use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::cdp::{CdpClient, PageSession, TargetInfo};

use super::chrome::{is_listening, ChromeProcess};
use super::{BrowserError, CdpBrowserConfig};

/// Lazily connected browser with a cache of attached tab sessions.
///
/// A dropped connection is replaced on the next call, and the cached
/// sessions go with it.
pub struct CdpBrowser {
    config: CdpBrowserConfig,
    client: Mutex<Option<Arc<CdpClient>>>,
    sessions: RwLock<HashMap<String, Arc<PageSession>>>,
    /// Set only when LeadFlow started Chrome itself.
    chrome: Mutex<Option<ChromeProcess>>,
}

impl CdpBrowser {
    pub fn new(config: CdpBrowserConfig) -> Self {
        Self {
            config,
            client: Mutex::new(None),
            sessions: RwLock::new(HashMap::new()),
            chrome: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &CdpBrowserConfig {
        &self.config
    }

    async fn ensure_chrome(&self) -> Result<(), BrowserError> {
        let endpoint = self.config.endpoint();
        if is_listening(&endpoint).await {
            debug!("Chrome already listening at {}", endpoint);
            return Ok(());
        }

        info!("Chrome not listening on port {}, launching", self.config.debug_port);
        let process = ChromeProcess::launch(&self.config).await?;
        *self.chrome.lock().await = Some(process);
        Ok(())
    }

    /// Live client, connecting (and launching Chrome) when needed.
    pub async fn connect(&self) -> Result<Arc<CdpClient>, BrowserError> {
        let mut slot = self.client.lock().await;
        if let Some(client) = slot.as_ref().filter(|c| c.is_alive()) {
            return Ok(client.clone());
        }
        if slot.take().is_some() {
            warn!("CDP connection lost, reconnecting");
        }
        self.sessions.write().await.clear();

        self.ensure_chrome().await?;
        let client = Arc::new(CdpClient::connect(&self.config.endpoint()).await?);
        info!("Connected to Chrome at {}", self.config.endpoint());

        *slot = Some(client.clone());
        Ok(client)
    }

    pub async fn page_targets(&self) -> Result<Vec<TargetInfo>, BrowserError> {
        Ok(self.connect().await?.page_targets().await?)
    }

    /// Cached session for `target_id`, attaching on first use.
    pub async fn session(&self, target_id: &str) -> Result<Arc<PageSession>, BrowserError> {
        let client = self.connect().await?;
        if let Some(session) = self.sessions.read().await.get(target_id) {
            return Ok(session.clone());
        }

        let session = Arc::new(client.attach(target_id).await?);
        debug!("Attached session {} to {}", session.session_id(), target_id);
        self.sessions
            .write()
            .await
            .insert(target_id.to_string(), session.clone());
        Ok(session)
    }

    /// Open a tab at `url` and cache its session.
    pub async fn open_page(&self, url: &str) -> Result<Arc<PageSession>, BrowserError> {
        let session = Arc::new(self.connect().await?.open_tab(url).await?);
        self.sessions
            .write()
            .await
            .insert(session.target_id().to_string(), session.clone());
        Ok(session)
    }

    pub async fn forget_session(&self, target_id: &str) {
        if self.sessions.write().await.remove(target_id).is_some() {
            debug!("Dropped cached session for {}", target_id);
        }
    }

    /// Select the tab and raise its window.
    pub async fn focus(&self, target_id: &str) -> Result<(), BrowserError> {
        let client = self.connect().await?;
        let open = client
            .page_targets()
            .await?
            .iter()
            .any(|t| t.target_id == target_id);
        if !open {
            self.forget_session(target_id).await;
            return Err(BrowserError::TabGone(target_id.to_string()));
        }

        client.activate(target_id).await?;
        self.session(target_id).await?.bring_to_front().await?;
        Ok(())
    }

    /// Drop the connection and cached sessions.
    pub async fn close(&self) {
        self.sessions.write().await.clear();
        self.client.lock().await.take();
        info!("Browser connection closed");
    }

    /// Close, then stop Chrome if LeadFlow launched it.
    pub async fn shutdown(&self) {
        self.close().await;
        if let Some(mut process) = self.chrome.lock().await.take() {
            info!("Stopping the Chrome instance LeadFlow launched");
            process.kill().await;
        }
    }
}
