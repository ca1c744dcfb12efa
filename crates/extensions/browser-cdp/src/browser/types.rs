use std::path::PathBuf;

use thiserror::Error;

use crate::cdp::CdpError;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("No Chrome or Chromium executable found; set CHROME_PATH")]
    ChromeMissing,

    #[error("Failed to launch Chrome: {0}")]
    Launch(String),

    #[error("Chrome did not open debugging port {0} in time")]
    NotListening(u16),

    /// The tab was closed or never existed.
    #[error("Tab {0} is gone")]
    TabGone(String),

    #[error(transparent)]
    Cdp(#[from] CdpError),
}

#[derive(Debug, Clone)]
pub struct CdpBrowserConfig {
    pub debug_port: u16,
    /// Chrome user data directory; keeps the CRM session cookies.
    pub profile_dir: PathBuf,
    pub headless: bool,
}

impl Default for CdpBrowserConfig {
    fn default() -> Self {
        Self {
            debug_port: 9222,
            profile_dir: dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".leadflow")
                .join("browser-profile"),
            headless: false,
        }
    }
}

impl CdpBrowserConfig {
    /// HTTP debugging endpoint.
    pub fn endpoint(&self) -> String {
        format!("http://127.0.0.1:{}", self.debug_port)
    }

    /// Command line for a Chrome we launch ourselves.
    pub fn chrome_args(&self) -> Vec<String> {
        let mut args = vec![
            format!("--remote-debugging-port={}", self.debug_port),
            format!("--user-data-dir={}", self.profile_dir.display()),
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
            // A backgrounded CRM tab must keep running its timers
            "--disable-background-timer-throttling".to_string(),
            "--disable-renderer-backgrounding".to_string(),
            "--disable-backgrounding-occluded-windows".to_string(),
        ];
        if self.headless {
            args.push("--headless=new".to_string());
        }
        args
    }
}
