//! Locating, launching and stopping a local Chrome.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command};
use tracing::{info, warn};

use super::{BrowserError, CdpBrowserConfig};

const STARTUP_POLL: Duration = Duration::from_millis(200);
const STARTUP_ATTEMPTS: u32 = 30;

#[cfg(target_os = "macos")]
const CANDIDATES: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
];

#[cfg(target_os = "linux")]
const CANDIDATES: &[&str] = &[
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
];

#[cfg(target_os = "windows")]
const CANDIDATES: &[&str] = &[
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
];

#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
const CANDIDATES: &[&str] = &[];

/// `CHROME_PATH` if set, else the first installed candidate.
pub(crate) fn find_executable() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("CHROME_PATH").map(PathBuf::from) {
        return Some(path);
    }
    CANDIDATES.iter().map(PathBuf::from).find(|p| p.exists())
}

/// Whether a DevTools endpoint answers at `endpoint`.
pub(crate) async fn is_listening(endpoint: &str) -> bool {
    reqwest::get(format!("{}/json/version", endpoint))
        .await
        .map(|r| r.status().is_success())
        .unwrap_or(false)
}

/// A Chrome process started by LeadFlow.
pub(crate) struct ChromeProcess {
    child: Child,
}

impl ChromeProcess {
    /// Start Chrome and wait until its debugging port answers.
    pub(crate) async fn launch(config: &CdpBrowserConfig) -> Result<Self, BrowserError> {
        let executable = find_executable().ok_or(BrowserError::ChromeMissing)?;

        if let Err(e) = tokio::fs::create_dir_all(&config.profile_dir).await {
            warn!("Could not create Chrome profile directory: {}", e);
        }

        let child = Command::new(&executable)
            .args(config.chrome_args())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(false)
            .spawn()
            .map_err(|e| BrowserError::Launch(format!("{}: {}", executable.display(), e)))?;
        info!(
            "Launched Chrome (pid {:?}) with profile {}",
            child.id(),
            config.profile_dir.display()
        );

        let endpoint = config.endpoint();
        for _ in 0..STARTUP_ATTEMPTS {
            tokio::time::sleep(STARTUP_POLL).await;
            if is_listening(&endpoint).await {
                return Ok(Self { child });
            }
        }

        let mut process = Self { child };
        process.kill().await;
        Err(BrowserError::NotListening(config.debug_port))
    }

    pub(crate) async fn kill(&mut self) {
        if let Err(e) = self.child.kill().await {
            warn!("Failed to stop Chrome: {}", e);
        }
    }
}
