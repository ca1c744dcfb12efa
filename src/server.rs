//! Service wiring and startup for LeadFlow.

use std::sync::Arc;

use tracing::{error, info, warn};

use leadflow_api::{ApiServer, ApiState, ServerConfig};
use leadflow_browser_cdp::{CdpBrowser, CdpBrowserConfig, CdpFormDriver, CdpTargetManager, CrmLocation};
use leadflow_config::{Config, ConfigLoader, ConfigValidator};
use leadflow_lead_store_http::HttpLeadStore;
use leadflow_orchestrator::{EventHub, LeadSync, Orchestrator, OrchestratorConfig, RecoveryAction};
use leadflow_protocols::{AutomationSettings, LogSink};
use leadflow_storage::{FileKvStore, RunStorage};

pub(crate) type BoxError = Box<dyn std::error::Error>;

/// Load the config file, falling back to defaults when it does not exist.
pub(crate) fn load_config(path: &std::path::Path) -> Result<Config, BoxError> {
    let config = ConfigLoader::load_or_default(path)?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Log validation findings; fail when the config has errors.
pub(crate) fn validate_config(config: &Config) -> Result<(), BoxError> {
    let result = ConfigValidator::validate(config);
    for warning in &result.warnings {
        warn!("Config warning at {}: {}", warning.path, warning.message);
    }
    for err in &result.errors {
        error!("Config error at {}: {}", err.path, err.message);
    }
    if !result.is_valid() {
        return Err(format!("Configuration has {} error(s)", result.errors.len()).into());
    }
    Ok(())
}

/// Open the durable run storage and seed the settings record on first use.
pub(crate) async fn open_storage(
    config: &Config,
) -> Result<(Arc<RunStorage>, AutomationSettings), BoxError> {
    let data_dir = config.storage.resolved_data_dir();
    let kv = FileKvStore::new(&data_dir).await?;
    info!("Run storage at {}", data_dir.display());

    let storage = Arc::new(RunStorage::new(Arc::new(kv)).with_log_capacity(config.automation.log_capacity));
    let settings = storage.seed_settings(config.initial_settings()).await?;
    Ok((storage, settings))
}

/// HTTP Lead Store pointed at the persisted endpoint.
///
/// The persisted settings win over the config file once seeded.
pub(crate) fn open_lead_store(
    config: &Config,
    settings: &AutomationSettings,
) -> Result<Arc<HttpLeadStore>, BoxError> {
    let store = HttpLeadStore::new(config.lead_store.timeout())?.with_endpoint(&settings.api_url)?;
    if store.endpoint().is_none() {
        warn!("Lead store endpoint is not configured");
    }
    Ok(Arc::new(store))
}

fn orchestrator_config(config: &Config) -> OrchestratorConfig {
    let automation = &config.automation;
    OrchestratorConfig::default()
        .with_fill_timeout(automation.fill_timeout())
        .with_init_timeout(automation.init_timeout())
        .with_staleness_threshold(automation.staleness_threshold())
        .with_heartbeat_interval(automation.heartbeat_interval())
}

fn browser_config(config: &Config) -> CdpBrowserConfig {
    CdpBrowserConfig {
        debug_port: config.browser.debug_port,
        profile_dir: config.browser.resolved_profile_dir(),
        headless: config.browser.headless,
    }
}

fn crm_location(config: &Config) -> CrmLocation {
    CrmLocation {
        origin: config.crm.origin.clone(),
        entry_path: config.crm.entry_path.clone(),
        settle_delay: config.crm.settle_delay(),
    }
}

async fn form_driver(
    config: &Config,
    browser: Arc<CdpBrowser>,
    sink: Arc<dyn LogSink>,
) -> Result<CdpFormDriver, BoxError> {
    let driver = CdpFormDriver::new(browser).with_log_sink(sink);
    match config.browser.resolved_driver_script() {
        Some(path) => {
            let source = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| format!("Failed to read driver script {}: {}", path.display(), e))?;
            info!("Loaded driver script from {}", path.display());
            Ok(driver.with_agent_script(source))
        }
        None => {
            warn!("No driver script configured; the CRM page must host the driver agent");
            Ok(driver)
        }
    }
}

/// Run the automation service in foreground until Ctrl-C.
pub(crate) async fn run_server(config: Config, server: ServerConfig) -> Result<(), BoxError> {
    info!("Starting LeadFlow v{}", env!("CARGO_PKG_VERSION"));
    validate_config(&config)?;

    let (storage, settings) = open_storage(&config).await?;
    let lead_store = open_lead_store(&config, &settings)?;

    let orch_config = orchestrator_config(&config);
    let events = Arc::new(EventHub::new(storage.clone(), orch_config.event_capacity));

    let browser = Arc::new(CdpBrowser::new(browser_config(&config)));
    let targets = Arc::new(CdpTargetManager::new(browser.clone(), crm_location(&config)));
    let driver = Arc::new(form_driver(&config, browser.clone(), events.clone()).await?);
    info!("CRM at {}", config.crm.entry_url());

    let orchestrator = Orchestrator::new(
        storage.clone(),
        events.clone(),
        targets,
        driver,
        lead_store.clone(),
        orch_config,
    );

    match orchestrator.recover().await {
        Ok(RecoveryAction::NothingToRecover) => {}
        Ok(action) => info!("Recovery: {:?}", action),
        Err(e) => error!("Failed to recover previous run: {}", e),
    }

    let lead_sync = Arc::new(LeadSync::new(
        lead_store,
        storage,
        events,
        config.automation.sync_interval(),
    ));
    let sync_task = lead_sync.spawn();

    let api = ApiServer::new(server, Arc::new(ApiState::new(orchestrator.clone())));
    info!("Control API at http://{}", api.addr());

    let result = api
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
                return;
            }
            info!("Shutdown signal received");
        })
        .await;

    orchestrator.shutdown();
    lead_sync.stop();
    let _ = sync_task.await;
    browser.shutdown().await;
    info!("LeadFlow stopped");

    result.map_err(|e| e as BoxError)
}
