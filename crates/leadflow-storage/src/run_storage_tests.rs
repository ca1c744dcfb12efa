use super::*;
use crate::kv::{FileKvStore, MemoryKvStore};
use chrono::Utc;
use leadflow_protocols::LogLevel;
use serde_json::json;
use tempfile::TempDir;

fn memory_storage() -> RunStorage {
    RunStorage::new(Arc::new(MemoryKvStore::new()))
}

#[tokio::test]
async fn test_load_state_defaults_to_idle() {
    let storage = memory_storage();
    let state = storage.load_state().await.unwrap();
    assert_eq!(state, RunState::default());
}

#[tokio::test]
async fn test_update_state_patches_and_persists() {
    let storage = memory_storage();
    storage.save_state(&RunState::begin(3, Utc::now())).await.unwrap();

    let (state, advanced) = storage
        .update_state(|s| {
            s.record_outcome(true, Utc::now());
            true
        })
        .await
        .unwrap();

    assert!(advanced);
    assert_eq!(state.current_lead_index, 1);
    assert_eq!(storage.load_state().await.unwrap(), state);
}

#[tokio::test]
async fn test_concurrent_patches_do_not_lose_updates() {
    let storage = Arc::new(memory_storage());
    storage.save_state(&RunState::begin(50, Utc::now())).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..50 {
        let storage = storage.clone();
        handles.push(tokio::spawn(async move {
            storage
                .update_state(|s| s.record_outcome(false, Utc::now()))
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let state = storage.load_state().await.unwrap();
    assert_eq!(state.current_lead_index, 50);
    assert_eq!(state.failed_count, 50);
    assert!(state.is_consistent());
}

#[tokio::test]
async fn test_corrupt_state_is_reported() {
    let kv = Arc::new(MemoryKvStore::new());
    kv.set("automation_state", &json!({"currentLeadIndex": "three"}))
        .await
        .unwrap();
    let storage = RunStorage::new(kv);

    let result = storage.load_state().await;
    assert!(matches!(result, Err(StorageError::Corrupt { .. })));

    // Saving a fresh record recovers
    storage.save_state(&RunState::default()).await.unwrap();
    assert!(storage.load_state().await.is_ok());
}

#[tokio::test]
async fn test_lead_queue_round_trip() {
    let storage = memory_storage();
    assert!(storage.load_leads().await.unwrap().is_empty());

    let leads = vec![
        LeadRecord::new(2, "Jane", "Citizen"),
        LeadRecord::new(3, "John", "Smith"),
    ];
    storage.save_leads(&leads).await.unwrap();
    assert_eq!(storage.load_leads().await.unwrap(), leads);

    storage.clear_leads().await.unwrap();
    assert!(storage.load_leads().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_log_is_fifo_trimmed() {
    let storage = memory_storage().with_log_capacity(3);
    for i in 0..5 {
        storage
            .append_log(LogEntry::new(LogLevel::Info, format!("entry {}", i)))
            .await
            .unwrap();
    }

    let logs = storage.logs().await.unwrap();
    assert_eq!(logs.len(), 3);
    assert_eq!(logs[0].message, "entry 2");
    assert_eq!(logs[2].message, "entry 4");
}

#[tokio::test]
async fn test_default_log_capacity() {
    let storage = memory_storage();
    for i in 0..(DEFAULT_LOG_CAPACITY + 10) {
        storage
            .append_log(LogEntry::new(LogLevel::Info, format!("entry {}", i)))
            .await
            .unwrap();
    }
    let logs = storage.logs().await.unwrap();
    assert_eq!(logs.len(), DEFAULT_LOG_CAPACITY);
    assert_eq!(logs[0].message, "entry 10");

    storage.clear_logs().await.unwrap();
    assert!(storage.logs().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_seed_settings_only_once() {
    let storage = memory_storage();
    let first = AutomationSettings {
        api_url: "https://first".to_string(),
        ..Default::default()
    };
    let seeded = storage.seed_settings(first.clone()).await.unwrap();
    assert_eq!(seeded, first);

    let second = AutomationSettings {
        api_url: "https://second".to_string(),
        ..Default::default()
    };
    let kept = storage.seed_settings(second).await.unwrap();
    assert_eq!(kept.api_url, "https://first");
}

#[tokio::test]
async fn test_update_settings_merges_patch() {
    let storage = memory_storage();
    assert!(storage.load_settings().await.unwrap().is_none());

    let patch = SettingsPatch {
        batch_delay_ms: Some(250),
        ..Default::default()
    };
    let settings = storage.update_settings(&patch).await.unwrap();
    assert_eq!(settings.batch_delay_ms, 250);
    assert_eq!(settings.retry_attempts, 3);
    assert_eq!(storage.settings().await.unwrap(), settings);
}

#[tokio::test]
async fn test_file_backed_state_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    let state = RunState::begin(4, Utc::now());
    {
        let kv = Arc::new(FileKvStore::new(temp_dir.path()).await.unwrap());
        let storage = RunStorage::new(kv);
        storage.save_state(&state).await.unwrap();
        storage
            .save_leads(&[LeadRecord::new(2, "Jane", "Citizen")])
            .await
            .unwrap();
    }

    let kv = Arc::new(FileKvStore::new(temp_dir.path()).await.unwrap());
    let storage = RunStorage::new(kv);
    assert_eq!(storage.load_state().await.unwrap(), state);
    assert_eq!(storage.load_leads().await.unwrap().len(), 1);
}
