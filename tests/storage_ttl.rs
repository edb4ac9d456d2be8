use std::time::Duration;

use serde_json::{Value, json};
use yapee_store::storage::{
    Cipher, FileBackend, LocalStorage, MemoryBackend, StorageConfig, StorageError,
};

fn memory_storage() -> LocalStorage {
    LocalStorage::new(MemoryBackend::new(), Cipher::new("test-storage"))
}

#[tokio::test]
async fn expired_items_read_as_absent_and_are_removed() -> anyhow::Result<()> {
    let storage = memory_storage();
    storage.set_item_with(
        "flash",
        &"hello",
        StorageConfig::plain(Some(Duration::from_millis(10))),
    )?;
    assert_eq!(storage.get_item::<String>("flash")?.as_deref(), Some("hello"));

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(storage.get_item::<String>("flash")?, None);
    assert!(!storage.has_item("flash")?);
    Ok(())
}

#[tokio::test]
async fn cleanup_drops_only_expired_records() -> anyhow::Result<()> {
    let storage = memory_storage();
    storage.set_item_with("short", &1, StorageConfig::plain(Some(Duration::from_millis(5))))?;
    storage.set_item("search_history", &vec!["lamp"])?;

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(storage.cleanup_expired()?, 1);

    let stats = storage.stats()?;
    assert_eq!(stats.total_items, 1);
    assert_eq!(stats.items[0].key, "search_history");
    assert!(stats.items[0].has_expiry);
    Ok(())
}

#[test]
fn file_backend_survives_reopen() -> anyhow::Result<()> {
    let path = std::env::temp_dir().join(format!("yapee-storage-{}.json", uuid::Uuid::new_v4()));

    let storage = LocalStorage::new(FileBackend::open(&path)?, Cipher::new("file-secret"));
    storage.set_item("user", &json!({ "email": "lan@example.com" }))?;
    storage.set_item("theme", &"dark")?;
    drop(storage);

    let raw = std::fs::read_to_string(&path)?;
    assert!(!raw.contains("lan@example.com"));

    let reopened = LocalStorage::new(FileBackend::open(&path)?, Cipher::new("file-secret"));
    let user: Option<Value> = reopened.get_item("user")?;
    assert_eq!(user, Some(json!({ "email": "lan@example.com" })));
    assert_eq!(reopened.get_item::<String>("theme")?.as_deref(), Some("dark"));

    let wrong_key = LocalStorage::new(FileBackend::open(&path)?, Cipher::new("other-secret"));
    assert_eq!(wrong_key.get_item::<Value>("user")?, None);

    std::fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn tampered_sealed_value_reads_as_absent() -> anyhow::Result<()> {
    let storage = memory_storage();
    storage.set_item("session", &json!({ "token": "abc" }))?;

    let mut backup = storage.backup()?;
    let raw = backup["data"]["yapee_session"]
        .as_str()
        .expect("sealed session record")
        .to_string();
    let mut envelope: Value = serde_json::from_str(&raw)?;
    assert_eq!(envelope["encrypted"], json!(true));

    let sealed = envelope["value"].as_str().expect("sealed text").to_string();
    let flipped = if sealed.starts_with('A') { "B" } else { "A" };
    envelope["value"] = Value::String(format!("{flipped}{}", &sealed[1..]));
    backup["data"]["yapee_session"] = Value::String(envelope.to_string());

    assert_eq!(storage.restore(&backup)?, 1);
    assert_eq!(storage.get_item::<Value>("session")?, None);
    Ok(())
}

#[test]
fn restore_rejects_backups_without_data() {
    let storage = memory_storage();
    let err = storage.restore(&json!({ "version": 1 })).unwrap_err();
    assert!(matches!(err, StorageError::InvalidBackup(_)));
}
