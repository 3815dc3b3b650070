use std::collections::VecDeque;

use redis_relay::{
    config::ServerConfig,
    key_value_store::{now_ms, DataType, Value},
    rdb::encode_snapshot,
    server::RedisServer,
};

fn snapshot_config(dir: &tempfile::TempDir, dbfilename: &str) -> ServerConfig {
    ServerConfig {
        port: 0,
        dir: dir.path().to_string_lossy().into_owned(),
        dbfilename: dbfilename.to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_server_loads_snapshot_on_startup() {
    let dir = tempfile::tempdir().unwrap();

    let entries = vec![
        (
            "fruit".to_string(),
            Value::new(DataType::String("mango".into())),
        ),
        (
            "queue".to_string(),
            Value::new(DataType::List(VecDeque::from(vec![
                "a".to_string(),
                "b".to_string(),
            ]))),
        ),
        (
            "session".to_string(),
            Value::with_expiration(DataType::String("live".into()), Some(now_ms() + 60_000)),
        ),
        (
            "stale".to_string(),
            Value::with_expiration(DataType::String("gone".into()), Some(now_ms() - 1_000)),
        ),
    ];
    std::fs::write(dir.path().join("dump.rdb"), encode_snapshot(&entries)).unwrap();

    let server = RedisServer::bind(snapshot_config(&dir, "dump.rdb")).await.unwrap();
    let store = &server.state().store;

    assert_eq!(
        store.get("fruit").await,
        Some(DataType::String("mango".into()))
    );
    assert_eq!(
        store.get("queue").await,
        Some(DataType::List(VecDeque::from(vec![
            "a".to_string(),
            "b".to_string()
        ])))
    );
    assert_eq!(
        store.get("session").await,
        Some(DataType::String("live".into()))
    );
    assert_eq!(store.get("stale").await, None);

    let mut keys = store.keys("*").await;
    keys.sort();
    assert_eq!(keys, vec!["fruit", "queue", "session"]);

    server.state().shutdown().await;
}

#[tokio::test]
async fn test_server_starts_empty_without_snapshot() {
    let dir = tempfile::tempdir().unwrap();

    let server = RedisServer::bind(snapshot_config(&dir, "missing.rdb")).await.unwrap();

    assert!(server.state().store.keys("*").await.is_empty());
    server.state().shutdown().await;
}

#[tokio::test]
async fn test_server_starts_empty_with_corrupt_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("dump.rdb"), b"not a snapshot").unwrap();

    let server = RedisServer::bind(snapshot_config(&dir, "dump.rdb")).await.unwrap();

    assert!(server.state().store.keys("*").await.is_empty());
    server.state().shutdown().await;
}
