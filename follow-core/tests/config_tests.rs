use follow_core::{AppConfig, FeedViewType};

fn temp_dir(name: &str) -> std::path::PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!(
        "follow_{name}_{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    dir
}

#[test]
fn config_round_trips_through_disk() {
    let dir = temp_dir("config");
    let path = dir.join("config.json");

    let mut config = AppConfig::default();
    config.api.base_url = "http://localhost:3000".into();
    config.optimistic.rollback_on_failure = false;
    config.refresh.view = Some(FeedViewType::Pictures);
    config.save_to(&path).unwrap();

    let loaded = AppConfig::load_from(&path).unwrap();
    assert_eq!(loaded.api.base_url, "http://localhost:3000");
    assert!(!loaded.optimistic.rollback_on_failure);
    assert_eq!(loaded.refresh.view, Some(FeedViewType::Pictures));
    assert!(!path.with_extension("json.tmp").exists());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn partial_config_fills_in_defaults() {
    let dir = temp_dir("partial");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.json");
    std::fs::write(&path, r#"{ "eagle": { "endpoint": "http://localhost:1" } }"#).unwrap();

    let loaded = AppConfig::load_from(&path).unwrap();
    assert_eq!(loaded.eagle.endpoint, "http://localhost:1");
    assert_eq!(loaded.eagle.probe_timeout_ms, 1500);
    assert!(loaded.optimistic.rollback_on_failure);
    assert_eq!(loaded.api.request_timeout_seconds, 10);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn corrupted_config_is_an_error() {
    let dir = temp_dir("corrupt");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.json");
    std::fs::write(&path, b"{ this is not json ").unwrap();

    assert!(AppConfig::load_from(&path).is_err());
    assert!(AppConfig::load_from(dir.join("missing.json")).is_err());

    let _ = std::fs::remove_dir_all(&dir);
}
