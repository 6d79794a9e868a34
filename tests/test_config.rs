use std::path::PathBuf;
use warden::config::{CONFIG_ENV, Config, DEFAULT_CONFIG_PATH};

const VALID: &str = r#"{
    "host": "127.0.0.1",
    "port": 8080,
    "admin_port": 8081,
    "document_root": "./www",
    "max_threads": 16,
    "log_file": "server.log"
}"#;

fn without(field: &str) -> String {
    let mut value: serde_json::Value = serde_json::from_str(VALID).unwrap();
    value.as_object_mut().unwrap().remove(field);
    value.to_string()
}

fn with(field: &str, v: serde_json::Value) -> String {
    let mut value: serde_json::Value = serde_json::from_str(VALID).unwrap();
    value.as_object_mut().unwrap().insert(field.to_string(), v);
    value.to_string()
}

#[test]
fn test_config_valid_json() {
    let cfg = Config::from_json(VALID).unwrap();

    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.admin_port, 8081);
    assert_eq!(cfg.document_root, PathBuf::from("./www"));
    assert_eq!(cfg.max_threads, 16);
    assert_eq!(cfg.log_file, PathBuf::from("server.log"));
    assert_eq!(cfg.address(), "127.0.0.1:8080");
    assert_eq!(cfg.admin_address(), "127.0.0.1:8081");
}

#[test]
fn test_config_defaults_for_optional_fields() {
    let cfg = Config::from_json(VALID).unwrap();

    assert_eq!(cfg.read_timeout_secs, 10);
    assert_eq!(cfg.write_timeout_secs, 10);
    assert_eq!(cfg.stats_interval_secs, 60);
    assert_eq!(cfg.admin_username, "admin");
    assert_eq!(cfg.admin_password, "adminpass");
    assert!(cfg.server_name.starts_with("warden/"));
}

#[test]
fn test_config_every_required_field_is_required() {
    for field in ["host", "port", "admin_port", "document_root", "max_threads", "log_file"] {
        assert!(
            Config::from_json(&without(field)).is_err(),
            "config without {} was accepted",
            field
        );
    }
}

#[test]
fn test_config_rejects_zero_and_empty_values() {
    let cases = [
        ("host", serde_json::json!("")),
        ("port", serde_json::json!(0)),
        ("admin_port", serde_json::json!(0)),
        ("document_root", serde_json::json!("")),
        ("max_threads", serde_json::json!(0)),
        ("log_file", serde_json::json!("")),
        ("read_timeout_secs", serde_json::json!(0)),
        ("stats_interval_secs", serde_json::json!(0)),
    ];

    for (field, value) in cases {
        let err = Config::from_json(&with(field, value)).unwrap_err();
        assert!(
            format!("{:#}", err).contains(field.split('_').next().unwrap()),
            "error for {} does not name it: {:#}",
            field,
            err
        );
    }
}

#[test]
fn test_config_rejects_invalid_json() {
    assert!(Config::from_json("{ not json").is_err());
    assert!(Config::from_json(&with("port", serde_json::json!("eighty"))).is_err());
}

#[test]
fn test_config_yaml() {
    let cfg = Config::from_yaml(
        "host: 0.0.0.0\nport: 80\nadmin_port: 9000\ndocument_root: /srv/www\nmax_threads: 2\nlog_file: /var/log/warden.log\nadmin_password: s3cret\n",
    )
    .unwrap();

    assert_eq!(cfg.address(), "0.0.0.0:80");
    assert_eq!(cfg.admin_password, "s3cret");
}

#[test]
fn test_config_load_from_files() {
    let dir = tempfile::tempdir().unwrap();
    let json = dir.path().join("config.json");
    let yaml = dir.path().join("config.yml");
    std::fs::write(&json, VALID).unwrap();
    std::fs::write(
        &yaml,
        "host: localhost\nport: 1\nadmin_port: 2\ndocument_root: www\nmax_threads: 3\nlog_file: l.log\n",
    )
    .unwrap();

    assert_eq!(Config::load(&json).unwrap().port, 8080);
    assert_eq!(Config::load(&yaml).unwrap().max_threads, 3);
}

#[test]
fn test_config_missing_file_names_path() {
    let err = Config::load("/nonexistent/warden.json").unwrap_err();

    assert!(format!("{:#}", err).contains("/nonexistent/warden.json"));
}

#[test]
fn test_config_path_resolution() {
    let from_arg = Config::path_from_args(vec!["custom.json".to_string()].into_iter());
    assert_eq!(from_arg, PathBuf::from("custom.json"));

    unsafe {
        std::env::set_var(CONFIG_ENV, "/etc/warden.yaml");
    }
    assert_eq!(
        Config::path_from_args(std::iter::empty()),
        PathBuf::from("/etc/warden.yaml")
    );

    unsafe {
        std::env::remove_var(CONFIG_ENV);
    }
    assert_eq!(
        Config::path_from_args(std::iter::empty()),
        PathBuf::from(DEFAULT_CONFIG_PATH)
    );
}

#[test]
fn test_config_clone() {
    let cfg1 = Config::from_json(VALID).unwrap();
    let cfg2 = cfg1.clone();

    assert_eq!(cfg1.address(), cfg2.address());
}
