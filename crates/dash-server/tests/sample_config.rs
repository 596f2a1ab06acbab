//! The shipped sample configuration must load and validate.

use std::path::Path;

use dash_checker::AnalyzerConfig;
use dash_server::ServerConfig;

fn sample_path() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/server.toml")
}

#[test]
fn test_sample_config_loads_and_validates() {
    let config = ServerConfig::from_file(sample_path()).unwrap();
    config.validate().unwrap();

    assert_eq!(config.http.port, 5000);
    assert_eq!(config.websocket.port, 5001);
    assert_eq!(config.checker.current_user.as_deref(), Some("demo"));
    assert!(config.http.static_dir.is_none());
}

#[test]
fn test_sample_analyzer_args_match_defaults() {
    let config = ServerConfig::from_file(sample_path()).unwrap();
    assert_eq!(config.analyzer_config(), AnalyzerConfig::default());
}

#[test]
fn test_missing_file_is_an_error() {
    let result = ServerConfig::from_file("does/not/exist.toml");
    assert!(result.is_err());
}
