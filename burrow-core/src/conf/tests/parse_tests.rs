use crate::conf::{ConfigError, parse_config, parse_config_str};
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};

#[test]
fn parse_full_config() {
    // Arrange
    let src = r#"
server {
  listen   = "0.0.0.0:1081"
  pid_file = "/tmp/burrow.pid"
}

remote {
  endpoint           = "tunnel@bastion.example.com:2222"
  identity_file      = "/home/tunnel/.ssh/id_ed25519"
  passphrase_env     = "TUNNEL_PASSPHRASE"
  connect_timeout_ms = 5000
}

pool {
  size            = 4
  selector_buffer = 16
}
"#;

    // Act
    let cfg = parse_config_str(src, Path::new("burrow.hcl")).unwrap();

    // Assert
    assert_eq!(cfg.server.listen, "0.0.0.0:1081");
    assert_eq!(cfg.server.pid_file, Some(PathBuf::from("/tmp/burrow.pid")));
    assert_eq!(
        cfg.remote.endpoint.as_deref(),
        Some("tunnel@bastion.example.com:2222")
    );
    assert_eq!(
        cfg.remote.identity_file,
        Some(PathBuf::from("/home/tunnel/.ssh/id_ed25519"))
    );
    assert_eq!(cfg.remote.passphrase_env, "TUNNEL_PASSPHRASE");
    assert_eq!(cfg.remote.connect_timeout_ms, Some(5000));
    assert_eq!(cfg.pool.size, 4);
    assert_eq!(cfg.pool.selector_buffer, Some(16));
}

#[test]
fn missing_sections_fall_back_to_defaults() {
    // Arrange
    let src = r#"
remote {
  endpoint = "bastion"
}
"#;

    // Act
    let cfg = parse_config_str(src, Path::new("burrow.hcl")).unwrap();

    // Assert
    assert_eq!(cfg.server.listen, "127.0.0.1:1080");
    assert_eq!(cfg.server.pid_file, None);
    assert_eq!(cfg.remote.passphrase_env, "BURROW_KEY_PASSPHRASE");
    assert_eq!(cfg.pool.size, 1);
    assert_eq!(cfg.pool.selector_buffer, None);
}

#[test]
fn unknown_fields_are_rejected() {
    // Arrange
    let src = r#"
pool {
  size  = 2
  sizes = 3
}
"#;

    // Act
    let result = parse_config_str(src, Path::new("burrow.hcl"));

    // Assert
    assert!(matches!(result, Err(ConfigError::Parse { .. })));
}

#[test]
fn missing_file_is_a_read_error() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.hcl");

    // Act
    let result = parse_config(&path);

    // Assert
    match result {
        Err(ConfigError::ReadFile { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected ReadFile error, got {other:?}"),
    }
}
