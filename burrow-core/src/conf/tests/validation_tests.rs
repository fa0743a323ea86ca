use crate::conf::types::{BurrowConfig, PoolConfig, RemoteConfig, ServerConfig};
use crate::conf::{ValidationReport, validate_config};
use pretty_assertions::assert_eq;

fn valid_config() -> BurrowConfig {
    BurrowConfig {
        remote: RemoteConfig {
            endpoint: Some("tunnel@bastion:22".to_string()),
            ..Default::default()
        },
        ..Default::default()
    }
}

#[test]
fn validate_minimum_config() {
    // Arrange
    let cfg = valid_config();

    // Act
    let report = validate_config(&cfg);

    // Assert
    assert!(!report.has_violations());
}

#[test]
fn validation_collects_every_error() {
    // Arrange
    let cfg = BurrowConfig {
        server: ServerConfig {
            listen: "localhost".to_string(),
            pid_file: Some("/definitely/not/here/burrow.pid".into()),
        },
        remote: RemoteConfig {
            endpoint: None,
            connect_timeout_ms: Some(0),
            ..Default::default()
        },
        pool: PoolConfig {
            size: 0,
            selector_buffer: Some(0),
        },
    };

    // Act
    let ValidationReport { errors, warnings } = validate_config(&cfg);

    // Assert
    assert_eq!(errors.len(), 6, "{errors:#?}");
    assert!(warnings.is_empty());
    assert!(errors.iter().any(|e| e.contains("listen address")));
    assert!(errors.iter().any(|e| e.contains("pid file")));
    assert!(errors.iter().any(|e| e.contains("endpoint is required")));
    assert!(errors.iter().any(|e| e.contains("connect_timeout_ms")));
    assert!(errors.iter().any(|e| e.contains("pool size 0")));
    assert!(errors.iter().any(|e| e.contains("selector_buffer")));
}

#[test]
fn oversized_pool_is_an_error() {
    // Arrange
    let mut cfg = valid_config();
    cfg.pool.size = 1025;

    // Act
    let report = validate_config(&cfg);

    // Assert
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("between 1 and 1024"));
}

#[test]
fn large_pool_only_warns() {
    // Arrange
    let mut cfg = valid_config();
    cfg.pool.size = 32;

    // Act
    let report = validate_config(&cfg);

    // Assert
    assert!(report.errors.is_empty());
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("MaxStartups"));
}

#[test]
fn malformed_endpoint_is_reported() {
    // Arrange
    let mut cfg = valid_config();
    cfg.remote.endpoint = Some("bastion:not-a-port".to_string());

    // Act
    let report = validate_config(&cfg);

    // Assert
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("bastion:not-a-port"));
}

#[test]
fn missing_identity_file_is_reported() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = valid_config();
    cfg.remote.identity_file = Some(dir.path().join("id_missing"));

    // Act
    let report = validate_config(&cfg);

    // Assert
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("identity file"));
}
