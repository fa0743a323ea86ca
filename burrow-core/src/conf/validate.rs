use crate::conf::endpoint::RemoteEndpoint;
use crate::conf::types::{BurrowConfig, PoolConfig, RemoteConfig, ServerConfig};
use std::net::SocketAddr;

pub const MAX_POOL_SIZE: usize = 1024;

pub(crate) const MISSING_ENDPOINT: &str = "remote endpoint is required";

/// OpenSSH's default `MaxStartups` begins refusing at 10 concurrent handshakes.
const SSHD_DEFAULT_MAX_STARTUPS: usize = 10;

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn has_violations(&self) -> bool {
        !self.errors.is_empty() || !self.warnings.is_empty()
    }

    pub(crate) fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub(crate) fn warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

/// Run every validator, collecting all problems instead of stopping at the first.
pub fn validate_config(cfg: &BurrowConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_server(&cfg.server, &mut report);
    validate_remote(&cfg.remote, &mut report);
    validate_pool(&cfg.pool, &mut report);
    report
}

pub fn validate_server(cfg: &ServerConfig, report: &mut ValidationReport) {
    if cfg.listen.parse::<SocketAddr>().is_err() {
        report.error(format!(
            "invalid listen address '{}' - expected ip:port",
            cfg.listen
        ));
    }

    if let Some(pid_file) = &cfg.pid_file {
        let Some(parent) = pid_file.parent().filter(|p| !p.as_os_str().is_empty()) else {
            return;
        };

        if !parent.exists() {
            report.error(format!(
                "invalid pid file - parent directory does not exist: {}",
                pid_file.display()
            ));
        } else if !parent.is_dir() {
            report.error(format!(
                "invalid pid file - parent path exists but is not a directory: {}",
                pid_file.display()
            ));
        }
    }
}

pub fn validate_remote(cfg: &RemoteConfig, report: &mut ValidationReport) {
    match &cfg.endpoint {
        None => report.error(MISSING_ENDPOINT),
        Some(endpoint) => {
            if let Err(e) = RemoteEndpoint::parse(endpoint) {
                report.error(e.to_string());
            }
        }
    }

    if let Some(identity) = &cfg.identity_file {
        if !identity.is_file() {
            report.error(format!(
                "invalid identity file - file does not exist: {}",
                identity.display()
            ));
        }
    }

    if cfg.connect_timeout_ms == Some(0) {
        report.error("remote connect_timeout_ms must be greater than zero");
    }

    if cfg.passphrase_env.trim().is_empty() {
        report.error("remote passphrase_env must not be empty");
    }
}

pub fn validate_pool(cfg: &PoolConfig, report: &mut ValidationReport) {
    if cfg.size == 0 || cfg.size > MAX_POOL_SIZE {
        report.error(format!(
            "invalid pool size {} - must be between 1 and {MAX_POOL_SIZE}",
            cfg.size
        ));
    } else if cfg.size > SSHD_DEFAULT_MAX_STARTUPS {
        report.warning(format!(
            "pool size {} exceeds the default sshd MaxStartups ({SSHD_DEFAULT_MAX_STARTUPS}); \
             concurrent handshakes may be refused",
            cfg.size
        ));
    }

    if cfg.selector_buffer == Some(0) {
        report.error("pool selector_buffer must be at least 1");
    }
}
