use crate::pool::PoolSettings;
use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_LISTEN: &str = "127.0.0.1:1080";
pub const DEFAULT_PASSPHRASE_ENV: &str = "BURROW_KEY_PASSPHRASE";

/// Represents the whole configuration file. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BurrowConfig {
    pub server: ServerConfig,
    pub remote: RemoteConfig,
    pub pool: PoolConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// SOCKS5 listen address, e.g. "127.0.0.1:1080"
    pub listen: String,

    /// Optional pid file path
    pub pid_file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.to_string(),
            pid_file: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemoteConfig {
    /// `[user@]host[:port]`
    pub endpoint: Option<String>,

    /// Private key; defaults to `$HOME/.ssh/id_rsa`.
    pub identity_file: Option<PathBuf>,

    /// Defaults to `$HOME/.ssh/known_hosts`.
    pub known_hosts: Option<PathBuf>,

    /// Environment variable holding the key passphrase.
    pub passphrase_env: String,

    pub connect_timeout_ms: Option<u64>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            identity_file: None,
            known_hosts: None,
            passphrase_env: DEFAULT_PASSPHRASE_ENV.to_string(),
            connect_timeout_ms: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolConfig {
    pub size: usize,
    pub selector_buffer: Option<usize>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            size: 1,
            selector_buffer: None,
        }
    }
}

impl PoolConfig {
    pub fn settings(&self) -> PoolSettings {
        PoolSettings {
            size: self.size,
            selector_buffer: self.selector_buffer,
        }
    }
}

/// Values given on the command line; they win over the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub listen: Option<String>,
    pub pool_size: Option<usize>,
    pub endpoint: Option<String>,
}

impl BurrowConfig {
    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(listen) = overrides.listen {
            self.server.listen = listen;
        }
        if let Some(size) = overrides.pool_size {
            self.pool.size = size;
        }
        if let Some(endpoint) = overrides.endpoint {
            self.remote.endpoint = Some(endpoint);
        }
    }
}
