mod endpoint;
mod error;
mod loader;
pub mod types;
mod validate;

pub use endpoint::{DEFAULT_SSH_PORT, RemoteEndpoint};
pub use error::ConfigError;
pub use loader::{ValidatedConfig, load_config, parse_config, parse_config_str};
pub use types::{BurrowConfig, ConfigOverrides, PoolConfig, RemoteConfig, ServerConfig};
pub use validate::{MAX_POOL_SIZE, ValidationReport, validate_config};
