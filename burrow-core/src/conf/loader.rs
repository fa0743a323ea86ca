use crate::conf::endpoint::RemoteEndpoint;
use crate::conf::error::ConfigError;
use crate::conf::types::{BurrowConfig, ConfigOverrides};
use crate::conf::validate::{MISSING_ENDPOINT, ValidationReport, validate_config};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;

/// Configuration that passed validation, with the derived values resolved.
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub config: BurrowConfig,
    pub listen: SocketAddr,
    pub endpoint: RemoteEndpoint,
    pub warnings: Vec<String>,
}

/// Load, merge and validate the configuration.
///
/// Without a file the built-in defaults are used; overrides from the command
/// line are applied before validation.
pub fn load_config(
    path: Option<&Path>,
    overrides: ConfigOverrides,
) -> Result<ValidatedConfig, ConfigError> {
    //--------------------------------------------------------------------------
    // Hard fail: IO and parsing
    //--------------------------------------------------------------------------
    let mut config = match path {
        Some(path) => parse_config(path)?,
        None => BurrowConfig::default(),
    };

    config.apply(overrides);

    //--------------------------------------------------------------------------
    // Semantic validation (aggregate all errors)
    //--------------------------------------------------------------------------
    let ValidationReport { errors, warnings } = validate_config(&config);
    if !errors.is_empty() {
        return Err(ConfigError::Validation { errors });
    }

    let listen = config
        .server
        .listen
        .parse()
        .map_err(|_| ConfigError::Validation {
            errors: vec![format!("invalid listen address '{}'", config.server.listen)],
        })?;

    let endpoint = match &config.remote.endpoint {
        Some(spec) => RemoteEndpoint::parse(spec)?,
        None => {
            return Err(ConfigError::Validation {
                errors: vec![MISSING_ENDPOINT.to_string()],
            });
        }
    };

    Ok(ValidatedConfig {
        config,
        listen,
        endpoint,
        warnings,
    })
}

pub fn parse_config(path: &Path) -> Result<BurrowConfig, ConfigError> {
    let src = fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
    parse_config_str(&src, path)
}

pub fn parse_config_str(src: &str, path: &Path) -> Result<BurrowConfig, ConfigError> {
    hcl::from_str(src).map_err(|e| ConfigError::parse(path, e))
}
