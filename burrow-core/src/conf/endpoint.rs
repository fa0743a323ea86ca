use crate::conf::error::ConfigError;
use std::fmt;
use url::Url;

pub const DEFAULT_SSH_PORT: u16 = 22;

/// SSH server to tunnel through, written `[user@]host[:port]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEndpoint {
    pub user: Option<String>,
    pub host: String,
    pub port: u16,
}

impl RemoteEndpoint {
    pub fn parse(spec: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(&format!("ssh://{spec}"))
            .map_err(|e| ConfigError::invalid_endpoint(spec, e.to_string()))?;

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| ConfigError::invalid_endpoint(spec, "missing host"))?;

        if !matches!(url.path(), "" | "/") || url.query().is_some() {
            return Err(ConfigError::invalid_endpoint(
                spec,
                "expected [user@]host[:port]",
            ));
        }

        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host)
            .to_string();

        let user = Some(url.username())
            .filter(|u| !u.is_empty())
            .map(str::to_string);

        Ok(Self {
            user,
            host,
            port: url.port().unwrap_or(DEFAULT_SSH_PORT),
        })
    }

    /// Login name, falling back to `$USER`.
    pub fn user_or_default(&self) -> Option<String> {
        self.user
            .clone()
            .or_else(|| std::env::var("USER").ok().filter(|u| !u.is_empty()))
    }
}

impl fmt::Display for RemoteEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(user) = &self.user {
            write!(f, "{user}@")?;
        }
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}
