//! SSH transport built on russh: one authenticated session per connection,
//! one `direct-tcpip` channel per stream.

use crate::transport::{
    Connector, TransportError, TransportErrorKind, TunnelConnection, TunnelIo, split_host_port,
};
use async_trait::async_trait;
use russh::{ChannelOpenFailure, client};
use russh_keys::key;
use std::error::Error;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// Fully resolved settings for reaching one SSH server.
#[derive(Debug, Clone)]
pub struct SshSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub identity_file: PathBuf,
    pub passphrase: Option<String>,
    pub known_hosts: PathBuf,
    pub connect_timeout: Option<Duration>,
}

pub struct SshConnector {
    settings: SshSettings,
    key: Arc<key::KeyPair>,
    config: Arc<client::Config>,
}

impl SshConnector {
    /// Load the private key up front so a bad key fails at startup, not per dial.
    pub fn new(settings: SshSettings) -> Result<Self, TransportError> {
        let key =
            russh_keys::load_secret_key(&settings.identity_file, settings.passphrase.as_deref())
                .map_err(|e| {
                    TransportError::with_source(
                        format!("failed to load identity {}", settings.identity_file.display()),
                        e,
                    )
                })?;

        let config = client::Config {
            inactivity_timeout: None,
            keepalive_interval: Some(KEEPALIVE_INTERVAL),
            ..Default::default()
        };

        Ok(Self {
            settings,
            key: Arc::new(key),
            config: Arc::new(config),
        })
    }

    async fn establish(&self) -> Result<SshConnection, TransportError> {
        let s = &self.settings;
        let (alive, closed) = watch::channel(());
        let handler = SessionHandler {
            host: s.host.clone(),
            port: s.port,
            known_hosts: s.known_hosts.clone(),
            _alive: alive,
        };

        let mut handle = client::connect(self.config.clone(), (s.host.as_str(), s.port), handler)
            .await
            .map_err(|e| {
                TransportError::with_source(
                    format!("ssh connect to {}:{} failed", s.host, s.port),
                    e,
                )
            })?;

        let authenticated = handle
            .authenticate_publickey(s.user.clone(), self.key.clone())
            .await
            .map_err(|e| TransportError::with_source("ssh authentication failed", e))?;

        if !authenticated {
            return Err(TransportError::new(format!(
                "ssh server rejected public key for user {}",
                s.user
            )));
        }

        debug!(host = %s.host, port = s.port, user = %s.user, "ssh session authenticated");

        Ok(SshConnection { handle, closed })
    }
}

#[async_trait]
impl Connector for SshConnector {
    type Connection = SshConnection;

    async fn connect(&self) -> Result<SshConnection, TransportError> {
        match self.settings.connect_timeout {
            Some(limit) => tokio::time::timeout(limit, self.establish())
                .await
                .map_err(|_| {
                    TransportError::new(format!("ssh connect timed out after {limit:?}"))
                })?,
            None => self.establish().await,
        }
    }
}

/// Classify a failed `direct-tcpip` open.
///
/// The server only reports `ConnectFailed` for any dial failure on its side,
/// so refused and unreachable destinations cannot be told apart.
fn open_failure_kind(err: &russh::Error) -> TransportErrorKind {
    match err {
        russh::Error::ChannelOpenFailure(ChannelOpenFailure::ConnectFailed) => {
            TransportErrorKind::HostUnreachable
        }
        russh::Error::ChannelOpenFailure(ChannelOpenFailure::AdministrativelyProhibited) => {
            TransportErrorKind::NotAllowed
        }
        russh::Error::IO(io) => io.kind().into(),
        _ => TransportErrorKind::Other,
    }
}

/// True when the identity could not be loaded because it needs a passphrase.
pub fn key_needs_passphrase(err: &TransportError) -> bool {
    err.source()
        .and_then(|source| source.downcast_ref::<russh_keys::Error>())
        .is_some_and(|e| matches!(e, russh_keys::Error::KeyIsEncrypted))
}

/// Client-side session callbacks.
///
/// Owned by the russh session task; dropping it when the session ends
/// closes the `watch` channel the connection listens on.
struct SessionHandler {
    host: String,
    port: u16,
    known_hosts: PathBuf,
    _alive: watch::Sender<()>,
}

#[async_trait]
impl client::Handler for SessionHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &key::PublicKey,
    ) -> Result<bool, Self::Error> {
        match russh_keys::check_known_hosts_path(
            &self.host,
            self.port,
            server_public_key,
            &self.known_hosts,
        ) {
            Ok(true) => Ok(true),
            Ok(false) => {
                warn!(
                    host = %self.host,
                    port = self.port,
                    known_hosts = %self.known_hosts.display(),
                    "ssh host key not found in known_hosts"
                );
                Ok(false)
            }
            Err(e) => {
                warn!(host = %self.host, port = self.port, error = %e, "ssh host key check failed");
                Ok(false)
            }
        }
    }
}

/// Authenticated session. Channel opens take `&self`, so any number of
/// streams can be opened on it at the same time.
pub struct SshConnection {
    handle: client::Handle<SessionHandler>,
    closed: watch::Receiver<()>,
}

#[async_trait]
impl TunnelConnection for SshConnection {
    type Stream = Pin<Box<dyn TunnelIo>>;

    async fn open_stream(&self, address: &str) -> Result<Self::Stream, TransportError> {
        let (host, port) = split_host_port(address)?;

        let channel = self
            .handle
            .channel_open_direct_tcpip(host, u32::from(port), "127.0.0.1", 0)
            .await
            .map_err(|e| {
                let kind = open_failure_kind(&e);
                TransportError::with_source(format!("direct-tcpip to {address}"), e)
                    .with_kind(kind)
            })?;

        Ok(Box::pin(channel.into_stream()))
    }

    async fn wait_for_death(&self) -> TransportError {
        let mut closed = self.closed.clone();
        while closed.changed().await.is_ok() {}
        TransportError::new("ssh session closed")
    }
}
