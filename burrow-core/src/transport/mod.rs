//! Boundary to the secure tunnel transport.
//!
//! The pool only needs three capabilities from a transport: establish a
//! connection, open a logical stream over it, and wait for it to die.
//! Everything else (authentication, host key checks, channel framing) lives
//! behind these traits.

mod error;
#[cfg(feature = "ssh")]
pub mod ssh;

pub use error::{TransportError, TransportErrorKind};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

/// Establishes tunnel connections to a single remote endpoint.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Connection: TunnelConnection;

    async fn connect(&self) -> Result<Self::Connection, TransportError>;
}

/// One live tunnel, able to carry any number of concurrent streams.
#[async_trait]
pub trait TunnelConnection: Send + Sync + 'static {
    type Stream: Send + 'static;

    /// Open a logical stream to `address` (`host:port`) through the tunnel.
    async fn open_stream(&self, address: &str) -> Result<Self::Stream, TransportError>;

    /// Resolve once the connection is no longer usable, with the reason.
    async fn wait_for_death(&self) -> TransportError;
}

/// Byte stream carried inside a tunnel.
pub trait TunnelIo: AsyncRead + AsyncWrite + Send {}

impl<T: AsyncRead + AsyncWrite + Send + ?Sized> TunnelIo for T {}

/// Split a `host:port` destination into its parts.
///
/// IPv6 literals may be written in brackets (`[::1]:443`); the brackets are
/// stripped from the returned host.
pub fn split_host_port(address: &str) -> Result<(&str, u16), TransportError> {
    let (host, port) = address
        .rsplit_once(':')
        .ok_or_else(|| TransportError::new(format!("missing port in address {address}")))?;

    let port: u16 = port
        .parse()
        .map_err(|_| TransportError::new(format!("invalid port in address {address}")))?;

    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);

    if host.is_empty() {
        return Err(TransportError::new(format!(
            "missing host in address {address}"
        )));
    }

    Ok((host, port))
}
