use crate::pool::Dial;
use crate::socks::error::SocksError;
use crate::socks::protocol::{Reply, negotiate, read_request, write_reply};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, copy_bidirectional};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

/// Byte counts of a finished relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayStats {
    pub client_to_target: u64,
    pub target_to_client: u64,
}

/// SOCKS5 listener handing every CONNECT to a [`Dial`] implementation.
pub struct SocksServer<D: Dial> {
    dialer: Arc<D>,
}

impl<D> SocksServer<D>
where
    D: Dial,
    D::Stream: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(dialer: Arc<D>) -> Self {
        Self { dialer }
    }

    /// Accept clients until `shutdown` resolves.
    ///
    /// Every client runs on its own task; a failing client never stops the
    /// listener.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()>,
    {
        let local = listener.local_addr()?;
        info!(listen = %local, "socks5 listener started");

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!(listen = %local, "socks5 listener stopping");
                    return Ok(());
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let _ = stream.set_nodelay(true);
                        let dialer = self.dialer.clone();

                        tokio::spawn(async move {
                            match handle_client(dialer.as_ref(), stream, peer).await {
                                Ok(stats) => debug!(
                                    %peer,
                                    sent = stats.client_to_target,
                                    received = stats.target_to_client,
                                    "socks5 session closed"
                                ),
                                Err(e) => debug!(%peer, error = %e, "socks5 session failed"),
                            }
                        });
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to accept socks5 client");
                        tokio::time::sleep(Duration::from_millis(100)).await;
                    }
                },
            }
        }
    }
}

/// Run one SOCKS5 session: negotiate, dial through the pool, relay.
pub async fn handle_client<D, S>(
    dialer: &D,
    mut client: S,
    peer: SocketAddr,
) -> Result<RelayStats, SocksError>
where
    D: Dial,
    D::Stream: AsyncRead + AsyncWrite + Unpin,
    S: AsyncRead + AsyncWrite + Unpin,
{
    negotiate(&mut client).await?;
    let target = read_request(&mut client).await?;
    let address = target.to_string();

    let mut upstream = match dialer.dial(&address).await {
        Ok(stream) => stream,
        Err(err) => {
            warn!(%peer, address = %address, error = %err, "dial failed");
            write_reply(&mut client, Reply::for_dial_error(&err)).await?;
            return Err(err.into());
        }
    };

    write_reply(&mut client, Reply::Succeeded).await?;
    debug!(%peer, address = %address, "relaying");

    let (client_to_target, target_to_client) =
        copy_bidirectional(&mut client, &mut upstream).await?;

    Ok(RelayStats {
        client_to_target,
        target_to_client,
    })
}
