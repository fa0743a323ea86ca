use crate::transport::{TransportError, TunnelConnection};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Report from a lifecycle monitor that the connection it watched is gone.
#[derive(Debug)]
pub(crate) struct DeathNotice {
    /// Generation of the connection within its slot.
    pub generation: u64,
    pub error: TransportError,
}

/// Watch one connection and report its death to the owning slot.
///
/// The notice is only read when the slot serves its next request.
pub(crate) fn spawn_monitor<T: TunnelConnection>(
    slot: usize,
    generation: u64,
    connection: Arc<T>,
    deaths: mpsc::Sender<DeathNotice>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let error = connection.wait_for_death().await;
        drop(connection);

        tracing::debug!(
            slot,
            generation,
            error = %error,
            "lifecycle monitor observed connection death"
        );

        // The slot may already be gone (pool shut down).
        let _ = deaths.send(DeathNotice { generation, error }).await;
    })
}
