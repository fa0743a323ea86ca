use crate::pool::error::DialError;
use crate::pool::monitor::{DeathNotice, spawn_monitor};
use crate::transport::{Connector, TransportError};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub(crate) type DialResponse<T> = Result<Arc<T>, TransportError>;

/// Request for the slot's current connection.
///
/// Carries no destination: the address is applied to the connection by the
/// caller, not by the slot.
pub(crate) struct DialRequest<T> {
    reply: oneshot::Sender<DialResponse<T>>,
}

/// Caller-side handle of one slot actor.
pub(crate) struct SlotHandle<T> {
    index: usize,
    requests: mpsc::Sender<DialRequest<T>>,
}

impl<T> SlotHandle<T> {
    pub(crate) fn index(&self) -> usize {
        self.index
    }

    /// Ask the slot for a usable connection and wait for its answer.
    pub(crate) async fn acquire(&self) -> Result<Arc<T>, DialError> {
        let (reply, response) = oneshot::channel();

        self.requests
            .send(DialRequest { reply })
            .await
            .map_err(|_| DialError::PoolClosed)?;

        match response.await {
            Ok(Ok(connection)) => Ok(connection),
            Ok(Err(source)) => Err(DialError::Connect {
                slot: self.index,
                source,
            }),
            Err(_) => Err(DialError::PoolClosed),
        }
    }
}

struct CachedConnection<T> {
    generation: u64,
    connection: Arc<T>,
    monitor: JoinHandle<()>,
}

impl<T> Drop for CachedConnection<T> {
    fn drop(&mut self) {
        self.monitor.abort();
    }
}

/// Owner of one slot's connection.
///
/// Requests are served strictly one at a time, so at most one connect
/// attempt is ever in flight for the slot.
struct SlotActor<C: Connector> {
    index: usize,
    connector: Arc<C>,
    cached: Option<CachedConnection<C::Connection>>,
    last_error: Option<TransportError>,
    generation: u64,
    requests: mpsc::Receiver<DialRequest<C::Connection>>,
    deaths: mpsc::Receiver<DeathNotice>,
    deaths_tx: mpsc::Sender<DeathNotice>,
}

/// Start the actor for slot `index`.
pub(crate) fn spawn_slot<C: Connector>(
    index: usize,
    connector: Arc<C>,
) -> (SlotHandle<C::Connection>, JoinHandle<()>) {
    let (requests_tx, requests) = mpsc::channel(1);
    let (deaths_tx, deaths) = mpsc::channel(1);

    let actor = SlotActor {
        index,
        connector,
        cached: None,
        last_error: None,
        generation: 0,
        requests,
        deaths,
        deaths_tx,
    };

    let task = tokio::spawn(actor.run());

    (
        SlotHandle {
            index,
            requests: requests_tx,
        },
        task,
    )
}

impl<C: Connector> SlotActor<C> {
    async fn run(mut self) {
        debug!(slot = self.index, "slot actor started");

        while let Some(request) = self.requests.recv().await {
            self.reap_dead_connection();

            let response = self.ensure_connected().await;

            if request.reply.send(response).is_err() {
                debug!(slot = self.index, "dial caller went away before the reply");
            }
        }

        debug!(slot = self.index, "slot actor stopped");
    }

    /// Drop the cached connection if its monitor reported it dead.
    fn reap_dead_connection(&mut self) {
        while let Ok(notice) = self.deaths.try_recv() {
            let current = self
                .cached
                .as_ref()
                .is_some_and(|cached| cached.generation == notice.generation);

            if !current {
                debug!(
                    slot = self.index,
                    generation = notice.generation,
                    "ignoring death notice for a discarded connection"
                );
                continue;
            }

            warn!(
                slot = self.index,
                generation = notice.generation,
                error = %notice.error,
                "tunnel connection died"
            );
            self.cached = None;
            self.last_error = Some(notice.error);
        }
    }

    async fn ensure_connected(&mut self) -> DialResponse<C::Connection> {
        if let Some(cached) = &self.cached {
            return Ok(cached.connection.clone());
        }

        match &self.last_error {
            Some(previous) => info!(
                slot = self.index,
                previous_error = %previous,
                "re-establishing tunnel connection"
            ),
            None => info!(slot = self.index, "establishing tunnel connection"),
        }

        match self.connector.connect().await {
            Ok(connection) => {
                self.generation += 1;
                let generation = self.generation;
                let connection = Arc::new(connection);

                let monitor = spawn_monitor(
                    self.index,
                    generation,
                    connection.clone(),
                    self.deaths_tx.clone(),
                );

                info!(slot = self.index, generation, "tunnel connection established");

                self.last_error = None;
                self.cached = Some(CachedConnection {
                    generation,
                    connection: connection.clone(),
                    monitor,
                });

                Ok(connection)
            }
            Err(error) => {
                warn!(slot = self.index, error = %error, "tunnel connect failed");
                self.last_error = Some(error.clone());
                Err(error)
            }
        }
    }
}
