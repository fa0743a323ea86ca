use crate::transport::{Connector, TransportError, TunnelConnection};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

/// Scriptable in-memory transport.
#[derive(Clone, Default)]
pub struct FakeConnector {
    pub state: Arc<FakeState>,
}

#[derive(Default)]
pub struct FakeState {
    attempts: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    next_id: AtomicUsize,
    connect_delay: Mutex<Duration>,
    failure: Mutex<Option<String>>,
    links: Mutex<Vec<Arc<FakeLink>>>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        let connector = Self::default();
        *connector.state.connect_delay.lock().unwrap() = delay;
        connector
    }

    pub fn failing(message: &str) -> Self {
        let connector = Self::default();
        connector.fail_with(Some(message));
        connector
    }

    pub fn fail_with(&self, message: Option<&str>) {
        *self.state.failure.lock().unwrap() = message.map(str::to_string);
    }

    pub fn attempts(&self) -> usize {
        self.state.attempts.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.state.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn link(&self, id: usize) -> Arc<FakeLink> {
        self.state.links.lock().unwrap()[id].clone()
    }

    pub fn established(&self) -> usize {
        self.state.links.lock().unwrap().len()
    }
}

#[async_trait]
impl Connector for FakeConnector {
    type Connection = FakeConnection;

    async fn connect(&self) -> Result<FakeConnection, TransportError> {
        let state = &self.state;
        let attempt = state.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let now = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        state.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = *state.connect_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        state.in_flight.fetch_sub(1, Ordering::SeqCst);

        let failure = state.failure.lock().unwrap().clone();
        if let Some(message) = failure {
            let message = message.replace("{attempt}", &attempt.to_string());
            return Err(TransportError::new(message));
        }

        let link = Arc::new(FakeLink::new(state.next_id.fetch_add(1, Ordering::SeqCst)));
        state.links.lock().unwrap().push(link.clone());

        Ok(FakeConnection { link })
    }
}

pub struct FakeLink {
    pub id: usize,
    death: watch::Sender<Option<TransportError>>,
    open_failure: Mutex<Option<String>>,
    streams: AtomicUsize,
}

impl FakeLink {
    fn new(id: usize) -> Self {
        let (death, _) = watch::channel(None);
        Self {
            id,
            death,
            open_failure: Mutex::new(None),
            streams: AtomicUsize::new(0),
        }
    }

    pub fn kill(&self, reason: &str) {
        self.death.send_replace(Some(TransportError::new(reason)));
    }

    pub fn fail_opens(&self, message: Option<&str>) {
        *self.open_failure.lock().unwrap() = message.map(str::to_string);
    }

    pub fn streams(&self) -> usize {
        self.streams.load(Ordering::SeqCst)
    }
}

pub struct FakeConnection {
    link: Arc<FakeLink>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeStream {
    pub connection_id: usize,
    pub address: String,
}

#[async_trait]
impl TunnelConnection for FakeConnection {
    type Stream = FakeStream;

    async fn open_stream(&self, address: &str) -> Result<FakeStream, TransportError> {
        let failure = self.link.open_failure.lock().unwrap().clone();
        if let Some(message) = failure {
            return Err(TransportError::new(message));
        }

        self.link.streams.fetch_add(1, Ordering::SeqCst);
        Ok(FakeStream {
            connection_id: self.link.id,
            address: address.to_string(),
        })
    }

    async fn wait_for_death(&self) -> TransportError {
        let mut death = self.link.death.subscribe();
        loop {
            let current = death.borrow_and_update().clone();
            if let Some(error) = current {
                return error;
            }
            if death.changed().await.is_err() {
                return TransportError::new("fake link dropped");
            }
        }
    }
}

/// Let spawned monitors deliver their notices.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

/// Draw function cycling through `order`.
pub fn sequence(order: Vec<usize>) -> impl FnMut() -> usize + Send + 'static {
    let mut position = 0;
    move || {
        let index = order[position % order.len()];
        position += 1;
        index
    }
}
