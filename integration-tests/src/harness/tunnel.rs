use async_trait::async_trait;
use burrow_core::transport::{Connector, TransportError, TunnelConnection};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpStream;
use tokio::sync::watch;

/// Stand-in for an SSH server: every "tunnelled" stream is a direct TCP
/// connection made from the test process.
#[derive(Clone, Default)]
pub struct LoopbackConnector {
    state: Arc<LoopbackState>,
}

#[derive(Default)]
struct LoopbackState {
    connects: AtomicUsize,
    refuse: AtomicBool,
    links: Mutex<Vec<watch::Sender<bool>>>,
}

impl LoopbackConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following connect attempt fail.
    pub fn refuse_connects(&self, refuse: bool) {
        self.state.refuse.store(refuse, Ordering::SeqCst);
    }

    /// Number of connect attempts, successful or not.
    pub fn connects(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    /// Tear down every connection established so far.
    pub fn kill_all(&self) {
        for link in self.state.links.lock().unwrap().iter() {
            let _ = link.send(true);
        }
    }
}

#[async_trait]
impl Connector for LoopbackConnector {
    type Connection = LoopbackConnection;

    async fn connect(&self) -> Result<LoopbackConnection, TransportError> {
        let id = self.state.connects.fetch_add(1, Ordering::SeqCst) + 1;
        if self.state.refuse.load(Ordering::SeqCst) {
            return Err(TransportError::new(format!(
                "loopback tunnel unavailable (attempt {id})"
            )));
        }

        let (link, dead) = watch::channel(false);
        self.state.links.lock().unwrap().push(link);
        Ok(LoopbackConnection { id, dead })
    }
}

pub struct LoopbackConnection {
    pub id: usize,
    dead: watch::Receiver<bool>,
}

#[async_trait]
impl TunnelConnection for LoopbackConnection {
    type Stream = TcpStream;

    async fn open_stream(&self, address: &str) -> Result<TcpStream, TransportError> {
        if *self.dead.borrow() {
            return Err(TransportError::new("loopback tunnel is closed"));
        }
        Ok(TcpStream::connect(address).await?)
    }

    async fn wait_for_death(&self) -> TransportError {
        let mut dead = self.dead.clone();
        let _ = dead.wait_for(|dead| *dead).await;
        TransportError::new(format!("loopback tunnel {} killed", self.id))
    }
}
