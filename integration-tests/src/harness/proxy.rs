use crate::harness::LoopbackConnector;
use burrow_core::pool::{Dispatcher, Pool, PoolSettings};
use burrow_core::socks::SocksServer;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// A SOCKS5 frontend over a pool of loopback tunnels, on an ephemeral port.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub pool: Arc<Pool<LoopbackConnector>>,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<std::io::Result<()>>,
}

impl TestProxy {
    pub async fn start(connector: LoopbackConnector, size: usize) -> Self {
        let settings = PoolSettings {
            size,
            ..Default::default()
        };
        let pool = Arc::new(Pool::spawn(connector, &settings).expect("invalid pool settings"));
        let dispatcher = Arc::new(Dispatcher::new(pool.clone()));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind proxy");
        let addr = listener.local_addr().expect("proxy has no address");

        let (tx, rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            SocksServer::new(dispatcher)
                .serve(listener, async move {
                    let _ = rx.await;
                })
                .await
        });

        Self {
            addr,
            pool,
            shutdown: Some(tx),
            task,
        }
    }

    /// Stop accepting and wait for the listener task to finish.
    pub async fn stop(mut self) -> std::io::Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let result = (&mut self.task).await.expect("listener task panicked");
        self.pool.shutdown();
        result
    }
}

impl Drop for TestProxy {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}
