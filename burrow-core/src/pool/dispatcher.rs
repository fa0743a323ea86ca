use crate::pool::Pool;
use crate::pool::error::DialError;
use crate::transport::{Connector, TunnelConnection};
use async_trait::async_trait;
use std::sync::Arc;

/// Open a stream to a destination; the only operation a frontend needs.
#[async_trait]
pub trait Dial: Send + Sync + 'static {
    type Stream: Send + 'static;

    async fn dial(&self, address: &str) -> Result<Self::Stream, DialError>;
}

/// Routes each dial to a randomly chosen slot of the pool.
///
/// No retry happens here: one failed draw is one failed `dial`. Calling again
/// may land on a different slot.
pub struct Dispatcher<C: Connector> {
    pool: Arc<Pool<C>>,
}

impl<C: Connector> Dispatcher<C> {
    pub fn new(pool: Arc<Pool<C>>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Arc<Pool<C>> {
        &self.pool
    }
}

impl<C: Connector> Clone for Dispatcher<C> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
        }
    }
}

#[async_trait]
impl<C: Connector> Dial for Dispatcher<C> {
    type Stream = <C::Connection as TunnelConnection>::Stream;

    async fn dial(&self, address: &str) -> Result<Self::Stream, DialError> {
        let slot = self.pool.draw().await?;
        let connection = slot.acquire().await?;

        tracing::debug!(slot = slot.index(), address, "opening tunnelled stream");

        connection
            .open_stream(address)
            .await
            .map_err(|source| DialError::StreamOpen {
                slot: slot.index(),
                address: address.to_string(),
                source,
            })
    }
}
