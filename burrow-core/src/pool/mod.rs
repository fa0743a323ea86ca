//! Fixed-size pool of tunnel connections.
//!
//! Each slot is served by its own actor task that owns the slot's cached
//! connection; callers reach it only through a request/reply exchange. A
//! background selector feeds uniformly random slot indices to the
//! [`Dispatcher`].

mod dispatcher;
mod error;
mod monitor;
mod selector;
mod slot;


pub use dispatcher::{Dial, Dispatcher};
pub use error::{DialError, PoolError};
pub use selector::Selector;

use crate::transport::Connector;
use slot::{SlotHandle, spawn_slot};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    pub size: usize,

    /// Capacity of the selector's index buffer; defaults to `size`.
    pub selector_buffer: Option<usize>,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            size: 1,
            selector_buffer: None,
        }
    }
}

impl PoolSettings {
    fn validated(&self) -> Result<(NonZeroUsize, NonZeroUsize), PoolError> {
        let size = NonZeroUsize::new(self.size).ok_or(PoolError::EmptyPool)?;
        let buffer = match self.selector_buffer {
            Some(n) => NonZeroUsize::new(n).ok_or(PoolError::EmptySelectorBuffer)?,
            None => size,
        };
        Ok((size, buffer))
    }
}

/// The slots, their actors and the selector.
///
/// Created once and never resized. Dropping the pool (or calling
/// [`Pool::shutdown`]) stops every task it owns; pending and later dials
/// then fail with [`DialError::PoolClosed`].
pub struct Pool<C: Connector> {
    slots: Vec<SlotHandle<C::Connection>>,
    actors: Vec<JoinHandle<()>>,
    selector: Selector,
}

impl<C: Connector> Pool<C> {
    /// Start a pool with uniformly random slot selection.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(connector: C, settings: &PoolSettings) -> Result<Self, PoolError> {
        let (size, buffer) = settings.validated()?;
        Ok(Self::start(connector, size, Selector::random(size, buffer)))
    }

    /// Start a pool whose slot choice comes from `draw` instead of the RNG.
    pub fn spawn_with<F>(connector: C, settings: &PoolSettings, draw: F) -> Result<Self, PoolError>
    where
        F: FnMut() -> usize + Send + 'static,
    {
        let (size, buffer) = settings.validated()?;
        Ok(Self::start(
            connector,
            size,
            Selector::spawn(size, buffer, draw),
        ))
    }

    fn start(connector: C, size: NonZeroUsize, selector: Selector) -> Self {
        let connector = Arc::new(connector);

        let (slots, actors): (Vec<_>, Vec<_>) = (0..size.get())
            .map(|index| spawn_slot(index, connector.clone()))
            .unzip();

        tracing::info!(size = size.get(), "connection pool started");

        Self {
            slots,
            actors,
            selector,
        }
    }

    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Stop the selector and every slot actor.
    ///
    /// Cached connections are dropped with their actors.
    pub fn shutdown(&self) {
        self.selector.shutdown();
        for actor in &self.actors {
            actor.abort();
        }
    }

    /// Pick the slot for the next dial.
    pub(crate) async fn draw(&self) -> Result<&SlotHandle<C::Connection>, DialError> {
        let index = self.selector.next().await.ok_or(DialError::PoolClosed)?;
        self.slots.get(index).ok_or(DialError::PoolClosed)
    }
}

impl<C: Connector> Drop for Pool<C> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
