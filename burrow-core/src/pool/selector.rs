use rand::{Rng, rng};
use std::num::NonZeroUsize;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

/// Background producer of slot indices.
///
/// Indices are generated ahead of demand into a bounded buffer so request
/// handling never computes them inline. The producer blocks while the buffer
/// is full.
#[derive(Debug)]
pub struct Selector {
    indices: Mutex<mpsc::Receiver<usize>>,
    task: JoinHandle<()>,
}

impl Selector {
    /// Uniform, independent draws from `[0, size)`.
    pub fn random(size: NonZeroUsize, capacity: NonZeroUsize) -> Self {
        let upper = size.get();
        Self::spawn(size, capacity, move || rng().random_range(0..upper))
    }

    /// Produce indices with `draw`; values are reduced modulo `size`.
    pub fn spawn<F>(size: NonZeroUsize, capacity: NonZeroUsize, mut draw: F) -> Self
    where
        F: FnMut() -> usize + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(capacity.get());
        let size = size.get();

        let task = tokio::spawn(async move {
            loop {
                let index = draw() % size;
                if tx.send(index).await.is_err() {
                    break;
                }
            }
        });

        Self {
            indices: Mutex::new(rx),
            task,
        }
    }

    /// Take the next index, or `None` once the selector has stopped.
    pub async fn next(&self) -> Option<usize> {
        self.indices.lock().await.recv().await
    }

    pub fn shutdown(&self) {
        self.task.abort();
    }
}

impl Drop for Selector {
    fn drop(&mut self) {
        self.task.abort();
    }
}
