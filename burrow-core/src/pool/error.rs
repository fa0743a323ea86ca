use crate::transport::TransportError;
use thiserror::Error;

/// Failure of a single `dial` call.
#[derive(Debug, Clone, Error)]
pub enum DialError {
    /// The chosen slot had no connection and could not establish one.
    #[error("slot {slot}: failed to establish tunnel connection: {source}")]
    Connect {
        slot: usize,
        #[source]
        source: TransportError,
    },

    /// The slot's connection is healthy but refused to open the stream.
    #[error("slot {slot}: failed to open stream to {address}: {source}")]
    StreamOpen {
        slot: usize,
        address: String,
        #[source]
        source: TransportError,
    },

    #[error("connection pool is shut down")]
    PoolClosed,
}

impl DialError {
    /// Index of the slot that produced the error, if one was reached.
    pub fn slot(&self) -> Option<usize> {
        match self {
            DialError::Connect { slot, .. } | DialError::StreamOpen { slot, .. } => Some(*slot),
            DialError::PoolClosed => None,
        }
    }

    pub fn transport_error(&self) -> Option<&TransportError> {
        match self {
            DialError::Connect { source, .. } | DialError::StreamOpen { source, .. } => {
                Some(source)
            }
            DialError::PoolClosed => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("pool size must be at least 1")]
    EmptyPool,

    #[error("selector buffer must hold at least one index")]
    EmptySelectorBuffer,
}
