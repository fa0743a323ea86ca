use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Coarse reason a stream could not be opened, as far as the transport knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportErrorKind {
    #[default]
    Other,
    ConnectionRefused,
    NetworkUnreachable,
    HostUnreachable,
    /// The far end's policy forbids the destination.
    NotAllowed,
}

impl From<std::io::ErrorKind> for TransportErrorKind {
    fn from(kind: std::io::ErrorKind) -> Self {
        use std::io::ErrorKind;

        match kind {
            ErrorKind::ConnectionRefused => Self::ConnectionRefused,
            ErrorKind::NetworkUnreachable => Self::NetworkUnreachable,
            ErrorKind::HostUnreachable => Self::HostUnreachable,
            ErrorKind::PermissionDenied => Self::NotAllowed,
            _ => Self::Other,
        }
    }
}

/// Error reported by a transport.
///
/// Cloneable so a slot can both record it and hand it to the waiting caller.
#[derive(Debug, Clone)]
pub struct TransportError {
    message: String,
    kind: TransportErrorKind,
    source: Option<Arc<dyn Error + Send + Sync>>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: TransportErrorKind::Other,
            source: None,
        }
    }

    /// Wrap an underlying error, keeping it reachable through `source()`.
    pub fn with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self {
            message: message.into(),
            kind: TransportErrorKind::Other,
            source: Some(Arc::new(source)),
        }
    }

    pub fn with_kind(mut self, kind: TransportErrorKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{}: {}", self.message, source),
            None => f.write_str(&self.message),
        }
    }
}

impl Error for TransportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| &**s as &(dyn Error + 'static))
    }
}

impl PartialEq for TransportError {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string()).with_kind(err.kind().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = TransportError::with_source("ssh connect failed", io);

        assert_eq!(err.to_string(), "ssh connect failed: refused");
        assert_eq!(err.message(), "ssh connect failed");
        assert!(err.source().is_some());
    }

    #[test]
    fn io_errors_keep_their_kind() {
        let refused = std::io::Error::from(std::io::ErrorKind::ConnectionRefused);
        let timed_out = std::io::Error::from(std::io::ErrorKind::TimedOut);

        assert_eq!(
            TransportError::from(refused).kind(),
            TransportErrorKind::ConnectionRefused
        );
        assert_eq!(TransportError::from(timed_out).kind(), TransportErrorKind::Other);
    }

    #[test]
    fn clones_compare_equal() {
        let err = TransportError::new("unreachable");
        assert_eq!(err.clone(), err);
    }
}
