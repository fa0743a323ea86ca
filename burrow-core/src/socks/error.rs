use crate::pool::DialError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SocksError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported SOCKS version {0}")]
    UnsupportedVersion(u8),

    #[error("client offered no acceptable authentication method")]
    NoAcceptableMethod,

    #[error("unsupported command {0:#04x}")]
    UnsupportedCommand(u8),

    #[error("unsupported address type {0:#04x}")]
    UnsupportedAddressType(u8),

    #[error("destination name is not valid UTF-8")]
    InvalidDomain,

    #[error(transparent)]
    Dial(#[from] DialError),
}
