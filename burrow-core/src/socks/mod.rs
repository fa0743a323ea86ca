mod error;
pub mod protocol;
mod server;

pub use error::SocksError;
pub use protocol::{Reply, TargetAddr};
pub use server::{RelayStats, SocksServer, handle_client};
