pub mod cli;
pub mod conf;
pub mod logging;
pub mod pool;
#[cfg(feature = "ssh")]
pub mod server;
pub mod socks;
pub mod transport;
