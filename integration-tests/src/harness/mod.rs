pub mod proxy;
pub mod socks_client;
pub mod tracing;
pub mod tunnel;
pub mod upstream;

pub use proxy::TestProxy;
pub use socks_client::socks_connect;
pub use self::tracing::{CapturedEvent, EventLog, events_with_message, init_test_tracing};
pub use tunnel::LoopbackConnector;
pub use upstream::{closed_port, start_echo_upstream};
