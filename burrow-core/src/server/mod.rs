mod pid;
pub mod setup;

pub use pid::PidFile;
pub use setup::{build_connector, run, ssh_settings};
