mod check;

pub use check::*;
use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum ConfCmd {
    /// Validate configuration and exit
    Check {
        /// Path to config file
        #[arg(long, default_value = "burrow.hcl")]
        config: PathBuf,
    },
}

pub fn run_conf_cmd(cmd: ConfCmd) -> anyhow::Result<()> {
    match cmd {
        ConfCmd::Check { config } => check(config),
    }
}
