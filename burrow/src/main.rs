use burrow_core::cli::conf::{ConfCmd, run_conf_cmd};
use burrow_core::conf::{ConfigOverrides, load_config};
use burrow_core::logging::init_logging;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "burrow",
    version,
    about = "Burrow: SOCKS5 over a pool of multiplexed SSH connections"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the SOCKS5 listener
    Run {
        /// Path to an HCL config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Listen address, e.g. 127.0.0.1:1080
        #[arg(short, long)]
        listen: Option<String>,

        /// Number of pooled SSH connections
        #[arg(short = 'p', long)]
        pool_size: Option<usize>,

        /// Remote SSH endpoint, [user@]host[:port]
        remote: Option<String>,
    },

    /// Configuration tooling
    Conf {
        #[command(subcommand)]
        cmd: ConfCmd,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Conf { cmd } => run_conf_cmd(cmd),
        Command::Run {
            config,
            listen,
            pool_size,
            remote,
        } => run(
            config,
            ConfigOverrides {
                listen,
                pool_size,
                endpoint: remote,
            },
        ),
    };

    if let Err(e) = result {
        eprintln!("burrow: {e:#}");
        std::process::exit(1);
    }
}

fn run(config: Option<PathBuf>, overrides: ConfigOverrides) -> anyhow::Result<()> {
    let validated = load_config(config.as_deref(), overrides)?;
    init_logging();
    burrow_core::server::run(validated)
}
