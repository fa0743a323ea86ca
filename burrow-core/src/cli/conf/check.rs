use crate::conf::{ConfigError, ConfigOverrides, load_config};
use std::path::PathBuf;

pub fn check(path: PathBuf) -> anyhow::Result<()> {
    match load_config(Some(&path), ConfigOverrides::default()) {
        Ok(cfg) => {
            println!("✔ Config loaded successfully");
            println!("✔ listening on {}", cfg.listen);
            println!("✔ remote {}", cfg.endpoint);
            println!("✔ {} pooled connections", cfg.config.pool.size);
            for warning in &cfg.warnings {
                println!("! {warning}");
            }
            Ok(())
        }
        Err(err) => {
            print_config_error(&err);
            std::process::exit(1);
        }
    }
}

fn print_config_error(err: &ConfigError) {
    eprintln!("{err}");
    if let Some(hint) = config_error_hint(err) {
        eprintln!();
        eprintln!("{hint}");
    }
}

pub fn config_error_hint(err: &ConfigError) -> Option<&'static str> {
    match err {
        ConfigError::Validation { errors }
            if errors.iter().any(|e| e.contains("endpoint is required")) =>
        {
            Some(
                "A remote SSH endpoint is required.\n\
                 \n\
                 Example:\n\
                 \n\
                 remote {\n\
                 \x20 endpoint = \"user@bastion.example.com:22\"\n\
                 }",
            )
        }

        ConfigError::InvalidEndpoint { .. } => Some(
            "Remote endpoints are written [user@]host[:port].\n\
             \n\
             IPv6 literals must be bracketed, e.g. [2001:db8::1]:22",
        ),

        ConfigError::Parse { .. } => Some(
            "Recognised blocks are `server`, `remote` and `pool`.\n\
             \n\
             Check for typos in attribute names; unknown attributes are rejected.",
        ),

        _ => None,
    }
}
