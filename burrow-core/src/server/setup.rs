use crate::conf::{RemoteConfig, RemoteEndpoint, ValidatedConfig};
use crate::pool::{Dispatcher, Pool};
use crate::server::pid::PidFile;
use crate::socks::SocksServer;
use crate::transport::ssh::{SshConnector, SshSettings, key_needs_passphrase};
use anyhow::{Context, Result, anyhow};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;

/// Run the SOCKS5 frontend until Ctrl-C or SIGTERM.
pub fn run(validated: ValidatedConfig) -> Result<()> {
    use tokio::runtime::Builder;

    let ValidatedConfig {
        config,
        listen,
        endpoint,
        warnings,
    } = validated;

    for warning in &warnings {
        tracing::warn!(warning = %warning, "configuration warning");
    }

    // Attempt to write pid file (best-effort)
    let _pid_file = config.server.pid_file.as_ref().and_then(|path| {
        match PidFile::create(path) {
            Ok(guard) => {
                tracing::info!(pid_file = %path.display(), "pid file written");
                Some(guard)
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to write pid file; continuing");
                None
            }
        }
    });

    let connector = build_connector(&endpoint, &config.remote)?;

    // Shutdown wiring: the ctrlc handler runs on its own thread.
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    ctrlc::set_handler(move || {
        tracing::info!("shutdown requested");
        let _ = shutdown_tx.send(true);
    })?;

    let rt = Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build Tokio runtime")?;

    rt.block_on(async move {
        let pool = Arc::new(Pool::spawn(connector, &config.pool.settings())?);
        let dispatcher = Arc::new(Dispatcher::new(pool.clone()));

        let listener = TcpListener::bind(listen)
            .await
            .with_context(|| format!("failed to bind {listen}"))?;

        tracing::info!(
            listen = %listen,
            remote = %endpoint,
            pool_size = pool.size(),
            "burrow started"
        );

        SocksServer::new(dispatcher)
            .serve(listener, async move {
                let _ = shutdown_rx.wait_for(|stop| *stop).await;
            })
            .await?;

        pool.shutdown();
        tracing::info!("burrow stopped");
        Ok::<_, anyhow::Error>(())
    })
}

/// Load the identity and prepare the connector for `endpoint`.
pub fn build_connector(endpoint: &RemoteEndpoint, remote: &RemoteConfig) -> Result<SshConnector> {
    SshConnector::new(ssh_settings(endpoint, remote)?).map_err(|e| {
        let hint = if key_needs_passphrase(&e) {
            format!(
                "identity is encrypted; export its passphrase in ${} (remote.passphrase_env)",
                remote.passphrase_env
            )
        } else {
            "failed to prepare ssh connector".to_string()
        };
        anyhow::Error::new(e).context(hint)
    })
}

/// Resolve SSH settings, filling in `$USER` and `$HOME/.ssh` defaults.
pub fn ssh_settings(endpoint: &RemoteEndpoint, remote: &RemoteConfig) -> Result<SshSettings> {
    let user = endpoint
        .user_or_default()
        .ok_or_else(|| anyhow!("no user in remote endpoint and $USER is not set"))?;

    let ssh_dir = || -> Result<PathBuf> {
        let home = std::env::var_os("HOME").ok_or_else(|| anyhow!("$HOME is not set"))?;
        Ok(PathBuf::from(home).join(".ssh"))
    };

    let identity_file = match &remote.identity_file {
        Some(path) => path.clone(),
        None => ssh_dir()?.join("id_rsa"),
    };
    let known_hosts = match &remote.known_hosts {
        Some(path) => path.clone(),
        None => ssh_dir()?.join("known_hosts"),
    };

    Ok(SshSettings {
        host: endpoint.host.clone(),
        port: endpoint.port,
        user,
        identity_file,
        passphrase: std::env::var(&remote.passphrase_env).ok(),
        known_hosts,
        connect_timeout: remote.connect_timeout_ms.map(Duration::from_millis),
    })
}
