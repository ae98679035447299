//! slircd - IRC daemon entry point.
//!
//! Usage: `slircd [config.toml]`. Without a config file the server listens on
//! localhost:6667 with default settings.

use slircd_lite::config::defaults::{DEFAULT_LISTEN_HOST, DEFAULT_LISTEN_PORT};
use slircd_lite::config::{Config, LogConfig};
use slircd_lite::{Server, telemetry};
use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1);

    let config = match config_path.as_deref() {
        Some(path) => match Config::load(path) {
            Ok(config) => {
                telemetry::init(&config.log);
                info!(%path, "Loaded config");
                config
            }
            Err(e) => {
                telemetry::init(&LogConfig::default());
                error!(%path, error = %e, "Failed to load config");
                return Err(e.into());
            }
        },
        None => {
            telemetry::init(&LogConfig::default());
            let mut config = Config::default();
            config
                .listen
                .add_listener(DEFAULT_LISTEN_HOST, DEFAULT_LISTEN_PORT)?;
            config
        }
    };

    info!(
        server = %config.server.name,
        listeners = config.listen.len(),
        "Starting slircd-lite"
    );

    let mut server = Server::new(config)?;
    let addrs = server.bind().map_err(|e| {
        error!(error = %e, "Failed to bind listeners");
        e
    })?;
    info!(?addrs, "Accepting connections");

    server.run().map_err(|e| {
        error!(error = %e, "Event loop stopped");
        e
    })?;
    Ok(())
}
