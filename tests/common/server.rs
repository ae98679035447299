//! Test server management.
//!
//! Spawns and manages slircd instances for integration testing.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::sleep;

/// Path of the compiled daemon under test.
pub fn binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_slircd"))
}

/// A test server instance.
pub struct TestServer {
    child: Child,
    port: u16,
    // Removed on drop
    _data_dir: TempDir,
}

impl TestServer {
    /// Spawn a new test server listening on `127.0.0.1:port`.
    pub async fn spawn(port: u16) -> anyhow::Result<Self> {
        let config = format!(
            r#"
[server]
name = "test.server"

[[listen]]
host = "127.0.0.1"
port = "{port}"

[registry]
initial_capacity = 16
max_load_percent = 75

[log]
level = "warn"
"#
        );
        Self::spawn_with_config(port, &config).await
    }

    /// Spawn a test server from raw TOML.
    pub async fn spawn_with_config(port: u16, config: &str) -> anyhow::Result<Self> {
        let data_dir = tempfile::tempdir()?;
        let config_path = write_config(data_dir.path(), config)?;

        let child = Command::new(binary_path())
            .arg(&config_path)
            .env_remove("RUST_LOG")
            .stdout(Stdio::null())
            .spawn()?;

        let server = Self {
            child,
            port,
            _data_dir: data_dir,
        };

        // Wait for server to start listening
        server.wait_until_ready().await?;

        Ok(server)
    }

    /// Wait until the server is accepting connections.
    async fn wait_until_ready(&self) -> anyhow::Result<()> {
        for _ in 0..50 {
            if tokio::net::TcpStream::connect(("127.0.0.1", self.port))
                .await
                .is_ok()
            {
                return Ok(());
            }
            sleep(Duration::from_millis(100)).await;
        }
        anyhow::bail!("Server failed to start within 5 seconds")
    }

    /// Get the server address.
    pub fn address(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }

    /// Create a new test client connected to this server.
    pub async fn connect(&self) -> anyhow::Result<super::client::TestClient> {
        super::client::TestClient::connect(&self.address()).await
    }

    /// Whether the server process is still running.
    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Run the daemon against `config` and wait for it to exit.
pub async fn run_to_exit(config: &str) -> anyhow::Result<ExitStatus> {
    let data_dir = tempfile::tempdir()?;
    let config_path = write_config(data_dir.path(), config)?;

    let mut child = Command::new(binary_path())
        .arg(&config_path)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    for _ in 0..50 {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        sleep(Duration::from_millis(100)).await;
    }

    let _ = child.kill();
    let _ = child.wait();
    anyhow::bail!("Server did not exit within 5 seconds")
}

fn write_config(dir: &Path, config: &str) -> anyhow::Result<PathBuf> {
    let config_path = dir.join("config.toml");
    std::fs::write(&config_path, config)?;
    Ok(config_path)
}
