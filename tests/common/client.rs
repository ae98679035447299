//! Test IRC client.
//!
//! The server never replies, so the client only writes lines and watches
//! whether the connection stays open.

use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// A raw line-oriented test client.
pub struct TestClient {
    stream: TcpStream,
}

impl TestClient {
    /// Connect to a test server.
    pub async fn connect(address: &str) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(address).await?;
        Ok(Self { stream })
    }

    /// Send a raw IRC line, adding CRLF if missing.
    pub async fn send_raw(&mut self, line: &str) -> anyhow::Result<()> {
        self.stream.write_all(line.as_bytes()).await?;
        if !line.ends_with("\r\n") {
            self.stream.write_all(b"\r\n").await?;
        }
        self.stream.flush().await?;
        Ok(())
    }

    /// Send bytes exactly as given.
    pub async fn send_bytes(&mut self, data: &[u8]) -> anyhow::Result<()> {
        self.stream.write_all(data).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// True if the server has neither closed nor reset the connection within `dur`.
    pub async fn stays_open(&mut self, dur: Duration) -> bool {
        let mut buf = [0u8; 64];
        match timeout(dur, self.stream.read(&mut buf)).await {
            // Timed out waiting: still open
            Err(_) => true,
            Ok(Ok(0)) | Ok(Err(_)) => false,
            // The server never writes, but any byte still means open.
            Ok(Ok(_)) => true,
        }
    }

    /// Close the write side, as a client QUIT without message would.
    pub async fn shutdown(mut self) -> anyhow::Result<()> {
        self.stream.shutdown().await?;
        Ok(())
    }
}
