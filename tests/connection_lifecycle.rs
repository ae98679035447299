//! Integration tests for the connection lifecycle.
//!
//! Spawns the `slircd` binary and drives it over loopback TCP.

mod common;

use common::server::run_to_exit;
use common::{TestClient, TestServer};
use std::time::Duration;

const QUIET: Duration = Duration::from_millis(300);

#[tokio::test]
async fn test_accepts_and_keeps_connection_open() {
    let server = TestServer::spawn(26667)
        .await
        .expect("Failed to spawn test server");

    let mut client = server.connect().await.expect("Failed to connect");
    client.send_raw("NICK alice").await.unwrap();
    client.send_raw("USER alice 0 * :Alice Liddell").await.unwrap();

    assert!(client.stays_open(QUIET).await, "server dropped a well-behaved client");
}

#[tokio::test]
async fn test_line_split_across_writes() {
    let server = TestServer::spawn(26668)
        .await
        .expect("Failed to spawn test server");

    let mut client = server.connect().await.unwrap();
    client.send_bytes(b"PRIVMSG #rust :hel").await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    client.send_bytes(b"lo\r\n").await.unwrap();

    assert!(client.stays_open(QUIET).await);
}

#[tokio::test]
async fn test_oversized_line_does_not_kill_connection() {
    let server = TestServer::spawn(26669)
        .await
        .expect("Failed to spawn test server");

    let mut client = server.connect().await.unwrap();
    let long = format!("PRIVMSG #flood :{}", "x".repeat(4096));
    client.send_raw(&long).await.unwrap();
    client.send_raw("PING :still-here").await.unwrap();

    assert!(client.stays_open(QUIET).await);
}

#[tokio::test]
async fn test_server_survives_disconnects() {
    let mut server = TestServer::spawn(26670)
        .await
        .expect("Failed to spawn test server");

    for i in 0..10 {
        let mut client = server.connect().await.unwrap();
        client.send_raw(&format!("NICK user{i}")).await.unwrap();
        client.shutdown().await.unwrap();
    }
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(server.is_running());
    let mut late = server.connect().await.expect("server stopped accepting");
    assert!(late.stays_open(QUIET).await);
}

#[tokio::test]
async fn test_many_concurrent_clients() {
    let server = TestServer::spawn(26671)
        .await
        .expect("Failed to spawn test server");

    // More clients than the initial user table capacity of 16
    let mut clients = Vec::new();
    for i in 0..40 {
        let mut client = server.connect().await.unwrap();
        client.send_raw(&format!("NICK c{i}")).await.unwrap();
        clients.push(client);
    }

    for client in &mut clients {
        assert!(client.stays_open(Duration::from_millis(20)).await);
    }
}

#[tokio::test]
async fn test_invalid_port_in_config_fails_startup() {
    let status = run_to_exit(
        r#"
[[listen]]
host = "127.0.0.1"
port = "99999"
"#,
    )
    .await
    .unwrap();
    assert!(!status.success());
}

#[tokio::test]
async fn test_missing_listeners_fails_startup() {
    let status = run_to_exit("[server]\nname = \"x\"\n").await.unwrap();
    assert!(!status.success());
}
