//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use sockjs_server::routing::HandlerRegistry;
use sockjs_server::{Application, Echo, Shutdown, SockJsConfig, SockJsServer};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Config with short timings so heartbeats show up within a test.
pub fn test_config() -> SockJsConfig {
    let mut config = SockJsConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.transports.heartbeat_delay_ms = 200;
    config.transports.disconnect_delay_ms = 200;
    config
}

/// A server running the echo application on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
}

impl TestServer {
    pub async fn start(config: SockJsConfig) -> Self {
        Self::start_with_app(config, Arc::new(Echo)).await
    }

    pub async fn start_with_app(config: SockJsConfig, app: Arc<dyn Application>) -> Self {
        let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let shutdown = Shutdown::new();
        let (_, config_updates) = mpsc::unbounded_channel();
        let server = SockJsServer::new(config, HandlerRegistry::standard().unwrap(), app);
        let server_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            let _ = server.run(listener, config_updates, server_shutdown).await;
        });

        Self { addr, shutdown }
    }

    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn ws_url(&self, path: &str) -> String {
        format!("ws://{}{}", self.addr, path)
    }

    pub async fn connect(&self, path: &str) -> Client {
        let (client, _) = tokio_tungstenite::connect_async(self.ws_url(path)).await.unwrap();
        client
    }
}

/// Next text message, skipping control frames. Panics after two seconds.
pub async fn next_text(client: &mut Client) -> String {
    let read = async {
        loop {
            match client.next().await {
                Some(Ok(Message::Text(text))) => return text.as_str().to_owned(),
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                other => panic!("expected a text message, got {other:?}"),
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(2), read)
        .await
        .expect("timed out waiting for a text message")
}
