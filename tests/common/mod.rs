//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use dehaze_server::config::ServerConfig;
use dehaze_server::http::{AppState, HttpServer};
use dehaze_server::lifecycle::Shutdown;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

#[allow(dead_code)]
/// A server running on an ephemeral port with its own media directory.
pub struct TestServer {
    pub addr: SocketAddr,
    pub state: AppState,
    pub shutdown: Shutdown,
    pub config_tx: mpsc::UnboundedSender<ServerConfig>,
    pub media_root: PathBuf,
    pub client: reqwest::Client,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
        let _ = std::fs::remove_dir_all(&self.media_root);
    }
}

/// Default config pointing at a fresh temporary media directory.
pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.media.root = std::env::temp_dir()
        .join(format!("dehaze-it-{}", uuid::Uuid::new_v4()))
        .to_string_lossy()
        .into_owned();
    config
}

/// Start a server with `config` and wait until it accepts connections.
pub async fn start_server(config: ServerConfig) -> TestServer {
    let media_root = PathBuf::from(&config.media.root);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (config_tx, config_rx) = mpsc::unbounded_channel();
    let server = HttpServer::new(config).unwrap();
    let state = server.state().clone();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, config_rx, server_shutdown).await;
    });

    let client = reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();

    TestServer {
        addr,
        state,
        shutdown,
        config_tx,
        media_root,
        client,
    }
}
