//! Shared helpers for server integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use hostcheck::{ServiceManager, ServiceState};
use hostcheck_server::{AppState, Config, HealthcheckServer};
use std::collections::HashMap;
use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Service manager answering from a fixed table and counting queries
#[derive(Default)]
pub struct FakeServiceManager {
    states: HashMap<String, String>,
    queries: AtomicUsize,
}

impl FakeServiceManager {
    pub fn with_states(states: &[(&str, &str)]) -> Self {
        Self {
            states: states
                .iter()
                .map(|(name, state)| (name.to_string(), state.to_string()))
                .collect(),
            queries: AtomicUsize::new(0),
        }
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ServiceManager for FakeServiceManager {
    async fn query_state(&self, name: &str) -> ServiceState {
        self.queries.fetch_add(1, Ordering::SeqCst);
        match self.states.get(name) {
            Some(state) => ServiceState::reported(state.clone()),
            None => ServiceState::reported("inactive"),
        }
    }
}

/// A local port with nothing listening on it
pub fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Parse and validate YAML through a real file, as the binary does
pub fn load_config(yaml: &str) -> Config {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();

    let config = Config::load_unvalidated(file.path()).unwrap();
    config.validate_all().unwrap();
    config
}

/// A running server bound to an ephemeral port
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<Result<(), hostcheck_server::ServerError>>,
}

impl TestServer {
    pub async fn start(config: &Config, manager: Arc<dyn ServiceManager>) -> Self {
        let state = AppState::from_config(config, manager).unwrap();
        Self::start_with_state(config, state).await
    }

    pub async fn start_with_state(config: &Config, state: AppState) -> Self {
        let mut server_config = config.to_server_config();
        server_config.listen_host = "127.0.0.1".to_string();
        server_config.listen_port = 0;

        let bound = HealthcheckServer::new(server_config, state).bind().await.unwrap();
        let addr = bound.local_addr();

        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(bound.serve(async {
            let _ = rx.await;
        }));

        Self {
            addr,
            shutdown: Some(tx),
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn stop(mut self) -> Result<(), hostcheck_server::ServerError> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.handle.await.unwrap()
    }
}
