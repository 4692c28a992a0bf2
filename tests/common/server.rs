//! A songpin server per test, on a random local port, backed by a throwaway
//! database that already holds the two test members.

use super::constants::*;
use super::fixtures::create_test_db_with_members;
use axum::Router;
use songpin_server::auth::{Authenticator, SqliteTokenCache};
use songpin_server::server::{make_app, RequestsLoggingLevel, ServerConfig};
use songpin_server::{EngineSettings, SongPinStore};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

const TEST_TOKEN_TTL_SEC: u64 = 3600;

pub struct TestServer {
    /// e.g. "http://127.0.0.1:40123"
    pub base_url: String,
    pub port: u16,
    /// Same database the server writes to, for assertions below the HTTP layer.
    pub store: SongPinStore,

    _db_dir: TempDir,
    stop: Option<oneshot::Sender<()>>,
}

fn test_authenticator(store: &SongPinStore) -> Authenticator {
    Authenticator::new(
        TEST_JWT_SECRET.as_bytes(),
        Arc::new(SqliteTokenCache::new(store.clone())),
        TEST_TOKEN_TTL_SEC,
    )
}

/// Serves `app` until the returned sender fires or is dropped.
fn serve_in_background(listener: TcpListener, app: Router) -> oneshot::Sender<()> {
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        let stopped = async move {
            let _ = stop_rx.await;
        };
        if let Err(err) = axum::serve(listener, app)
            .with_graceful_shutdown(stopped)
            .await
        {
            panic!("Test server crashed: {}", err);
        }
    });
    stop_tx
}

impl TestServer {
    pub async fn spawn() -> Self {
        Self::spawn_with_settings(EngineSettings::default()).await
    }

    /// Panics when the database or the socket cannot be set up, or when the
    /// server does not answer within `SERVER_READY_TIMEOUT_MS`.
    pub async fn spawn_with_settings(settings: EngineSettings) -> Self {
        let (db_dir, db_path) =
            create_test_db_with_members().expect("Could not create test database");
        let store = SongPinStore::new(&db_path).expect("Could not open test database");

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Could not bind a local port");
        let port = listener.local_addr().expect("No local address").port();

        // The metrics listener is not started by make_app, so its port is unused.
        let config = ServerConfig {
            requests_logging_level: RequestsLoggingLevel::None,
            port,
            metrics_port: 0,
            frontend_dir_path: None,
        };
        let app = make_app(config, store.clone(), settings, test_authenticator(&store));
        let stop = serve_in_background(listener, app);

        let server = TestServer {
            base_url: format!("http://127.0.0.1:{}", port),
            port,
            store,
            _db_dir: db_dir,
            stop: Some(stop),
        };
        server.wait_until_answering().await;
        server
    }

    async fn wait_until_answering(&self) {
        let readiness_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Could not build readiness client");
        let deadline = Instant::now() + Duration::from_millis(SERVER_READY_TIMEOUT_MS);
        let home = format!("{}/", self.base_url);

        while Instant::now() < deadline {
            if let Ok(response) = readiness_client.get(&home).send().await {
                if response.status().is_success() {
                    return;
                }
            }
            tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
        }
        panic!(
            "Test server on port {} not answering after {}ms",
            self.port, SERVER_READY_TIMEOUT_MS
        );
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}
