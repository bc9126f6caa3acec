use corner_store::server::serve;
use corner_store::shutdown::{
    CompositeShutdownHandler, ShutdownCoordinator, ShutdownHandler, ShutdownPhase,
    StoreShutdownHandler,
};
use corner_store::state::AppState;
use corner_store::store::{self, DocumentStore, StoreError};
use corner_store::views::Views;
use corner_store::ServerConfig;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::tempdir;
use tokio::net::TcpListener;
use tokio::time::timeout;

struct Counting {
    calls: Arc<AtomicUsize>,
    fail: bool,
}

#[async_trait::async_trait]
impl ShutdownHandler for Counting {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn shutdown(&self) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        anyhow::ensure!(!self.fail, "requested failure");
        Ok(())
    }
}

#[tokio::test]
async fn composite_runs_every_handler_and_reports_failures() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut handlers = CompositeShutdownHandler::new();
    handlers.add_handler(Box::new(Counting { calls: calls.clone(), fail: true }));
    handlers.add_handler(Box::new(Counting { calls: calls.clone(), fail: false }));

    let coordinator = ShutdownCoordinator::new(Duration::from_secs(5));
    let result = coordinator.run_handlers(&handlers).await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(coordinator.phase(), ShutdownPhase::Forced);
}

#[tokio::test]
async fn store_handler_writes_the_final_snapshot() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("catalog.json");
    let store = store::connect(path.to_str().unwrap()).await.unwrap();

    StoreShutdownHandler::new(store.clone()).shutdown().await.unwrap();

    assert!(path.exists());
    assert!(matches!(store.ping().await, Err(StoreError::Closed)));
}

#[tokio::test]
async fn server_drains_and_closes_the_store_on_trigger() {
    // Arrange: a live server on an ephemeral port
    let store: Arc<dyn DocumentStore> = store::connect("memory").await.unwrap();
    let state = Arc::new(AppState::new(
        Arc::new(ServerConfig::default()),
        store.clone(),
        Views::embedded().unwrap(),
    ));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let coordinator = Arc::new(ShutdownCoordinator::new(Duration::from_secs(5)));
    let server = tokio::spawn(serve(listener, state, coordinator.clone()));

    // Act: serve one request, then shut down
    let response = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");

    coordinator.trigger();
    let result = timeout(Duration::from_secs(10), server)
        .await
        .expect("server stops within the timeout")
        .unwrap();

    // Assert
    result.unwrap();
    assert!(coordinator.is_shutdown_initiated());
    assert_eq!(coordinator.phase(), ShutdownPhase::Complete);
    assert!(matches!(store.ping().await, Err(StoreError::Closed)));
}
