// Static HTTP server for rendered chart files

use crate::config::{DEFAULT_IMAGE_SERVER_HOST, DEFAULT_IMAGE_SERVER_PORT};
use crate::error::{ChartError, ChartResult};
use crate::render::OutputDir;
use axum::Router;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::OnceCell;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Route prefix images are served under
pub const CHARTS_ROUTE: &str = "/charts";

#[derive(Debug, Clone, PartialEq, Eq)]
struct Binding {
    host: String,
    port: u16,
}

/// Serves the output directory at `http://<host>:<port>/charts/<file>`.
///
/// Starts at most once. Racing first calls share a single bind attempt and
/// the first caller's host/port win; a failed start leaves the server
/// stopped so a later call may retry.
pub struct ImageServer {
    output_dir: Arc<OutputDir>,
    binding: OnceCell<Binding>,
}

impl ImageServer {
    pub fn new(output_dir: Arc<OutputDir>) -> Self {
        Self {
            output_dir,
            binding: OnceCell::new(),
        }
    }

    pub async fn ensure_started(&self, host: &str, port: u16) -> ChartResult<()> {
        self.binding.get_or_try_init(|| self.start(host, port)).await?;
        Ok(())
    }

    async fn start(&self, host: &str, port: u16) -> ChartResult<Binding> {
        let dir = self.output_dir.resolve().await?;
        let addr = format!("{}:{}", host, port);

        let listener = TcpListener::bind(&addr).await.map_err(|e| match e.kind() {
            ErrorKind::AddrInUse => ChartError::PortInUse { port },
            _ => ChartError::Bind {
                addr: addr.clone(),
                source: e,
            },
        })?;
        let bound = listener.local_addr()?;

        let app = router(&dir);
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!("Image server stopped: {}", e);
            }
        });

        info!(
            "Image server listening on http://{}:{}{} (serving {})",
            host,
            bound.port(),
            CHARTS_ROUTE,
            dir.display()
        );
        Ok(Binding {
            host: host.to_string(),
            port: bound.port(),
        })
    }

    pub fn is_running(&self) -> bool {
        self.binding.initialized()
    }

    /// Bound `(host, port)` once started
    pub fn address(&self) -> Option<(String, u16)> {
        self.binding.get().map(|b| (b.host.clone(), b.port))
    }

    /// `http://<host>:<port>/charts`, falling back to the defaults when the
    /// server has not started
    pub fn url_prefix(&self) -> String {
        let (host, port) = self
            .address()
            .unwrap_or_else(|| (DEFAULT_IMAGE_SERVER_HOST.to_string(), DEFAULT_IMAGE_SERVER_PORT));
        format!("http://{}:{}{}", host, port, CHARTS_ROUTE)
    }

    /// URL for a rendered file. Does not check the file exists.
    pub fn to_url(&self, path: &Path) -> String {
        let filename = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("{}/{}", self.url_prefix(), filename)
    }
}

/// Router serving `dir` under [`CHARTS_ROUTE`]
pub fn router(dir: &Path) -> Router {
    Router::new()
        .nest_service(CHARTS_ROUTE, ServeDir::new(dir))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn server(temp: &TempDir) -> ImageServer {
        ImageServer::new(Arc::new(OutputDir::new(temp.path())))
    }

    #[tokio::test]
    async fn test_ensure_started_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let server = server(&temp);
        assert!(!server.is_running());

        server.ensure_started("127.0.0.1", 0).await.unwrap();
        let first = server.address().unwrap();
        server.ensure_started("127.0.0.1", 0).await.unwrap();
        assert_eq!(server.address().unwrap(), first);
        assert!(server.is_running());

        // first caller wins
        server.ensure_started("0.0.0.0", 1).await.unwrap();
        assert_eq!(server.address().unwrap(), first);
    }

    #[tokio::test]
    async fn test_concurrent_first_calls_bind_once() {
        let temp = TempDir::new().unwrap();
        let server = server(&temp);

        let results = futures::future::join_all((0..8).map(|_| server.ensure_started("127.0.0.1", 0))).await;
        assert!(results.iter().all(Result::is_ok));
        assert!(server.is_running());
    }

    #[tokio::test]
    async fn test_port_in_use_names_port() {
        let temp = TempDir::new().unwrap();
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = taken.local_addr().unwrap().port();

        let server = server(&temp);
        let err = server.ensure_started("127.0.0.1", port).await.unwrap_err();
        assert!(matches!(err, ChartError::PortInUse { port: p } if p == port));
        assert!(err.to_string().contains(&port.to_string()));
        assert!(!server.is_running());
    }

    #[tokio::test]
    async fn test_invalid_host_is_bind_error() {
        let temp = TempDir::new().unwrap();
        let server = server(&temp);

        let err = server.ensure_started("256.0.0.1", 0).await.unwrap_err();
        match &err {
            ChartError::Bind { addr, .. } => assert_eq!(addr, "256.0.0.1:0"),
            other => panic!("expected bind error, got {:?}", other),
        }
        assert!(err.to_string().contains("256.0.0.1:0"));
        assert!(!server.is_running());
    }

    #[tokio::test]
    async fn test_url_uses_bound_address() {
        let temp = TempDir::new().unwrap();
        let server = server(&temp);
        assert_eq!(
            server.to_url(Path::new("/tmp/chart-1-abcdef12.png")),
            "http://localhost:18900/charts/chart-1-abcdef12.png"
        );

        server.ensure_started("127.0.0.1", 0).await.unwrap();
        let (_, port) = server.address().unwrap();
        assert_eq!(
            server.to_url(Path::new("/anywhere/chart-1-abcdef12.png")),
            format!("http://127.0.0.1:{}/charts/chart-1-abcdef12.png", port)
        );
    }

    #[tokio::test]
    async fn test_router_serves_files_and_404s() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("chart-1-00000000.png"), b"\x89PNG data").unwrap();
        let app = router(temp.path());

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/charts/chart-1-00000000.png").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"\x89PNG data");

        let missing = app
            .oneshot(Request::builder().uri("/charts/missing.png").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }
}
