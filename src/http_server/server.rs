//! # HTTP Server
//!
//! Serves the dataset and query routes over a shared engine.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::QueryEngine;
use crate::observability::Event;
use crate::storage::DatasetStore;

use super::config::HttpServerConfig;
use super::routes::{api_routes, AppState};

/// HTTP server for insightdb
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    pub fn new(config: HttpServerConfig, engine: QueryEngine<DatasetStore>) -> Self {
        let router = Self::build_router(&config, Arc::new(AppState::new(engine)));
        Self { config, router }
    }

    fn build_router(config: &HttpServerConfig, state: Arc<AppState>) -> Router {
        let cors = if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        api_routes(state)
            .layer(TraceLayer::new_for_http())
            .layer(cors)
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Binds and serves until the process stops
    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid socket address '{}': {}", self.config.socket_addr(), e),
            )
        })?;

        let listener = TcpListener::bind(addr).await?;
        Event::ServerStart.log(&[("addr", addr.to_string().as_str())]);
        axum::serve(listener, self.router).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(dir: &tempfile::TempDir) -> QueryEngine<DatasetStore> {
        QueryEngine::new(Arc::new(DatasetStore::open(dir.path()).unwrap()))
    }

    #[test]
    fn test_server_with_custom_port() {
        let dir = tempfile::tempdir().unwrap();
        let server = HttpServer::new(HttpServerConfig::with_port(8080), engine(&dir));
        assert_eq!(server.socket_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_router_builds_with_origins() {
        let dir = tempfile::tempdir().unwrap();
        let config = HttpServerConfig {
            cors_origins: vec!["http://localhost:5173".into()],
            ..Default::default()
        };
        let _router = HttpServer::new(config, engine(&dir)).router();
    }

    #[tokio::test]
    async fn test_invalid_address() {
        let dir = tempfile::tempdir().unwrap();
        let config = HttpServerConfig {
            host: "not an address".into(),
            ..Default::default()
        };
        let err = HttpServer::new(config, engine(&dir)).start().await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    }
}
