//! Web layer module
//!
//! HTTP interface for the photo proxy. Handlers are thin and delegate to
//! the service layer; errors are mapped to status codes in `responses`.

use anyhow::Result;
use axum::{routing::get, Router};
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::services::PhotoProxyService;

pub mod handlers;
pub mod responses;

/// Web server configuration and setup
pub struct WebServer {
    app: Router,
    addr: SocketAddr,
}

impl WebServer {
    pub fn new(config: &Config, service: PhotoProxyService) -> Result<Self> {
        let app = Self::create_router(service);
        let addr: SocketAddr = format!("{}:{}", config.web.host, config.web.port).parse()?;
        Ok(Self { app, addr })
    }

    /// Create the router with all routes and middleware
    pub fn create_router(service: PhotoProxyService) -> Router {
        Router::new()
            .route("/health", get(handlers::health))
            .route("/api/providers", get(handlers::list_providers))
            .route("/api/photos/:provider", get(handlers::get_photo))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(service)
    }

    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub async fn serve(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        axum::serve(listener, self.app).await?;
        Ok(())
    }
}
