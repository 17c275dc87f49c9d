//! 对外提供洞察管道的 HTTP 服务

pub mod routes;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::config::ServerConfig;
use crate::utils::{InsightError, InsightResult};
use state::AppState;

/// 构建包含全部路由的 Router
pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let upload = post(routes::upload).layer(DefaultBodyLimit::max(max_upload_bytes));

    Router::new()
        .route("/", get(routes::root))
        .route("/health", get(routes::health_check))
        .route("/upload", upload.clone())
        .route("/upload-resume", upload)
        .route("/history", get(routes::history))
        .route("/insights/:id", get(routes::get_insight))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

pub struct InsightServer {
    config: ServerConfig,
    state: AppState,
}

impl InsightServer {
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    pub async fn start(self) -> InsightResult<()> {
        let addr: SocketAddr = self
            .address()
            .parse()
            .map_err(|e| InsightError::Config(format!("无效的监听地址: {}", e)))?;

        let router = build_router(self.state, self.config.max_upload_bytes);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("服务已启动: http://{}", addr);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("服务已停止");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("无法监听停止信号: {}", e);
        std::future::pending::<()>().await;
    }
    info!("收到停止信号");
}
