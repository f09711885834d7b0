//! API Server
//!
//! Builds the middleware stack around the router and serves it until a
//! shutdown signal arrives.

use super::{
    handlers::AppState,
    middleware::{create_cors_layer, request_id_middleware},
    routes::create_router,
};
use crate::config::GameConfig;
use crate::games::seed_chain::{OsSeedSource, SeedSource};
use crate::session::{InMemorySessionStore, SessionRoundManager};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::signal;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};

/// HTTP listener settings
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub request_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            allowed_origins: vec!["*".to_string()],
            request_timeout_secs: 30,
        }
    }
}

/// Wrap the router in the request id, CORS, timeout and trace layers
pub fn build_app(state: Arc<AppState>, settings: &ServerSettings) -> axum::Router {
    create_router(state)
        // Request ID first so every later layer and handler sees it
        .layer(axum::middleware::from_fn(request_id_middleware))
        // CORS before timeout to answer preflight
        .layer(create_cors_layer(settings.allowed_origins.clone()))
        .layer(TimeoutLayer::new(Duration::from_secs(settings.request_timeout_secs)))
        .layer(TraceLayer::new_for_http())
}

/// Outcome engine HTTP server backed by the in-memory session store
pub struct ApiServer {
    settings: ServerSettings,
    manager: Arc<SessionRoundManager>,
}

impl ApiServer {
    pub fn new(settings: ServerSettings, config: GameConfig) -> Self {
        Self::with_seed_source(settings, config, Arc::new(OsSeedSource))
    }

    pub fn with_seed_source(settings: ServerSettings, config: GameConfig, seeds: Arc<dyn SeedSource>) -> Self {
        let manager = SessionRoundManager::new(Arc::new(config), Arc::new(InMemorySessionStore::new()), seeds);
        Self {
            settings,
            manager: Arc::new(manager),
        }
    }

    /// Start the API server
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let addr = self.socket_addr()?;
        let app = build_app(Arc::new(AppState::new(self.manager.clone())), &self.settings);

        info!("🚀 Starting freefall API server");
        info!("   Listen: http://{}", addr);
        self.log_server_info();

        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("✅ API server running");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("🛑 API server stopped gracefully");
        Ok(())
    }

    fn socket_addr(&self) -> Result<SocketAddr, Box<dyn std::error::Error>> {
        Ok(SocketAddr::from((
            self.settings.host.parse::<std::net::IpAddr>()?,
            self.settings.port,
        )))
    }

    fn log_server_info(&self) {
        let config = self.manager.config();
        info!("📋 Server configuration:");
        info!("   CORS: {:?}", self.settings.allowed_origins);
        info!("   Request timeout: {}s", self.settings.request_timeout_secs);
        info!("   Plan mode: {:?}", config.plan.mode);
        info!(
            "   Bets: {}..={} step {}",
            config.betting.min_bet, config.betting.max_bet, config.betting.bet_step
        );
        info!("   Wincap: {}x", config.payout.wincap);

        info!("📊 Available endpoints:");
        info!("   GET  /health                                - Health check");
        info!("   GET  /api/config                            - Public game parameters");
        info!("   GET  /api/rtp                               - Analytic return-to-player");
        info!("   POST /api/session                           - Open a session");
        info!("   GET  /api/session/:token                    - Session state");
        info!("   POST /api/session/:token/end                - End session, reveal seed");
        info!("   GET  /api/session/:token/round/:round_id    - Round record");
        info!("   POST /api/play                              - Play a round");
        info!("   POST /api/round/end                         - Settle a round");
        info!("   POST /api/verify                            - Verify a revealed draw");
    }
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }

    info!("Shutting down gracefully...");
}
