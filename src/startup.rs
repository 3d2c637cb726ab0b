use crate::config::HubConfig;
use crate::error::AppError;
use crate::handlers;
use crate::services::{AiService, Database};
use axum::http::{header, HeaderValue, Method};
use axum::{
    routing::{get, post},
    Router,
};
use std::future::IntoFuture;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub config: HubConfig,
    pub db: Database,
    pub ai: AiService,
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
    state: AppState,
}

impl Application {
    pub async fn build(config: HubConfig) -> Result<Self, AppError> {
        let db = Database::connect(
            &config.database.url,
            config.database.max_connections,
            config.database.min_connections,
        )
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to Postgres: {}", e);
            e
        })?;
        db.run_migrations().await.map_err(|e| {
            tracing::error!("Failed to run database migrations: {}", e);
            e
        })?;

        let ai = AiService::new(&config.gemini);

        let state = AppState {
            config: config.clone(),
            db: db.clone(),
            ai,
        };

        let cors = CorsLayer::new()
            .allow_origin(
                config
                    .security
                    .allowed_origins
                    .iter()
                    .filter_map(|o| match o.parse::<HeaderValue>() {
                        Ok(value) => Some(value),
                        Err(e) => {
                            tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e);
                            None
                        }
                    })
                    .collect::<Vec<HeaderValue>>(),
            )
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

        let app = Router::new()
            .route("/health", get(handlers::health::health_check))
            .route(
                "/resources",
                get(handlers::resources::list_resources).post(handlers::resources::create_resource),
            )
            .route(
                "/resources/:id",
                get(handlers::resources::get_resource)
                    .put(handlers::resources::update_resource)
                    .delete(handlers::resources::delete_resource),
            )
            .route("/ai/generate", post(handlers::ai::generate_description))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(state.clone());

        let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app);

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
            state,
        })
    }

    pub fn db(&self) -> &Database {
        &self.state.db
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}
