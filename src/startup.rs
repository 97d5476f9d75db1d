use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::configuration::Settings;
use crate::routes::{health_check, subscribe};
use crate::AppState;

pub struct Application {
    port: u16,
    listener: TcpListener,
    app: Router,
}

impl Application {
    pub async fn build(configuration: Settings) -> anyhow::Result<Self> {
        let email_client = if configuration.email.is_configured() {
            Some(Arc::new(configuration.email.client()?))
        } else {
            None
        };

        let address = format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        );
        let listener = TcpListener::bind(&address).await?;
        let port = listener.local_addr()?.port();
        let app = router(
            AppState { email_client },
            &configuration.application.static_dir,
        );

        Ok(Self {
            port,
            listener,
            app,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.app).await
    }
}

fn router(state: AppState, static_dir: &str) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/subscribe", post(subscribe))
        .fallback_service(ServeDir::new(static_dir))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = Uuid::new_v4();
                tracing::debug_span!(
                    "request",
                    %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .with_state(state)
}
