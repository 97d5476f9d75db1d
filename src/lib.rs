use std::sync::Arc;

use email_client::EmailClient;

pub mod broadcast;
pub mod configuration;
pub mod domain;
pub mod email_client;
pub mod routes;
pub mod startup;
pub mod telemetry;
pub mod templates;

#[derive(Clone)]
pub struct AppState {
    // None when SENDGRID_API_KEY is absent; the service still serves requests
    // and reports the gap through /api/health.
    pub email_client: Option<Arc<EmailClient>>,
}
