use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    status: &'static str,
    sendgrid_configured: bool,
}

pub async fn health_check(state: State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        sendgrid_configured: state.email_client.is_some(),
    })
}
