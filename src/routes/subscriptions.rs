use axum::extract::{FromRequest, Request, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use serde::Deserialize;

use crate::domain::NewSubscriber;
use crate::templates::{welcome_email, WELCOME_SUBJECT};
use crate::AppState;

use super::{error_chain_fmt, ApiResponse};

#[derive(Deserialize)]
pub struct SubscribePayload {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Accepts the subscription body either as JSON or as a form, keyed off the
/// request's `Content-Type`.
pub struct SubscribeForm(pub SubscribePayload);

#[axum::async_trait]
impl<S> FromRequest<S> for SubscribeForm
where
    S: Send + Sync,
{
    type Rejection = SubscribeError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map_or(false, |value| value.starts_with("application/json"));

        if is_json {
            let Json(payload) = Json::<SubscribePayload>::from_request(req, state)
                .await
                .map_err(|e| SubscribeError::ValidationError(e.to_string()))?;
            Ok(Self(payload))
        } else {
            let Form(payload) = Form::<SubscribePayload>::from_request(req, state)
                .await
                .map_err(|e| SubscribeError::ValidationError(e.to_string()))?;
            Ok(Self(payload))
        }
    }
}

#[derive(thiserror::Error)]
pub enum SubscribeError {
    #[error("{0}")]
    ValidationError(String),
    #[error("SendGrid API key not configured")]
    ConfigurationError,
    #[error("Failed to register the subscriber with SendGrid")]
    DeliveryError(#[source] anyhow::Error),
}

impl std::fmt::Debug for SubscribeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl IntoResponse for SubscribeError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::ValidationError(_) => {
                tracing::info!(error = ?self, "Rejected an invalid subscription request");
                (
                    StatusCode::BAD_REQUEST,
                    "Please provide a valid email address.",
                )
            }
            Self::ConfigurationError => {
                tracing::error!(error = ?self, "Subscription request hit an unconfigured service");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Newsletter service is not configured. Please try again later.",
                )
            }
            Self::DeliveryError(_) => {
                tracing::error!(error = ?self, "Failed to subscribe a new contact");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to subscribe. Please try again later.",
                )
            }
        };
        (
            status,
            Json(ApiResponse {
                success: false,
                message: message.into(),
            }),
        )
            .into_response()
    }
}

#[tracing::instrument(
    name = "Adding a new subscriber",
    skip(state, request),
    fields(subscriber_email = %request.0.email)
)]
pub async fn subscribe(
    state: State<AppState>,
    request: SubscribeForm,
) -> Result<Json<ApiResponse>, SubscribeError> {
    let new_subscriber: NewSubscriber = request
        .0
        .try_into()
        .map_err(SubscribeError::ValidationError)?;

    // The configuration guard runs before any provider call.
    let email_client = state
        .email_client
        .as_ref()
        .ok_or(SubscribeError::ConfigurationError)?;

    email_client
        .upsert_marketing_contact(
            &new_subscriber.email,
            new_subscriber.name.as_deref().unwrap_or(""),
        )
        .await
        .map_err(SubscribeError::DeliveryError)?;

    let (text, html) = welcome_email(new_subscriber.name.as_deref())
        .map_err(|e| SubscribeError::DeliveryError(e.into()))?;
    email_client
        .send_email(&new_subscriber.email, WELCOME_SUBJECT, &text, &html)
        .await
        .map_err(SubscribeError::DeliveryError)?;

    Ok(Json(ApiResponse {
        success: true,
        message: "Successfully subscribed! Check your email for confirmation.".into(),
    }))
}
