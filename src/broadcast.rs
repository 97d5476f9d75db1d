use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use comrak::{markdown_to_html, ComrakOptions};
use tokio::task::JoinSet;

use crate::configuration::Settings;
use crate::domain::{Subscriber, SubscriberEmail};
use crate::email_client::EmailClient;
use crate::templates;

pub struct BulletinContent {
    pub text: String,
    pub html: String,
}

pub enum RenderedHtml {
    Rendered(String),
    Fallback(String),
}

/// One record per subscriber per run.
pub struct DispatchResult {
    pub email: SubscriberEmail,
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Default)]
pub struct DispatchSummary {
    pub delivered: usize,
    pub failed: usize,
}

impl DispatchSummary {
    fn absorb(&mut self, result: &DispatchResult) {
        if result.success {
            self.delivered += 1;
        } else {
            self.failed += 1;
        }
    }
}

struct BulletinEmail {
    subject: String,
    text: String,
    html: String,
}

pub fn render_markdown(markdown: &str) -> RenderedHtml {
    let rendered = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        markdown_to_html(markdown, &ComrakOptions::default())
    }));
    match rendered {
        Ok(html) => RenderedHtml::Rendered(html),
        // A renderer panic on untrusted markdown must not take down the run.
        Err(_) => RenderedHtml::Fallback(format!(
            "<pre>{}</pre>",
            htmlescape::encode_minimal(markdown)
        )),
    }
}

#[tracing::instrument(name = "Loading bulletin content", fields(path = %path.display()))]
pub fn load_bulletin(path: &Path) -> BulletinContent {
    let markdown = match std::fs::read_to_string(path) {
        Ok(markdown) => markdown,
        Err(e) => {
            tracing::warn!(error = %e, "Bulletin content file is missing, using the placeholder");
            return BulletinContent {
                text: templates::BULLETIN_PLACEHOLDER_TEXT.into(),
                html: templates::BULLETIN_PLACEHOLDER_HTML.into(),
            };
        }
    };
    let html = match render_markdown(&markdown) {
        RenderedHtml::Rendered(html) => html,
        RenderedHtml::Fallback(html) => {
            tracing::warn!("Markdown rendering failed, falling back to preformatted text");
            html
        }
    };
    BulletinContent {
        text: markdown,
        html,
    }
}

#[tracing::instrument(name = "Loading the subscriber list", fields(path = %path.display()))]
pub fn load_subscribers(path: &Path) -> anyhow::Result<Vec<Subscriber>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read the subscriber list at {}", path.display()))?;
    serde_json::from_str(&raw).context("Failed to parse the subscriber list")
}

/// Fans out one send per subscriber. Every task is spawned before any is
/// joined; a failed send only affects its own subscriber's tally.
#[tracing::instrument(
    name = "Dispatching the bulletin",
    skip_all,
    fields(subscriber_count = subscribers.len())
)]
pub async fn broadcast_bulletin(
    email_client: Arc<EmailClient>,
    subscribers: Vec<Subscriber>,
    subject: &str,
    text: &str,
    html: &str,
) -> DispatchSummary {
    let message = Arc::new(BulletinEmail {
        subject: subject.to_owned(),
        text: text.to_owned(),
        html: html.to_owned(),
    });

    let mut dispatches = JoinSet::new();
    for subscriber in subscribers {
        let email_client = Arc::clone(&email_client);
        let message = Arc::clone(&message);
        dispatches.spawn(async move { dispatch_to(subscriber, &message, &email_client).await });
    }

    let mut summary = DispatchSummary::default();
    while let Some(dispatched) = dispatches.join_next().await {
        match dispatched {
            Ok(result) => summary.absorb(&result),
            Err(e) => {
                tracing::error!(error = %e, "A dispatch task was aborted");
                summary.failed += 1;
            }
        }
    }
    summary
}

async fn dispatch_to(
    subscriber: Subscriber,
    message: &BulletinEmail,
    email_client: &EmailClient,
) -> DispatchResult {
    match email_client
        .send_email(
            &subscriber.email,
            &message.subject,
            &message.text,
            &message.html,
        )
        .await
    {
        Ok(()) => {
            tracing::info!(subscriber_email = %subscriber.email, "Bulletin delivered");
            DispatchResult {
                email: subscriber.email,
                success: true,
                error: None,
            }
        }
        Err(e) => {
            tracing::error!(
                subscriber_email = %subscriber.email,
                error.cause_chain = ?e,
                "Failed to deliver the bulletin"
            );
            DispatchResult {
                email: subscriber.email,
                success: false,
                error: Some(e.to_string()),
            }
        }
    }
}

/// One-shot broadcast of the configured bulletin to every stored subscriber.
/// Setup faults (missing credential, unreadable list) abort with an error;
/// per-recipient failures are tolerated and only counted.
pub async fn run_broadcast(configuration: Settings) -> anyhow::Result<DispatchSummary> {
    let email_client = Arc::new(configuration.email.client()?);

    let subscribers = load_subscribers(Path::new(&configuration.newsletter.subscribers_file))?;
    if subscribers.is_empty() {
        tracing::info!("No subscribers found");
        return Ok(DispatchSummary::default());
    }
    tracing::info!("Sending newsletter to {} subscribers", subscribers.len());

    let content = load_bulletin(Path::new(&configuration.newsletter.newsletter_content_file));
    let page = templates::bulletin_page(&content.html)
        .context("Failed to render the bulletin page template")?;

    let summary = broadcast_bulletin(
        email_client,
        subscribers,
        &configuration.newsletter.newsletter_subject,
        &content.text,
        &page,
    )
    .await;

    tracing::info!(
        delivered = summary.delivered,
        failed = summary.failed,
        "Bulletin dispatch complete"
    );
    Ok(summary)
}
