use std::time::Duration;

use anyhow::Context;
use reqwest::{header, Client, ClientBuilder, Url};
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;

use crate::domain::SubscriberEmail;

pub struct EmailClient {
    http_client: Client,
    base_url: Url,
    sender: SubscriberEmail,
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    personalizations: [Personalization<'a>; 1],
    from: EmailAddress<'a>,
    subject: &'a str,
    content: [Content<'a>; 2],
}

#[derive(Serialize)]
struct Personalization<'a> {
    to: [EmailAddress<'a>; 1],
}

#[derive(Serialize)]
struct EmailAddress<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    r#type: &'a str,
    value: &'a str,
}

#[derive(Serialize)]
struct UpsertContactsRequest<'a> {
    contacts: [MarketingContact<'a>; 1],
}

#[derive(Serialize)]
struct MarketingContact<'a> {
    email: &'a str,
    first_name: &'a str,
}

impl EmailClient {
    pub fn new(
        base_url: &str,
        api_key: Secret<String>,
        sender: SubscriberEmail,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url).context("Failed to parse the SendGrid base URL")?;

        let mut authorization =
            header::HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))
                .context("Failed to build the Authorization header")?;
        authorization.set_sensitive(true);
        let mut headers = header::HeaderMap::new();
        headers.insert(header::AUTHORIZATION, authorization);

        let http_client = ClientBuilder::new()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context("Failed to build the HTTP client")?;

        Ok(Self {
            http_client,
            base_url,
            sender,
        })
    }

    /// Upserts the contact into the SendGrid marketing contact list.
    pub async fn upsert_marketing_contact(
        &self,
        email: &SubscriberEmail,
        first_name: &str,
    ) -> anyhow::Result<()> {
        let url = self.base_url.join("/v3/marketing/contacts")?;
        let body = UpsertContactsRequest {
            contacts: [MarketingContact {
                email: email.as_ref(),
                first_name,
            }],
        };

        self.http_client
            .put(url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to upsert the marketing contact for {email}"))?
            .error_for_status()
            .with_context(|| format!("SendGrid rejected the contact upsert for {email}"))?;
        Ok(())
    }

    /// Sends a two-part message. SendGrid requires the `text/plain` part to
    /// precede the `text/html` part in `content`.
    pub async fn send_email(
        &self,
        recipient: &SubscriberEmail,
        subject: &str,
        text: &str,
        html: &str,
    ) -> anyhow::Result<()> {
        let url = self.base_url.join("/v3/mail/send")?;
        let body = SendEmailRequest {
            personalizations: [Personalization {
                to: [EmailAddress {
                    email: recipient.as_ref(),
                }],
            }],
            from: EmailAddress {
                email: self.sender.as_ref(),
            },
            subject,
            content: [
                Content {
                    r#type: "text/plain",
                    value: text,
                },
                Content {
                    r#type: "text/html",
                    value: html,
                },
            ],
        };

        self.http_client
            .post(url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to send an email to {recipient}"))?
            .error_for_status()
            .with_context(|| format!("SendGrid rejected the email to {recipient}"))?;
        Ok(())
    }
}
