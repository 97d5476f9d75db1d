use std::time::Duration;

use anyhow::Context;
use config::Config;
use secrecy::Secret;
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

use crate::domain::SubscriberEmail;
use crate::email_client::EmailClient;

#[derive(Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub email: EmailSettings,
    pub newsletter: NewsletterSettings,
}

#[derive(Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(
        default = "default_port",
        deserialize_with = "deserialize_number_from_string"
    )]
    pub port: u16,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

#[derive(Deserialize, Clone)]
pub struct EmailSettings {
    #[serde(default)]
    pub sendgrid_api_key: Option<Secret<String>>,
    #[serde(default = "default_from_email")]
    pub sendgrid_from_email: String,
    #[serde(default = "default_base_url")]
    pub sendgrid_base_url: String,
    #[serde(
        default = "default_timeout_millis",
        deserialize_with = "deserialize_number_from_string"
    )]
    pub email_timeout_millis: u64,
}

#[derive(Deserialize, Clone)]
pub struct NewsletterSettings {
    #[serde(default = "default_subject")]
    pub newsletter_subject: String,
    #[serde(default = "default_content_file")]
    pub newsletter_content_file: String,
    #[serde(default = "default_subscribers_file")]
    pub subscribers_file: String,
}

impl EmailSettings {
    pub fn is_configured(&self) -> bool {
        self.sendgrid_api_key.is_some()
    }

    pub fn client(&self) -> anyhow::Result<EmailClient> {
        let api_key = self
            .sendgrid_api_key
            .as_ref()
            .context("SENDGRID_API_KEY is not set")?;
        EmailClient::new(
            &self.sendgrid_base_url,
            api_key.clone(),
            self.sender()?,
            self.timeout(),
        )
    }

    pub fn sender(&self) -> anyhow::Result<SubscriberEmail> {
        SubscriberEmail::parse(self.sendgrid_from_email.clone()).map_err(anyhow::Error::msg)
    }

    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.email_timeout_millis)
    }
}

/// Reads every setting from the process environment. Variable names match the
/// deployment contract (`PORT`, `SENDGRID_API_KEY`, `NEWSLETTER_SUBJECT`, ...),
/// so the sections all deserialize from the same flat environment map.
pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let environment = Config::builder()
        .add_source(config::Environment::default())
        .build()?;

    Ok(Settings {
        application: environment.clone().try_deserialize()?,
        email: environment.clone().try_deserialize()?,
        newsletter: environment.try_deserialize()?,
    })
}

fn default_host() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    3000
}

fn default_static_dir() -> String {
    "public".into()
}

fn default_from_email() -> String {
    "newsletter@blt.owasp.org".into()
}

fn default_base_url() -> String {
    "https://api.sendgrid.com".into()
}

fn default_timeout_millis() -> u64 {
    10_000
}

fn default_subject() -> String {
    "BLT Newsletter".into()
}

fn default_content_file() -> String {
    "newsletters/latest.md".into()
}

fn default_subscribers_file() -> String {
    "subscribers.json".into()
}
