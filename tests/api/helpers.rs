use std::path::Path;

use once_cell::sync::Lazy;
use secrecy::Secret;
use uuid::Uuid;
use wiremock::MockServer;

use blt_newsletter::configuration::{
    ApplicationSettings, EmailSettings, NewsletterSettings, Settings,
};
use blt_newsletter::startup::Application;
use blt_newsletter::telemetry::{get_tracing_subscriber, init_subscriber};

static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();

    if std::env::var("TEST_LOG").is_ok() {
        let subscriber =
            get_tracing_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber =
            get_tracing_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    };
});

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub email_server: MockServer,
}

impl TestApp {
    pub async fn post_subscribe_json(&self, body: &serde_json::Value) -> reqwest::Response {
        reqwest::Client::new()
            .post(format!("{}/api/subscribe", self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_subscribe_form(&self, body: &str) -> reqwest::Response {
        reqwest::Client::new()
            .post(format!("{}/api/subscribe", self.address))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body.to_string())
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_health(&self) -> reqwest::Response {
        reqwest::Client::new()
            .get(format!("{}/api/health", self.address))
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with_api_key(true).await
}

pub async fn spawn_app_without_api_key() -> TestApp {
    spawn_app_with_api_key(false).await
}

async fn spawn_app_with_api_key(configured: bool) -> TestApp {
    Lazy::force(&TRACING);

    let email_server = MockServer::start().await;

    let static_dir = std::env::temp_dir().join(format!("blt-newsletter-static-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&static_dir).expect("Failed to create the static asset directory.");
    std::fs::write(
        static_dir.join("index.html"),
        "<h1>BLT Newsletter landing page</h1>",
    )
    .expect("Failed to write the landing page.");

    let configuration = test_configuration(&email_server, configured, &static_dir);
    let application = Application::build(configuration)
        .await
        .expect("Failed to build application.");
    let port = application.port();
    tokio::spawn(application.run_until_stopped());

    TestApp {
        address: format!("http://localhost:{port}"),
        port,
        email_server,
    }
}

fn test_configuration(email_server: &MockServer, configured: bool, static_dir: &Path) -> Settings {
    Settings {
        application: ApplicationSettings {
            host: "127.0.0.1".into(),
            port: 0,
            static_dir: static_dir.display().to_string(),
        },
        email: EmailSettings {
            sendgrid_api_key: configured.then(|| Secret::new(Uuid::new_v4().to_string())),
            sendgrid_from_email: "newsletter@blt.owasp.org".into(),
            sendgrid_base_url: email_server.uri(),
            email_timeout_millis: 200,
        },
        newsletter: NewsletterSettings {
            newsletter_subject: "BLT Newsletter".into(),
            newsletter_content_file: "newsletters/latest.md".into(),
            subscribers_file: "subscribers.json".into(),
        },
    }
}
