use anyhow::Context;
use blt_newsletter::configuration::get_configuration;
use blt_newsletter::startup::Application;
use blt_newsletter::telemetry::{get_tracing_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber =
        get_tracing_subscriber("blt-newsletter".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber);

    let configuration = get_configuration().context("Failed to read configuration")?;
    tracing::info!(
        "SendGrid configured: {}",
        configuration.email.is_configured()
    );

    let application = Application::build(configuration).await?;
    tracing::info!(
        "Newsletter server running on http://localhost:{}",
        application.port()
    );
    application.run_until_stopped().await?;
    Ok(())
}
