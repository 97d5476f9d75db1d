use anyhow::Context;
use blt_newsletter::broadcast::run_broadcast;
use blt_newsletter::configuration::get_configuration;
use blt_newsletter::telemetry::{get_tracing_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber =
        get_tracing_subscriber("send-newsletter".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber);

    let configuration = get_configuration().context("Failed to read configuration")?;
    run_broadcast(configuration).await?;
    Ok(())
}
