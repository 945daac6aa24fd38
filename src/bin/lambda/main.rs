use lambda_runtime::{service_fn, Error, LambdaEvent};
use prefix_aggregator::app::{AppBuilder, AppConfig};
use serde_json::Value;
use std::time::{Duration, UNIX_EPOCH};
use tracing::info;
use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn init_logging(level: LevelFilter) {
    // The platform prefixes every line with its own timestamp.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .without_time()
                .with_target(false),
        )
        .with(level)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    init_logging(config.log_level);

    info!("Starting prefix aggregator");
    info!("Storage backend: {}", config.storage_backend.kind());
    info!("Scratch directory: {}", config.scratch_dir.display());

    // Built once per process and shared by every invocation.
    let deadline_margin = config.deadline_margin;
    let services = AppBuilder::new().with_config(config).build().await?;
    let handler = services.invocation_handler(deadline_margin);
    let handler = &handler;

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        let deadline = UNIX_EPOCH + Duration::from_millis(event.context.deadline);
        info!(request_id = %event.context.request_id, "Handling invocation");

        handler
            .handle(event.payload, Some(deadline))
            .await
            .map_err(Error::from)
    }))
    .await
}
