use ec2gate_api::app::AppState;
use ec2gate_api::session::AwsSessionFactory;
use ec2gate_api::{build_app, session::SessionFactory};
use ec2gate_common::Settings;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let settings = Settings::from_env();

    let default_level = if settings.service.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let addr = format!("{}:{}", settings.service.listen, settings.service.port);
    let factory: Arc<dyn SessionFactory> = Arc::new(AwsSessionFactory);
    let state = AppState::new(settings, factory);
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    println!("EC2 Gate listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
