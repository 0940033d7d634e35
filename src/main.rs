use assessment_backend::{
    config::{Config, LogFormat},
    database::pool::{create_pool, run_migrations},
    routes::create_router,
    AppState,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    let pool = create_pool(&config).await?;
    run_migrations(&pool).await?;

    let app_state = AppState::new(pool, config.clone());

    if config.deadline_sweep_seconds > 0 {
        let attempts = app_state.attempt_service.clone();
        let every = Duration::from_secs(config.deadline_sweep_seconds);
        tokio::spawn(async move {
            loop {
                match attempts.expire_overdue_attempts().await {
                    Ok(0) => {}
                    Ok(expired) => info!(expired, "Deadline sweep submitted overdue attempts"),
                    Err(e) => tracing::error!(error = ?e, "Deadline sweep failed"),
                }
                tokio::time::sleep(every).await;
            }
        });
    } else {
        info!("Deadline sweeper disabled");
    }

    let app = create_router(app_state);

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
