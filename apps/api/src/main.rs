use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use auth_cell::services::UserService;
use checar_api::create_router;
use shared_config::AppConfig;
use shared_utils::rate_limit::{spawn_cleanup, RateLimiter};
use shared_utils::AppState;

const LIMITER_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CHECAR API server");

    let config = AppConfig::from_env();
    config.validate().context("invalid configuration")?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("HOST and PORT must form a socket address")?;

    let state = AppState::new(config.clone());
    match UserService::new(&state).ensure_admin(&config).await {
        Ok(Some(admin)) => info!("Bootstrap administrator {} created", admin.email),
        Ok(None) if config.has_bootstrap_admin() => info!("Bootstrap administrator already present"),
        Ok(None) => warn!("ADMIN_EMAIL/ADMIN_PASSWORD not set, no administrator bootstrapped"),
        Err(e) => return Err(anyhow::anyhow!("failed to create bootstrap administrator: {}", e)),
    }

    let limiter = RateLimiter::new(config.rate_limit_per_minute)
        .trust_proxy_headers(config.trust_proxy_headers);
    spawn_cleanup(
        vec![limiter.clone(), state.login_limiter.clone()],
        LIMITER_SWEEP_INTERVAL,
    );

    let app = create_router(state, limiter);

    info!("Listening on {}", addr);
    let listener = TcpListener::bind(addr).await.context("failed to bind listener")?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .context("server error")?;

    Ok(())
}
