use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chooseme_api::config::ServerConfig;
use chooseme_api::router::build_app_router;
use chooseme_api::state::AppState;
use chooseme_core::login_throttle::LoginThrottle;
use chooseme_events::{EventBus, LeadAlertRouter};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chooseme_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = config.port,
        environment = %config.environment,
        upload_dir = %config.upload_dir.display(),
        "Loaded server configuration"
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = chooseme_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    chooseme_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    chooseme_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .expect("Failed to create upload directory");

    // --- Events and lead alerts ---
    let event_bus = Arc::new(EventBus::default());
    let alerts = Arc::new(LeadAlertRouter::from_env());
    let status = alerts.status();
    tracing::info!(
        alerts_enabled = status.alerts_enabled,
        email = status.email.status,
        sms = status.sms.status,
        slack = status.slack.status,
        "Lead alert channels"
    );

    let alerts_cancel = CancellationToken::new();
    let alerts_handle = tokio::spawn(
        Arc::clone(&alerts).run(Arc::clone(&event_bus), alerts_cancel.clone()),
    );

    // --- HTTP ---
    let login_throttle = LoginThrottle::new(
        config.admin.max_login_attempts,
        Duration::from_secs(config.admin.lockout_minutes * 60),
    );
    let shutdown_timeout = Duration::from_secs(config.shutdown_timeout_secs);
    let addr = SocketAddr::new(
        config.host.parse().expect("HOST must be a valid IP address"),
        config.port,
    );

    let config = Arc::new(config);
    let state = AppState {
        pool: pool.clone(),
        config: Arc::clone(&config),
        event_bus,
        alerts,
        login_throttle: Arc::new(Mutex::new(login_throttle)),
    };
    let app = build_app_router(state, &config);

    tracing::info!("Starting server on {addr}");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    alerts_cancel.cancel();
    if tokio::time::timeout(shutdown_timeout, alerts_handle)
        .await
        .is_err()
    {
        tracing::warn!("Lead alert router did not stop within the shutdown timeout");
    }
    pool.close().await;

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
