use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use leadbridge_api::background;
use leadbridge_api::config::ServerConfig;
use leadbridge_api::router::build_app_router;
use leadbridge_api::state::AppState;
use leadbridge_core::events::SyncEventType;
use leadbridge_crm::{CrmApi, CrmClient, StatusFieldMap};
use leadbridge_outreach::{OutreachApi, OutreachClient};
use leadbridge_sync::backfill::BackfillOrchestrator;
use leadbridge_sync::classifier::EventClassifier;
use leadbridge_sync::engine::SyncEngine;
use leadbridge_sync::notify::{AlertSink, ChatOpsNotifier, LogOnlySink};
use leadbridge_sync::retry::RetrySubsystem;
use leadbridge_sync::store::{BackfillStore, PgStore, SyncStore, WatchdogStore};
use leadbridge_sync::tag_cache::CampaignTagCache;
use leadbridge_sync::watchdog::CronWatchdog;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "leadbridge_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = leadbridge_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    leadbridge_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    leadbridge_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- External clients ---
    let outreach: Arc<dyn OutreachApi> = Arc::new(OutreachClient::new(
        config.outreach_api_url.clone(),
        config.outreach_api_key.clone(),
    ));
    let crm: Arc<dyn CrmApi> = Arc::new(CrmClient::new(
        config.crm_api_url.clone(),
        config.crm_api_token.clone(),
        StatusFieldMap::default(),
    ));

    // --- Webhook subscription ---
    if let Some(url) = &config.webhook_public_url {
        match outreach
            .ensure_webhook(url, SyncEventType::supported_wire_types())
            .await
        {
            Ok(()) => tracing::info!(%url, "Webhook subscription registered"),
            Err(e) => tracing::warn!(error = %e, %url, "Webhook registration failed, continuing"),
        }
    }

    // --- Sync components ---
    let store = Arc::new(PgStore::new(pool.clone()));
    let tag_cache = Arc::new(CampaignTagCache::new(
        Arc::clone(&outreach),
        config.campaign_tag.clone(),
    ));
    let classifier = Arc::new(EventClassifier::new(tag_cache));
    let engine = Arc::new(SyncEngine::new(
        Arc::clone(&crm),
        Arc::clone(&store) as Arc<dyn SyncStore>,
    ));
    let backfill = Arc::new(BackfillOrchestrator::new(
        Arc::clone(&outreach),
        Arc::clone(&engine),
        Arc::clone(&store) as Arc<dyn BackfillStore>,
        config.campaign_tag.clone(),
    ));
    let retry = Arc::new(RetrySubsystem::new(
        Arc::clone(&engine),
        Arc::clone(&store) as Arc<dyn SyncStore>,
    ));

    let sink: Arc<dyn AlertSink> = match &config.chatops_webhook_url {
        Some(url) => Arc::new(ChatOpsNotifier::new(url.clone())),
        None => Arc::new(LogOnlySink),
    };
    let watchdog = Arc::new(CronWatchdog::new(
        Arc::clone(&store) as Arc<dyn WatchdogStore>,
        sink,
        config.monitored_jobs(),
    ));

    // --- Watchdog scheduler ---
    let watchdog_cancel = tokio_util::sync::CancellationToken::new();
    let watchdog_handle =
        background::start_watchdog_scheduler(Arc::clone(&watchdog), watchdog_cancel.clone());
    tracing::info!("Watchdog scheduler started");

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        outreach,
        classifier,
        engine,
        backfill,
        retry,
        watchdog,
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    watchdog_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), watchdog_handle).await;
    tracing::info!("Watchdog scheduler stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
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
