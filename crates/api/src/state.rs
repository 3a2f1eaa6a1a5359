use std::sync::Arc;

use leadbridge_outreach::OutreachApi;
use leadbridge_sync::backfill::BackfillOrchestrator;
use leadbridge_sync::classifier::EventClassifier;
use leadbridge_sync::engine::SyncEngine;
use leadbridge_sync::retry::RetrySubsystem;
use leadbridge_sync::watchdog::CronWatchdog;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via
/// `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: leadbridge_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Outreach platform client (campaign listing for operators).
    pub outreach: Arc<dyn OutreachApi>,
    /// Webhook event classifier (owns the campaign tag cache).
    pub classifier: Arc<EventClassifier>,
    /// The sync engine.
    pub engine: Arc<SyncEngine>,
    /// Backfill orchestrator.
    pub backfill: Arc<BackfillOrchestrator>,
    /// Failed-sync retry subsystem.
    pub retry: Arc<RetrySubsystem>,
    /// Scheduled-job watchdog.
    pub watchdog: Arc<CronWatchdog>,
}
