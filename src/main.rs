use std::env;
use std::sync::Arc;

use chrono::Duration as ChronoDuration;
use dotenv::dotenv;
use tracing::info;
use tracing_subscriber::EnvFilter;

use meeting_scheduler_service::services::database::create_meeting_store;
use meeting_scheduler_service::services::directory::{StaticRoomCatalog, StaticUserDirectory};
use meeting_scheduler_service::services::reminder::DEFAULT_REMINDER_LEAD_MINUTES;
use meeting_scheduler_service::{MailRelayClient, Notifier, ReminderScheduler};

#[tokio::main]
async fn main() {
    dotenv().ok();

    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Initialize the meeting store
    let store = create_meeting_store().expect("Failed to initialize meeting store");
    info!("Meeting store initialized");

    // Load the static principal and room snapshots
    let users_path =
        env::var("USER_DIRECTORY_PATH").expect("USER_DIRECTORY_PATH must be set in environment");
    let rooms_path =
        env::var("ROOM_CATALOG_PATH").expect("ROOM_CATALOG_PATH must be set in environment");

    let directory = Arc::new(
        StaticUserDirectory::load_csv(&users_path).expect("Failed to load user directory"),
    );
    let rooms =
        Arc::new(StaticRoomCatalog::load_csv(&rooms_path).expect("Failed to load room catalog"));

    let app_url = env::var("APP_URL").expect("APP_URL must be set in environment");

    // Initialize the mail relay client and the notification fan-out
    let client = Arc::new(MailRelayClient::new());
    let notifier = Arc::new(Notifier::new(client));

    // Reminder lead time from environment or default
    let lead_minutes = env::var("REMINDER_LEAD_MINUTES")
        .ok()
        .and_then(|val| val.parse::<i64>().ok())
        .unwrap_or(DEFAULT_REMINDER_LEAD_MINUTES);

    let reminders = Arc::new(
        ReminderScheduler::new(
            store.clone(),
            directory.clone(),
            rooms.clone(),
            notifier.clone(),
            app_url.clone(),
        )
        .with_lead(ChronoDuration::minutes(lead_minutes)),
    );

    // Pending timers do not survive a restart, so recompute the reminder
    // set from the store before accepting any work.
    let restored = reminders
        .restore_from_store()
        .await
        .expect("Failed to restore reminder jobs");
    info!(
        "Reminder scheduler ready with {} jobs ({}m lead)",
        restored, lead_minutes
    );

    // Wait for a shutdown signal; reminder timers run until then
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
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
        _ = ctrl_c => {
            info!("Received interrupt signal, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }

    info!("Shutdown complete");
}
