use std::time::Duration;

use tracing::{info, warn};

use lumen_api::AppState;

/// Background task that prunes expired email verification codes.
///
/// Runs on an interval and deletes every code past its `expires_at`
/// timestamp, whether or not it was ever used.
pub async fn run_cleanup_loop(state: AppState, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;

        let state = state.clone();
        let result = tokio::task::spawn_blocking(move || {
            state.db.delete_expired_verifications(chrono::Utc::now())
        })
        .await;

        match result {
            Ok(Ok(count)) => {
                if count > 0 {
                    info!("Cleanup: pruned {} expired verification codes", count);
                }
            }
            Ok(Err(e)) => warn!("Cleanup error: {:#}", e),
            Err(e) => warn!("Cleanup task join error: {}", e),
        }
    }
}
