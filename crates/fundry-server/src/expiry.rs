use std::time::Duration;

use tracing::{info, warn};

use fundry_api::auth::AppState;

/// Background task that cancels stale pledges.
///
/// Runs on an interval and cancels pending investments that were never
/// signed within the configured window. Committed (signed but unpaid)
/// investments are left alone so the investor can resume payment.
pub async fn run_expiry_loop(state: AppState, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    let max_age_days = state.config.pending_expiry_days;

    loop {
        interval.tick().await;

        let db_state = state.clone();
        let result =
            tokio::task::spawn_blocking(move || db_state.db.expire_stale_pending(max_age_days))
                .await;

        match result {
            Ok(Ok(count)) => {
                if count > 0 {
                    info!("Expiry: cancelled {} stale pending pledges", count);
                }
            }
            Ok(Err(e)) => warn!("Expiry error: {}", e),
            Err(e) => warn!("Expiry task join error: {}", e),
        }
    }
}
