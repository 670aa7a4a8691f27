use time::OffsetDateTime;
use tokio::sync::watch;
use tokio::time::{interval, Duration};

use crate::core::state::AppState;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Drops drafts idle for longer than the configured TTL until shutdown is signalled.
pub(crate) async fn run(state: AppState, mut shutdown: watch::Receiver<bool>) {
    let ttl = idle_ttl(state.settings().drafts().ttl_minutes);
    let mut tick = interval(SWEEP_INTERVAL);

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = tick.tick() => {
                if let Some(cutoff) = OffsetDateTime::now_utc().checked_sub(ttl) {
                    sweep(&state, cutoff).await;
                }
            }
        }
    }

    tracing::info!("Draft sweeper stopped");
}

fn idle_ttl(ttl_minutes: u64) -> time::Duration {
    time::Duration::minutes(i64::try_from(ttl_minutes).unwrap_or(i64::MAX / 60))
}

pub(crate) async fn sweep(state: &AppState, cutoff: OffsetDateTime) -> usize {
    let expired = state.drafts().purge_idle(cutoff).await;
    for draft_id in &expired {
        state.debouncer().cancel(draft_id);
    }
    if !expired.is_empty() {
        tracing::info!(count = expired.len(), "Discarded idle drafts");
    }
    expired.len()
}
