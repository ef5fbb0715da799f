use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::core::generator::MatchGenerator;
use crate::services::CacheManager;

/// Run match generation on a fixed interval in the background
///
/// The first run happens one full interval after the call. Cached match
/// listings are invalidated after every run.
pub fn spawn_periodic_generation(
    generator: MatchGenerator,
    cache: Arc<CacheManager>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!("Scheduled match generation every {}s", period.as_secs());

        loop {
            ticker.tick().await;

            let report = generator.generate_matches().await;
            if !report.is_success() {
                tracing::warn!(
                    "Scheduled match generation finished with {} errors: {:?}",
                    report.errors.len(),
                    report.errors
                );
            }

            if let Err(e) = cache.invalidate_matches().await {
                tracing::warn!("Failed to invalidate match cache: {}", e);
            }
        }
    })
}
