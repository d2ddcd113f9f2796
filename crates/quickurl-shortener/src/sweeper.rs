use crate::shortener::Shortener;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Periodically removes expired records in the background.
///
/// Reads already hide expired records, so the sweeper only reclaims space and
/// frees their tokens. A failed pass is logged and retried on the next tick.
pub struct Sweeper {
    shortener: Arc<dyn Shortener>,
    interval: Duration,
}

impl Sweeper {
    pub fn new(shortener: Arc<dyn Shortener>, interval: Duration) -> Self {
        Self {
            shortener,
            interval: interval.max(Duration::from_millis(1)),
        }
    }

    /// Runs until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        info!(interval = ?self.interval, "sweeper started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => self.sweep_once().await,
            }
        }

        info!("sweeper stopped");
    }

    /// Spawns [`Sweeper::run`] onto the current runtime.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    async fn sweep_once(&self) {
        match self.shortener.purge_expired().await {
            Ok(0) => debug!("no expired urls"),
            Ok(removed) => info!(removed, "purged expired urls"),
            Err(err) => warn!(error = %err, retryable = err.is_retryable(), "sweep failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, ShortenerError};
    use crate::shortener::ShortenParams;
    use async_trait::async_trait;
    use quickurl_core::{ListQuery, StoreError, Token, UrlRecord};
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Counts purge calls; fails every other one.
    #[derive(Default)]
    struct CountingShortener {
        purges: AtomicU64,
    }

    #[async_trait]
    impl Shortener for CountingShortener {
        async fn shorten(&self, _params: ShortenParams) -> Result<UrlRecord> {
            unimplemented!()
        }

        async fn resolve(&self, _token: &Token) -> Result<UrlRecord> {
            unimplemented!()
        }

        async fn info(&self, _token: &Token) -> Result<UrlRecord> {
            unimplemented!()
        }

        async fn list(&self, _query: ListQuery) -> Result<Vec<UrlRecord>> {
            unimplemented!()
        }

        async fn delete(&self, _token: &Token) -> Result<()> {
            unimplemented!()
        }

        async fn purge_expired(&self) -> Result<u64> {
            let n = self.purges.fetch_add(1, Ordering::SeqCst);
            if n % 2 == 1 {
                return Err(ShortenerError::Storage(StoreError::Unavailable(
                    "disk gone".to_string(),
                )));
            }
            Ok(n)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn sweeps_on_every_tick_until_cancelled() {
        let shortener = Arc::new(CountingShortener::default());
        let shutdown = CancellationToken::new();
        let handle =
            Sweeper::new(shortener.clone(), Duration::from_secs(10)).spawn(shutdown.clone());

        // No sweep before the first interval elapses.
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(shortener.purges.load(Ordering::SeqCst), 0);

        // Failures do not stop the loop.
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(shortener.purges.load(Ordering::SeqCst), 3);

        shutdown.cancel();
        handle.await.unwrap();

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(shortener.purges.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn stops_immediately_when_already_cancelled() {
        let shortener = Arc::new(CountingShortener::default());
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        Sweeper::new(shortener.clone(), Duration::from_secs(3600))
            .run(shutdown)
            .await;

        assert_eq!(shortener.purges.load(Ordering::SeqCst), 0);
    }
}
