use super::manager::RuleListManager;
use super::ruleset::RuleCounts;
use super::state::{ProviderState, Snapshot};
use super::traits::RuleSource;
use crate::error::RefreshError;
use crate::stats::RefreshStats;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::Receiver;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Keeps a rendered rule document fresh and hands it out to readers.
///
/// One background task (see [`RuleProvider::run`]) rebuilds the document;
/// any number of readers call [`RuleProvider::serve`] concurrently. A failed
/// refresh never replaces the published document.
pub struct RuleProvider {
    manager: RuleListManager,
    interval: Duration,
    state: ProviderState,
    stats: RefreshStats,
}

impl RuleProvider {
    pub fn new(source: Arc<dyn RuleSource>, interval: Duration) -> Arc<Self> {
        let interval = if interval.is_zero() {
            DEFAULT_INTERVAL
        } else {
            interval
        };

        Arc::new(Self {
            manager: RuleListManager::new(source),
            interval,
            state: ProviderState::new(),
            stats: RefreshStats::new(),
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn stats(&self) -> &RefreshStats {
        &self.stats
    }

    /// The last successfully rendered document, empty before the first one.
    pub fn serve(&self) -> Bytes {
        self.state.document()
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.state.load()
    }

    /// Runs one fetch, parse and render cycle and publishes the result.
    pub async fn refresh(&self) -> Result<RuleCounts, RefreshError> {
        let start = Instant::now();
        let result = self.build_snapshot().await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(snapshot) => {
                let counts = snapshot.counts;
                self.state.publish(snapshot);
                self.stats.record_success(elapsed_ms);
                Ok(counts)
            }
            Err(e) => {
                self.stats.record_failure(elapsed_ms, e.to_string());
                Err(e)
            }
        }
    }

    async fn build_snapshot(&self) -> Result<Snapshot, RefreshError> {
        let set = self.manager.build().await?;
        let document = set.to_document()?;
        Ok(Snapshot::new(document, set.counts()))
    }

    async fn update(&self) {
        let start = Instant::now();
        match self.refresh().await {
            Ok(counts) => info!(
                "Rule list update success in {:?}: {} domains, {} ips, {} keywords",
                start.elapsed(),
                counts.domains,
                counts.ips,
                counts.domain_keywords
            ),
            Err(e) => error!(kind = e.kind(), "Rule list update failed, {}", e),
        }
        self.stats.dump();
    }

    /// Refresh loop: one cycle right away, then one per interval or forced
    /// request. The interval timer is armed only after a cycle finishes.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken, mut refresh_rx: Receiver<()>) {
        info!("Rule refresh loop started, interval {:?}", self.interval);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = self.update() => {}
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep(self.interval) => {
                    debug!("Scheduled rule list update...");
                }
                Some(()) = refresh_rx.recv() => {
                    info!("Forced rule list update triggered via API...");
                }
            }
        }

        info!("Rule refresh loop stopped");
    }

    pub fn spawn(self: &Arc<Self>, cancel: CancellationToken, refresh_rx: Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(Arc::clone(self).run(cancel, refresh_rx))
    }
}
