//! Self-pacing poll loop over all monitored nodes.
//!
//! Each round reconciles every node concurrently and waits for all of them
//! to settle before sleeping, so two rounds for the same node never
//! overlap. The sleep is `interval - elapsed`, floored at
//! [`MIN_ROUND_DELAY`] so a slow round never turns into a busy loop.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::Instant;

use crate::config::ExporterConfig;
use crate::metrics::{GaugeFamily, GaugeRegistry};
use crate::reconcile::{NodeGauges, Reconciler};
use crate::rpc::NodeRpc;

/// Minimum pause between two rounds.
pub const MIN_ROUND_DELAY: Duration = Duration::from_millis(10);

/// Delay before the next round given how long the last one took.
pub fn next_delay(interval: Duration, elapsed: Duration) -> Duration {
    interval.saturating_sub(elapsed).max(MIN_ROUND_DELAY)
}

/// Drives one [`Reconciler`] per node on a fixed cadence.
pub struct Poller<C, G> {
    reconcilers: Vec<Reconciler<C, G>>,
    interval: Duration,
}

impl<C, G> Poller<C, G>
where
    C: NodeRpc,
    G: GaugeFamily,
{
    pub fn new(reconcilers: Vec<Reconciler<C, G>>, interval: Duration) -> Self {
        Self {
            reconcilers,
            interval,
        }
    }

    /// Builds one reconciler per configured node, all sharing `rpc` and the
    /// gauge families registered in `registry`.
    pub fn from_config<R>(
        cfg: &ExporterConfig,
        rpc: Arc<C>,
        registry: &R,
    ) -> Result<Self, prometheus::Error>
    where
        R: GaugeRegistry<Family = G>,
    {
        let gauges = NodeGauges::register(registry, cfg.layout)?;
        let reconcilers = cfg
            .nodes
            .iter()
            .map(|node| Reconciler::new(node.clone(), rpc.clone(), gauges.clone()))
            .collect();
        Ok(Self::new(reconcilers, cfg.interval))
    }

    pub fn reconcilers(&self) -> &[Reconciler<C, G>] {
        &self.reconcilers
    }

    /// Reconciles every node once. Failures are logged per node and do not
    /// affect the others. Returns the number of nodes that failed.
    pub async fn poll_round(&mut self) -> usize {
        let results = join_all(self.reconcilers.iter_mut().map(|r| r.reconcile())).await;

        let mut failed = 0;
        for err in results.into_iter().filter_map(Result::err) {
            failed += 1;
            tracing::warn!(
                node = %err.node,
                method = err.method,
                error = %err.source,
                "failed to poll node"
            );
        }
        failed
    }

    /// Polls forever. Cancel by dropping the future.
    pub async fn run(&mut self) {
        tracing::info!(
            nodes = self.reconcilers.len(),
            interval_ms = self.interval.as_millis() as u64,
            "poller running"
        );

        loop {
            let start = Instant::now();
            self.poll_round().await;
            tokio::time::sleep(next_delay(self.interval, start.elapsed())).await;
        }
    }
}
