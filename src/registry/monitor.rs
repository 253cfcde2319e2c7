//! Registry reconciliation loop.
//!
//! # Responsibilities
//! - Periodically re-read flags and react to out-of-band changes
//!   (an operator flipping a flag directly in the database)
//!
//! The baseline itself is read by the server before it accepts requests,
//! so the first poll here compares against flags no breaker has touched.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::broadcast;
use tokio::time;

use crate::config::RegistryConfig;
use crate::registry::flags::FlagStatus;
use crate::registry::service::ServiceRegistry;

pub struct RegistryMonitor {
    registry: Arc<ServiceRegistry>,
    config: RegistryConfig,
}

impl RegistryMonitor {
    pub fn new(registry: Arc<ServiceRegistry>, config: RegistryConfig) -> Self {
        Self { registry, config }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tokio::select! {
            _ = time::sleep(Duration::from_millis(self.config.startup_delay_ms)) => {}
            _ = shutdown.recv() => return,
        }

        if !self.config.reconcile {
            tracing::info!("Registry reconciliation disabled");
            return;
        }

        tracing::info!(
            interval_ms = self.config.poll_interval_ms,
            jitter_ms = self.config.poll_jitter_ms,
            "Starting active service listener"
        );

        loop {
            tokio::select! {
                _ = time::sleep(self.next_delay()) => {
                    self.reconcile_once().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Registry monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    fn next_delay(&self) -> Duration {
        let jitter = if self.config.poll_jitter_ms > 0 {
            rand::thread_rng().gen_range(0..self.config.poll_jitter_ms)
        } else {
            0
        };
        Duration::from_millis(self.config.poll_interval_ms + jitter)
    }

    /// Re-read every flag and apply changes against the cached baseline.
    ///
    /// A changed flag has its turn on/off action applied again. Returns the
    /// services whose status changed.
    pub async fn reconcile_once(&self) -> Vec<(String, FlagStatus)> {
        let mut changed = Vec::new();
        for name in self.registry.services() {
            let current = match self.registry.get_flag(name).await {
                Ok(status) => status.unwrap_or(FlagStatus::Off),
                Err(e) => {
                    tracing::warn!(service = %name, error = %e, "Could not poll service flag");
                    continue;
                }
            };

            let previous = self.registry.remember(name, current);
            if previous == Some(current) {
                continue;
            }

            match previous {
                Some(previous) => {
                    tracing::info!(
                        service = %name,
                        "Detected status change for {}: {} -> {}",
                        name,
                        previous,
                        current
                    );
                    // Re-run the per-service action for the observed status.
                    if let Err(e) = self.registry.set_flag(name, current).await {
                        tracing::warn!(service = %name, error = %e, "Failed to re-apply service status");
                    }
                }
                None => tracing::info!(service = %name, status = %current, "Discovered service flag"),
            }
            changed.push((name.clone(), current));
        }
        changed
    }
}
