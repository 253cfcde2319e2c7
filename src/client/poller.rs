//! Periodic fetch of the service flag snapshot.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use reqwest::Client;
use tokio::sync::broadcast;
use tokio::time;
use url::Url;

use crate::client::status::ServiceStatus;
use crate::registry::FlagSnapshot;

/// Default refresh period used by the web frontend.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

const SERVICES_PATH: &str = "api/admin/services";

/// Polls `GET /api/admin/services` and publishes a [`ServiceStatus`].
pub struct ServicePoller {
    client: Client,
    url: Url,
    interval: Duration,
    status: Arc<ArcSwap<ServiceStatus>>,
}

impl ServicePoller {
    pub fn new(base_url: &str, interval: Duration) -> Result<Self, url::ParseError> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            client: Client::new(),
            url: base.join(SERVICES_PATH)?,
            interval,
            status: Arc::new(ArcSwap::from_pointee(ServiceStatus::loading())),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Shared handle that always holds the latest status.
    pub fn status(&self) -> Arc<ArcSwap<ServiceStatus>> {
        self.status.clone()
    }

    pub async fn fetch(&self) -> Result<FlagSnapshot, reqwest::Error> {
        self.client
            .get(self.url.clone())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    /// Fetch once and publish the result.
    ///
    /// A failed fetch keeps the previous snapshot. If there was none, the
    /// status becomes loaded-and-empty so consumers stop waiting.
    pub async fn refresh(&self) -> Arc<ServiceStatus> {
        match self.fetch().await {
            Ok(snapshot) => self.status.store(Arc::new(ServiceStatus::loaded(snapshot))),
            Err(e) => {
                tracing::warn!(url = %self.url, error = %e, "Failed to fetch service status");
                if !self.status.load().is_loaded() {
                    self.status.store(Arc::new(ServiceStatus::loaded(FlagSnapshot::new())));
                }
            }
        }
        self.status.load_full()
    }

    /// Refresh immediately, then every `interval` until shutdown.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = time::interval(self.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.refresh().await;
                }
                _ = shutdown.recv() => break,
            }
        }
    }
}
