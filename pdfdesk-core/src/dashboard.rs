//! Dashboard metrics and periodic refresh
//!
//! [`DashboardPoller`] fetches on a fixed period. Every tick spawns its own
//! fetch: a slow fetch does not delay or suppress the next one, and failures
//! are not backed off. A failed fetch yields empty data, the same view the
//! dashboard shows before anything has loaded.

use crate::api::ApiClient;
use crate::model::page::Page;
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tokio::sync::mpsc;

pub const METRICS_PATH: &str = "dashboard/metrics/";
pub const QUICK_LINKS_PATH: &str = "dashboard/quick-links/";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserQuota {
    #[serde(default)]
    pub used: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub remaining: u64,
}

/// Metrics body; anything beyond the known counters is kept in `extra`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardMetrics {
    #[serde(default)]
    pub total_clients: u64,
    #[serde(default)]
    pub active_clients: u64,
    #[serde(default)]
    pub forms_generated: u64,
    #[serde(default)]
    pub quota_usage: f64,
    #[serde(default)]
    pub metrics_by_type: Map<String, Value>,
    #[serde(default)]
    pub user_quota: Option<UserQuota>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickLink {
    #[serde(default, deserialize_with = "crate::model::opt_id_string")]
    pub id: Option<String>,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub order: i64,
    #[serde(default = "crate::model::default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardData {
    pub metrics: DashboardMetrics,
    pub quick_links: Vec<QuickLink>,
    pub user_quota: UserQuota,
}

#[derive(Debug, Clone)]
pub struct DashboardService {
    client: ApiClient,
}

impl DashboardService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Metrics and quick links, fetched concurrently
    pub async fn fetch(&self) -> Result<DashboardData> {
        log::debug!("Fetching dashboard data");
        let (metrics, links) = tokio::try_join!(
            self.client.get::<DashboardMetrics>(METRICS_PATH),
            self.client.get::<Page<QuickLink>>(QUICK_LINKS_PATH),
        )?;

        let mut quick_links: Vec<QuickLink> = links.results.into_iter().filter(|l| l.is_active).collect();
        quick_links.sort_by_key(|l| l.order);
        let user_quota = metrics.user_quota.clone().unwrap_or_default();

        Ok(DashboardData { metrics, quick_links, user_quota })
    }

    /// Like [`fetch`](Self::fetch), logging a failure and falling back to empty data
    pub async fn fetch_or_default(&self) -> DashboardData {
        match self.fetch().await {
            Ok(data) => data,
            Err(err) => {
                log::error!("Dashboard refresh failed: {}", err);
                DashboardData::default()
            }
        }
    }
}

/// Background refresh; dropping the poller stops it
pub struct DashboardPoller {
    task: Option<tokio::task::JoinHandle<()>>,
    period: Duration,
}

impl DashboardPoller {
    /// Start polling; the first fetch fires immediately.
    ///
    /// Returns the poller and a receiver of every completed fetch.
    pub fn spawn(service: DashboardService, period: Duration) -> (Self, mpsc::UnboundedReceiver<DashboardData>) {
        let (tx, rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(period);
            loop {
                interval_timer.tick().await;
                if tx.is_closed() {
                    break;
                }

                let service = service.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let data = service.fetch_or_default().await;
                    // Receiver gone means the dashboard was closed
                    let _ = tx.send(data);
                });
            }
        });

        (Self { task: Some(task), period }, rx)
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for DashboardPoller {
    fn drop(&mut self) {
        self.stop();
    }
}
