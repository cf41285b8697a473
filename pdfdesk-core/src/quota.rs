//! Quota gauges
//!
//! Usage numbers come from the backend; the only arithmetic here is the
//! progress percentage. An unknown or zero total yields `NaN`, which is kept
//! in [`QuotaGauge::percent`] and rendered as-is.

use crate::api::ApiClient;
use crate::model::user::QuotaUsage;
use crate::registry::users::QUOTA_USAGE_PATH;
use crate::Result;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaLevel {
    Normal,
    Warning,
    Critical,
}

impl QuotaLevel {
    /// Above 90% is critical, above 70% a warning
    pub fn for_percent(percent: f64) -> Self {
        if percent > 90.0 {
            QuotaLevel::Critical
        } else if percent > 70.0 {
            QuotaLevel::Warning
        } else {
            QuotaLevel::Normal
        }
    }
}

/// One usage-against-quota reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuotaGauge {
    pub used: u64,
    pub total: Option<u64>,
}

impl QuotaGauge {
    pub fn new(used: u64, total: Option<u64>) -> Self {
        Self { used, total }
    }

    /// `used / total * 100`, unclamped
    pub fn percent(&self) -> f64 {
        match self.total {
            Some(total) if total > 0 => self.used as f64 / total as f64 * 100.0,
            _ => f64::NAN,
        }
    }

    /// Percentage clamped to `[0, 100]`; `NaN` passes through
    pub fn display_percent(&self) -> f64 {
        let percent = self.percent();
        if percent.is_nan() {
            percent
        } else {
            percent.clamp(0.0, 100.0)
        }
    }

    pub fn level(&self) -> QuotaLevel {
        QuotaLevel::for_percent(self.percent())
    }

    pub fn remaining(&self) -> Option<u64> {
        self.total.map(|total| total.saturating_sub(self.used))
    }
}

impl fmt::Display for QuotaGauge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.total {
            Some(total) => write!(f, "{} / {} ({:.0}%)", self.used, total, self.display_percent()),
            None => write!(f, "{} / unlimited", self.used),
        }
    }
}

/// Daily and monthly gauges derived from a usage report
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuotaSnapshot {
    pub daily: Option<QuotaGauge>,
    pub monthly: Option<QuotaGauge>,
}

impl From<&QuotaUsage> for QuotaSnapshot {
    fn from(usage: &QuotaUsage) -> Self {
        Self {
            daily: usage
                .has_daily_quota
                .then(|| QuotaGauge::new(usage.daily_usage, usage.daily_quota)),
            monthly: usage
                .has_monthly_quota
                .then(|| QuotaGauge::new(usage.monthly_usage, usage.monthly_quota)),
        }
    }
}

/// Reads the signed-in user's quota usage
#[derive(Debug, Clone)]
pub struct QuotaService {
    client: ApiClient,
}

impl QuotaService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn usage(&self) -> Result<QuotaUsage> {
        self.client.get(QUOTA_USAGE_PATH).await
    }

    pub async fn snapshot(&self) -> Result<QuotaSnapshot> {
        let usage = self.usage().await?;
        Ok(QuotaSnapshot::from(&usage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockBackend, MockReply};
    use http::Method;
    use serde_json::json;

    #[test]
    fn test_percent_and_clamp() {
        let gauge = QuotaGauge::new(15, Some(10));
        assert_eq!(gauge.percent(), 150.0);
        assert_eq!(gauge.display_percent(), 100.0);
        assert_eq!(gauge.remaining(), Some(0));

        assert!(QuotaGauge::new(3, Some(0)).percent().is_nan());
        assert!(QuotaGauge::new(3, None).display_percent().is_nan());
    }

    #[test]
    fn test_levels() {
        assert_eq!(QuotaGauge::new(7, Some(10)).level(), QuotaLevel::Normal);
        assert_eq!(QuotaGauge::new(71, Some(100)).level(), QuotaLevel::Warning);
        assert_eq!(QuotaGauge::new(91, Some(100)).level(), QuotaLevel::Critical);
        assert_eq!(QuotaGauge::new(1, None).level(), QuotaLevel::Normal);
    }

    #[tokio::test]
    async fn test_snapshot_respects_flags() {
        let backend = MockBackend::new();
        backend.on(
            Method::GET,
            QUOTA_USAGE_PATH,
            MockReply::json(200, json!({
                "daily_usage": 8, "daily_quota": 10, "has_daily_quota": true,
                "monthly_usage": 40, "monthly_quota": null, "has_monthly_quota": false
            })),
        );
        let service = QuotaService::new(backend.client().await);

        let snapshot = service.snapshot().await.unwrap();
        let daily = snapshot.daily.unwrap();
        assert_eq!(daily.percent(), 80.0);
        assert_eq!(daily.level(), QuotaLevel::Warning);
        assert_eq!(daily.to_string(), "8 / 10 (80%)");
        assert!(snapshot.monthly.is_none());
    }
}
