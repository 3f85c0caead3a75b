use chrono::NaiveDate;
use serde_json::Value;
use std::fmt;

pub mod client;

pub use client::ZanataClient;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("translation platform client configuration error: {0}")]
    Configuration(String),
    #[error("request to {uri} failed: {source}")]
    Transport {
        uri: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{uri} answered with HTTP {status}")]
    Status {
        uri: String,
        status: reqwest::StatusCode,
    },
    #[error("invalid JSON from {uri}: {source}")]
    Decode {
        uri: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Inclusive reporting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> anyhow::Result<Self> {
        if start > end {
            anyhow::bail!("Start date {} is after end date {}", start, end);
        }
        Ok(Self { start, end })
    }
}

/// Formatted the way the stats endpoint expects it: `2017-01-01..2017-06-30`.
impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

/// Read access to a translation platform's contribution statistics.
///
/// Calls are issued one at a time by the collector; implementations never
/// retry.
pub trait StatsSource {
    async fn list_projects(&self) -> Result<Vec<String>, FetchError>;

    /// Versions of `project_id` eligible for reporting.
    async fn list_versions(&self, project_id: &str) -> Result<Vec<String>, FetchError>;

    /// Raw contributor stats of `user_id` within one project version.
    async fn fetch_scope_stats(
        &self,
        project_id: &str,
        version_id: &str,
        user_id: &str,
        period: &DateRange,
    ) -> Result<Value, FetchError>;
}
