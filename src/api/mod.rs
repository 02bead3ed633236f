//! API client facade for the MedIQ researcher service
//!
//! [`EdaApi`] is the trait seam between the session store / analysis
//! orchestrator and the wire. [`HttpApiClient`] is the real reqwest
//! implementation; tests drive the rest of the crate through
//! [`crate::testing::MockEdaApi`] instead.

pub mod client;

pub use client::HttpApiClient;

use crate::auth::{ResearcherLogin, ResearcherSignup, TokenResponse};
use crate::eda::types::{
    BoxPlot, Correlation, GroupBy, Histogram, MissingAnalysis, Outliers, Percentiles, Report,
    Scatter, SegmentRule, Segmentation, SummaryStats, TimeTrend, TimeUnit, UniqueValues,
};
use crate::error::Result;
use crate::session::{
    ResearchSession, SessionCreate, SessionListResponse, SessionStatus, SessionUpdate,
};
use async_trait::async_trait;

/// Typed operations against the researcher service
///
/// Every method is a single round trip; no retry, no caching. Non-2xx
/// responses surface as [`crate::Error::Auth`] (login/signup) or
/// [`crate::Error::Request`]; a request that gets no response at all is
/// [`crate::Error::Transport`].
#[async_trait]
pub trait EdaApi: Send + Sync {
    /// Authenticate and persist the issued token
    async fn login(&self, credentials: &ResearcherLogin) -> Result<TokenResponse>;

    /// Register a researcher account and persist the issued token
    async fn signup(&self, profile: &ResearcherSignup) -> Result<TokenResponse>;

    /// List the researcher's sessions, optionally filtered by status
    async fn list_sessions(&self, status_filter: Option<SessionStatus>)
        -> Result<SessionListResponse>;

    /// Create a session; the server assigns id and timestamps
    async fn create_session(&self, draft: &SessionCreate) -> Result<ResearchSession>;

    /// Fetch one session by id
    async fn get_session(&self, id: &str) -> Result<ResearchSession>;

    /// Apply a partial update to a session
    async fn update_session(&self, id: &str, patch: &SessionUpdate) -> Result<ResearchSession>;

    /// Descriptive statistics per column
    async fn summary_stats(&self, dataset_id: &str, columns: &[String])
        -> Result<Vec<SummaryStats>>;

    /// Distinct value counts for one column
    async fn unique_values(&self, dataset_id: &str, column: &str) -> Result<UniqueValues>;

    /// Missingness per column
    async fn missing_analysis(
        &self,
        dataset_id: &str,
        columns: &[String],
    ) -> Result<Vec<MissingAnalysis>>;

    /// Binned distribution of one column
    async fn histogram(&self, dataset_id: &str, column: &str, bins: u32) -> Result<Histogram>;

    /// Quartile summary of one column
    async fn boxplot(&self, dataset_id: &str, column: &str) -> Result<BoxPlot>;

    /// Percentile cut points of one column
    async fn percentiles(
        &self,
        dataset_id: &str,
        column: &str,
        percentiles: &[f64],
    ) -> Result<Percentiles>;

    /// Pairwise correlations across columns
    async fn correlation(&self, dataset_id: &str, columns: &[String]) -> Result<Correlation>;

    /// Binned scatter relationship between two columns
    async fn scatter(&self, dataset_id: &str, x: &str, y: &str) -> Result<Scatter>;

    /// Metric aggregated per group
    async fn group_by(
        &self,
        dataset_id: &str,
        group_column: &str,
        metric_column: &str,
    ) -> Result<GroupBy>;

    /// Cohort size and summary for a rule-defined segment
    async fn segment(&self, dataset_id: &str, rules: &[SegmentRule]) -> Result<Segmentation>;

    /// Mean of one column over time
    async fn time_trend(
        &self,
        dataset_id: &str,
        column: &str,
        time_unit: TimeUnit,
    ) -> Result<TimeTrend>;

    /// Outlier count and non-outlier range of one column
    async fn outliers(&self, dataset_id: &str, column: &str) -> Result<Outliers>;

    /// Generate a report and return its URL
    async fn report(&self, dataset_id: &str, sections: &[String]) -> Result<Report>;
}
