//! Testing utilities: a scriptable API facade and fixtures
//!
//! [`MockEdaApi`] lets session and orchestrator logic run without a
//! researcher service. Responses are queued per operation as raw JSON
//! (the wire shape) and every call is recorded with the body it would
//! have sent.

use crate::api::EdaApi;
use crate::auth::{ResearcherLogin, ResearcherProfile, ResearcherSignup, TokenResponse};
use crate::eda::types::{
    BoxPlot, Correlation, GroupBy, Histogram, MissingAnalysis, Outliers, Percentiles, Report,
    Scatter, SegmentRule, Segmentation, SummaryStats, TimeTrend, TimeUnit, UniqueValues,
};
use crate::error::{Error, Result};
use crate::session::{
    ResearchSession, SessionCreate, SessionListResponse, SessionStatus, SessionUpdate,
};
use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use std::collections::{HashMap, VecDeque};
use tokio::sync::Mutex;
use uuid::Uuid;

/// One recorded facade call: operation name plus the JSON body it
/// would have sent over the wire
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub operation: String,
    pub body: serde_json::Value,
}

/// Scriptable in-memory implementation of [`EdaApi`]
pub struct MockEdaApi {
    responses: Mutex<HashMap<String, VecDeque<Result<serde_json::Value>>>>,
    calls: Mutex<Vec<RecordedCall>>,
    delay_ms: Mutex<Option<u64>>,
}

impl MockEdaApi {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            delay_ms: Mutex::new(None),
        }
    }

    /// Delay every subsequent response, to simulate an in-flight request
    pub async fn set_delay_ms(&self, delay: u64) {
        *self.delay_ms.lock().await = Some(delay);
    }

    /// Queue a successful JSON response for the named operation
    pub async fn queue_ok(&self, operation: &str, body: serde_json::Value) {
        self.responses
            .lock()
            .await
            .entry(operation.to_string())
            .or_default()
            .push_back(Ok(body));
    }

    /// Queue an error for the named operation
    pub async fn queue_err(&self, operation: &str, error: Error) {
        self.responses
            .lock()
            .await
            .entry(operation.to_string())
            .or_default()
            .push_back(Err(error));
    }

    /// All calls made so far, in order
    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }

    /// Number of calls made to the named operation
    pub async fn call_count(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    async fn invoke<T: DeserializeOwned>(
        &self,
        operation: &str,
        body: serde_json::Value,
    ) -> Result<T> {
        self.calls.lock().await.push(RecordedCall {
            operation: operation.to_string(),
            body,
        });

        let delay = *self.delay_ms.lock().await;
        if let Some(ms) = delay {
            tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
        }

        let response = self
            .responses
            .lock()
            .await
            .get_mut(operation)
            .and_then(VecDeque::pop_front);

        match response {
            Some(Ok(value)) => serde_json::from_value(value).map_err(Error::Serialization),
            Some(Err(error)) => Err(error),
            None => Err(Error::Other(format!(
                "No mock response configured for {operation}"
            ))),
        }
    }
}

impl Default for MockEdaApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EdaApi for MockEdaApi {
    async fn login(&self, credentials: &ResearcherLogin) -> Result<TokenResponse> {
        self.invoke("login", serde_json::to_value(credentials)?).await
    }

    async fn signup(&self, profile: &ResearcherSignup) -> Result<TokenResponse> {
        self.invoke("signup", serde_json::to_value(profile)?).await
    }

    async fn list_sessions(
        &self,
        status_filter: Option<SessionStatus>,
    ) -> Result<SessionListResponse> {
        self.invoke(
            "list_sessions",
            serde_json::json!({"status_filter": status_filter}),
        )
        .await
    }

    async fn create_session(&self, draft: &SessionCreate) -> Result<ResearchSession> {
        self.invoke("create_session", serde_json::to_value(draft)?)
            .await
    }

    async fn get_session(&self, id: &str) -> Result<ResearchSession> {
        self.invoke("get_session", serde_json::json!({"id": id}))
            .await
    }

    async fn update_session(&self, id: &str, patch: &SessionUpdate) -> Result<ResearchSession> {
        self.invoke(
            "update_session",
            serde_json::json!({"id": id, "patch": serde_json::to_value(patch)?}),
        )
        .await
    }

    async fn summary_stats(
        &self,
        dataset_id: &str,
        columns: &[String],
    ) -> Result<Vec<SummaryStats>> {
        self.invoke(
            "summary_stats",
            serde_json::json!({"dataset_id": dataset_id, "columns": columns}),
        )
        .await
    }

    async fn unique_values(&self, dataset_id: &str, column: &str) -> Result<UniqueValues> {
        self.invoke(
            "unique_values",
            serde_json::json!({"dataset_id": dataset_id, "column": column}),
        )
        .await
    }

    async fn missing_analysis(
        &self,
        dataset_id: &str,
        columns: &[String],
    ) -> Result<Vec<MissingAnalysis>> {
        self.invoke(
            "missing_analysis",
            serde_json::json!({"dataset_id": dataset_id, "columns": columns}),
        )
        .await
    }

    async fn histogram(&self, dataset_id: &str, column: &str, bins: u32) -> Result<Histogram> {
        self.invoke(
            "histogram",
            serde_json::json!({"dataset_id": dataset_id, "column": column, "bins": bins}),
        )
        .await
    }

    async fn boxplot(&self, dataset_id: &str, column: &str) -> Result<BoxPlot> {
        self.invoke(
            "boxplot",
            serde_json::json!({"dataset_id": dataset_id, "column": column}),
        )
        .await
    }

    async fn percentiles(
        &self,
        dataset_id: &str,
        column: &str,
        percentiles: &[f64],
    ) -> Result<Percentiles> {
        self.invoke(
            "percentiles",
            serde_json::json!({
                "dataset_id": dataset_id,
                "column": column,
                "percentiles": percentiles
            }),
        )
        .await
    }

    async fn correlation(&self, dataset_id: &str, columns: &[String]) -> Result<Correlation> {
        self.invoke(
            "correlation",
            serde_json::json!({"dataset_id": dataset_id, "columns": columns}),
        )
        .await
    }

    async fn scatter(&self, dataset_id: &str, x: &str, y: &str) -> Result<Scatter> {
        self.invoke(
            "scatter",
            serde_json::json!({"dataset_id": dataset_id, "x": x, "y": y}),
        )
        .await
    }

    async fn group_by(
        &self,
        dataset_id: &str,
        group_column: &str,
        metric_column: &str,
    ) -> Result<GroupBy> {
        self.invoke(
            "group_by",
            serde_json::json!({
                "dataset_id": dataset_id,
                "group_column": group_column,
                "metric_column": metric_column
            }),
        )
        .await
    }

    async fn segment(&self, dataset_id: &str, rules: &[SegmentRule]) -> Result<Segmentation> {
        self.invoke(
            "segment",
            serde_json::json!({
                "dataset_id": dataset_id,
                "rules": serde_json::to_value(rules)?
            }),
        )
        .await
    }

    async fn time_trend(
        &self,
        dataset_id: &str,
        column: &str,
        time_unit: TimeUnit,
    ) -> Result<TimeTrend> {
        self.invoke(
            "time_trend",
            serde_json::json!({
                "dataset_id": dataset_id,
                "column": column,
                "time_unit": time_unit
            }),
        )
        .await
    }

    async fn outliers(&self, dataset_id: &str, column: &str) -> Result<Outliers> {
        self.invoke(
            "outliers",
            serde_json::json!({"dataset_id": dataset_id, "column": column}),
        )
        .await
    }

    async fn report(&self, dataset_id: &str, sections: &[String]) -> Result<Report> {
        self.invoke(
            "report",
            serde_json::json!({"dataset_id": dataset_id, "sections": sections}),
        )
        .await
    }
}

/// Build a session fixture with fixed id and title
pub fn sample_session(id: &str, title: &str) -> ResearchSession {
    ResearchSession {
        id: id.to_string(),
        researcher_id: "r1".to_string(),
        title: title.to_string(),
        purpose: "x".to_string(),
        description: None,
        institution: None,
        irb_approval_number: None,
        start_date: None,
        end_date: None,
        status: SessionStatus::Active,
        requested_fields: vec!["age".to_string()],
        data_scope: None,
        session_metadata: None,
        data_access_count: 0,
        last_accessed_at: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Build a session fixture with a generated id
pub fn unique_session(title: &str) -> ResearchSession {
    sample_session(&format!("session-{}", Uuid::new_v4()), title)
}

/// Build a researcher profile fixture
pub fn sample_profile(email: &str) -> ResearcherProfile {
    ResearcherProfile {
        id: "r1".to_string(),
        email: email.to_string(),
        full_name: "Ada Lovelace".to_string(),
        institution: None,
        research_interests: None,
        credentials: None,
        is_active: true,
        is_verified: true,
        created_at: Utc::now(),
        last_login: None,
    }
}

/// Build a token response fixture
pub fn sample_token_response(token: &str) -> TokenResponse {
    TokenResponse {
        access_token: token.to_string(),
        token_type: "bearer".to_string(),
        expires_in: 3600,
        researcher: sample_profile("ada@example.org"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_calls_and_pops_responses() {
        let api = MockEdaApi::new();
        api.queue_ok(
            "outliers",
            serde_json::json!({"outlier_count": 2, "range": [1.0, 9.0]}),
        )
        .await;

        let output = api.outliers("ds1", "age").await.unwrap();
        assert_eq!(output.outlier_count, 2);

        let calls = api.calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].operation, "outliers");
        assert_eq!(
            calls[0].body,
            serde_json::json!({"dataset_id": "ds1", "column": "age"})
        );

        // Queue exhausted
        assert!(api.outliers("ds1", "age").await.is_err());
        assert_eq!(api.call_count("outliers").await, 2);
    }

    #[tokio::test]
    async fn test_mock_returns_queued_errors() {
        let api = MockEdaApi::new();
        api.queue_err("histogram", Error::Request("boom".to_string()))
            .await;

        let result = api.histogram("ds1", "age", 10).await;
        assert!(matches!(result, Err(Error::Request(_))));
    }
}
