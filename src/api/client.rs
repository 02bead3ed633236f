//! HTTP implementation of the researcher service API

use super::EdaApi;
use crate::auth::{CredentialStore, ResearcherLogin, ResearcherSignup, TokenResponse};
use crate::config::ApiConfig;
use crate::eda::types::{
    BoxPlot, Correlation, GroupBy, Histogram, MissingAnalysis, Outliers, Percentiles, Report,
    Scatter, SegmentRule, Segmentation, SummaryStats, TimeTrend, TimeUnit, UniqueValues,
};
use crate::error::{Error, Result};
use crate::session::{
    ResearchSession, SessionCreate, SessionListResponse, SessionStatus, SessionUpdate,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

const AUTH_LOGIN: &str = "/api/v1/auth/login";
const AUTH_SIGNUP: &str = "/api/v1/auth/signup";
const SESSIONS: &str = "/api/v1/sessions";
const EDA_SUMMARY_STATS: &str = "/api/v1/eda/summary-stats";
const EDA_UNIQUE_VALUES: &str = "/api/v1/eda/unique-values";
const EDA_MISSING_ANALYSIS: &str = "/api/v1/eda/missing-analysis";
const EDA_HISTOGRAM: &str = "/api/v1/eda/histogram";
const EDA_BOXPLOT: &str = "/api/v1/eda/boxplot";
const EDA_PERCENTILES: &str = "/api/v1/eda/percentiles";
const EDA_CORRELATION: &str = "/api/v1/eda/correlation";
const EDA_SCATTER: &str = "/api/v1/eda/scatter";
const EDA_GROUP_BY: &str = "/api/v1/eda/group-by";
const EDA_SEGMENT: &str = "/api/v1/eda/segment";
const EDA_TIME_TREND: &str = "/api/v1/eda/time-trend";
const EDA_OUTLIERS: &str = "/api/v1/eda/outliers";
const EDA_REPORT: &str = "/api/v1/eda/report";

/// Researcher service client over HTTP
///
/// Reads the bearer token from the credential store before every
/// request and attaches it when present.
pub struct HttpApiClient {
    client: Client,
    base_url: Url,
    credentials: Arc<dyn CredentialStore>,
}

impl HttpApiClient {
    /// Create a new client against the configured base URL
    pub fn new(config: &ApiConfig, credentials: Arc<dyn CredentialStore>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {e}")))?;

        let base_url = Url::parse(&config.base_url)
            .map_err(|e| Error::Config(format!("Invalid base URL '{}': {e}", config.base_url)))?;

        Ok(Self {
            client,
            base_url,
            credentials,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Config(format!("Invalid endpoint path '{path}': {e}")))
    }

    async fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.credentials.token().await {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.authorize(request).await.send().await?;
        Self::parse_response(response).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!("POST {path}");
        self.send(self.client.post(self.endpoint(path)?).json(body))
            .await
    }

    async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| Error::Request(format!("Failed to parse response: {e}")))
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(Error::Request(detail_message(status, &body)))
        }
    }

    async fn persist(&self, token: &TokenResponse) -> Result<()> {
        self.credentials
            .store(token)
            .await
            .map_err(|e| Error::Storage(e.to_string()))
    }

    /// Clear persisted credentials
    pub async fn logout(&self) -> Result<()> {
        self.credentials
            .clear()
            .await
            .map_err(|e| Error::Storage(e.to_string()))
    }
}

/// Extract the server's `detail` field from an error body, falling back
/// to a status-based message.
fn detail_message(status: StatusCode, body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        detail: Option<serde_json::Value>,
    }

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail)
        .map(|detail| match detail {
            serde_json::Value::String(text) => text,
            other => other.to_string(),
        })
        .unwrap_or_else(|| format!("Request failed with status {status}"))
}

/// Re-classify a request failure as an authentication failure
fn map_auth(error: Error) -> Error {
    match error {
        Error::Request(msg) => Error::Auth(msg),
        other => other,
    }
}

#[derive(Serialize)]
struct MultiColumnBody<'a> {
    dataset_id: &'a str,
    columns: &'a [String],
}

#[derive(Serialize)]
struct SingleColumnBody<'a> {
    dataset_id: &'a str,
    column: &'a str,
}

#[derive(Serialize)]
struct HistogramBody<'a> {
    dataset_id: &'a str,
    column: &'a str,
    bins: u32,
}

#[derive(Serialize)]
struct PercentilesBody<'a> {
    dataset_id: &'a str,
    column: &'a str,
    percentiles: &'a [f64],
}

#[derive(Serialize)]
struct ScatterBody<'a> {
    dataset_id: &'a str,
    x: &'a str,
    y: &'a str,
}

#[derive(Serialize)]
struct GroupByBody<'a> {
    dataset_id: &'a str,
    group_column: &'a str,
    metric_column: &'a str,
}

#[derive(Serialize)]
struct SegmentBody<'a> {
    dataset_id: &'a str,
    rules: &'a [SegmentRule],
}

#[derive(Serialize)]
struct TimeTrendBody<'a> {
    dataset_id: &'a str,
    column: &'a str,
    time_unit: TimeUnit,
}

#[derive(Serialize)]
struct ReportBody<'a> {
    dataset_id: &'a str,
    sections: &'a [String],
}

#[async_trait]
impl EdaApi for HttpApiClient {
    async fn login(&self, credentials: &ResearcherLogin) -> Result<TokenResponse> {
        let token: TokenResponse = self
            .post_json(AUTH_LOGIN, credentials)
            .await
            .map_err(map_auth)?;
        self.persist(&token).await?;
        Ok(token)
    }

    async fn signup(&self, profile: &ResearcherSignup) -> Result<TokenResponse> {
        let token: TokenResponse = self
            .post_json(AUTH_SIGNUP, profile)
            .await
            .map_err(map_auth)?;
        self.persist(&token).await?;
        Ok(token)
    }

    async fn list_sessions(
        &self,
        status_filter: Option<SessionStatus>,
    ) -> Result<SessionListResponse> {
        debug!("GET {SESSIONS}");
        let mut request = self.client.get(self.endpoint(SESSIONS)?);
        if let Some(status) = status_filter {
            request = request.query(&[("status_filter", status.as_str())]);
        }
        self.send(request).await
    }

    async fn create_session(&self, draft: &SessionCreate) -> Result<ResearchSession> {
        self.post_json(SESSIONS, draft).await
    }

    async fn get_session(&self, id: &str) -> Result<ResearchSession> {
        let path = format!("{SESSIONS}/{id}");
        debug!("GET {path}");
        self.send(self.client.get(self.endpoint(&path)?)).await
    }

    async fn update_session(&self, id: &str, patch: &SessionUpdate) -> Result<ResearchSession> {
        let path = format!("{SESSIONS}/{id}");
        debug!("PUT {path}");
        self.send(self.client.put(self.endpoint(&path)?).json(patch))
            .await
    }

    async fn summary_stats(
        &self,
        dataset_id: &str,
        columns: &[String],
    ) -> Result<Vec<SummaryStats>> {
        self.post_json(EDA_SUMMARY_STATS, &MultiColumnBody { dataset_id, columns })
            .await
    }

    async fn unique_values(&self, dataset_id: &str, column: &str) -> Result<UniqueValues> {
        self.post_json(EDA_UNIQUE_VALUES, &SingleColumnBody { dataset_id, column })
            .await
    }

    async fn missing_analysis(
        &self,
        dataset_id: &str,
        columns: &[String],
    ) -> Result<Vec<MissingAnalysis>> {
        self.post_json(
            EDA_MISSING_ANALYSIS,
            &MultiColumnBody { dataset_id, columns },
        )
        .await
    }

    async fn histogram(&self, dataset_id: &str, column: &str, bins: u32) -> Result<Histogram> {
        self.post_json(
            EDA_HISTOGRAM,
            &HistogramBody {
                dataset_id,
                column,
                bins,
            },
        )
        .await
    }

    async fn boxplot(&self, dataset_id: &str, column: &str) -> Result<BoxPlot> {
        self.post_json(EDA_BOXPLOT, &SingleColumnBody { dataset_id, column })
            .await
    }

    async fn percentiles(
        &self,
        dataset_id: &str,
        column: &str,
        percentiles: &[f64],
    ) -> Result<Percentiles> {
        self.post_json(
            EDA_PERCENTILES,
            &PercentilesBody {
                dataset_id,
                column,
                percentiles,
            },
        )
        .await
    }

    async fn correlation(&self, dataset_id: &str, columns: &[String]) -> Result<Correlation> {
        self.post_json(EDA_CORRELATION, &MultiColumnBody { dataset_id, columns })
            .await
    }

    async fn scatter(&self, dataset_id: &str, x: &str, y: &str) -> Result<Scatter> {
        self.post_json(EDA_SCATTER, &ScatterBody { dataset_id, x, y })
            .await
    }

    async fn group_by(
        &self,
        dataset_id: &str,
        group_column: &str,
        metric_column: &str,
    ) -> Result<GroupBy> {
        self.post_json(
            EDA_GROUP_BY,
            &GroupByBody {
                dataset_id,
                group_column,
                metric_column,
            },
        )
        .await
    }

    async fn segment(&self, dataset_id: &str, rules: &[SegmentRule]) -> Result<Segmentation> {
        self.post_json(EDA_SEGMENT, &SegmentBody { dataset_id, rules })
            .await
    }

    async fn time_trend(
        &self,
        dataset_id: &str,
        column: &str,
        time_unit: TimeUnit,
    ) -> Result<TimeTrend> {
        self.post_json(
            EDA_TIME_TREND,
            &TimeTrendBody {
                dataset_id,
                column,
                time_unit,
            },
        )
        .await
    }

    async fn outliers(&self, dataset_id: &str, column: &str) -> Result<Outliers> {
        self.post_json(EDA_OUTLIERS, &SingleColumnBody { dataset_id, column })
            .await
    }

    async fn report(&self, dataset_id: &str, sections: &[String]) -> Result<Report> {
        self.post_json(EDA_REPORT, &ReportBody { dataset_id, sections })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryCredentialStore;

    fn test_client() -> HttpApiClient {
        let config = ApiConfig::default();
        HttpApiClient::new(&config, Arc::new(MemoryCredentialStore::new())).unwrap()
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let client = test_client();
        let url = client.endpoint(EDA_HISTOGRAM).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8003/api/v1/eda/histogram");
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let config = ApiConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        let result = HttpApiClient::new(&config, Arc::new(MemoryCredentialStore::new()));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_bearer_token_attached_when_present() {
        let config = ApiConfig::default();
        let store = Arc::new(MemoryCredentialStore::with_token(
            "tok-1",
            crate::testing::sample_profile("ada@example.org"),
        ));
        let client = HttpApiClient::new(&config, store).unwrap();

        let request = client
            .authorize(client.client.get(client.endpoint(SESSIONS).unwrap()))
            .await
            .build()
            .unwrap();
        let value = request
            .headers()
            .get(reqwest::header::AUTHORIZATION)
            .unwrap()
            .to_str()
            .unwrap();
        assert_eq!(value, "Bearer tok-1");
    }

    #[tokio::test]
    async fn test_no_auth_header_without_token() {
        let client = test_client();
        let request = client
            .authorize(client.client.get(client.endpoint(SESSIONS).unwrap()))
            .await
            .build()
            .unwrap();
        assert!(request.headers().get(reqwest::header::AUTHORIZATION).is_none());
    }

    #[test]
    fn test_detail_message_uses_server_detail() {
        let message = detail_message(
            StatusCode::NOT_FOUND,
            r#"{"detail": "Dataset not found"}"#,
        );
        assert_eq!(message, "Dataset not found");
    }

    #[test]
    fn test_detail_message_falls_back_on_unparseable_body() {
        let message = detail_message(StatusCode::BAD_GATEWAY, "<html>oops</html>");
        assert_eq!(message, "Request failed with status 502 Bad Gateway");
    }

    #[test]
    fn test_detail_message_renders_structured_detail() {
        let message = detail_message(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"detail": [{"loc": ["body", "bins"], "msg": "value is not a valid integer"}]}"#,
        );
        assert!(message.contains("value is not a valid integer"));
    }

    #[test]
    fn test_map_auth_reclassifies_request_errors() {
        let err = map_auth(Error::Request("Invalid credentials".to_string()));
        assert!(matches!(err, Error::Auth(_)));

        let err = map_auth(Error::Config("bad".to_string()));
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_analysis_bodies_serialize_to_wire_shape() {
        let columns = vec!["age".to_string(), "bp".to_string()];
        let body = serde_json::to_value(MultiColumnBody {
            dataset_id: "ds1",
            columns: &columns,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"dataset_id": "ds1", "columns": ["age", "bp"]})
        );

        let body = serde_json::to_value(HistogramBody {
            dataset_id: "ds1",
            column: "glucose_level",
            bins: 10,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"dataset_id": "ds1", "column": "glucose_level", "bins": 10})
        );

        let body = serde_json::to_value(TimeTrendBody {
            dataset_id: "ds1",
            column: "visit_date",
            time_unit: TimeUnit::Month,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"dataset_id": "ds1", "column": "visit_date", "time_unit": "month"})
        );

        let rules = vec![SegmentRule {
            column: "age".to_string(),
            operator: ">=".to_string(),
            value: serde_json::json!(65),
        }];
        let body = serde_json::to_value(SegmentBody {
            dataset_id: "ds1",
            rules: &rules,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "dataset_id": "ds1",
                "rules": [{"column": "age", "operator": ">=", "value": 65}]
            })
        );
    }
}
