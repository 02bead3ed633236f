//! Analysis request lifecycle and dispatch

use super::types::{AnalysisKind, AnalysisOutput, AnalysisRequest};
use crate::api::EdaApi;
use crate::error::{Error, Result};
use crate::session::{ResearchSession, SessionCreate, SessionStore};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

const FETCH_SESSIONS_FAILED: &str = "Failed to load sessions";
const CREATE_SESSION_FAILED: &str = "Failed to create session";

/// Lifecycle phase of the analysis slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisPhase {
    /// No result, no error, nothing in flight
    Idle,
    /// A request is in flight
    Loading,
    /// A result is held, paired with its kind
    Success,
    /// The last settled request failed
    Failed,
}

/// Point-in-time view of the orchestrator for rendering
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSnapshot {
    pub loading: bool,
    pub error: Option<String>,
    pub view_type: Option<AnalysisKind>,
    pub data: Option<AnalysisOutput>,
}

impl AnalysisSnapshot {
    pub fn phase(&self) -> AnalysisPhase {
        if self.loading {
            AnalysisPhase::Loading
        } else if self.error.is_some() {
            AnalysisPhase::Failed
        } else if self.data.is_some() {
            AnalysisPhase::Success
        } else {
            AnalysisPhase::Idle
        }
    }
}

struct ControllerState {
    store: SessionStore,
    loading: bool,
    error: Option<String>,
    /// The single current result; a new settled request overwrites it.
    /// The view type is derived from the payload, so a held result is
    /// always paired with its kind.
    output: Option<AnalysisOutput>,
    /// Context version: bumped on every accepted request, reset, and
    /// selection change. A response settling under an older generation
    /// is stale and its result/error is discarded.
    generation: u64,
    /// Generation of the most recently accepted request; that request
    /// owns the loading flag and clears it when it settles, even if
    /// its result was invalidated by a context change.
    latest_request: u64,
}

/// Orchestrates research sessions and analysis requests
///
/// All mutation goes through one lock; analysis requests release it
/// while in flight, so the session can change or the slot can be reset
/// while a request is outstanding. Stale responses are discarded by
/// generation.
pub struct EdaController {
    api: Arc<dyn EdaApi>,
    state: RwLock<ControllerState>,
}

impl EdaController {
    /// Create a controller over the given API facade
    pub fn new(api: Arc<dyn EdaApi>) -> Self {
        let store = SessionStore::new(api.clone());
        Self {
            api,
            state: RwLock::new(ControllerState {
                store,
                loading: false,
                error: None,
                output: None,
                generation: 0,
                latest_request: 0,
            }),
        }
    }

    /// All locally known sessions, newest first
    pub async fn sessions(&self) -> Vec<ResearchSession> {
        self.state.read().await.store.sessions().to_vec()
    }

    /// The currently selected session, if any
    pub async fn active_session(&self) -> Option<ResearchSession> {
        self.state.read().await.store.active_session().cloned()
    }

    /// Select a session (or clear the selection); no network call.
    /// Outstanding analysis responses are invalidated.
    pub async fn set_active_session(&self, session: Option<ResearchSession>) {
        let mut state = self.state.write().await;
        state.store.set_active_session(session);
        state.generation += 1;
    }

    /// Reload the session list, keeping any existing selection
    pub async fn fetch_sessions(&self) -> Result<()> {
        let mut state = self.state.write().await;
        state.loading = true;

        let before = state.store.active_session().map(|s| s.id.clone());
        let result = state.store.fetch_sessions().await;
        state.loading = false;

        match result {
            Ok(()) => {
                let after = state.store.active_session().map(|s| s.id.clone());
                if before != after {
                    state.generation += 1;
                }
                Ok(())
            }
            Err(err) => {
                state.error = Some(FETCH_SESSIONS_FAILED.to_string());
                Err(err)
            }
        }
    }

    /// Create a session and make it the active selection
    pub async fn create_session(&self, draft: &SessionCreate) -> Result<ResearchSession> {
        let mut state = self.state.write().await;
        state.loading = true;

        let result = state.store.create_session(draft).await;
        state.loading = false;

        match result {
            Ok(session) => {
                state.generation += 1;
                Ok(session)
            }
            Err(err) => {
                state.error = Some(CREATE_SESSION_FAILED.to_string());
                Err(err)
            }
        }
    }

    /// Run one analysis request against the active session's context
    ///
    /// Rejected synchronously when no session is active; no network
    /// call is made and the held result is left alone. Otherwise the
    /// request is dispatched and, unless superseded in the meantime,
    /// its settlement becomes the new state: a success stores the
    /// result, a failure stores a user-facing message and clears any
    /// prior result.
    pub async fn run_analysis(&self, request: AnalysisRequest) -> Result<AnalysisOutput> {
        let generation = {
            let mut state = self.state.write().await;
            if state.store.active_session().is_none() {
                let err = Error::NoActiveSession;
                state.error = Some(err.to_string());
                return Err(err);
            }
            state.loading = true;
            state.error = None;
            state.generation += 1;
            state.latest_request = state.generation;
            state.generation
        };

        let kind = request.kind();
        debug!("Dispatching {kind} analysis");
        let result = self.dispatch(request).await;

        let mut state = self.state.write().await;
        if state.latest_request == generation {
            state.loading = false;
        }
        if state.generation != generation {
            debug!("Discarding stale {kind} response");
            return result;
        }

        match result {
            Ok(output) => {
                state.error = None;
                state.output = Some(output.clone());
                Ok(output)
            }
            Err(err) => {
                state.error = Some(err.user_message());
                state.output = None;
                Err(err)
            }
        }
    }

    /// Clear result, view type, and error; cancels interest in any
    /// outstanding response
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        state.loading = false;
        state.error = None;
        state.output = None;
        state.generation += 1;
    }

    /// Current loading/error/result state for rendering
    pub async fn snapshot(&self) -> AnalysisSnapshot {
        let state = self.state.read().await;
        AnalysisSnapshot {
            loading: state.loading,
            error: state.error.clone(),
            view_type: state.output.as_ref().map(AnalysisOutput::kind),
            data: state.output.clone(),
        }
    }

    async fn dispatch(&self, request: AnalysisRequest) -> Result<AnalysisOutput> {
        match request {
            AnalysisRequest::Summary {
                dataset_id,
                columns,
            } => self
                .api
                .summary_stats(&dataset_id, &columns)
                .await
                .map(AnalysisOutput::Summary),
            AnalysisRequest::Unique { dataset_id, column } => self
                .api
                .unique_values(&dataset_id, &column)
                .await
                .map(AnalysisOutput::Unique),
            AnalysisRequest::Missing {
                dataset_id,
                columns,
            } => self
                .api
                .missing_analysis(&dataset_id, &columns)
                .await
                .map(AnalysisOutput::Missing),
            AnalysisRequest::Histogram {
                dataset_id,
                column,
                bins,
            } => self
                .api
                .histogram(&dataset_id, &column, bins)
                .await
                .map(AnalysisOutput::Histogram),
            AnalysisRequest::Boxplot { dataset_id, column } => self
                .api
                .boxplot(&dataset_id, &column)
                .await
                .map(AnalysisOutput::Boxplot),
            AnalysisRequest::Percentiles {
                dataset_id,
                column,
                percentiles,
            } => self
                .api
                .percentiles(&dataset_id, &column, &percentiles)
                .await
                .map(AnalysisOutput::Percentiles),
            AnalysisRequest::Correlation {
                dataset_id,
                columns,
            } => self
                .api
                .correlation(&dataset_id, &columns)
                .await
                .map(AnalysisOutput::Correlation),
            AnalysisRequest::Scatter { dataset_id, x, y } => self
                .api
                .scatter(&dataset_id, &x, &y)
                .await
                .map(AnalysisOutput::Scatter),
            AnalysisRequest::GroupBy {
                dataset_id,
                group_column,
                metric_column,
            } => self
                .api
                .group_by(&dataset_id, &group_column, &metric_column)
                .await
                .map(AnalysisOutput::GroupBy),
            AnalysisRequest::Segment { dataset_id, rules } => self
                .api
                .segment(&dataset_id, &rules)
                .await
                .map(AnalysisOutput::Segment),
            AnalysisRequest::Trend {
                dataset_id,
                column,
                time_unit,
            } => self
                .api
                .time_trend(&dataset_id, &column, time_unit)
                .await
                .map(AnalysisOutput::Trend),
            AnalysisRequest::Outliers { dataset_id, column } => self
                .api
                .outliers(&dataset_id, &column)
                .await
                .map(AnalysisOutput::Outliers),
            AnalysisRequest::Report {
                dataset_id,
                sections,
            } => self
                .api
                .report(&dataset_id, &sections)
                .await
                .map(AnalysisOutput::Report),
        }
    }
}
