//! Local session list and active-session selection

use super::{ResearchSession, SessionCreate};
use crate::api::EdaApi;
use crate::error::Result;
use std::sync::Arc;
use tracing::debug;

/// Authoritative local copy of the researcher's sessions
///
/// Holds at most one "active" session: the consent context analysis
/// requests run under. This is a client-side selection; the server may
/// hold many sessions in `active` status concurrently.
pub struct SessionStore {
    api: Arc<dyn EdaApi>,
    sessions: Vec<ResearchSession>,
    active: Option<ResearchSession>,
}

impl SessionStore {
    /// Create an empty store
    pub fn new(api: Arc<dyn EdaApi>) -> Self {
        Self {
            api,
            sessions: Vec::new(),
            active: None,
        }
    }

    /// All locally known sessions, newest first
    pub fn sessions(&self) -> &[ResearchSession] {
        &self.sessions
    }

    /// The currently selected session, if any
    pub fn active_session(&self) -> Option<&ResearchSession> {
        self.active.as_ref()
    }

    /// Select a session (or clear the selection) without any network call
    pub fn set_active_session(&mut self, session: Option<ResearchSession>) {
        self.active = session;
    }

    /// Reload the session list from the server
    ///
    /// Replaces the local list on success. Selects the first returned
    /// session only when nothing is active yet, so repeated fetches
    /// never steal an existing selection. A failed fetch leaves all
    /// prior state untouched.
    pub async fn fetch_sessions(&mut self) -> Result<()> {
        let response = self.api.list_sessions(None).await?;
        debug!("Loaded {} sessions", response.sessions.len());

        self.sessions = response.sessions;
        if self.active.is_none() {
            self.active = self.sessions.first().cloned();
        }

        Ok(())
    }

    /// Create a session on the server and make it the active selection
    ///
    /// The new session is prepended (newest first) and unconditionally
    /// replaces any prior selection. A failed create leaves all prior
    /// state untouched.
    pub async fn create_session(&mut self, draft: &SessionCreate) -> Result<ResearchSession> {
        let session = self.api.create_session(draft).await?;
        debug!("Created session {}", session.id);

        self.sessions.insert(0, session.clone());
        self.active = Some(session.clone());

        Ok(session)
    }
}
