//! Research session types and local session state
//!
//! A research session is the consent context every analysis request runs
//! under. The server owns the session records; [`SessionStore`] keeps the
//! local copy plus the at-most-one "active" selection the UI analyzes
//! against.

pub mod store;

pub use store::SessionStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a research session
///
/// Archival is a status transition, not a deletion; sessions are never
/// removed client-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Paused,
    Completed,
    Archived,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Paused => "paused",
            SessionStatus::Completed => "completed",
            SessionStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SessionStatus::Active),
            "paused" => Ok(SessionStatus::Paused),
            "completed" => Ok(SessionStatus::Completed),
            "archived" => Ok(SessionStatus::Archived),
            other => Err(crate::error::Error::Validation(format!(
                "Unknown session status '{other}'"
            ))),
        }
    }
}

/// A research session as returned by the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchSession {
    pub id: String,
    pub researcher_id: String,
    pub title: String,
    pub purpose: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub irb_approval_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    pub requested_fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_scope: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_metadata: Option<serde_json::Map<String, serde_json::Value>>,
    /// Monotonically non-decreasing, server-maintained
    pub data_access_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_accessed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Draft for creating a session; the server assigns id and timestamps
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionCreate {
    pub title: String,
    pub purpose: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub irb_approval_number: Option<String>,
    pub requested_fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_scope: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Partial update for an existing session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SessionStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_fields: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_scope: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Paged session listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionListResponse {
    pub sessions: Vec<ResearchSession>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&SessionStatus::Active).unwrap(),
            "\"active\""
        );
        assert_eq!(
            serde_json::from_str::<SessionStatus>("\"archived\"").unwrap(),
            SessionStatus::Archived
        );
    }

    #[test]
    fn test_session_update_skips_unset_fields() {
        let patch = SessionUpdate {
            status: Some(SessionStatus::Paused),
            ..Default::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({"status": "paused"}));
    }

    #[test]
    fn test_session_round_trip() {
        let json = serde_json::json!({
            "id": "s1",
            "researcher_id": "r1",
            "title": "Study A",
            "purpose": "x",
            "status": "active",
            "requested_fields": ["age", "bp"],
            "data_access_count": 3,
            "created_at": "2024-03-01T10:00:00Z",
            "updated_at": "2024-03-02T10:00:00Z"
        });
        let session: ResearchSession = serde_json::from_value(json).unwrap();
        assert_eq!(session.id, "s1");
        assert_eq!(session.status, SessionStatus::Active);
        assert_eq!(session.requested_fields, vec!["age", "bp"]);
        assert!(session.description.is_none());
        assert_eq!(session.data_access_count, 3);
    }
}
