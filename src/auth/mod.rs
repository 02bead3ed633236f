//! Researcher authentication types and credential persistence
//!
//! The token issued at login is attached to every outgoing API request.
//! Persistence goes through the [`CredentialStore`] trait so the HTTP
//! client never touches process-global state.

pub mod store;

pub use store::{CredentialStore, FileCredentialStore, MemoryCredentialStore, StoredCredentials};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Researcher account profile as returned by the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearcherProfile {
    pub id: String,
    pub email: String,
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub research_interests: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<String>,
    pub is_active: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
}

/// Successful login/signup response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    /// Token lifetime in seconds
    pub expires_in: u64,
    pub researcher: ResearcherProfile,
}

/// Login request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearcherLogin {
    pub email: String,
    pub password: String,
}

/// Signup request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearcherSignup {
    pub email: String,
    pub password: String,
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub research_interests: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<String>,
}
