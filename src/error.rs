use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Please select an active research session first")]
    NoActiveSession,

    #[error("Credential storage error: {0}")]
    Storage(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl Error {
    /// User-facing message for the analysis error slot.
    ///
    /// Server-provided detail text passes through verbatim; transport
    /// failures collapse to a generic message since no retry policy
    /// distinguishes them from any other failed request.
    pub fn user_message(&self) -> String {
        match self {
            Error::Auth(msg) | Error::Request(msg) => msg.clone(),
            Error::Transport(_) => "Analysis failed".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_message_is_fixed() {
        assert_eq!(
            Error::NoActiveSession.to_string(),
            "Please select an active research session first"
        );
    }

    #[test]
    fn test_user_message_passes_server_detail_through() {
        let err = Error::Request("Dataset not found".to_string());
        assert_eq!(err.user_message(), "Dataset not found");

        let err = Error::Auth("Invalid credentials".to_string());
        assert_eq!(err.user_message(), "Invalid credentials");
    }

    #[test]
    fn test_user_message_generic_for_other_errors() {
        let err = Error::Other("boom".to_string());
        assert_eq!(err.user_message(), "Other error: boom");
    }
}
