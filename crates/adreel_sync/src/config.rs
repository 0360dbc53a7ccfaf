use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection settings for one remote editing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub base_url: String,
    pub session_id: String,
    /// Bearer token. Never written back out.
    #[serde(default, skip_serializing)]
    pub token: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_poll_interval_ms() -> u64 {
    2_000
}

impl SessionConfig {
    pub fn new(base_url: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            session_id: session_id.into(),
            token: None,
            request_timeout_secs: default_request_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// `{base}/sessions/{id}/{op}`
    pub fn endpoint(&self, op: &str) -> String {
        format!(
            "{}/sessions/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.session_id,
            op
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slash() {
        let cfg = SessionConfig::new("https://edit.example.com/api/", "s-42");
        assert_eq!(
            cfg.endpoint("trim"),
            "https://edit.example.com/api/sessions/s-42/trim"
        );
    }

    #[test]
    fn token_is_not_serialized() {
        let cfg = SessionConfig::new("http://localhost:8080", "abc").with_token("secret");
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(!json.contains("secret"));

        let back: SessionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.token, None);
        assert_eq!(back.poll_interval(), Duration::from_secs(2));
    }

    #[test]
    fn defaults_fill_missing_fields() {
        let cfg: SessionConfig =
            serde_json::from_str(r#"{"base_url":"http://x","session_id":"y"}"#).unwrap();
        assert_eq!(cfg.request_timeout(), Duration::from_secs(30));
    }
}
