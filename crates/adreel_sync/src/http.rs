use crate::config::SessionConfig;
use crate::error::{Result, SyncError};
use crate::service::SessionService;
use crate::wire::*;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Session service over JSON POSTs to `{base}/sessions/{id}/{op}`.
pub struct HttpSessionService {
    config: SessionConfig,
    client: reqwest::Client,
}

impl HttpSessionService {
    pub fn new(config: SessionConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    async fn post<B, R>(&self, op: &str, body: &B) -> Result<R>
    where
        B: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.config.endpoint(op);
        tracing::debug!("POST {}", url);

        let mut request = self.client.post(&url).json(body);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        // No response at all (connect error, timeout) is a network failure.
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::warn!("{} failed with {}", op, status);
        }
        decode_response(status.as_u16(), &text)
    }
}

/// Map a response into the session error taxonomy. Undecodable success
/// bodies are reported as malformed responses rather than raw JSON errors.
fn decode_response<R: DeserializeOwned>(status: u16, text: &str) -> Result<R> {
    if !(200..300).contains(&status) {
        return Err(SyncError::from_status(status, text));
    }
    serde_json::from_str(text).map_err(SyncError::malformed_response)
}

#[async_trait::async_trait]
impl SessionService for HttpSessionService {
    async fn trim(&self, body: &TrimBody) -> Result<TrimResponse> {
        self.post("trim", body).await
    }

    async fn split(&self, body: &SplitBody) -> Result<SplitResponse> {
        self.post("split", body).await
    }

    async fn merge(&self, body: &MergeBody) -> Result<MergeResponse> {
        self.post("merge", body).await
    }

    async fn reposition(&self, body: &RepositionBody) -> Result<RepositionResponse> {
        self.post("reposition", body).await
    }

    async fn save(&self, body: &SaveBody) -> Result<SaveResponse> {
        self.post("save", body).await
    }

    async fn export(&self) -> Result<ExportResponse> {
        self.post("export", &serde_json::json!({})).await
    }

    async fn export_status(&self, body: &ExportStatusBody) -> Result<ExportStatus> {
        self.post("export/status", body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_success_body_is_invalid_request() {
        let err = decode_response::<SaveResponse>(200, "<html>gateway</html>").unwrap_err();
        match err {
            SyncError::InvalidRequest(detail) => assert!(detail.starts_with("malformed response")),
            other => panic!("unexpected {other:?}"),
        }

        let err = decode_response::<SaveResponse>(403, r#"{"error":"read only"}"#).unwrap_err();
        assert!(matches!(err, SyncError::PermissionDenied(_)));

        let ok: SaveResponse =
            decode_response(200, r#"{"sessionId":"s-1","savedAt":"1700000000"}"#).unwrap();
        assert_eq!(ok.session_id, "s-1");
        assert!(ok.updated_state.is_none());
    }

    #[tokio::test]
    async fn unreachable_host_is_network_failure() {
        // Port 9 (discard) on localhost is closed on test machines.
        let mut config = SessionConfig::new("http://127.0.0.1:9", "s-1");
        config.request_timeout_secs = 2;
        let service = HttpSessionService::new(config).unwrap();

        let err = service.export().await.unwrap_err();
        assert!(matches!(err, SyncError::NetworkFailure(_)));
        assert!(!err.requires_reauth());
    }
}
