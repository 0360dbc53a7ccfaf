use crate::error::Result;
use crate::wire::*;

/// The remote editing session. Every edit response carries the complete
/// authoritative timeline state.
#[async_trait::async_trait]
pub trait SessionService: Send + Sync {
    async fn trim(&self, body: &TrimBody) -> Result<TrimResponse>;

    async fn split(&self, body: &SplitBody) -> Result<SplitResponse>;

    async fn merge(&self, body: &MergeBody) -> Result<MergeResponse>;

    async fn reposition(&self, body: &RepositionBody) -> Result<RepositionResponse>;

    async fn save(&self, body: &SaveBody) -> Result<SaveResponse>;

    async fn export(&self) -> Result<ExportResponse>;

    async fn export_status(&self, body: &ExportStatusBody) -> Result<ExportStatus>;
}
