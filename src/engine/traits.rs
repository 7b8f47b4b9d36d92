use crate::error::RefreshError;
use tokio::io::AsyncRead;

/// Body of a successful download. Dropping it closes the underlying
/// connection.
pub type RuleStream = Box<dyn AsyncRead + Send + Unpin>;

/// Where the encoded rule list comes from.
#[async_trait::async_trait]
pub trait RuleSource: Send + Sync {
    /// Starts a download and returns the response body on success.
    async fn download(&self) -> Result<RuleStream, RefreshError>;

    /// Human-readable origin used in log lines.
    fn describe(&self) -> String;
}
