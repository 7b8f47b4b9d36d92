use super::traits::{RuleSource, RuleStream};
use crate::config::SourceConfig;
use crate::error::RefreshError;
use futures::TryStreamExt;
use reqwest::{Client, StatusCode};
use tokio_util::io::StreamReader;
use tracing::warn;

const MAX_BODY_SNIPPET: usize = 512;

/// Downloads the rule list over HTTP(S).
pub struct HttpSource {
    client: Client,
    url: String,
}

impl HttpSource {
    pub fn new(config: &SourceConfig) -> Result<Self, RefreshError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }
}

#[async_trait::async_trait]
impl RuleSource for HttpSource {
    async fn download(&self) -> Result<RuleStream, RefreshError> {
        let resp = self.client.get(&self.url).send().await?;

        let status = resp.status();
        if status != StatusCode::OK {
            // Best effort, the status alone is enough to fail the cycle.
            let body = match resp.bytes().await {
                Ok(body) => body_snippet(&body),
                Err(e) => {
                    warn!("Failed to read error body from {}: {}", self.url, e);
                    String::new()
                }
            };
            return Err(RefreshError::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        let stream = resp.bytes_stream().map_err(std::io::Error::other);
        Ok(Box::new(StreamReader::new(Box::pin(stream))))
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

fn body_snippet(body: &[u8]) -> String {
    let end = body.len().min(MAX_BODY_SNIPPET);
    String::from_utf8_lossy(&body[..end]).into_owned()
}
