use thiserror::Error;

/// Everything that can abort a single refresh cycle.
///
/// None of these reach readers: the provider logs them and keeps serving the
/// last document it published.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("failed to reach rule source: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("download rule list failed, code: {status}, body: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("failed to read rule list stream: {0}")]
    Stream(#[from] std::io::Error),

    #[error("failed to decode base64 rule list: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("failed to render rule document: {0}")]
    Render(#[from] serde_yaml::Error),
}

impl RefreshError {
    /// Short label used in stats and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            RefreshError::Transport(_) => "transport",
            RefreshError::UpstreamStatus { .. } => "upstream_status",
            RefreshError::Stream(_) | RefreshError::Decode(_) => "decode",
            RefreshError::Render(_) => "render",
        }
    }
}
