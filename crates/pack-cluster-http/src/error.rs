use pack_core::AdapterError;

/// Failures talking to the cluster API, collapsed into the narrow
/// [`AdapterError`] the runner actually inspects (`spec §4.6` "Contracts").
#[derive(Debug, thiserror::Error)]
pub enum ClusterHttpError {
    #[error("invalid cluster address: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
    #[error("request to cluster failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("cluster returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("failed to decode cluster response: {0}")]
    Decode(#[source] reqwest::Error),
}

impl ClusterHttpError {
    /// Collapses every transport/decode failure into `AdapterError::Other`,
    /// except a 404 status, which is the one sentinel the runner inspects
    /// textually (`spec §4.6`). The response body is passed through
    /// verbatim so an index-enforcement message keeps the
    /// `\(Enforcing job modify index.*\)` prefix the runner re-labels.
    pub(crate) fn into_adapter_error(self) -> AdapterError {
        match self {
            ClusterHttpError::Status { status, .. } if status == reqwest::StatusCode::NOT_FOUND => {
                AdapterError::NotFound
            }
            ClusterHttpError::Status { status, body } => {
                AdapterError::Other(format!("{status}: {body}"))
            }
            other => AdapterError::Other(other.to_string()),
        }
    }
}
