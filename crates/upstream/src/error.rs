use amobagan_core::error::CoreError;

/// Errors from talking to an upstream HTTP service.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("upstream API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The response body did not have the expected shape.
    #[error("failed to decode upstream response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The configured base URL cannot have path segments appended.
    #[error("invalid upstream base URL: {0}")]
    InvalidUrl(String),
}

impl From<UpstreamError> for CoreError {
    fn from(err: UpstreamError) -> Self {
        CoreError::Upstream(err.to_string())
    }
}

/// Ensure the response has a success status code, returning it unchanged.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, UpstreamError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(UpstreamError::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

/// Append path segments to `base`, percent-encoding each one.
pub(crate) fn join_segments(base: &str, segments: &[&str]) -> Result<reqwest::Url, UpstreamError> {
    let mut url =
        reqwest::Url::parse(base).map_err(|e| UpstreamError::InvalidUrl(format!("{base}: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| UpstreamError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
