//! Client for the nutrition analysis service.
//!
//! Endpoints:
//!
//! ```text
//! POST /v1/analysis          { product, preferences? } -> { content }
//! POST /v1/analysis/stream   { product, preferences? } -> NDJSON lines
//!                            { "content": "...", "section": "..." }
//!                            { "error": "..." }
//! ```

use std::collections::VecDeque;
use std::time::Duration;

use amobagan_core::analysis::{AnalysisStream, NutritionAnalyzer};
use amobagan_core::error::CoreError;
use amobagan_core::nutrition::{AnalysisChunk, NutritionAnalysis, NutritionPreferences};
use amobagan_core::product::Product;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::error::{ensure_success, join_segments, UpstreamError};
use crate::ndjson::LineDecoder;

/// HTTP client for the nutrition analysis service.
pub struct AnalysisServiceClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    /// Applied to one-shot requests only; streams run as long as the
    /// service keeps sending.
    request_timeout: Duration,
}

#[derive(Serialize)]
struct AnalysisRequest<'a> {
    product: &'a Product,
    #[serde(skip_serializing_if = "Option::is_none")]
    preferences: Option<&'a NutritionPreferences>,
}

#[derive(Deserialize)]
struct AnalysisResponse {
    content: String,
}

#[derive(Deserialize)]
struct StreamLine {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    section: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl AnalysisServiceClient {
    /// Create a client reusing an existing [`reqwest::Client`].
    ///
    /// * `base_url` - e.g. `http://localhost:8090`.
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: Option<String>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
            request_timeout,
        }
    }

    /// Request a complete analysis in one round trip.
    pub async fn request_analysis(
        &self,
        product: &Product,
        preferences: Option<&NutritionPreferences>,
    ) -> Result<NutritionAnalysis, UpstreamError> {
        let url = join_segments(&self.base_url, &["v1", "analysis"])?;
        let response = self
            .post(url, product, preferences)
            .timeout(self.request_timeout)
            .send()
            .await?;

        let response = ensure_success(response).await?;
        let bytes = response.bytes().await?;
        let body: AnalysisResponse = serde_json::from_slice(&bytes)?;

        Ok(NutritionAnalysis {
            barcode: product.barcode.clone(),
            product_name: product.name.clone(),
            content: body.content,
            personalized: preferences.is_some(),
            generated_at: chrono::Utc::now(),
        })
    }

    /// Open a streamed analysis. The returned stream yields one item per
    /// NDJSON line and ends when the service closes the body.
    pub async fn open_stream(
        &self,
        product: &Product,
        preferences: Option<&NutritionPreferences>,
    ) -> Result<AnalysisStream, UpstreamError> {
        let url = join_segments(&self.base_url, &["v1", "analysis", "stream"])?;
        let response = self.post(url, product, preferences).send().await?;
        let response = ensure_success(response).await?;

        Ok(decode_stream(response.bytes_stream().boxed()))
    }

    fn post(
        &self,
        url: reqwest::Url,
        product: &Product,
        preferences: Option<&NutritionPreferences>,
    ) -> reqwest::RequestBuilder {
        let request = self.client.post(url).json(&AnalysisRequest {
            product,
            preferences,
        });
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

#[async_trait]
impl NutritionAnalyzer for AnalysisServiceClient {
    async fn analyze(
        &self,
        product: &Product,
        preferences: Option<&NutritionPreferences>,
    ) -> Result<NutritionAnalysis, CoreError> {
        self.request_analysis(product, preferences)
            .await
            .map_err(|e| {
                tracing::warn!(barcode = %product.barcode, error = %e, "Nutrition analysis failed");
                CoreError::from(e)
            })
    }

    async fn analyze_stream(
        &self,
        product: &Product,
        preferences: Option<&NutritionPreferences>,
    ) -> Result<AnalysisStream, CoreError> {
        self.open_stream(product, preferences).await.map_err(|e| {
            tracing::warn!(barcode = %product.barcode, error = %e, "Nutrition stream failed to open");
            CoreError::from(e)
        })
    }
}

struct DecodeState<S> {
    bytes: S,
    decoder: LineDecoder,
    pending: VecDeque<String>,
    done: bool,
}

/// Turn a raw body stream into analysis chunks.
///
/// A transport error or an `error` line ends the stream after yielding it.
fn decode_stream<S, B>(bytes: S) -> AnalysisStream
where
    S: Stream<Item = Result<B, reqwest::Error>> + Send + Unpin + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    let state = DecodeState {
        bytes,
        decoder: LineDecoder::new(),
        pending: VecDeque::new(),
        done: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(line) = state.pending.pop_front() {
                let item = parse_line(&line);
                if item.is_err() {
                    state.pending.clear();
                    state.done = true;
                }
                return Some((item, state));
            }
            if state.done {
                return None;
            }
            match state.bytes.next().await {
                Some(Ok(buf)) => {
                    let lines = state.decoder.push(buf.as_ref());
                    state.pending.extend(lines);
                }
                Some(Err(e)) => {
                    state.done = true;
                    return Some((Err(UpstreamError::from(e).into()), state));
                }
                None => {
                    state.done = true;
                    state.pending.extend(state.decoder.finish());
                }
            }
        }
    })
    .boxed()
}

fn parse_line(line: &str) -> Result<AnalysisChunk, CoreError> {
    let parsed: StreamLine = serde_json::from_str(line).map_err(UpstreamError::from)?;
    if let Some(message) = parsed.error {
        return Err(CoreError::Upstream(message));
    }
    Ok(AnalysisChunk {
        content: parsed.content.unwrap_or_default(),
        section: parsed.section,
    })
}
