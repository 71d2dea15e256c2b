//! Tests for nutrition streaming over WebSocket.
//!
//! Session tests drive `run_analysis` / `StreamSession` against a plain
//! channel. End-to-end tests start the full router on an ephemeral port and
//! talk to it with `tokio-tungstenite`.

mod common;

use std::sync::Arc;
use std::time::Duration;

use amobagan_api::handlers::products::ProductController;
use amobagan_api::ws::session::{run_analysis, StreamSession};
use amobagan_core::analysis::{AnalysisStream, NutritionAnalyzer};
use amobagan_core::barcode::Barcode;
use amobagan_core::error::CoreError;
use amobagan_core::nutrition::{AnalysisChunk, NutritionAnalysis, NutritionPreferences};
use amobagan_core::product::Product;
use amobagan_core::stream::{StreamMessage, StreamMessageKind};
use async_trait::async_trait;
use axum::extract::ws::Message;
use common::{build_test_app, build_test_app_with, nutella, token_for, StubAnalyzer, StubCatalog};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;

/// Decode the next queued frame as a `StreamMessage`.
async fn next_message(rx: &mut mpsc::UnboundedReceiver<Message>) -> StreamMessage {
    let msg = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for a stream message")
        .expect("channel closed");
    match msg {
        Message::Text(text) => serde_json::from_str(text.as_str()).unwrap(),
        other => panic!("Expected a text frame, got: {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// run_analysis
// ---------------------------------------------------------------------------

#[tokio::test]
async fn streams_chunks_then_complete() {
    let app = build_test_app();
    let (tx, mut rx) = mpsc::unbounded_channel();

    run_analysis(app.state.products.clone(), tx, Barcode::new("ABC123"), None).await;

    let first = next_message(&mut rx).await;
    assert_eq!(first.kind, StreamMessageKind::StreamChunk);
    assert_eq!(first.content, "## Nutri-Score");

    let second = next_message(&mut rx).await;
    assert_eq!(second.kind, StreamMessageKind::StreamChunk);
    assert_eq!(second.content, " E");

    let done = next_message(&mut rx).await;
    assert_eq!(done.kind, StreamMessageKind::StreamComplete);
    assert_eq!(done.content, "## Nutri-Score E");
    let data = done.data.expect("complete carries metadata");
    assert_eq!(data["barcode"], "ABC123");
    assert_eq!(data["product_name"], "Nutella");
    assert_eq!(data["personalized"], false);
}

#[tokio::test]
async fn unknown_product_yields_error_message() {
    let app = build_test_app();
    let (tx, mut rx) = mpsc::unbounded_channel();

    run_analysis(app.state.products.clone(), tx, Barcode::new("NOPE"), None).await;

    let msg = next_message(&mut rx).await;
    assert_eq!(msg.kind, StreamMessageKind::Error);
    assert_eq!(msg.content, "Product NOPE not found");
    assert!(app.analyzer.calls().is_empty());
}

#[tokio::test]
async fn mid_stream_failure_ends_with_error_and_no_complete() {
    let app = build_test_app_with(
        StubCatalog::with_products([nutella()]),
        StubAnalyzer::failing_after(&["partial"]),
    );
    let (tx, mut rx) = mpsc::unbounded_channel();

    run_analysis(app.state.products.clone(), tx, Barcode::new("ABC123"), None).await;

    let chunk = next_message(&mut rx).await;
    assert_eq!(chunk.kind, StreamMessageKind::StreamChunk);

    let err = next_message(&mut rx).await;
    assert_eq!(err.kind, StreamMessageKind::Error);
    assert_eq!(err.content, "Nutrition analysis is temporarily unavailable");

    assert!(rx.recv().await.is_none(), "Nothing follows the error");
}

#[tokio::test]
async fn closed_connection_stops_quietly() {
    let app = build_test_app();
    let (tx, rx) = mpsc::unbounded_channel();
    drop(rx);

    // Must return rather than loop or panic.
    run_analysis(app.state.products.clone(), tx, Barcode::new("ABC123"), None).await;
}

// ---------------------------------------------------------------------------
// StreamSession
// ---------------------------------------------------------------------------

#[tokio::test]
async fn session_rejects_malformed_frames() {
    let app = build_test_app();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut session = StreamSession::new("conn-1".into(), app.state.products.clone(), tx);

    session.handle_text("{barcode");

    let msg = next_message(&mut rx).await;
    assert_eq!(msg.kind, StreamMessageKind::Error);
    assert!(msg.content.starts_with("Invalid request"));
    assert!(!session.is_streaming());
}

#[tokio::test]
async fn session_rejects_blank_barcode() {
    let app = build_test_app();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut session = StreamSession::new("conn-1".into(), app.state.products.clone(), tx);

    session.handle_text(r#"{"barcode": "   "}"#);

    let msg = next_message(&mut rx).await;
    assert_eq!(msg.kind, StreamMessageKind::Error);
    assert_eq!(msg.content, "Please provide a barcode");
    assert!(app.catalog.calls().is_empty());
}

#[tokio::test]
async fn session_trims_barcode_and_forwards_preferences() {
    let app = build_test_app();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut session = StreamSession::new("conn-1".into(), app.state.products.clone(), tx);

    session.handle_text(r#"{"barcode": " ABC123 ", "preferences": {"allergies": ["milk"]}}"#);

    // Drain until the analysis completes.
    loop {
        let msg = next_message(&mut rx).await;
        if msg.kind == StreamMessageKind::StreamComplete {
            assert_eq!(msg.data.unwrap()["personalized"], true);
            break;
        }
        assert_eq!(msg.kind, StreamMessageKind::StreamChunk);
    }

    let calls = app.analyzer.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "ABC123");
    assert_eq!(calls[0].1.as_ref().unwrap().allergies, vec!["milk".to_string()]);
}

/// Streams `<barcode>0`, `<barcode>1`, `<barcode>2`, pausing before each.
struct SlowAnalyzer {
    delay: Duration,
}

#[async_trait]
impl NutritionAnalyzer for SlowAnalyzer {
    async fn analyze(
        &self,
        _product: &Product,
        _preferences: Option<&NutritionPreferences>,
    ) -> Result<NutritionAnalysis, CoreError> {
        Err(CoreError::Internal("one-shot analysis not supported".into()))
    }

    async fn analyze_stream(
        &self,
        product: &Product,
        _preferences: Option<&NutritionPreferences>,
    ) -> Result<AnalysisStream, CoreError> {
        let barcode = product.barcode.to_string();
        let delay = self.delay;
        let chunks = futures::stream::iter(0..3).then(move |i| {
            let content = format!("{barcode}{i}");
            async move {
                tokio::time::sleep(delay).await;
                Ok::<_, CoreError>(AnalysisChunk {
                    content,
                    section: None,
                })
            }
        });
        Ok(chunks.boxed())
    }
}

#[tokio::test]
async fn new_request_supersedes_the_one_in_flight() {
    let catalog = Arc::new(StubCatalog::with_products([
        Product::new("A", "Apple juice"),
        Product::new("B", "Bran flakes"),
    ]));
    let analyzer = Arc::new(SlowAnalyzer {
        delay: Duration::from_millis(100),
    });
    let controller = ProductController::new(catalog, analyzer);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut session = StreamSession::new("conn-1".into(), controller, tx);

    session.handle_text(r#"{"barcode": "A"}"#);
    let first = next_message(&mut rx).await;
    assert_eq!(first.content, "A0");

    session.handle_text(r#"{"barcode": "B"}"#);

    let mut seen = Vec::new();
    loop {
        let msg = next_message(&mut rx).await;
        let done = msg.kind == StreamMessageKind::StreamComplete;
        seen.push((msg.kind, msg.content));
        if done {
            break;
        }
    }

    assert_eq!(
        seen,
        vec![
            (StreamMessageKind::StreamChunk, "B0".to_string()),
            (StreamMessageKind::StreamChunk, "B1".to_string()),
            (StreamMessageKind::StreamChunk, "B2".to_string()),
            (StreamMessageKind::StreamComplete, "B0B1B2".to_string()),
        ]
    );

    // The cancelled analysis must not resurface later.
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(rx.try_recv().is_err(), "No frames after B completes");
    assert!(!session.is_streaming());
}

// ---------------------------------------------------------------------------
// End to end
// ---------------------------------------------------------------------------

/// Serve the full app on an ephemeral port; returns its `ws://` base.
async fn spawn_app() -> String {
    let app = build_test_app();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app.router).await.unwrap();
    });
    format!("ws://{addr}")
}

#[tokio::test]
async fn upgrade_without_token_is_rejected() {
    let base = spawn_app().await;

    let err = tokio_tungstenite::connect_async(format!("{base}/ws/nutrition/stream"))
        .await
        .expect_err("upgrade must be refused");

    match err {
        tungstenite::Error::Http(response) => assert_eq!(response.status(), 401),
        other => panic!("Expected an HTTP 401, got: {other:?}"),
    }
}

#[tokio::test]
async fn upgrade_with_bad_token_is_rejected() {
    let base = spawn_app().await;

    let err = tokio_tungstenite::connect_async(format!("{base}/ws/nutrition/stream?token=bogus"))
        .await
        .expect_err("upgrade must be refused");

    match err {
        tungstenite::Error::Http(response) => assert_eq!(response.status(), 401),
        other => panic!("Expected an HTTP 401, got: {other:?}"),
    }
}

#[tokio::test]
async fn streams_analysis_over_websocket() {
    let base = spawn_app().await;
    let url = format!("{base}/ws/nutrition/stream?token={}", token_for(9));

    let (mut socket, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    socket
        .send(tungstenite::Message::text(r#"{"barcode":"ABC123"}"#))
        .await
        .unwrap();

    let mut kinds = Vec::new();
    let mut full = String::new();
    while let Some(frame) = tokio::time::timeout(Duration::from_secs(5), socket.next())
        .await
        .expect("timed out waiting for frames")
    {
        let frame = frame.unwrap();
        if !frame.is_text() {
            continue;
        }
        let msg: StreamMessage = serde_json::from_str(frame.to_text().unwrap()).unwrap();
        kinds.push(msg.kind);
        if msg.kind == StreamMessageKind::StreamComplete {
            full = msg.content;
            break;
        }
    }

    assert_eq!(
        kinds,
        vec![
            StreamMessageKind::StreamChunk,
            StreamMessageKind::StreamChunk,
            StreamMessageKind::StreamComplete,
        ]
    );
    assert_eq!(full, "## Nutri-Score E");

    socket.close(None).await.unwrap();
}
