//! Shared fixtures for the API integration tests.
//!
//! Collaborators are replaced with in-memory doubles that record every call,
//! so tests can assert both on the HTTP response and on what reached the
//! controller.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use amobagan_api::auth::jwt::{generate_access_token, JwtConfig};
use amobagan_api::auth::JwtAuthenticator;
use amobagan_api::config::{ServerConfig, UpstreamConfig};
use amobagan_api::handlers::products::ProductController;
use amobagan_api::router::build_app_router;
use amobagan_api::state::AppState;
use amobagan_api::ws::WsManager;
use amobagan_core::analysis::{AnalysisStream, NutritionAnalyzer};
use amobagan_core::barcode::Barcode;
use amobagan_core::catalog::ProductCatalog;
use amobagan_core::error::CoreError;
use amobagan_core::nutrition::{AnalysisChunk, NutritionAnalysis, NutritionPreferences};
use amobagan_core::product::Product;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

/// Build a test `ServerConfig` with safe defaults.
///
/// Upstream URLs point nowhere; every test swaps the clients for doubles.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: jwt_config(TEST_SECRET),
        upstream: UpstreamConfig {
            catalog_url: "http://127.0.0.1:9".to_string(),
            analysis_url: "http://127.0.0.1:9".to_string(),
            analysis_api_key: None,
            timeout_secs: 1,
        },
    }
}

pub fn jwt_config(secret: &str) -> JwtConfig {
    JwtConfig {
        secret: secret.to_string(),
        access_token_expiry_mins: 15,
    }
}

/// A valid access token for `user_id`, signed with [`TEST_SECRET`].
pub fn token_for(user_id: i64) -> String {
    generate_access_token(user_id, "user", &jwt_config(TEST_SECRET)).unwrap()
}

// ---------------------------------------------------------------------------
// Collaborator doubles
// ---------------------------------------------------------------------------

/// Catalog backed by a map. Records every barcode it is asked about.
#[derive(Default)]
pub struct StubCatalog {
    products: HashMap<String, Product>,
    unavailable: bool,
    calls: Mutex<Vec<String>>,
}

impl StubCatalog {
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        Self {
            products: products
                .into_iter()
                .map(|p| (p.barcode.as_str().to_string(), p))
                .collect(),
            ..Default::default()
        }
    }

    /// A catalog whose every lookup fails as if the service were down.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProductCatalog for StubCatalog {
    async fn find_by_barcode(&self, barcode: &Barcode) -> Result<Option<Product>, CoreError> {
        self.calls.lock().unwrap().push(barcode.as_str().to_string());
        if self.unavailable {
            return Err(CoreError::Upstream("catalog down".into()));
        }
        Ok(self.products.get(barcode.as_str()).cloned())
    }
}

/// Analyzer that echoes the product name and records its inputs.
#[derive(Default)]
pub struct StubAnalyzer {
    chunks: Vec<String>,
    fail_after_chunks: bool,
    calls: Mutex<Vec<(String, Option<NutritionPreferences>)>>,
}

impl StubAnalyzer {
    /// Streams the given pieces in order.
    pub fn streaming(chunks: &[&str]) -> Self {
        Self {
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
            ..Default::default()
        }
    }

    /// Streams the given pieces, then fails.
    pub fn failing_after(chunks: &[&str]) -> Self {
        Self {
            fail_after_chunks: true,
            ..Self::streaming(chunks)
        }
    }

    pub fn calls(&self) -> Vec<(String, Option<NutritionPreferences>)> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, product: &Product, preferences: Option<&NutritionPreferences>) {
        self.calls
            .lock()
            .unwrap()
            .push((product.barcode.as_str().to_string(), preferences.cloned()));
    }
}

#[async_trait]
impl NutritionAnalyzer for StubAnalyzer {
    async fn analyze(
        &self,
        product: &Product,
        preferences: Option<&NutritionPreferences>,
    ) -> Result<NutritionAnalysis, CoreError> {
        self.record(product, preferences);
        let content = match preferences {
            Some(_) => format!("Personalized analysis of {}", product.name),
            None => format!("Analysis of {}", product.name),
        };
        Ok(NutritionAnalysis {
            barcode: product.barcode.clone(),
            product_name: product.name.clone(),
            content,
            personalized: preferences.is_some(),
            generated_at: chrono::Utc::now(),
        })
    }

    async fn analyze_stream(
        &self,
        product: &Product,
        preferences: Option<&NutritionPreferences>,
    ) -> Result<AnalysisStream, CoreError> {
        self.record(product, preferences);
        let mut items: Vec<Result<AnalysisChunk, CoreError>> = self
            .chunks
            .iter()
            .map(|c| {
                Ok(AnalysisChunk {
                    content: c.clone(),
                    section: None,
                })
            })
            .collect();
        if self.fail_after_chunks {
            items.push(Err(CoreError::Upstream("model overloaded".into())));
        }
        Ok(Box::pin(futures::stream::iter(items)))
    }
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

pub fn nutella() -> Product {
    let mut product = Product::new("ABC123", "Nutella");
    product.brand = Some("Ferrero".into());
    product
}

/// Full application plus handles on its doubles.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub catalog: Arc<StubCatalog>,
    pub analyzer: Arc<StubAnalyzer>,
}

pub fn build_test_app() -> TestApp {
    build_test_app_with(
        StubCatalog::with_products([nutella()]),
        StubAnalyzer::streaming(&["## Nutri-Score", " E"]),
    )
}

/// Build the full application router with all middleware layers around the
/// given doubles. Mirrors `main.rs`.
pub fn build_test_app_with(catalog: StubCatalog, analyzer: StubAnalyzer) -> TestApp {
    let config = test_config();
    let catalog = Arc::new(catalog);
    let analyzer = Arc::new(analyzer);

    let state = AppState {
        authenticator: Arc::new(JwtAuthenticator::new(config.jwt.clone())),
        products: ProductController::new(catalog.clone(), analyzer.clone()),
        ws_manager: Arc::new(WsManager::new()),
        config: Arc::new(config),
    };

    TestApp {
        router: build_app_router(state.clone()).unwrap(),
        state,
        catalog,
        analyzer,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_raw_auth(app: Router, uri: &str, body: &str, token: &str) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    post_raw_auth(app, uri, &body.to_string(), token).await
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
