//! Test application factory for integration tests.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

use affiche::assets::AssetLoader;
use affiche::models::AppConfig;
use affiche::server::{build_router, create_app_state_with_engine};
use affiche::services::PosterPipeline;

use super::mock_engine::{EngineStats, MockEngine};

/// Test application with router and direct access to the pipeline
pub struct TestApp {
    router: axum::Router,
    pub config: Arc<AppConfig>,
    pub pipeline: Arc<PosterPipeline>,
    pub engine: Arc<EngineStats>,
}

impl TestApp {
    /// Create a new test application over a scripted engine, using
    /// embedded assets only
    pub fn new() -> Self {
        let mock = Arc::new(MockEngine::new());
        let engine = mock.stats();

        let asset_loader = Arc::new(AssetLoader::new(None, None, None));
        let state = create_app_state_with_engine(asset_loader, mock)
            .expect("Failed to create app state");

        let config = state.config.clone();
        let pipeline = state.pipeline.clone();
        let router = build_router(state);

        Self {
            router,
            config,
            pipeline,
            engine,
        }
    }

    /// Make a GET request to the given path
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request(Request::get(path).body(Body::empty()).unwrap())
            .await
    }

    /// Make a POST request with a JSON body
    pub async fn post_json(&self, path: &str, body: &serde_json::Value) -> TestResponse {
        let request = Request::post(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.request(request).await
    }

    /// Send a request to the router
    async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes()
            .to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Test response with convenience methods
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    /// Parse body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to parse JSON response")
    }

    /// Get body as string
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Get raw body bytes
    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    /// Check if response is a PNG image
    pub fn is_png(&self) -> bool {
        self.body.len() >= 8 && &self.body[0..8] == b"\x89PNG\r\n\x1a\n"
    }
}
