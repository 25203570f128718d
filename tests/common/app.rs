//! Test application factory for integration tests.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

use pointlab::models::AppConfig;
use pointlab::server::{build_router, create_app_state_with_fetcher, AppState};
use pointlab::services::{HttpFetcher, SurfaceRegistry};

/// Test application with router and direct access to services
pub struct TestApp {
    router: axum::Router,
    pub surfaces: Arc<SurfaceRegistry>,
}

impl TestApp {
    /// Create a test application with the default configuration
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Create a test application with a custom configuration
    pub fn with_config(config: AppConfig) -> Self {
        let state = Self::create_state(config);
        let surfaces = state.surfaces.clone();
        let router = build_router(state);

        Self { router, surfaces }
    }

    /// Create application state backed by a real HTTP fetcher
    pub fn create_state(config: AppConfig) -> AppState {
        let fetcher =
            Arc::new(HttpFetcher::new(&config.fetch).expect("Failed to create HTTP fetcher"));
        create_app_state_with_fetcher(config, fetcher)
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

    /// GET without collecting the body, for streaming endpoints
    pub async fn open(&self, path: &str) -> axum::response::Response {
        self.router
            .clone()
            .oneshot(Request::get(path).body(Body::empty()).unwrap())
            .await
            .expect("Request failed")
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

    /// Check if response is a PNG image
    pub fn is_png(&self) -> bool {
        self.body.len() >= 8 && &self.body[0..8] == b"\x89PNG\r\n\x1a\n"
    }

    /// Decode a PNG body into RGB8 pixels
    pub fn png_rgb(&self) -> image::RgbImage {
        image::load_from_memory_with_format(&self.body, image::ImageFormat::Png)
            .expect("Failed to decode PNG body")
            .to_rgb8()
    }
}
