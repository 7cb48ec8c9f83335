//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with one method per route. When routes or request formats
//! change, update only this file.

#![allow(dead_code)]

use super::constants::*;
use reqwest::multipart::{Form, Part};
use reqwest::Response;
use std::time::Duration;
use warehouse_server::server::HEADER_ACCESS_TOKEN_KEY;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    pub base_url: String,
    token: Option<String>,
}

impl TestClient {
    /// A client that sends no access token.
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self {
            client,
            base_url,
            token: None,
        }
    }

    /// A client that sends `token` on every request.
    pub fn with_token(base_url: String, token: &str) -> Self {
        let mut client = Self::new(base_url);
        client.token = Some(token.to_string());
        client
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match &self.token {
            Some(token) => builder.header(HEADER_ACCESS_TOKEN_KEY, token),
            None => builder,
        }
    }

    // ========================================================================
    // Status
    // ========================================================================

    /// GET /
    pub async fn home(&self) -> Response {
        self.request(reqwest::Method::GET, "/")
            .send()
            .await
            .expect("Home request failed")
    }

    /// GET /health/conflicts
    pub async fn conflicts(&self) -> Response {
        self.request(reqwest::Method::GET, "/health/conflicts")
            .send()
            .await
            .expect("Conflicts request failed")
    }

    // ========================================================================
    // Upload routes
    // ========================================================================

    /// POST /upload with the default image url
    pub async fn upload(&self, bytes: Vec<u8>) -> Response {
        self.upload_with_image(bytes, IMAGE_URL).await
    }

    /// POST /upload
    pub async fn upload_with_image(&self, bytes: Vec<u8>, image_url: &str) -> Response {
        let form = Form::new()
            .part("file", Part::bytes(bytes).file_name("track.mp3"))
            .text("image_url", image_url.to_string());
        self.request(reqwest::Method::POST, "/upload")
            .multipart(form)
            .send()
            .await
            .expect("Upload request failed")
    }

    /// GET /upload?title&artist
    pub async fn get_track(&self, title: &str, artist: &str) -> Response {
        self.request(reqwest::Method::GET, "/upload")
            .query(&[("title", title), ("artist", artist)])
            .send()
            .await
            .expect("Get track request failed")
    }

    /// DELETE /upload?title&artist&album
    pub async fn delete_track(&self, title: &str, artist: &str, album: &str) -> Response {
        self.request(reqwest::Method::DELETE, "/upload")
            .query(&[("title", title), ("artist", artist), ("album", album)])
            .send()
            .await
            .expect("Delete request failed")
    }

    /// GET /upload/list/last
    pub async fn list_last(&self) -> Response {
        self.get("/upload/list/last").await
    }

    /// GET /upload/list/album
    pub async fn list_albums(&self) -> Response {
        self.get("/upload/list/album").await
    }

    /// GET /upload/list/artist
    pub async fn list_artists(&self) -> Response {
        self.get("/upload/list/artist").await
    }

    /// GET /upload/list/files
    pub async fn list_files(&self) -> Response {
        self.get("/upload/list/files").await
    }

    /// GET /upload/search?q
    pub async fn search(&self, q: &str) -> Response {
        self.request(reqwest::Method::GET, "/upload/search")
            .query(&[("q", q)])
            .send()
            .await
            .expect("Search request failed")
    }

    // ========================================================================
    // Download
    // ========================================================================

    /// GET /download?title&artist&album
    pub async fn download(&self, title: &str, artist: &str, album: &str) -> Response {
        self.request(reqwest::Method::GET, "/download")
            .query(&[("title", title), ("artist", artist), ("album", album)])
            .send()
            .await
            .expect("Download request failed")
    }

    async fn get(&self, path: &str) -> Response {
        self.request(reqwest::Method::GET, path)
            .send()
            .await
            .expect("GET request failed")
    }
}
