//! Common test infrastructure
//!
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{mp3_with_tags, TestClient, TestServer, OWNER_1_TOKEN};
//! use reqwest::StatusCode;
//!
//! #[tokio::test]
//! async fn test_upload() {
//!     let server = TestServer::spawn().await;
//!     let client = TestClient::with_token(server.base_url.clone(), OWNER_1_TOKEN);
//!
//!     let response = client.upload(mp3_with_tags("Song", "Band", "Album")).await;
//!     assert_eq!(response.status(), StatusCode::OK);
//! }
//! ```

mod client;
mod constants;
mod fixtures;
mod server;

pub use client::TestClient;
pub use constants::*;
#[allow(unused_imports)]
pub use fixtures::{mp3_bytes, mp3_with_tags, not_audio_bytes};
pub use server::TestServer;
