use super::response::ApiError;
use super::state::ServerState;

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Response},
};
use std::collections::HashSet;
use tracing::debug;

pub const HEADER_ACCESS_TOKEN_KEY: &str = "X-Access-Token";

/// Decides whether an opaque owner token may use the protected routes.
pub trait TokenValidator: Send + Sync {
    fn is_valid(&self, token: &str) -> bool;
}

/// Accepts exactly the configured tokens.
pub struct AllowListTokenValidator {
    tokens: HashSet<String>,
}

impl AllowListTokenValidator {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens
                .into_iter()
                .map(Into::into)
                .filter(|t: &String| !t.is_empty())
                .collect(),
        }
    }
}

impl TokenValidator for AllowListTokenValidator {
    fn is_valid(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }
}

/// The caller of a protected route, identified by their access token.
#[derive(Debug, Clone)]
pub struct Owner {
    pub token: String,
}

#[derive(Debug)]
pub enum OwnerExtractionError {
    MissingToken,
    Rejected,
}

impl IntoResponse for OwnerExtractionError {
    fn into_response(self) -> Response {
        match self {
            OwnerExtractionError::MissingToken => {
                ApiError::unauthorized("Missing access token").into_response()
            }
            OwnerExtractionError::Rejected => {
                ApiError::unauthorized("Invalid access token").into_response()
            }
        }
    }
}

fn extract_token_from_headers(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(HEADER_ACCESS_TOKEN_KEY)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).trim().to_string())
        .filter(|t| !t.is_empty())
}

impl FromRequestParts<ServerState> for Owner {
    type Rejection = OwnerExtractionError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        let token = match extract_token_from_headers(parts) {
            Some(token) => token,
            None => {
                debug!("No access token in headers.");
                return Err(OwnerExtractionError::MissingToken);
            }
        };

        if !ctx.token_validator.is_valid(&token) {
            debug!("Access token rejected.");
            return Err(OwnerExtractionError::Rejected);
        }

        Ok(Owner { token })
    }
}
