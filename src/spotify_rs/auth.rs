use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::AUTHORIZATION;

use crate::spotify_rs::types::SpotifyTokenResponse;

pub const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// `Basic` credential for the token endpoint: base64 of `client_id:client_secret`.
fn basic_authorization(client_id: &str, client_secret: &str) -> String {
    format!(
        "Basic {}",
        STANDARD.encode(format!("{}:{}", client_id, client_secret))
    )
}

#[derive(Debug, thiserror::Error)]
pub enum RefreshTokenError {
    #[error("Invalid refresh token ({status}): {reason}")]
    InvalidRefreshToken { status: u16, reason: String },
    #[error("Failed to send http request: {0}")]
    FailedToSendRequest(reqwest::Error),
    #[error("Failed to parse response: {0}")]
    FailedToParseResponse(reqwest::Error),
    #[error("Token response did not contain an access token")]
    MissingAccessToken,
}

/// Builds the refresh-token grant request.
///
/// `.form` serializes to x-www-form-urlencoded and sets the header (as required by spotify).
pub fn refresh_token_request(
    client: &reqwest::Client,
    token_url: &str,
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> reqwest::RequestBuilder {
    let params = [
        ("grant_type", "refresh_token"),
        ("client_id", client_id),
        ("refresh_token", refresh_token),
    ];

    client
        .post(token_url)
        .form(&params)
        .header(AUTHORIZATION, basic_authorization(client_id, client_secret))
}

/// Exchange a refresh token for a fresh access token
/// https://developer.spotify.com/documentation/web-api/tutorials/refreshing-tokens
pub async fn refresh_access_token(
    client: &reqwest::Client,
    token_url: &str,
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> Result<String, RefreshTokenError> {
    let response = refresh_token_request(client, token_url, client_id, client_secret, refresh_token)
        .send()
        .await
        .map_err(RefreshTokenError::FailedToSendRequest)?;

    let status = response.status();
    if !status.is_success() {
        return Err(RefreshTokenError::InvalidRefreshToken {
            status: status.as_u16(),
            reason: response
                .text()
                .await
                .unwrap_or("Failed to get error text".to_string()),
        });
    }

    let token_response: SpotifyTokenResponse = response
        .json()
        .await
        .map_err(RefreshTokenError::FailedToParseResponse)?;

    access_token_from_response(token_response)
}

fn access_token_from_response(response: SpotifyTokenResponse) -> Result<String, RefreshTokenError> {
    match response.access_token {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(RefreshTokenError::MissingAccessToken),
    }
}
