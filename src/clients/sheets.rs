//! Google Sheets values API client.
//!
//! Authenticates with a refresh-token grant and caches the access token
//! until shortly before expiry. Only the two operations the sync needs
//! are implemented: clearing a range and overwriting it.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;

use crate::config::SheetsConfig;
use crate::error::GatewayError;

const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const SHEETS_API_BASE: &str = "https://sheets.googleapis.com";

/// Refresh the token this many seconds before it actually expires.
const TOKEN_SLACK_SECS: i64 = 60;

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// HTTP client for the Google Sheets values API.
#[derive(Debug)]
pub struct SheetsClient {
    http: reqwest::Client,
    config: SheetsConfig,
    token_url: String,
    api_base: String,
    token: Mutex<Option<CachedToken>>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

impl SheetsClient {
    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SheetsApi`] when the HTTP client cannot be
    /// constructed.
    pub fn new(config: SheetsConfig) -> Result<Self, GatewayError> {
        Self::with_endpoints(config, GOOGLE_TOKEN_URL, SHEETS_API_BASE)
    }

    /// Builds the client against custom endpoints. Exposed for tests.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SheetsApi`] when the HTTP client cannot be
    /// constructed.
    pub fn with_endpoints(
        config: SheetsConfig,
        token_url: &str,
        api_base: &str,
    ) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| GatewayError::SheetsApi(e.to_string()))?;
        Ok(Self {
            http,
            config,
            token_url: token_url.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
            token: Mutex::new(None),
        })
    }

    /// Returns a valid access token, refreshing it when absent or close
    /// to expiry.
    async fn access_token(&self) -> Result<String, GatewayError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref()
            && token.expires_at > Utc::now()
        {
            return Ok(token.access_token.clone());
        }

        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("refresh_token", self.config.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| GatewayError::SheetsApi(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GatewayError::SheetsApi(format!(
                "token refresh failed: {}",
                response.status()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::SheetsApi(format!("unparseable token response: {e}")))?;

        let expires_at =
            Utc::now() + chrono::Duration::seconds((token.expires_in - TOKEN_SLACK_SECS).max(0));
        *cached = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at,
        });
        Ok(token.access_token)
    }

    /// Clears all values in the given A1 range.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SheetsApi`] on auth or API failure.
    pub async fn clear_range(&self, range: &str) -> Result<(), GatewayError> {
        let token = self.access_token().await?;
        let url = format!(
            "{}/v4/spreadsheets/{}/values/{range}:clear",
            self.api_base, self.config.spreadsheet_id
        );
        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&json!({}))
            .send()
            .await
            .map_err(|e| GatewayError::SheetsApi(e.to_string()))?;
        if !response.status().is_success() {
            return Err(GatewayError::SheetsApi(format!(
                "clear failed for {range}: {}",
                response.status()
            )));
        }
        Ok(())
    }

    /// Overwrites the given A1 range with fresh rows (RAW input).
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SheetsApi`] on auth or API failure.
    pub async fn update_range(
        &self,
        range: &str,
        values: &[Vec<String>],
    ) -> Result<(), GatewayError> {
        let token = self.access_token().await?;
        let url = format!(
            "{}/v4/spreadsheets/{}/values/{range}?valueInputOption=RAW",
            self.api_base, self.config.spreadsheet_id
        );
        let response = self
            .http
            .put(url)
            .bearer_auth(token)
            .json(&json!({
                "range": range,
                "majorDimension": "ROWS",
                "values": values,
            }))
            .send()
            .await
            .map_err(|e| GatewayError::SheetsApi(e.to_string()))?;
        if !response.status().is_success() {
            return Err(GatewayError::SheetsApi(format!(
                "update failed for {range}: {}",
                response.status()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn config() -> SheetsConfig {
        SheetsConfig {
            spreadsheet_id: "sheet-1".to_string(),
            balance_range: "Balance!A1:E100".to_string(),
            users_range: "Users!A1:F1000".to_string(),
            client_id: "cid".to_string(),
            client_secret: "cs".to_string(),
            refresh_token: "rt".to_string(),
            sync_interval_secs: 0,
        }
    }

    #[tokio::test]
    async fn token_is_fetched_once_and_cached() {
        let mut server = mockito::Server::new_async().await;
        let token_mock = server
            .mock("POST", "/token")
            .with_status(200)
            .with_body(r#"{"access_token":"tok-1","expires_in":3600,"token_type":"Bearer"}"#)
            .expect(1)
            .create_async()
            .await;
        let clear_mock = server
            .mock("POST", "/v4/spreadsheets/sheet-1/values/Range!A1:B2:clear")
            .match_header("authorization", "Bearer tok-1")
            .with_status(200)
            .with_body("{}")
            .expect(2)
            .create_async()
            .await;

        let token_url = format!("{}/token", server.url());
        let Ok(client) = SheetsClient::with_endpoints(config(), &token_url, &server.url()) else {
            panic!("client construction failed");
        };

        assert!(client.clear_range("Range!A1:B2").await.is_ok());
        assert!(client.clear_range("Range!A1:B2").await.is_ok());

        token_mock.assert_async().await;
        clear_mock.assert_async().await;
    }

    #[tokio::test]
    async fn update_sends_rows_as_raw_values() {
        let mut server = mockito::Server::new_async().await;
        let _token_mock = server
            .mock("POST", "/token")
            .with_status(200)
            .with_body(r#"{"access_token":"tok-1","expires_in":3600}"#)
            .create_async()
            .await;
        let update_mock = server
            .mock(
                "PUT",
                "/v4/spreadsheets/sheet-1/values/Users!A1:F1000?valueInputOption=RAW",
            )
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let token_url = format!("{}/token", server.url());
        let Ok(client) = SheetsClient::with_endpoints(config(), &token_url, &server.url()) else {
            panic!("client construction failed");
        };

        let rows = vec![vec!["a".to_string(), "b".to_string()]];
        assert!(client.update_range("Users!A1:F1000", &rows).await.is_ok());
        update_mock.assert_async().await;
    }

    #[tokio::test]
    async fn failed_token_refresh_is_a_typed_error() {
        let mut server = mockito::Server::new_async().await;
        let _token_mock = server
            .mock("POST", "/token")
            .with_status(401)
            .create_async()
            .await;

        let token_url = format!("{}/token", server.url());
        let Ok(client) = SheetsClient::with_endpoints(config(), &token_url, &server.url()) else {
            panic!("client construction failed");
        };

        let Err(GatewayError::SheetsApi(msg)) = client.clear_range("Range!A1:B2").await else {
            panic!("expected SheetsApi error");
        };
        assert!(msg.contains("token refresh failed"));
    }
}
