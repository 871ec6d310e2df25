//! Capitalist payment gateway client.
//!
//! Thin HTTP wrapper over the gateway's form-based API. Depending on the
//! endpoint the gateway answers in JSON or in semicolon-delimited CSV;
//! both are normalized into typed structs here. Transient failures (429,
//! 5xx, connect errors) are retried with exponential backoff.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::config::CapitalistConfig;
use crate::error::GatewayError;

const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_BASE_MS: u64 = 250;

/// Gateway acknowledgement for a registered withdrawal batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRegistration {
    /// Batch number assigned by the gateway.
    pub batch_number: String,
    /// Human-readable gateway message.
    pub message: String,
}

/// One currency account balance at the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountBalance {
    /// Gateway account identifier.
    pub account: String,
    /// Currency code.
    pub currency: String,
    /// Available amount.
    pub amount: Decimal,
}

/// HTTP client for the Capitalist API.
#[derive(Debug)]
pub struct CapitalistClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl CapitalistClient {
    /// Builds the client, loading the optional client certificate.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PaymentGateway`] when the certificate file
    /// cannot be read or the HTTP client cannot be constructed.
    pub fn new(config: &CapitalistConfig) -> Result<Self, GatewayError> {
        let mut builder = reqwest::Client::builder().timeout(Duration::from_secs(30));

        if let Some(path) = &config.client_cert_path {
            let pem = std::fs::read(path).map_err(|e| {
                GatewayError::PaymentGateway(format!("cannot read client certificate: {e}"))
            })?;
            let identity = reqwest::Identity::from_pem(&pem).map_err(|e| {
                GatewayError::PaymentGateway(format!("invalid client certificate: {e}"))
            })?;
            builder = builder.identity(identity);
        }

        let http = builder
            .build()
            .map_err(|e| GatewayError::PaymentGateway(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    /// Registers a one-record withdrawal batch with the gateway.
    ///
    /// The batch record format is `number;address;amount;currency;memo`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PaymentGateway`] when the gateway rejects
    /// the batch or stays unreachable across retries.
    pub async fn submit_withdrawal(
        &self,
        batch_id: &str,
        recipient_address: &str,
        amount: Decimal,
        currency: &str,
        memo: &str,
    ) -> Result<BatchRegistration, GatewayError> {
        let record = format!("{batch_id};{recipient_address};{amount};{currency};{memo}");
        let body = self
            .send_with_retry("registerbatch", &[("batch", record.as_str()), ("verification_type", "json")])
            .await?;
        parse_batch_response(&body)
    }

    /// Fetches all account balances. The gateway answers this endpoint in
    /// semicolon CSV only.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PaymentGateway`] on gateway failure or an
    /// unparseable response.
    pub async fn account_balance(&self) -> Result<Vec<AccountBalance>, GatewayError> {
        let body = self.send_with_retry("getaccounts", &[]).await?;
        parse_balance_csv(&body)
    }

    /// Posts one operation with credentials, retrying transient failures.
    async fn send_with_retry(
        &self,
        operation: &str,
        extra: &[(&str, &str)],
    ) -> Result<String, GatewayError> {
        let url = format!("{}/api/v1/{operation}", self.base_url);
        let mut form: Vec<(&str, &str)> = vec![
            ("login", self.username.as_str()),
            ("password", self.password.as_str()),
            ("operation", operation),
        ];
        form.extend_from_slice(extra);

        let mut last_error = String::new();
        for attempt in 1..=MAX_ATTEMPTS {
            let result = self.http.post(&url).form(&form).send().await;
            match result {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response
                            .text()
                            .await
                            .map_err(|e| GatewayError::PaymentGateway(e.to_string()));
                    }
                    let retryable = status.as_u16() == 429 || status.is_server_error();
                    let body = response.text().await.unwrap_or_default();
                    tracing::warn!(%status, operation, attempt, "gateway returned error");
                    if !retryable {
                        return Err(GatewayError::PaymentGateway(format!(
                            "gateway returned {status}: {body}"
                        )));
                    }
                    last_error = format!("{status}: {body}");
                }
                Err(e) if e.is_connect() || e.is_timeout() => {
                    tracing::warn!(error = %e, operation, attempt, "gateway unreachable");
                    last_error = e.to_string();
                }
                Err(e) => return Err(GatewayError::PaymentGateway(e.to_string())),
            }
            if attempt < MAX_ATTEMPTS {
                let backoff = BACKOFF_BASE_MS << (attempt - 1);
                tokio::time::sleep(Duration::from_millis(backoff)).await;
            }
        }
        Err(GatewayError::PaymentGateway(format!(
            "gateway unavailable after {MAX_ATTEMPTS} attempts: {last_error}"
        )))
    }
}

/// JSON shape of a batch registration response.
#[derive(Debug, Deserialize)]
struct BatchJson {
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<BatchJsonData>,
}

#[derive(Debug, Deserialize)]
struct BatchJsonData {
    batch_number: String,
}

/// Normalizes a batch response arriving as JSON or as semicolon CSV
/// (`code;batch_number;message`).
fn parse_batch_response(body: &str) -> Result<BatchRegistration, GatewayError> {
    if let Ok(json) = serde_json::from_str::<BatchJson>(body) {
        if json.code != 0 {
            return Err(GatewayError::PaymentGateway(format!(
                "gateway rejected batch (code {}): {}",
                json.code, json.message
            )));
        }
        let data = json.data.ok_or_else(|| {
            GatewayError::PaymentGateway("gateway response missing batch data".to_string())
        })?;
        return Ok(BatchRegistration {
            batch_number: data.batch_number,
            message: json.message,
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes());
    let record = reader
        .records()
        .next()
        .transpose()
        .map_err(|e| GatewayError::PaymentGateway(format!("unparseable gateway response: {e}")))?
        .ok_or_else(|| GatewayError::PaymentGateway("empty gateway response".to_string()))?;

    let code: i64 = record
        .get(0)
        .and_then(|c| c.trim().parse().ok())
        .ok_or_else(|| GatewayError::PaymentGateway("missing gateway result code".to_string()))?;
    if code != 0 {
        let message = record.get(2).or_else(|| record.get(1)).unwrap_or_default();
        return Err(GatewayError::PaymentGateway(format!(
            "gateway rejected batch (code {code}): {message}"
        )));
    }
    let batch_number = record
        .get(1)
        .filter(|b| !b.is_empty())
        .ok_or_else(|| GatewayError::PaymentGateway("missing batch number".to_string()))?;

    Ok(BatchRegistration {
        batch_number: batch_number.to_string(),
        message: record.get(2).unwrap_or_default().to_string(),
    })
}

/// Parses `account;currency;amount` CSV rows.
fn parse_balance_csv(body: &str) -> Result<Vec<AccountBalance>, GatewayError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut balances = Vec::new();
    for record in reader.records() {
        let record = record
            .map_err(|e| GatewayError::PaymentGateway(format!("unparseable balance row: {e}")))?;
        let (Some(account), Some(currency), Some(amount)) =
            (record.get(0), record.get(1), record.get(2))
        else {
            continue;
        };
        let amount: Decimal = amount.trim().parse().map_err(|_| {
            GatewayError::PaymentGateway(format!("invalid balance amount: {amount}"))
        })?;
        balances.push(AccountBalance {
            account: account.to_string(),
            currency: currency.to_string(),
            amount,
        });
    }
    Ok(balances)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn client_for(url: &str) -> CapitalistClient {
        let config = CapitalistConfig {
            base_url: url.to_string(),
            username: "merchant".to_string(),
            password: "secret".to_string(),
            client_cert_path: None,
        };
        let Ok(client) = CapitalistClient::new(&config) else {
            panic!("client construction failed");
        };
        client
    }

    #[test]
    fn json_batch_response_is_normalized() {
        let body = r#"{"code":0,"message":"accepted","data":{"batch_number":"B-7781"}}"#;
        let Ok(batch) = parse_batch_response(body) else {
            panic!("expected parsed batch");
        };
        assert_eq!(batch.batch_number, "B-7781");
        assert_eq!(batch.message, "accepted");
    }

    #[test]
    fn csv_batch_response_is_normalized() {
        let Ok(batch) = parse_batch_response("0;B-9913;queued") else {
            panic!("expected parsed batch");
        };
        assert_eq!(batch.batch_number, "B-9913");
        assert_eq!(batch.message, "queued");
    }

    #[test]
    fn nonzero_code_is_an_error_in_both_formats() {
        assert!(parse_batch_response(r#"{"code":35,"message":"bad address"}"#).is_err());
        assert!(parse_batch_response("35;;bad address").is_err());
    }

    #[test]
    fn balance_csv_parses_rows() {
        let Ok(balances) = parse_balance_csv("U001;USDT;1250.50\nU002;USDC;9.00") else {
            panic!("expected balances");
        };
        assert_eq!(balances.len(), 2);
        let Some(first) = balances.first() else {
            panic!("missing first row");
        };
        assert_eq!(first.currency, "USDT");
        assert_eq!(first.amount, dec!(1250.50));
    }

    #[tokio::test]
    async fn submit_succeeds_on_first_attempt() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/registerbatch")
            .with_status(200)
            .with_body(r#"{"code":0,"message":"accepted","data":{"batch_number":"B-1"}}"#)
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let result = client
            .submit_withdrawal("WD-1", "TXk3mqYhWbP5ZQF2dGhKp9cTvNwE4s8uJr", dec!(50), "USDT", "")
            .await;

        let Ok(batch) = result else {
            panic!("expected success");
        };
        assert_eq!(batch.batch_number, "B-1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn server_errors_are_retried_to_exhaustion() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/registerbatch")
            .with_status(502)
            .expect(3)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let result = client
            .submit_withdrawal("WD-1", "TXk3mqYhWbP5ZQF2dGhKp9cTvNwE4s8uJr", dec!(50), "USDT", "")
            .await;

        let Err(GatewayError::PaymentGateway(msg)) = result else {
            panic!("expected gateway error");
        };
        assert!(msg.contains("3 attempts"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/registerbatch")
            .with_status(400)
            .with_body("bad request")
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let result = client
            .submit_withdrawal("WD-1", "TXk3mqYhWbP5ZQF2dGhKp9cTvNwE4s8uJr", dec!(50), "USDT", "")
            .await;

        assert!(result.is_err());
        mock.assert_async().await;
    }
}
