//! Thin wrapper over the external accrual service: build one
//! `reqwest::Client` and reuse it for every poll.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::OrderStatus;

#[derive(Debug, Deserialize)]
struct AccrualResponse {
    order: String,
    status: String,
    accrual: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct AccrualPoll {
    pub status: OrderStatus,
    pub accrual: Decimal,
}

#[derive(Debug, thiserror::Error)]
pub enum AccrualError {
    #[error("order not registered with the accrual service")]
    NotRegistered,

    /// The accrual service asked us to back off; the `Duration` is how long.
    #[error("rate limited, retry after {0:?}")]
    RateLimited(std::time::Duration),

    #[error("accrual response carried an unrecognised status: {0}")]
    UnknownStatus(String),

    #[error("accrual request failed: {0}")]
    Request(#[from] reqwest::Error),
}

pub struct AccrualClient {
    http: reqwest::Client,
    base_url: String,
}

impl AccrualClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Polls the accrual service for one order number.
    ///
    /// Maps HTTP 204 to `NotRegistered`, 429 to `RateLimited` carrying the
    /// `Retry-After` header value (falling back to the worker's default
    /// backoff when the header is absent or unparsable), and any other
    /// non-200 status to `UnknownStatus`.
    pub async fn check_order(&self, number: &str) -> Result<AccrualPoll, AccrualError> {
        let url = format!("{}/api/orders/{}", self.base_url.trim_end_matches('/'), number);
        let resp = self.http.get(&url).send().await?;

        match resp.status() {
            reqwest::StatusCode::OK => {
                let body: AccrualResponse = resp.json().await?;
                let status = OrderStatus::parse_external(&body.status)
                    .ok_or(AccrualError::UnknownStatus(body.status.clone()))?;
                Ok(AccrualPoll {
                    status,
                    accrual: body.accrual.unwrap_or(Decimal::ZERO),
                })
            }
            reqwest::StatusCode::NO_CONTENT => Err(AccrualError::NotRegistered),
            reqwest::StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = resp
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .map(std::time::Duration::from_secs)
                    .unwrap_or(crate::accrual::worker::DEFAULT_BACKOFF);
                Err(AccrualError::RateLimited(retry_after))
            }
            other => Err(AccrualError::UnknownStatus(format!("unexpected status {other}"))),
        }
    }
}
