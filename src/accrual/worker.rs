//! Scoring worker: a single task that repeatedly picks up pending orders,
//! polls the accrual service, and applies the result. Runs a
//! `loop { scan; sleep(poll_interval) }` with `tokio::select!` cancellation
//! checked at each tick boundary.

use std::time::Duration;

use tokio::sync::watch;

use super::{AccrualClient, AccrualError};
use crate::db::PersistenceGateway;
use crate::domain::OrderStatus;

/// How many orders to pull per tick.
const BATCH_SIZE: i64 = 10;

/// Sleep between ticks when there was nothing, or nothing new, to do.
const IDLE_GAP: Duration = Duration::from_secs(5);

/// Default backoff applied on a 429 with no usable `Retry-After` header.
pub(crate) const DEFAULT_BACKOFF: Duration = Duration::from_secs(2);

pub struct ScoringWorker<G: PersistenceGateway> {
    gateway: std::sync::Arc<G>,
    client: AccrualClient,
}

impl<G: PersistenceGateway> ScoringWorker<G> {
    pub fn new(gateway: std::sync::Arc<G>, client: AccrualClient) -> Self {
        Self { gateway, client }
    }

    /// Runs until `shutdown` is flipped to `true`. The channel is only
    /// checked at tick boundaries, so an in-flight accrual poll always
    /// finishes before shutdown takes effect.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                tracing::info!("scoring worker shutting down");
                return;
            }

            let sleep_for = match self.tick().await {
                Ok(true) => Duration::ZERO,
                Ok(false) => IDLE_GAP,
                Err(backoff) => backoff,
            };

            tokio::select! {
                _ = tokio::time::sleep(sleep_for) => {},
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        tracing::info!("scoring worker shutting down");
                        return;
                    }
                }
            }
        }
    }

    /// Processes one batch. Returns `Ok(true)` if any order made progress
    /// (so the next tick should run immediately rather than idling), or an
    /// `Err(duration)` backoff if the accrual service asked us to slow
    /// down.
    async fn tick(&mut self) -> Result<bool, Duration> {
        let pending = match self.gateway.pick_pending_orders(BATCH_SIZE).await {
            Ok(orders) => orders,
            Err(e) => {
                tracing::error!(error = %e, "failed to pick pending orders");
                return Ok(false);
            }
        };

        if pending.is_empty() {
            return Ok(false);
        }

        let mut progressed = false;

        for (number, _status) in pending {
            match self.client.check_order(&number).await {
                Ok(poll) => {
                    if poll.status != OrderStatus::New {
                        if let Err(e) = self.gateway.apply_accrual(&number, poll.status, poll.accrual).await {
                            tracing::error!(error = %e, order = %number, "failed to apply accrual result");
                        } else {
                            progressed = true;
                        }
                    }
                }
                Err(AccrualError::NotRegistered) => {
                    tracing::warn!(order = %number, "order not registered with accrual service");
                }
                Err(AccrualError::RateLimited(retry_after)) => {
                    return Err(retry_after);
                }
                Err(e) => {
                    tracing::error!(error = %e, order = %number, "accrual poll failed");
                }
            }
        }

        Ok(progressed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryGateway;
    use std::sync::Arc;

    #[tokio::test]
    async fn idle_tick_reports_no_progress() {
        let gateway = Arc::new(MemoryGateway::new());
        let client = AccrualClient::new("http://127.0.0.1:1");
        let mut worker = ScoringWorker::new(gateway, client);
        assert_eq!(worker.tick().await, Ok(false));
    }

    #[tokio::test]
    async fn processed_order_credits_balance_and_reports_progress() {
        use crate::db::PersistenceGateway;
        use httpmock::Method::GET;
        use httpmock::MockServer;
        use rust_decimal::Decimal;

        let gateway = Arc::new(MemoryGateway::new());
        let user_id = gateway.create_user("alice", "pw").await.unwrap();
        gateway.insert_order(user_id, "79927398713").await.unwrap();

        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/orders/79927398713");
                then.status(200)
                    .json_body(serde_json::json!({"order": "79927398713", "status": "PROCESSED", "accrual": 500}));
            })
            .await;

        let client = AccrualClient::new(server.base_url());
        let mut worker = ScoringWorker::new(Arc::clone(&gateway), client);

        assert_eq!(worker.tick().await, Ok(true));
        let balance = gateway.get_balance(user_id).await.unwrap();
        assert_eq!(balance.current, Decimal::new(500, 0));
    }

    #[tokio::test]
    async fn rate_limited_response_reports_backoff() {
        use crate::db::PersistenceGateway;
        use httpmock::Method::GET;
        use httpmock::MockServer;

        let gateway = Arc::new(MemoryGateway::new());
        let user_id = gateway.create_user("alice", "pw").await.unwrap();
        gateway.insert_order(user_id, "79927398713").await.unwrap();

        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/orders/79927398713");
                then.status(429).header("Retry-After", "7");
            })
            .await;

        let client = AccrualClient::new(server.base_url());
        let mut worker = ScoringWorker::new(gateway, client);

        assert_eq!(worker.tick().await, Err(Duration::from_secs(7)));
    }
}
