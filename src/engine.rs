//! Order lifecycle engine: the thin orchestration layer between the
//! domain validator and the persistence gateway, carrying an order from
//! submission through scoring to final credit.

use rust_decimal::Decimal;

use crate::db::{Balance, OrderRow, PersistenceGateway, StoreError, WithdrawalRow};
use crate::domain::{OrderStatus, luhn};

pub struct OrderEngine<G: PersistenceGateway> {
    gateway: G,
}

/// Outcome of submitting an order number, distinguishing a fresh insert
/// from an idempotent resubmission by the same owner.
pub enum Submission {
    Accepted,
    AlreadyOwnedBySame,
}

impl<G: PersistenceGateway> OrderEngine<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub async fn register_user(&self, login: &str, password: &str) -> Result<i64, StoreError> {
        self.gateway.create_user(login, password).await
    }

    /// Verifies the login/password pair against the stored verifier,
    /// returning the user id on success.
    pub async fn authenticate(&self, login: &str, password: &str) -> Result<i64, StoreError> {
        let (user_id, hash) = self.gateway.find_user(login).await?;
        if crate::db::verify_password(password, &hash) {
            Ok(user_id)
        } else {
            Err(StoreError::Unauthorized)
        }
    }

    /// Submits an order number for scoring. Rejects non-Luhn numbers
    /// before ever touching the gateway.
    pub async fn submit_order(&self, user_id: i64, number: &str) -> Result<Submission, SubmitError> {
        if !luhn::is_valid(number) {
            return Err(SubmitError::InvalidNumber);
        }

        match self.gateway.insert_order(user_id, number).await {
            Ok(()) => Ok(Submission::Accepted),
            Err(StoreError::AlreadyOwnedBySame) => Ok(Submission::AlreadyOwnedBySame),
            Err(StoreError::AlreadyOwnedByOther) => Err(SubmitError::OwnedByOther),
            Err(e) => Err(SubmitError::Store(e)),
        }
    }

    pub async fn list_orders(&self, user_id: i64) -> Result<Vec<OrderRow>, StoreError> {
        self.gateway.list_orders(user_id).await
    }

    pub async fn get_balance(&self, user_id: i64) -> Result<Balance, StoreError> {
        self.gateway.get_balance(user_id).await
    }

    /// Debits `sum` from the user's balance for `order_number`, requiring
    /// the order number itself to be Luhn-valid even though it is never
    /// scored.
    pub async fn withdraw(
        &self,
        user_id: i64,
        order_number: &str,
        sum: Decimal,
    ) -> Result<(), SubmitError> {
        if !luhn::is_valid(order_number) {
            return Err(SubmitError::InvalidNumber);
        }
        self.gateway
            .withdraw(user_id, order_number, sum)
            .await
            .map_err(SubmitError::Store)
    }

    pub async fn list_withdrawals(&self, user_id: i64) -> Result<Vec<WithdrawalRow>, StoreError> {
        self.gateway.list_withdrawals(user_id).await
    }

    pub async fn pick_pending_orders(&self, limit: i64) -> Result<Vec<(String, OrderStatus)>, StoreError> {
        self.gateway.pick_pending_orders(limit).await
    }

    pub async fn apply_accrual(
        &self,
        number: &str,
        status: OrderStatus,
        accrual: Decimal,
    ) -> Result<(), StoreError> {
        self.gateway.apply_accrual(number, status, accrual).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("order number fails the Luhn check")]
    InvalidNumber,
    #[error("order already uploaded by another user")]
    OwnedByOther,
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryGateway;

    fn engine() -> OrderEngine<MemoryGateway> {
        OrderEngine::new(MemoryGateway::new())
    }

    #[tokio::test]
    async fn rejects_luhn_invalid_numbers() {
        let e = engine();
        let user = e.register_user("alice", "pw").await.unwrap();
        let err = e.submit_order(user, "12345678901").await.unwrap_err();
        assert!(matches!(err, SubmitError::InvalidNumber));
    }

    #[tokio::test]
    async fn resubmission_is_idempotent_for_the_same_user() {
        let e = engine();
        let user = e.register_user("alice", "pw").await.unwrap();
        e.submit_order(user, "79927398713").await.unwrap();
        let second = e.submit_order(user, "79927398713").await.unwrap();
        assert!(matches!(second, Submission::AlreadyOwnedBySame));
    }

    #[tokio::test]
    async fn authenticate_rejects_wrong_password() {
        let e = engine();
        e.register_user("alice", "correct-horse").await.unwrap();
        let err = e.authenticate("alice", "wrong").await.unwrap_err();
        assert!(matches!(err, StoreError::Unauthorized));
    }
}
