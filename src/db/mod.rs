//! Persistence gateway: the durable store of users, orders, balances, and
//! withdrawals, exposed as a trait rather than a single concrete struct.
//! `PgGateway` is the Postgres-backed production implementation;
//! `MemoryGateway` is an in-process fake used by tests, honouring the same
//! invariants.

mod memory;
mod models;
mod password;
mod pg;

mod error;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::OrderStatus;

pub use error::StoreError;
pub use memory::MemoryGateway;
pub use models::{Balance, OrderRow, WithdrawalRow};
pub use password::{hash_password, verify_password};
pub use pg::PgGateway;

/// The operations the order lifecycle engine and the API surface depend on.
/// Any backend that satisfies this contract is admissible.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    async fn create_user(&self, login: &str, password: &str) -> Result<i64, StoreError>;

    /// Returns `(user_id, password_verifier)`. A missing row maps to
    /// `Unauthorized` rather than a distinguishable "not found", so login
    /// never leaks whether a login exists.
    async fn find_user(&self, login: &str) -> Result<(i64, String), StoreError>;

    async fn insert_order(&self, user_id: i64, number: &str) -> Result<(), StoreError>;

    async fn list_orders(&self, user_id: i64) -> Result<Vec<OrderRow>, StoreError>;

    async fn get_balance(&self, user_id: i64) -> Result<Balance, StoreError>;

    /// Non-terminal orders (`NEW` or `PROCESSING`), capped at `limit`.
    async fn pick_pending_orders(&self, limit: i64) -> Result<Vec<(String, OrderStatus)>, StoreError>;

    /// Transactionally updates the order row and, on `PROCESSED`, credits
    /// the owner's balance. A second apply against an order already
    /// terminal is a no-op.
    async fn apply_accrual(
        &self,
        number: &str,
        new_status: OrderStatus,
        accrual: Decimal,
    ) -> Result<(), StoreError>;

    /// Transactionally debits the balance and appends a withdrawal record,
    /// under the "sufficient funds" invariant.
    async fn withdraw(&self, user_id: i64, order_number: &str, sum: Decimal) -> Result<(), StoreError>;

    async fn list_withdrawals(&self, user_id: i64) -> Result<Vec<WithdrawalRow>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// Lets the order engine and the scoring worker share one pooled gateway
/// via a single `Arc`, instead of each needing its own owned instance.
#[async_trait]
impl<G: PersistenceGateway + ?Sized> PersistenceGateway for std::sync::Arc<G> {
    async fn create_user(&self, login: &str, password: &str) -> Result<i64, StoreError> {
        (**self).create_user(login, password).await
    }

    async fn find_user(&self, login: &str) -> Result<(i64, String), StoreError> {
        (**self).find_user(login).await
    }

    async fn insert_order(&self, user_id: i64, number: &str) -> Result<(), StoreError> {
        (**self).insert_order(user_id, number).await
    }

    async fn list_orders(&self, user_id: i64) -> Result<Vec<OrderRow>, StoreError> {
        (**self).list_orders(user_id).await
    }

    async fn get_balance(&self, user_id: i64) -> Result<Balance, StoreError> {
        (**self).get_balance(user_id).await
    }

    async fn pick_pending_orders(&self, limit: i64) -> Result<Vec<(String, OrderStatus)>, StoreError> {
        (**self).pick_pending_orders(limit).await
    }

    async fn apply_accrual(
        &self,
        number: &str,
        new_status: OrderStatus,
        accrual: Decimal,
    ) -> Result<(), StoreError> {
        (**self).apply_accrual(number, new_status, accrual).await
    }

    async fn withdraw(&self, user_id: i64, order_number: &str, sum: Decimal) -> Result<(), StoreError> {
        (**self).withdraw(user_id, order_number, sum).await
    }

    async fn list_withdrawals(&self, user_id: i64) -> Result<Vec<WithdrawalRow>, StoreError> {
        (**self).list_withdrawals(user_id).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        (**self).ping().await
    }
}
