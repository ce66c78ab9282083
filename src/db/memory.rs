//! In-process fake `PersistenceGateway`, for exercising invariant and
//! property tests without a live Postgres instance.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;

use super::{Balance, OrderRow, PersistenceGateway, StoreError, WithdrawalRow, hash_password};
use crate::domain::OrderStatus;

struct UserRow {
    login: String,
    password_hash: String,
    balance: Decimal,
    withdrawn: Decimal,
}

#[derive(Default)]
struct State {
    users: Vec<UserRow>,
    orders: HashMap<String, OrderRow>,
    order_insertion_order: Vec<String>,
    withdrawals: HashMap<i64, Vec<WithdrawalRow>>,
}

#[derive(Default)]
pub struct MemoryGateway {
    state: Mutex<State>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PersistenceGateway for MemoryGateway {
    async fn create_user(&self, login: &str, password: &str) -> Result<i64, StoreError> {
        let hash = hash_password(password)?;
        let mut state = self.state.lock().unwrap();

        if state.users.iter().any(|u| u.login == login) {
            return Err(StoreError::LoginTaken);
        }

        state.users.push(UserRow {
            login: login.to_string(),
            password_hash: hash,
            balance: Decimal::ZERO,
            withdrawn: Decimal::ZERO,
        });

        Ok((state.users.len() - 1) as i64)
    }

    async fn find_user(&self, login: &str) -> Result<(i64, String), StoreError> {
        let state = self.state.lock().unwrap();
        state
            .users
            .iter()
            .position(|u| u.login == login)
            .map(|idx| (idx as i64, state.users[idx].password_hash.clone()))
            .ok_or(StoreError::Unauthorized)
    }

    async fn insert_order(&self, user_id: i64, number: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();

        if let Some(existing) = state.orders.get(number) {
            return if existing.user_id == user_id {
                Err(StoreError::AlreadyOwnedBySame)
            } else {
                Err(StoreError::AlreadyOwnedByOther)
            };
        }

        let now = Utc::now();
        state.orders.insert(
            number.to_string(),
            OrderRow {
                number: number.to_string(),
                user_id,
                status: OrderStatus::New,
                accrual: Decimal::ZERO,
                created_at: now,
                updated_at: now,
            },
        );
        state.order_insertion_order.push(number.to_string());

        Ok(())
    }

    async fn list_orders(&self, user_id: i64) -> Result<Vec<OrderRow>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .order_insertion_order
            .iter()
            .filter_map(|n| state.orders.get(n))
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_balance(&self, user_id: i64) -> Result<Balance, StoreError> {
        let state = self.state.lock().unwrap();
        let user = state
            .users
            .get(user_id as usize)
            .ok_or(StoreError::Unauthorized)?;
        Ok(Balance {
            current: user.balance,
            withdrawn: user.withdrawn,
        })
    }

    async fn pick_pending_orders(&self, limit: i64) -> Result<Vec<(String, OrderStatus)>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .order_insertion_order
            .iter()
            .filter_map(|n| state.orders.get(n))
            .filter(|o| !o.status.is_terminal())
            .take(limit.max(0) as usize)
            .map(|o| (o.number.clone(), o.status))
            .collect())
    }

    async fn apply_accrual(
        &self,
        number: &str,
        new_status: OrderStatus,
        accrual: Decimal,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();

        let Some(order) = state.orders.get(number) else {
            return Ok(());
        };
        if order.status.is_terminal() {
            return Ok(());
        }

        let user_id = order.user_id;

        if new_status == OrderStatus::Processed && accrual > Decimal::ZERO {
            if let Some(user) = state.users.get_mut(user_id as usize) {
                user.balance += accrual;
            }
        }

        if let Some(order) = state.orders.get_mut(number) {
            order.status = new_status;
            order.accrual = accrual;
            order.updated_at = Utc::now();
        }

        Ok(())
    }

    async fn withdraw(&self, user_id: i64, order_number: &str, sum: Decimal) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();

        let user = state
            .users
            .get_mut(user_id as usize)
            .ok_or(StoreError::Unauthorized)?;

        if user.balance < sum {
            return Err(StoreError::InsufficientFunds);
        }

        user.balance -= sum;
        user.withdrawn += sum;

        state.withdrawals.entry(user_id).or_default().push(WithdrawalRow {
            order: order_number.to_string(),
            sum,
            processed_at: Utc::now(),
        });

        Ok(())
    }

    async fn list_withdrawals(&self, user_id: i64) -> Result<Vec<WithdrawalRow>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state.withdrawals.get(&user_id).cloned().unwrap_or_default())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_duplicate_login() {
        let gw = MemoryGateway::new();
        gw.create_user("alice", "pw").await.unwrap();
        let err = gw.create_user("alice", "other").await.unwrap_err();
        assert!(matches!(err, StoreError::LoginTaken));
    }

    #[tokio::test]
    async fn resubmission_by_same_user_is_distinguished_from_other_user() {
        let gw = MemoryGateway::new();
        let alice = gw.create_user("alice", "pw").await.unwrap();
        let bob = gw.create_user("bob", "pw").await.unwrap();

        gw.insert_order(alice, "79927398713").await.unwrap();

        let same = gw.insert_order(alice, "79927398713").await.unwrap_err();
        assert!(matches!(same, StoreError::AlreadyOwnedBySame));

        let other = gw.insert_order(bob, "79927398713").await.unwrap_err();
        assert!(matches!(other, StoreError::AlreadyOwnedByOther));
    }

    #[tokio::test]
    async fn balance_never_goes_negative_on_overdraft() {
        let gw = MemoryGateway::new();
        let alice = gw.create_user("alice", "pw").await.unwrap();
        let err = gw.withdraw(alice, "79927398713", Decimal::new(500, 2)).await.unwrap_err();
        assert!(matches!(err, StoreError::InsufficientFunds));
        let balance = gw.get_balance(alice).await.unwrap();
        assert_eq!(balance.current, Decimal::ZERO);
    }

    #[tokio::test]
    async fn accrual_credits_balance_exactly_once() {
        let gw = MemoryGateway::new();
        let alice = gw.create_user("alice", "pw").await.unwrap();
        gw.insert_order(alice, "79927398713").await.unwrap();

        gw.apply_accrual("79927398713", OrderStatus::Processed, Decimal::new(5000, 2))
            .await
            .unwrap();
        gw.apply_accrual("79927398713", OrderStatus::Processed, Decimal::new(5000, 2))
            .await
            .unwrap();

        let balance = gw.get_balance(alice).await.unwrap();
        assert_eq!(balance.current, Decimal::new(5000, 2));
    }
}
