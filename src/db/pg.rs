//! Postgres-backed `PersistenceGateway`: pooled connections, startup
//! schema bootstrap, and row-locking transactions for the two operations
//! that mutate a balance.
//!
//! Queries use the runtime-checked `sqlx::query`/`query_as` forms rather
//! than the `query!`/`query_as!` compile-time macros: schema setup happens
//! at startup via `bootstrap`, not a migrations directory, so there is no
//! `DATABASE_URL` available at build time for the macros to check against.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Row, postgres::PgPoolOptions};
use std::time::Duration;

use super::{Balance, OrderRow, PersistenceGateway, StoreError, WithdrawalRow, hash_password};
use crate::domain::OrderStatus;

const DEFAULT_MIN_CONNECTIONS: u32 = 2;
const DEFAULT_MAX_CONNECTIONS: u32 = 15;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Postgres error code for a unique-constraint violation.
const UNIQUE_VIOLATION: &str = "23505";

pub struct PgGateway {
    pool: sqlx::PgPool,
}

impl PgGateway {
    pub async fn connect(database_uri: &str) -> Result<Self, StoreError> {
        let max_connections = std::env::var("PG_POOL_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);

        let pool = PgPoolOptions::new()
            .min_connections(DEFAULT_MIN_CONNECTIONS)
            .max_connections(max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(database_uri)
            .await?;

        let gateway = Self { pool };
        gateway.bootstrap().await?;
        Ok(gateway)
    }

    /// Creates the logical schema if it doesn't already exist.
    async fn bootstrap(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id BIGSERIAL PRIMARY KEY,
                login TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                balance NUMERIC(18, 2) NOT NULL DEFAULT 0,
                withdrawn NUMERIC(18, 2) NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS orders (
                number TEXT PRIMARY KEY,
                user_id BIGINT NOT NULL REFERENCES users(id),
                status TEXT NOT NULL DEFAULT 'NEW',
                accrual NUMERIC(18, 2) NOT NULL DEFAULT 0,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS withdrawals (
                id BIGSERIAL PRIMARY KEY,
                user_id BIGINT NOT NULL REFERENCES users(id),
                order_number TEXT NOT NULL,
                sum NUMERIC(18, 2) NOT NULL,
                processed_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl PersistenceGateway for PgGateway {
    async fn create_user(&self, login: &str, password: &str) -> Result<i64, StoreError> {
        let hash = hash_password(password)?;

        let row = sqlx::query("INSERT INTO users (login, password_hash) VALUES ($1, $2) RETURNING id")
            .bind(login)
            .bind(&hash)
            .fetch_one(&self.pool)
            .await;

        match row {
            Ok(row) => Ok(row.get::<i64, _>("id")),
            Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                Err(StoreError::LoginTaken)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_user(&self, login: &str) -> Result<(i64, String), StoreError> {
        let row = sqlx::query("SELECT id, password_hash FROM users WHERE login = $1")
            .bind(login)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok((row.get::<i64, _>("id"), row.get::<String, _>("password_hash"))),
            None => Err(StoreError::Unauthorized),
        }
    }

    async fn insert_order(&self, user_id: i64, number: &str) -> Result<(), StoreError> {
        let existing = sqlx::query("SELECT user_id FROM orders WHERE number = $1")
            .bind(number)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = existing {
            let owner: i64 = row.get("user_id");
            return if owner == user_id {
                Err(StoreError::AlreadyOwnedBySame)
            } else {
                Err(StoreError::AlreadyOwnedByOther)
            };
        }

        sqlx::query("INSERT INTO orders (number, user_id, status) VALUES ($1, $2, 'NEW')")
            .bind(number)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list_orders(&self, user_id: i64) -> Result<Vec<OrderRow>, StoreError> {
        let rows = sqlx::query(
            "SELECT number, user_id, status, accrual, created_at, updated_at \
             FROM orders WHERE user_id = $1 ORDER BY created_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| OrderRow {
                number: row.get("number"),
                user_id: row.get("user_id"),
                status: OrderStatus::from(row.get::<String, _>("status").as_str()),
                accrual: row.get("accrual"),
                created_at: row.get::<DateTime<Utc>, _>("created_at"),
                updated_at: row.get::<DateTime<Utc>, _>("updated_at"),
            })
            .collect())
    }

    async fn get_balance(&self, user_id: i64) -> Result<Balance, StoreError> {
        let row = sqlx::query("SELECT balance, withdrawn FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        let row = row.ok_or(StoreError::Unauthorized)?;
        Ok(Balance {
            current: row.get::<Decimal, _>("balance"),
            withdrawn: row.get::<Decimal, _>("withdrawn"),
        })
    }

    async fn pick_pending_orders(&self, limit: i64) -> Result<Vec<(String, OrderStatus)>, StoreError> {
        let rows = sqlx::query(
            "SELECT number, status FROM orders WHERE status IN ('NEW', 'PROCESSING') \
             ORDER BY created_at ASC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.get("number"), OrderStatus::from(row.get::<String, _>("status").as_str())))
            .collect())
    }

    async fn apply_accrual(
        &self,
        number: &str,
        new_status: OrderStatus,
        accrual: Decimal,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT user_id, status FROM orders WHERE number = $1 FOR UPDATE")
            .bind(number)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(row) = row else {
            return Ok(());
        };

        let current_status = OrderStatus::from(row.get::<String, _>("status").as_str());
        if current_status.is_terminal() {
            return Ok(());
        }

        let user_id: i64 = row.get("user_id");

        sqlx::query("UPDATE orders SET status = $1, accrual = $2, updated_at = now() WHERE number = $3")
            .bind(new_status.as_str())
            .bind(accrual)
            .bind(number)
            .execute(&mut *tx)
            .await?;

        if new_status == OrderStatus::Processed && accrual > Decimal::ZERO {
            sqlx::query("UPDATE users SET balance = balance + $1 WHERE id = $2")
                .bind(accrual)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn withdraw(&self, user_id: i64, order_number: &str, sum: Decimal) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT balance FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;

        let row = row.ok_or(StoreError::Unauthorized)?;
        let balance: Decimal = row.get("balance");

        if balance < sum {
            return Err(StoreError::InsufficientFunds);
        }

        sqlx::query("UPDATE users SET balance = balance - $1, withdrawn = withdrawn + $1 WHERE id = $2")
            .bind(sum)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO withdrawals (user_id, order_number, sum) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(order_number)
            .bind(sum)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn list_withdrawals(&self, user_id: i64) -> Result<Vec<WithdrawalRow>, StoreError> {
        let rows = sqlx::query(
            "SELECT order_number, sum, processed_at FROM withdrawals \
             WHERE user_id = $1 ORDER BY processed_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| WithdrawalRow {
                order: row.get("order_number"),
                sum: row.get("sum"),
                processed_at: row.get::<DateTime<Utc>, _>("processed_at"),
            })
            .collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
