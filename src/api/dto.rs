//! Wire types for the HTTP surface. Deliberately separate from
//! `db::models` — the gateway's row types carry internal bookkeeping
//! (timestamps, user ids) the wire format doesn't always need in the same
//! shape.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db::{OrderRow, WithdrawalRow};
use crate::domain::OrderStatus;

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct OrderOut {
    pub number: String,
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accrual: Option<Decimal>,
    pub uploaded_at: chrono::DateTime<chrono::Utc>,
}

impl From<OrderRow> for OrderOut {
    fn from(row: OrderRow) -> Self {
        let accrual = if row.status == OrderStatus::Processed {
            Some(row.accrual)
        } else {
            None
        };
        Self {
            number: row.number,
            status: row.status,
            accrual,
            uploaded_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BalanceOut {
    pub current: Decimal,
    pub withdrawn: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct WithdrawIn {
    pub order: String,
    pub sum: Decimal,
}

#[derive(Debug, Serialize)]
pub struct WithdrawalOut {
    pub order: String,
    pub sum: Decimal,
    pub processed_at: chrono::DateTime<chrono::Utc>,
}

impl From<WithdrawalRow> for WithdrawalOut {
    fn from(row: WithdrawalRow) -> Self {
        Self {
            order: row.order,
            sum: row.sum,
            processed_at: row.processed_at,
        }
    }
}
