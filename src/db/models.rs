//! Row types returned by the persistence gateway.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::OrderStatus;

#[derive(Debug, Clone)]
pub struct OrderRow {
    pub number: String,
    pub user_id: i64,
    pub status: OrderStatus,
    pub accrual: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
pub struct Balance {
    pub current: Decimal,
    pub withdrawn: Decimal,
}

#[derive(Debug, Clone)]
pub struct WithdrawalRow {
    pub order: String,
    pub sum: Decimal,
    pub processed_at: DateTime<Utc>,
}
