//! Request handlers: thin adapters that parse the request, delegate to
//! the order engine, and map the result to the status code and flat
//! `{"message": "..."}` / resource body the caller expects.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar};

use crate::auth::{AuthUser, COOKIE_NAME, issue_token, TOKEN_TTL};
use crate::db::{PersistenceGateway, StoreError};
use crate::engine::{Submission, SubmitError};
use crate::error::AppError;

use super::dto::{BalanceOut, Credentials, OrderOut, WithdrawIn, WithdrawalOut};
use super::state::AppState;

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .max_age(time::Duration::seconds(TOKEN_TTL.as_secs() as i64))
        .build()
}

pub async fn register<G: PersistenceGateway>(
    State(state): State<AppState<G>>,
    jar: CookieJar,
    Json(body): Json<Credentials>,
) -> Result<impl IntoResponse, AppError> {
    if body.login.is_empty() || body.password.is_empty() {
        return Err(AppError::BadRequest("login and password are required".into()));
    }

    let user_id = state.engine.register_user(&body.login, &body.password).await?;
    let token = issue_token(user_id, &state.jwt_secret)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok((jar.add(session_cookie(token)), StatusCode::OK))
}

pub async fn login<G: PersistenceGateway>(
    State(state): State<AppState<G>>,
    jar: CookieJar,
    Json(body): Json<Credentials>,
) -> Result<impl IntoResponse, AppError> {
    if body.login.is_empty() || body.password.is_empty() {
        return Err(AppError::BadRequest("login and password are required".into()));
    }

    let user_id = state.engine.authenticate(&body.login, &body.password).await?;
    let token = issue_token(user_id, &state.jwt_secret)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok((jar.add(session_cookie(token)), StatusCode::OK))
}

pub async fn submit_order<G: PersistenceGateway>(
    State(state): State<AppState<G>>,
    AuthUser(user_id): AuthUser,
    body: String,
) -> Result<impl IntoResponse, AppError> {
    let number = body.trim();
    if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::BadRequest("order number must be a digit string".into()));
    }

    match state.engine.submit_order(user_id, number).await {
        Ok(Submission::Accepted) => Ok(StatusCode::ACCEPTED),
        Ok(Submission::AlreadyOwnedBySame) => Ok(StatusCode::OK),
        Err(SubmitError::InvalidNumber) => Err(AppError::UnprocessableEntity(
            "order number fails the Luhn check".into(),
        )),
        Err(SubmitError::OwnedByOther) => Err(AppError::AlreadyOwnedByOther),
        Err(SubmitError::Store(e)) => Err(e.into()),
    }
}

pub async fn list_orders<G: PersistenceGateway>(
    State(state): State<AppState<G>>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let orders = state.engine.list_orders(user_id).await?;
    if orders.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    let out: Vec<OrderOut> = orders.into_iter().map(OrderOut::from).collect();
    Ok(Json(out).into_response())
}

pub async fn get_balance<G: PersistenceGateway>(
    State(state): State<AppState<G>>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let balance = state.engine.get_balance(user_id).await?;
    Ok(Json(BalanceOut {
        current: balance.current,
        withdrawn: balance.withdrawn,
    }))
}

pub async fn withdraw<G: PersistenceGateway>(
    State(state): State<AppState<G>>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<WithdrawIn>,
) -> Result<impl IntoResponse, AppError> {
    if body.sum <= rust_decimal::Decimal::ZERO {
        return Err(AppError::BadRequest("withdrawal sum must be positive".into()));
    }

    match state.engine.withdraw(user_id, &body.order, body.sum).await {
        Ok(()) => Ok(StatusCode::OK),
        Err(SubmitError::InvalidNumber) => Err(AppError::UnprocessableEntity(
            "order number fails the Luhn check".into(),
        )),
        Err(SubmitError::OwnedByOther) => Err(AppError::Internal(
            "withdrawal path produced an order-ownership error".into(),
        )),
        Err(SubmitError::Store(StoreError::InsufficientFunds)) => Err(AppError::NotEnoughFunds),
        Err(SubmitError::Store(e)) => Err(e.into()),
    }
}

pub async fn list_withdrawals<G: PersistenceGateway>(
    State(state): State<AppState<G>>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let withdrawals = state.engine.list_withdrawals(user_id).await?;
    if withdrawals.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    let out: Vec<WithdrawalOut> = withdrawals.into_iter().map(WithdrawalOut::from).collect();
    Ok(Json(out).into_response())
}

pub async fn health<G: PersistenceGateway>(
    State(state): State<AppState<G>>,
) -> Result<impl IntoResponse, AppError> {
    state.engine.gateway().ping().await?;
    Ok(StatusCode::OK)
}
