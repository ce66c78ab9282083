//! Router assembly: nests the public (registration, login) and
//! cookie-authenticated route groups under `/api`.

use axum::Router;
use axum::routing::{get, post};

use crate::db::PersistenceGateway;

use super::handlers;
use super::state::AppState;

pub fn build<G: PersistenceGateway + 'static>(state: AppState<G>) -> Router {
    let public = Router::new()
        .route("/register", post(handlers::register::<G>))
        .route("/login", post(handlers::login::<G>));

    let protected = Router::new()
        .route(
            "/orders",
            post(handlers::submit_order::<G>).get(handlers::list_orders::<G>),
        )
        .route("/balance", get(handlers::get_balance::<G>))
        .route("/balance/withdraw", post(handlers::withdraw::<G>))
        .route("/withdrawals", get(handlers::list_withdrawals::<G>));

    let user = Router::new().nest("/user", public.merge(protected));

    let api = user.route("/health", get(handlers::health::<G>));

    Router::new().nest("/api", api).with_state(state)
}
