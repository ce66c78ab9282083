//! Shared application state: an Arc-wrapped, cheaply `Clone`-able handle
//! to the order engine and the JWT signing secret.

use std::sync::Arc;

use axum::extract::FromRef;

use crate::db::PersistenceGateway;
use crate::engine::OrderEngine;

pub struct AppState<G: PersistenceGateway> {
    pub engine: Arc<OrderEngine<G>>,
    pub jwt_secret: Vec<u8>,
}

impl<G: PersistenceGateway> Clone for AppState<G> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            jwt_secret: self.jwt_secret.clone(),
        }
    }
}

impl<G: PersistenceGateway> AppState<G> {
    pub fn new(engine: Arc<OrderEngine<G>>, jwt_secret: Vec<u8>) -> Self {
        Self { engine, jwt_secret }
    }
}

impl<G: PersistenceGateway> FromRef<AppState<G>> for Vec<u8> {
    fn from_ref(state: &AppState<G>) -> Self {
        state.jwt_secret.clone()
    }
}
