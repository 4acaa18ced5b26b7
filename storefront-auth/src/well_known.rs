//! JWKS publication endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::Json;
use axum::Router;
use jsonwebtoken::jwk::JwkSet;

pub const WELL_KNOWN_JWKS_PATH: &str = "/.well-known/jwks.json";

/// A router serving the public keyset; nest it into any service that hosts
/// the JWKS for demo purposes.
pub fn jwks_router(keys: JwkSet) -> Router {
    Router::new()
        .route(WELL_KNOWN_JWKS_PATH, get(serve_jwks))
        .with_state(Arc::new(keys))
}

async fn serve_jwks(State(keys): State<Arc<JwkSet>>) -> Json<JwkSet> {
    Json(keys.as_ref().clone())
}
