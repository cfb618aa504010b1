//! Website uptime pings: probe a fixed list of sites on demand, keep every
//! result in an append-only history and serve that history back by window.

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

pub mod argument_parsing;
pub mod error;
pub mod history;
pub mod measurement;
pub mod probe;
pub mod routes;
mod shared_queries;
pub mod sites;
pub mod store;

use probe::Prober;
use sites::Site;
use store::Store;

/// Process-wide state, built once at startup and cloned into handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    pub store: Store,
    pub prober: Prober,
    pub sites: Arc<[Site]>,
}

impl AppState {
    pub fn new(store: Store, prober: Prober, sites: Arc<[Site]>) -> Self {
        Self {
            store,
            prober,
            sites,
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/ping",
            get(routes::get_history).post(routes::trigger_round),
        )
        .route("/api/sites", get(routes::list_sites))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
