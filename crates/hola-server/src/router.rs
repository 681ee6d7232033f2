//! Axum router wiring.
//!
//! Routing is a fixed table of (method, path) -> endpoint; everything else
//! falls through to axum's default 404.

use axum::{
    routing::{on, MethodFilter},
    Router,
};

use crate::{app_state::AppState, handlers, ops};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Home,
    Metrics,
}

#[derive(Debug, Clone, Copy)]
pub struct Route {
    pub method: MethodFilter,
    pub path: &'static str,
    pub endpoint: Endpoint,
}

pub const ROUTES: [Route; 2] = [
    Route { method: MethodFilter::GET, path: "/", endpoint: Endpoint::Home },
    Route { method: MethodFilter::GET, path: "/metrics", endpoint: Endpoint::Metrics },
];

pub fn build_router(state: AppState) -> Router {
    ROUTES
        .iter()
        .fold(Router::<AppState>::new(), |router, r| {
            let handler = match r.endpoint {
                Endpoint::Home => on(r.method, handlers::home::home),
                Endpoint::Metrics => on(r.method, ops::metrics),
            };
            router.route(r.path, handler)
        })
        .with_state(state)
}
