use axum::Router;

pub mod admin;
pub mod client;

use crate::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .nest("/admin", admin::router(state.clone()))
        .nest("/client", client::router(state.clone()))
        .with_state(state)
}
