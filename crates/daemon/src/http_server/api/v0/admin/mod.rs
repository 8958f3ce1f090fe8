use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;

use crate::http_server::api::auth::require_administrator;
use crate::ServiceState;

pub mod credential;
pub mod login;
pub mod users;

pub use credential::SetCredentialRequest;
pub use login::AdminLoginRequest;
pub use users::{CreateUserRequest, DeleteUserRequest, ListUsersRequest};

pub fn router(state: ServiceState) -> Router<ServiceState> {
    let gated = Router::new()
        .route("/users", get(users::list_handler).post(users::create_handler))
        .route("/users/:username", delete(users::delete_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_administrator,
        ));

    Router::new()
        .route("/login", post(login::handler))
        .route("/credential", post(credential::handler))
        .merge(gated)
        .with_state(state)
}
