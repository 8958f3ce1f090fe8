use axum::middleware;
use axum::routing::{get, post};
use axum::Router;

use crate::http_server::api::auth::require_user;
use crate::ServiceState;

pub mod files;
pub mod folders;
pub mod login;

pub use folders::CreateFolderRequest;
pub use login::UserLoginRequest;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    let gated = Router::new()
        .route("/folders", post(folders::create_handler))
        .route("/folders/:folder_id", get(folders::list_handler))
        .route("/files", post(files::upload_handler))
        .route(
            "/files/:content_key",
            get(files::download_handler).delete(files::delete_handler),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_user));

    Router::new()
        .route("/login", post(login::handler))
        .merge(gated)
        .with_state(state)
}
