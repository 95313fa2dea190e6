use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn router(state: AppState) -> Router {
    let base = state.config.base_path.clone();
    let mut router = Router::new()
        .route(&base, get(handlers::index))
        .route(&format!("{base}_remote"), get(handlers::remote_resource))
        .route(&format!("{base}ws"), get(handlers::observer_socket))
        .route(&format!("{base}api/status"), get(handlers::get_status))
        .route(&format!("{base}api/lifecycle"), get(handlers::get_lifecycle))
        .route(&format!("{base}api/update"), post(handlers::post_update))
        .route(&format!("{base}api/skip-waiting"), post(handlers::post_skip_waiting))
        .route(&format!("{base}api/push"), post(handlers::post_push));
    if base != "/" {
        router = router.route("/", get(handlers::root_redirect));
    }
    router.fallback(handlers::resource).with_state(state)
}
