use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::handlers::public;
use crate::middleware::require_auth;
use crate::state::AppState;

/// Build the full router: public routes, token-guarded `/api` routes, then global layers
pub fn app(state: AppState, security: &SecurityConfig) -> Router {
    let router = Router::new()
        .route("/health", get(public::health::health))
        .merge(auth_public_routes())
        .merge(protected_routes(state.clone()))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    match cors_layer(security) {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

fn auth_public_routes() -> Router<AppState> {
    use crate::handlers::public::auth;

    Router::new()
        .route("/auth/sign-up", post(auth::sign_up))
        .route("/auth/sign-in", post(auth::sign_in))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use crate::handlers::protected::{todos, users};

    Router::new()
        .route("/api/users", get(users::list))
        .route("/api/users/me", get(users::me).delete(users::delete))
        .route("/api/users/me/name", patch(users::change_name))
        .route("/api/users/me/email", patch(users::change_email))
        .route("/api/users/me/password", patch(users::change_password))
        .route("/api/todos", post(todos::create).get(todos::list))
        .route("/api/todos/:todo_id", get(todos::show).delete(todos::delete))
        .route("/api/todos/:todo_id/content", patch(todos::change_content))
        .route("/api/todos/:todo_id/status", patch(todos::change_status))
        .route_layer(from_fn_with_state(state, require_auth))
}

fn cors_layer(security: &SecurityConfig) -> Option<CorsLayer> {
    if !security.enable_cors {
        return None;
    }

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if security.cors_origins.is_empty() || security.cors_origins.iter().any(|o| o == "*") {
        return Some(layer.allow_origin(Any));
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    Some(layer.allow_origin(origins))
}
