mod app_tests;
mod order_draft;
mod routes;
pub mod state;
mod templates;
mod web_result;

use routes::*;
use state::MadangState;
pub use templates::load_templates;

use axum::{handler::Handler, routing::get, Router};
use tower_http::{services::ServeDir, trace::TraceLayer};

/// Return a fully-functional bookstore manager app! The caller is in charge
/// of building the state (db connection, config, templates).
pub fn madang_app(state: MadangState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/search", get(search))
        .route("/order", get(order).post(post_order))
        .route("/register", get(register).post(post_register))
        .route("/status", get(status))
        .nest_service(
            "/public",
            ServeDir::new(&state.config.assets_dir)
                .not_found_service(four_oh_four.with_state(state.clone())),
        )
        .fallback(four_oh_four)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
