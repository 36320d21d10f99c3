pub mod identity;
pub mod plants;
pub mod rest;
pub mod state;

pub use plants::{get_plant_handler, list_plants_handler, rename_plant_handler};
pub use rest::diagnose_handler;

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderName, Method,
    },
    routing::{get, post},
    Router,
};
use rest::ApiDoc;
use state::AppState;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Builds the complete application router: API routes plus the Swagger UI.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(app_state.config.cors_origin.clone())
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([
            CONTENT_TYPE,
            ACCEPT,
            HeaderName::from_static(identity::USER_ID_HEADER),
        ]);

    // Photos arrive inline as data URIs, so the body limit follows the config.
    let api_router = Router::new()
        .route("/api/diagnose", post(diagnose_handler))
        .route("/api/plants", get(list_plants_handler))
        .route(
            "/api/plants/{id}",
            get(get_plant_handler).patch(rename_plant_handler),
        )
        .layer(DefaultBodyLimit::max(app_state.config.max_body_bytes))
        .layer(cors)
        .with_state(app_state);

    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
