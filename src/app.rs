use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Json},
    routing::{delete, get, post, put, MethodRouter},
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{AppConfig, SecurityConfig};
use crate::database::ProductStore;
use crate::handlers::{elevated, protected, public};
use crate::middleware::{jwt_auth_middleware, require_staff_middleware};

/// Shared handles passed to every handler through axum state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ProductStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn ProductStore>, config: AppConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}

pub fn build_app(state: AppState) -> Router {
    let mut app = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_routes())
        // Protected: any authenticated user
        .merge(protected_routes(state.clone()))
        // Elevated: staff only
        .merge(elevated_routes(state.clone()))
        .layer(DefaultBodyLimit::max(state.config.api.max_request_size_bytes));

    if let Some(cors) = cors_layer(&state.config.security) {
        app = app.layer(cors);
    }
    if state.config.api.enable_request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }

    app.with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/products/top", get(public::products_top))
        .route("/api/products/:id", get(public::product_get))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new().route(
        "/api/products/:id/reviews",
        authenticated(&state, post(protected::review_post)),
    )
}

fn elevated_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/products", staff_only(&state, post(elevated::product_post)))
        .route(
            "/api/products/:id",
            staff_only(&state, put(elevated::product_put).merge(delete(elevated::product_delete))),
        )
        .route("/api/products/:id/price", staff_only(&state, put(elevated::price_put)))
}

// Layers sit on the method router so unmatched methods still get 405
fn authenticated(state: &AppState, routes: MethodRouter<AppState>) -> MethodRouter<AppState> {
    routes.route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth_middleware))
}

fn staff_only(state: &AppState, routes: MethodRouter<AppState>) -> MethodRouter<AppState> {
    // Layers run bottom-up: JWT first, then the staff check
    let routes = routes.route_layer(middleware::from_fn(require_staff_middleware));
    authenticated(state, routes)
}

fn cors_layer(security: &SecurityConfig) -> Option<CorsLayer> {
    if !security.enable_cors {
        return None;
    }

    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if security.cors_origins.iter().any(|o| o == "*") {
        return Some(layer.allow_origin(Any));
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    Some(layer.allow_origin(origins))
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Storefront API",
            "version": version,
            "description": "Products, reviews and pricing backend built with Rust (Axum)",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "top": "GET /api/products/top (public)",
                "product": "GET /api/products/:id (public)",
                "reviews": "POST /api/products/:id/reviews (protected)",
                "create": "POST /api/products (staff)",
                "update": "PUT /api/products/:id (staff)",
                "delete": "DELETE /api/products/:id (staff)",
                "price": "PUT /api/products/:id/price (staff)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "SERVICE_UNAVAILABLE",
                    "detail": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
