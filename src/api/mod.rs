mod handlers;
mod middleware;

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::db::Database;
use crate::models::{Assignment, Attendance, Grade, Student};

pub use middleware::ApiConfig;

pub fn create_router(db: Database) -> Router {
    create_router_with_config(db, ApiConfig::disabled())
}

pub fn create_router_with_config(db: Database, config: ApiConfig) -> Router {
    let tables = Router::new()
        // Students
        .route("/students", get(handlers::list::<Student>))
        .route("/students", post(handlers::create::<Student>))
        .route("/students/{id}", get(handlers::get::<Student>))
        .route("/students/{id}", put(handlers::update::<Student>))
        .route("/students/{id}", delete(handlers::remove::<Student>))
        // Assignments
        .route("/assignments", get(handlers::list::<Assignment>))
        .route("/assignments", post(handlers::create::<Assignment>))
        .route("/assignments/{id}", get(handlers::get::<Assignment>))
        .route("/assignments/{id}", put(handlers::update::<Assignment>))
        .route("/assignments/{id}", delete(handlers::remove::<Assignment>))
        // Grades
        .route("/grades", get(handlers::list::<Grade>))
        .route("/grades", post(handlers::create::<Grade>))
        .route("/grades/{id}", get(handlers::get::<Grade>))
        .route("/grades/{id}", put(handlers::update::<Grade>))
        .route("/grades/{id}", delete(handlers::remove::<Grade>))
        // Attendance
        .route("/attendance", get(handlers::list::<Attendance>))
        .route("/attendance", post(handlers::create::<Attendance>))
        .route("/attendance/{id}", get(handlers::get::<Attendance>))
        .route("/attendance/{id}", put(handlers::update::<Attendance>))
        .route("/attendance/{id}", delete(handlers::remove::<Attendance>))
        .route_layer(from_fn_with_state(config, middleware::auth_middleware));

    // Health stays reachable without a key.
    let api = tables.route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(db)
}
