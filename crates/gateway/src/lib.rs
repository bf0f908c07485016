//! # Homelink Gateway
//!
//! The HTTP surface of the Homelink backend. Handlers translate JSON
//! bodies into account-service calls and map account errors onto status
//! codes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use homelink_gateway::{build_router, GatewayState};
//!
//! let state = GatewayState::new(registration, devices, subscriptions, notifications);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:7070").await?;
//! axum::serve(listener, build_router(state)).await?;
//! ```

mod docs;
mod error;
mod middleware;
mod state;
mod util;

pub mod routes;

pub use docs::ApiDoc;
pub use error::{ApiError, ErrorResponse};
pub use state::GatewayState;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};

pub fn build_router(state: GatewayState) -> Router {
    let router = Router::new()
        .route("/health", get(routes::health::health_check))
        // Identity routes
        .route("/api/users/signup", post(routes::users::signup_local))
        .route("/api/users/signup/social", post(routes::users::signup_social))
        .route("/api/users/login", post(routes::users::login))
        .route("/api/users/me", get(routes::users::get_current_user))
        .route(
            "/api/users/me/device-token",
            put(routes::users::update_device_token),
        )
        // Device routes
        .route("/api/devices", post(routes::devices::bind_device))
        // Subscription routes
        .route(
            "/api/subscriptions",
            get(routes::subscriptions::get_subscription).post(routes::subscriptions::subscribe),
        )
        .route(
            "/api/notifications/push",
            post(routes::notifications::push_to_self),
        )
        .with_state(state);

    #[cfg(debug_assertions)]
    let router = {
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
    };

    router
        .layer(middleware::cors_layer())
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
}
