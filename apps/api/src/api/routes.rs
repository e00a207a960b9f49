use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::errors::ApiError;
use crate::api::handlers::{auth, chat, profile, properties, subscriptions};
use crate::state::AppState;

async fn fallback() -> ApiError {
    ApiError::not_found("Route not found")
}

/// Builds the HTTP router over the shared state
pub fn build_router(state: AppState) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(auth::health_check))
        // Auth routes
        .route("/auth/register", post(auth::register))
        .route("/auth/register-provider", post(auth::register_provider))
        .route("/auth/login", post(auth::login))
        .route("/auth/upgrade-to-provider", post(auth::upgrade_to_provider))
        .route("/auth/me", get(auth::me))
        .route("/auth/logout", post(auth::logout))
        // Profile & categories
        .route(
            "/profile",
            get(profile::get_profile).put(profile::update_profile),
        )
        .route("/provider/onboarding", get(profile::get_onboarding))
        .route("/categories", get(profile::list_categories))
        .route("/user/categories", put(profile::set_categories))
        // Properties
        .route(
            "/properties",
            get(properties::list_properties).post(properties::create_property),
        )
        .route("/properties/:id", get(properties::get_property))
        .route("/properties/:id/view", post(properties::record_view))
        .route("/provider/properties", get(properties::list_own_properties))
        // Subscriptions
        .route("/create-subscription", post(subscriptions::create_subscription))
        .route("/webhooks/payment", post(subscriptions::payment_webhook))
        .route("/subscriptions", get(subscriptions::list_subscriptions))
        .route(
            "/subscriptions/:id/cancel",
            post(subscriptions::cancel_subscription),
        )
        // Chat
        .route(
            "/chat/conversations",
            get(chat::list_conversations).post(chat::open_conversation),
        )
        .route(
            "/chat/conversations/:id/messages",
            get(chat::list_messages).post(chat::send_message),
        )
        .fallback(fallback)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Shared state
        .with_state(state)
}
