use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use marketplace_api::api::build_router;
use marketplace_api::config::AppConfig;
use marketplace_api::domain::payments::PaymentProcessor;
use marketplace_api::infrastructure::payments::{MockPaymentProcessor, StripePaymentProcessor};
use marketplace_api::state::AppState;

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("marketplace_api=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env().expect("Invalid configuration");

    let payments: Arc<dyn PaymentProcessor> = match config.stripe.clone() {
        Some(stripe) => Arc::new(
            StripePaymentProcessor::new(stripe, config.payment_timeout)
                .expect("Failed to build payment client"),
        ),
        None => {
            tracing::warn!("STRIPE_SECRET_KEY not set, using the mock payment processor");
            Arc::new(MockPaymentProcessor::new())
        }
    };

    let state = match config.database_url.clone() {
        Some(database_url) => {
            // Connect to database
            tracing::info!("Connecting to database...");
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(&database_url)
                .await
                .expect("Failed to connect to database");

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .expect("Failed to run migrations");

            tracing::info!("Database connected successfully");
            AppState::postgres(pool, config, payments)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, data is kept in memory");
            AppState::in_memory(config, payments)
        }
    };

    let addr = state.config.bind_addr;
    let app = build_router(state);

    // Start server
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app)
        .await
        .expect("Server failed");
}
