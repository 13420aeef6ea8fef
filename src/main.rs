// src/main.rs

use std::sync::Arc;
use std::time::Duration;

use dotenvy::dotenv;
use exam_session::clients::QuestionServiceClient;
use exam_session::config::Config;
use exam_session::routes;
use exam_session::state::AppState;
use exam_session::store::PgSessionStore;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    for warning in &config.warnings {
        tracing::warn!("{}", warning);
    }

    // Postgres may still be starting when the service comes up
    let mut retry_count = 0;
    let pool = loop {
        match PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
        {
            Ok(pool) => break pool,
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    panic!("Failed to connect to database after 5 retries: {}", e);
                }
                tracing::warn!("Database not ready, retrying in 2s... (Attempt {})", retry_count);
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    };

    tracing::info!("Database connected...");

    let store = PgSessionStore::new(pool);
    tracing::info!("Running migrations...");
    store
        .run_migrations()
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations applied successfully.");

    let questions = QuestionServiceClient::new(&config.question_service_url)
        .expect("QUESTION_SERVICE_URL must be a valid URL");
    tracing::info!("Question service at {}", questions.base_url());

    let state = AppState {
        store: Arc::new(store),
        questions,
        config: config.clone(),
    };

    let app = routes::create_router(state);

    tracing::info!("Listening on {}", config.bind_address);
    let listener = tokio::net::TcpListener::bind(config.bind_address)
        .await
        .expect("Failed to bind listening address");

    axum::serve(listener, app).await.expect("Server error");
}
