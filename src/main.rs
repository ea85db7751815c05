// src/main.rs

use std::net::SocketAddr;
use std::sync::Arc;

use dotenvy::dotenv;
use edugenius_backend::config::Config;
use edugenius_backend::models::user::{User, UserRole};
use edugenius_backend::routes;
use edugenius_backend::state::AppState;
use edugenius_backend::store::{Db, LocalStore};
use edugenius_backend::utils::hash::hash_password;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    // Open the local fallback store and decide the active backend from the
    // stored settings.
    let local = LocalStore::connect(&config.database_path)
        .await
        .expect("Failed to open local store");
    let db = Arc::new(Db::new(local));
    db.init().await.expect("Failed to initialize storage");

    tracing::info!("Storage ready ({:?})", db.connection_type().await);

    // Seed Admin User
    if let Err(e) = seed_admin_user(&db, &config).await {
        tracing::error!("Failed to seed admin user: {:?}", e);
    }

    // Create AppState
    let state = AppState::new(db, config);

    // Create the Axum application router
    let app = routes::create_router(state);

    // Bind to the listening address
    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    tracing::info!("EduGenius backend listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();

    // Start the server
    axum::serve(listener, app).await.unwrap();
}

/// Creates the built-in admin account when the user table is empty.
async fn seed_admin_user(db: &Db, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) {
        let users = db.get_users().await?;

        if users.is_empty() {
            tracing::info!("Seeding admin user: {}", username);
            let admin = User {
                id: "admin".to_string(),
                username: username.trim().to_lowercase(),
                name: "Admin Utama".to_string(),
                role: UserRole::Admin,
                active: true,
                password: hash_password(password)?,
            };
            db.save_user(&admin).await?;
            tracing::info!("Admin user created successfully.");
        }
    }
    Ok(())
}
