use hoops_tracker::{
    auth::{token::TokenConfig, AuthService},
    AppState, Config, InMemoryStatStore, Notifier, PostgresStatStore, SeasonBook, StatStore,
    StoreSink,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hoops_tracker=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting hoops tracker");
    let config = Config::from_env();

    let store: Arc<dyn StatStore> = match config.database_url.as_deref() {
        Some(url) => match PostgresStatStore::connect(url).await {
            Ok(store) => {
                info!("Connected to PostgreSQL");
                Arc::new(store)
            }
            Err(e) => {
                error!(error = %e, "Failed to connect to database");
                std::process::exit(1);
            }
        },
        None => {
            warn!("DATABASE_URL not set, data lives in memory only");
            Arc::new(InMemoryStatStore::new())
        }
    };

    let notifier = Notifier::new(config.notification_capacity);
    let book = match SeasonBook::load(store.as_ref()).await {
        Ok(book) => book,
        Err(e) => {
            error!(error = %e, "Initial load failed, starting empty");
            notifier.error(format!("Failed to load data: {}", e));
            SeasonBook::default()
        }
    };

    if config.editor_password.is_none() {
        warn!("HOOPS_EDITOR_PASSWORD not set, the service is read-only");
    }
    let auth = AuthService::new(
        TokenConfig::new(config.jwt_secret.clone(), config.session_expiration_days),
        config.editor_password.clone(),
    );

    let app_state = AppState::new(
        store.clone(),
        Arc::new(StoreSink::new(store)),
        book.into_shared(),
        notifier,
        Arc::new(auth),
    );
    let app = hoops_tracker::router(app_state);

    let listener = match tokio::net::TcpListener::bind(&config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(error = %e, addr = %config.bind_addr, "Failed to bind");
            std::process::exit(1);
        }
    };
    info!(addr = %config.bind_addr, "Server running");
    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "Server stopped");
    }
}
