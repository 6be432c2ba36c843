use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use carpool_match::config::{Settings, StorageBackend};
use carpool_match::core::Matcher;
use carpool_match::models::MatchSettings;
use carpool_match::routes::{self, AppState, JwtValidator};
use carpool_match::services::{
    AddressService, AddressStore, Geocoder, InMemoryStore, NominatimGeocoder, PostgresStore,
    RateLimiter,
};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(default_level: &str, default_format: &str) {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| default_level.to_string());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| default_format.to_string());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

fn startup_error(what: &str, err: impl std::fmt::Display) -> io::Error {
    error!("{}: {}", what, err);
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", what, err))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Load configuration; logging settings come from it, so report failures on stderr
    let loaded = match std::env::var("CARPOOL_CONFIG") {
        Ok(path) => Settings::load_from(path),
        Err(_) => Settings::load(),
    };
    let settings = match loaded {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return Err(io::Error::new(io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    init_logging(&settings.logging.level, &settings.logging.format);

    info!("Starting carpool matching service...");

    // Initialize address store
    let store: Arc<dyn AddressStore> = match settings.database.backend {
        StorageBackend::Postgres => {
            let postgres = PostgresStore::from_settings(
                &settings.database.url,
                settings.database.max_connections,
                settings.database.min_connections,
                settings.database.acquire_timeout_secs,
                settings.database.idle_timeout_secs,
            )
            .await
            .map_err(|e| startup_error("Failed to connect to PostgreSQL", e))?;
            Arc::new(postgres)
        }
        StorageBackend::Memory => {
            warn!("Using the in-memory address store; data is lost on restart");
            Arc::new(InMemoryStore::new())
        }
    };

    info!(
        "Address store initialized (spatial search: {})",
        store.spatial_search_available()
    );

    // Initialize geocoder; one limiter per upstream
    let limiter = Arc::new(RateLimiter::new(Duration::from_millis(
        settings.geocoder.min_interval_ms,
    )));
    let geocoder: Arc<dyn Geocoder> = Arc::new(
        NominatimGeocoder::new(&settings.geocoder, limiter)
            .map_err(|e| startup_error("Failed to build geocoding client", e))?,
    );

    info!("Geocoder initialized ({})", settings.geocoder.base_url);

    // Initialize matcher
    let match_settings = MatchSettings::from(&settings.matching);
    let matcher = Matcher::new(match_settings);

    info!("Matcher initialized with settings: {:?}", match_settings);

    // Build application state
    let app_state = AppState {
        addresses: Arc::new(AddressService::new(store.clone(), geocoder)),
        store,
        matcher,
    };
    let jwt = JwtValidator::new(&settings.auth.jwt_secret);

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::Data::new(jwt.clone()))
            .app_data(web::JsonConfig::default().error_handler(routes::handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(routes::handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
