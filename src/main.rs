use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use skillswap_search::config::{CorsSettings, Settings};
use skillswap_search::core::SearchService;
use skillswap_search::routes::{self, AppState};
use skillswap_search::services::{AnyGeocoder, CacheManager, CachedGeocoder, HttpGeocoder, PostgresClient};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(level: &str, format: &str) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.compact().init();
    }
}

fn build_cors(settings: &CorsSettings) -> Cors {
    match &settings.allowed_origin {
        Some(origin) => Cors::default()
            .allowed_origin(origin)
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allow_any_header()
            .supports_credentials(),
        None => Cors::permissive(),
    }
}

async fn build_geocoder(settings: &Settings) -> io::Result<AnyGeocoder> {
    let geo = &settings.geocoder;
    let http = HttpGeocoder::new(
        geo.base_url.clone(),
        geo.country.clone(),
        settings.geocoder_attempt_timeout(),
        geo.max_retries,
        Duration::from_millis(geo.backoff_ms),
    )
    .map_err(io::Error::other)?;

    if !settings.cache.enabled {
        info!("Geocode cache disabled");
        return Ok(AnyGeocoder::Direct(http));
    }

    let cache_settings = &settings.cache;
    let cache = match CacheManager::new(
        cache_settings.redis_url.as_deref(),
        cache_settings.l1_cache_size,
        cache_settings.ttl_secs,
    )
    .await
    {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to connect to Redis ({}), using in-process geocode cache only", e);
            CacheManager::in_memory(cache_settings.l1_cache_size, cache_settings.ttl_secs)
        }
    };

    info!(
        "Geocode cache initialized (L1: {} entries, L2: {}, TTL: {}s)",
        cache_settings.l1_cache_size,
        if cache.has_l2() { "redis" } else { "none" },
        cache_settings.ttl_secs
    );

    let country = http.country().to_string();
    Ok(AnyGeocoder::Cached(CachedGeocoder::new(http, Arc::new(cache), country)))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = match Settings::load() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return Err(io::Error::other(e));
        }
    };

    init_logging(&settings.logging.level, &settings.logging.format);

    info!("Starting SkillSwap listing search service...");

    let postgres = PostgresClient::from_settings(
        &settings.database.url,
        settings.database.max_connections,
        settings.database.min_connections,
        settings.database.acquire_timeout_secs,
        settings.database.idle_timeout_secs,
    )
    .await
    .map_err(|e| {
        error!("Failed to connect to PostgreSQL: {}", e);
        io::Error::other(e)
    })?;

    info!("PostgreSQL client initialized");

    let geocoder = build_geocoder(&settings).await?;

    info!(
        "Geocoder initialized ({} / country {})",
        settings.geocoder.base_url, settings.geocoder.country
    );

    let search = SearchService::new(
        postgres,
        geocoder,
        settings.proximity_filter(),
        settings.search_options(),
    );

    let app_state = AppState {
        search: Arc::new(search),
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);
    let cors_settings = settings.cors.clone();

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(routes::handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(routes::handle_query_payload_error))
            .wrap(build_cors(&cors_settings))
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes::<PostgresClient, AnyGeocoder>)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
