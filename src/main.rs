use actix_cors::Cors;
use actix_web::http::Method;
use actix_web::middleware::{Compress, DefaultHeaders};
use actix_web::{App, HttpServer, web};
use dotenv::dotenv;
use human_panic::setup_panic;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};
use tracing_appender::non_blocking::WorkerGuard;

use rust_lms_next::config::{AppConfig, CorsConfig};
use rust_lms_next::routes;
use rust_lms_next::runtime::lifetime;
use rust_lms_next::utils::{json_error_handler, query_error_handler};

/// 初始化日志：开发环境输出文件与行号，其他环境输出 JSON
fn init_tracing(config: &AppConfig) -> WorkerGuard {
    let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.app.log_level))
        .with_writer(writer)
        .with_level(true);

    if config.is_development() {
        builder
            .with_ansi(true)
            .with_file(true)
            .with_line_number(true)
            .init();
    } else {
        builder.with_ansi(false).json().init();
    }
    guard
}

/// 按配置构造 CORS；"*" 表示放开对应项
fn build_cors(cors: &CorsConfig) -> Cors {
    let mut builder = Cors::default().max_age(cors.max_age);

    if cors.allowed_origins.iter().any(|o| o == "*") {
        builder = builder.allow_any_origin();
    } else {
        for origin in &cors.allowed_origins {
            builder = builder.allowed_origin(origin);
        }
    }

    if cors.allowed_methods.iter().any(|m| m == "*") {
        builder = builder.allow_any_method();
    } else {
        let methods = cors
            .allowed_methods
            .iter()
            .filter_map(|m| Method::from_str(m).ok());
        builder = builder.allowed_methods(methods);
    }

    if cors.allowed_headers.iter().any(|h| h == "*") {
        builder.allow_any_header()
    } else {
        builder.allowed_headers(cors.allowed_headers.iter().map(String::as_str))
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    setup_panic!();

    let started_at = chrono::Utc::now();

    AppConfig::init().expect("Failed to initialize configuration");
    let config = AppConfig::get();
    let _guard = init_tracing(config);

    warn!(
        "Starting {} ({} v{}) in {} mode",
        config.app.system_name,
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        config.app.environment
    );

    let startup = lifetime::startup::prepare_server_startup().await;
    let storage = startup.storage;
    let cache = startup.cache;

    debug!(
        "Pre-startup processing completed in {} ms",
        chrono::Utc::now()
            .signed_duration_since(started_at)
            .num_milliseconds()
    );
    warn!("Using {} worker threads", config.server.workers);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(build_cors(&config.cors))
            .wrap(Compress::default())
            .wrap(DefaultHeaders::new().add(("Cache-Control", "no-store")))
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::PayloadConfig::new(
                config.server.limits.max_payload_size,
            ))
            .app_data(web::Data::new(storage.clone()))
            .app_data(web::Data::new(cache.clone()))
            .configure(routes::configure_courses_routes)
            .configure(routes::configure_submissions_routes)
            .configure(routes::configure_progress_routes)
    })
    .keep_alive(Duration::from_secs(config.server.timeouts.keep_alive))
    .client_request_timeout(Duration::from_millis(
        config.server.timeouts.client_request,
    ))
    .client_disconnect_timeout(Duration::from_millis(
        config.server.timeouts.client_disconnect,
    ))
    .workers(config.server.workers);

    #[cfg(unix)]
    let server = match config.unix_socket_path() {
        Some(socket_path) => {
            warn!("Listening on unix socket {}", socket_path);
            if std::path::Path::new(socket_path).exists() {
                std::fs::remove_file(socket_path)?;
            }
            server.bind_uds(socket_path)?
        }
        None => {
            warn!("Listening on http://{}", config.server_bind_address());
            server.bind(config.server_bind_address())?
        }
    };

    #[cfg(not(unix))]
    let server = {
        warn!("Listening on http://{}", config.server_bind_address());
        server.bind(config.server_bind_address())?
    };

    tokio::select! {
        res = server.run() => res?,
        _ = lifetime::shutdown::listen_for_shutdown() => {
            warn!("Shutdown signal received, stopping server");
        }
    }

    Ok(())
}
