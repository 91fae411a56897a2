use albaranes_service::config::{Config, StorageBackend};
use albaranes_service::{build_server, create_pool, run_migrations, AppServices};
use dotenvy::dotenv;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| {
        log::error!("Invalid configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    let services = match (config.storage, config.database_url.as_deref()) {
        (StorageBackend::Postgres, Some(database_url)) => {
            let pool = create_pool(database_url, config.db_pool_size)
                .map_err(|e| std::io::Error::other(format!("Failed to create pool: {}", e)))?;
            run_migrations(&pool).map_err(|e| std::io::Error::other(e.to_string()))?;
            AppServices::postgres(pool, config.minimum_rate_policy)
        }
        (StorageBackend::Postgres, None) => {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "DATABASE_URL must be set",
            ));
        }
        (StorageBackend::Memory, _) => {
            log::warn!("Using in-memory storage; data is lost on restart");
            AppServices::in_memory(config.minimum_rate_policy)
        }
    };

    log::info!(
        "Starting server at http://{}:{} (minimum rate policy: {:?})",
        config.host,
        config.port,
        config.minimum_rate_policy
    );

    build_server(services, &config.host, config.port)?.await
}
