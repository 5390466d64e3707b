use dotenvy::dotenv;
use foodtruck_orders::config::Config;
use foodtruck_orders::domain::order::ValidationOptions;
use foodtruck_orders::infrastructure::diesel_store::DieselStore;
use foodtruck_orders::{build_server, create_pool, run_migrations};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(std::io::Error::other)?;

    let pool = create_pool(&config.database_url, config.pool_max_size)
        .map_err(std::io::Error::other)?;
    run_migrations(&pool)?;

    let options = ValidationOptions {
        require_customer_role: config.require_customer_role,
    };

    log::info!(
        "Starting server at http://{}:{} (customer role required: {})",
        config.host,
        config.port,
        options.require_customer_role
    );

    build_server(DieselStore::new(pool), options, &config.host, config.port)?.await
}
