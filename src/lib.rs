pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;

use actix_web::{error, middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use db::{create_pool, DbPool};

use domain::order::ValidationOptions;
use domain::ports::Backend;
use errors::AppError;
use handlers::{cart, orders, ApiDoc};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> std::io::Result<()> {
    let mut conn = pool.get().map_err(std::io::Error::other)?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(std::io::Error::other)?;
    log::info!("Applied {} pending migration(s)", applied.len());
    Ok(())
}

/// Registers the store, the placement options and every route on an app.
///
/// Malformed JSON bodies and path parameters are answered with a JSON `400`.
pub fn routes<S: Backend>(
    store: S,
    options: ValidationOptions,
) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(store))
            .app_data(web::Data::new(options))
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                error::Error::from(AppError::BadRequest(err.to_string()))
            }))
            .app_data(web::PathConfig::default().error_handler(|err, _req| {
                error::Error::from(AppError::BadRequest(err.to_string()))
            }))
            .service(
                web::scope("/order")
                    .route("/new", web::post().to(orders::place_order::<S>))
                    .route("/myOrders", web::get().to(orders::my_orders::<S>))
                    .route("/details/{orderId}", web::get().to(orders::order_details::<S>))
                    .route("/truckOrders", web::get().to(orders::truck_orders::<S>))
                    .route(
                        "/truckOwner/{orderId}",
                        web::get().to(orders::owner_order_details::<S>),
                    )
                    .route(
                        "/updateStatus/{orderId}",
                        web::put().to(orders::update_status::<S>),
                    ),
            )
            .service(
                web::scope("/cart")
                    .route("/new", web::post().to(cart::add_to_cart::<S>))
                    .route("/view", web::get().to(cart::view_cart::<S>))
                    .route("/edit/{cartId}", web::put().to(cart::edit_cart_item::<S>))
                    .route("/delete/{cartId}", web::delete().to(cart::delete_cart_item::<S>)),
            );
    }
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server<S: Backend>(
    store: S,
    options: ValidationOptions,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let openapi = ApiDoc::openapi();
    Ok(HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .configure(routes(store.clone(), options))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
