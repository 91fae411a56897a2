pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use application::{
    CustomerService, DeliveryNoteService, SharedCustomerService, SharedDeliveryNoteService,
};
use domain::errors::DomainError;
use domain::ports::{CustomerRepository, DeliveryNoteRepository};
use domain::pricing::MinimumRatePolicy;

pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::customers::create_customer,
        handlers::customers::list_customers,
        handlers::customers::get_customer,
        handlers::customers::update_customer,
        handlers::customers::delete_customer,
        handlers::delivery_notes::create_note,
        handlers::delivery_notes::preview_note,
        handlers::delivery_notes::list_notes,
        handlers::delivery_notes::get_note,
        handlers::delivery_notes::update_note,
        handlers::delivery_notes::delete_note,
    ),
    tags(
        (name = "customers", description = "Customers and their pricing rules"),
        (name = "delivery-notes", description = "Priced delivery notes (albaranes)"),
        (name = "health", description = "Liveness"),
    )
)]
pub struct ApiDoc;

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), DomainError> {
    let mut conn = pool.get()?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| DomainError::Internal(format!("Failed to run migrations: {}", e)))?;
    Ok(())
}

/// Both services, wired over the same pair of repositories.
#[derive(Clone)]
pub struct AppServices {
    pub customers: web::Data<SharedCustomerService>,
    pub delivery_notes: web::Data<SharedDeliveryNoteService>,
}

impl AppServices {
    pub fn new(
        customers: Arc<dyn CustomerRepository>,
        notes: Arc<dyn DeliveryNoteRepository>,
        policy: MinimumRatePolicy,
    ) -> Self {
        Self {
            customers: web::Data::new(CustomerService::new(customers.clone(), notes.clone())),
            delivery_notes: web::Data::new(DeliveryNoteService::new(customers, notes, policy)),
        }
    }

    pub fn postgres(pool: DbPool, policy: MinimumRatePolicy) -> Self {
        Self::new(
            Arc::new(infrastructure::DieselCustomerRepository::new(pool.clone())),
            Arc::new(infrastructure::DieselDeliveryNoteRepository::new(pool)),
            policy,
        )
    }

    pub fn in_memory(policy: MinimumRatePolicy) -> Self {
        Self::new(
            Arc::new(infrastructure::InMemoryCustomerRepository::new()),
            Arc::new(infrastructure::InMemoryDeliveryNoteRepository::new()),
            policy,
        )
    }
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    services: AppServices,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let openapi = ApiDoc::openapi();
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(services.customers.clone())
            .app_data(services.delivery_notes.clone())
            .wrap(Logger::default())
            .configure(handlers::configure)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
