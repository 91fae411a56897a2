pub mod customers;
pub mod delivery_notes;

use std::str::FromStr;

use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::AppError;

/// Parses a decimal field sent as a string, e.g. "12.50".
pub(crate) fn parse_decimal(field: &str, value: &str) -> Result<BigDecimal, AppError> {
    BigDecimal::from_str(value.trim())
        .map_err(|e| AppError::BadRequest(format!("Invalid {} '{}': {}", field, value, e)))
}

// ── Pagination ───────────────────────────────────────────────────────────────

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListParams {
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 20, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// GET /health
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse)),
    tag = "health"
)]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Registers every route. Services are expected as `app_data`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .route("/health", web::get().to(health))
    .service(
        web::scope("/customers")
            .route("", web::post().to(customers::create_customer))
            .route("", web::get().to(customers::list_customers))
            .route("/{id}", web::get().to(customers::get_customer))
            .route("/{id}", web::put().to(customers::update_customer))
            .route("/{id}", web::delete().to(customers::delete_customer)),
    )
    .service(
        web::scope("/delivery-notes")
            .route("", web::post().to(delivery_notes::create_note))
            .route("", web::get().to(delivery_notes::list_notes))
            .route("/preview", web::post().to(delivery_notes::preview_note))
            .route("/{id}", web::get().to(delivery_notes::get_note))
            .route("/{id}", web::put().to(delivery_notes::update_note))
            .route("/{id}", web::delete().to(delivery_notes::delete_note)),
    );
}
