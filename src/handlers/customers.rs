use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::customer_service::normalize_page;
use crate::application::SharedCustomerService;
use crate::domain::customer::{Customer, NewCustomer};
use crate::domain::pricing::{RateConfig, SpecialPiece};
use crate::errors::AppError;

use super::{parse_decimal, ListParams};

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SpecialPieceDto {
    pub name: String,
    /// Decimal price as a string, e.g. "15.00"
    pub price: String,
}

fn zero() -> String {
    "0".to_string()
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CustomerRequest {
    pub name: String,
    #[serde(default)]
    pub tax_id: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default = "zero")]
    pub price_per_linear_meter: String,
    #[serde(default = "zero")]
    pub price_per_square_meter: String,
    #[serde(default = "zero")]
    pub minimum_rate: String,
    #[serde(default)]
    pub special_pieces: Vec<SpecialPieceDto>,
}

impl CustomerRequest {
    fn into_domain(self) -> Result<NewCustomer, AppError> {
        let special_pieces = self
            .special_pieces
            .iter()
            .map(|p| {
                Ok(SpecialPiece {
                    name: p.name.clone(),
                    price: parse_decimal("special piece price", &p.price)?,
                })
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        Ok(NewCustomer {
            rates: RateConfig {
                price_per_linear_meter: parse_decimal(
                    "price_per_linear_meter",
                    &self.price_per_linear_meter,
                )?,
                price_per_square_meter: parse_decimal(
                    "price_per_square_meter",
                    &self.price_per_square_meter,
                )?,
                minimum_rate: parse_decimal("minimum_rate", &self.minimum_rate)?,
                special_pieces,
            },
            name: self.name,
            tax_id: self.tax_id,
            address: self.address,
            phone: self.phone,
            email: self.email,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerResponse {
    pub id: Uuid,
    pub name: String,
    pub tax_id: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub price_per_linear_meter: String,
    pub price_per_square_meter: String,
    pub minimum_rate: String,
    pub special_pieces: Vec<SpecialPieceDto>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Customer> for CustomerResponse {
    fn from(c: Customer) -> Self {
        CustomerResponse {
            id: c.id,
            name: c.name,
            tax_id: c.tax_id,
            address: c.address,
            phone: c.phone,
            email: c.email,
            price_per_linear_meter: c.rates.price_per_linear_meter.to_string(),
            price_per_square_meter: c.rates.price_per_square_meter.to_string(),
            minimum_rate: c.rates.minimum_rate.to_string(),
            special_pieces: c
                .rates
                .special_pieces
                .into_iter()
                .map(|p| SpecialPieceDto {
                    name: p.name,
                    price: p.price.to_string(),
                })
                .collect(),
            created_at: c.created_at.to_rfc3339(),
            updated_at: c.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateCustomerResponse {
    pub id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListCustomersResponse {
    pub items: Vec<CustomerResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /customers
///
/// Creates a customer together with its rates and special pieces.
#[utoipa::path(
    post,
    path = "/customers",
    request_body = CustomerRequest,
    responses(
        (status = 201, description = "Customer created", body = CreateCustomerResponse),
        (status = 400, description = "Invalid customer data"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "customers"
)]
pub async fn create_customer(
    svc: web::Data<SharedCustomerService>,
    body: web::Json<CustomerRequest>,
) -> Result<HttpResponse, AppError> {
    let customer = body.into_inner().into_domain()?;
    let created = web::block(move || svc.create_customer(customer)).await??;
    Ok(HttpResponse::Created().json(json!({ "id": created.id })))
}

/// GET /customers/{id}
#[utoipa::path(
    get,
    path = "/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer UUID")),
    responses(
        (status = 200, description = "Customer found", body = CustomerResponse),
        (status = 404, description = "Customer not found"),
    ),
    tag = "customers"
)]
pub async fn get_customer(
    svc: web::Data<SharedCustomerService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let customer = web::block(move || svc.get_customer(id)).await??;
    Ok(HttpResponse::Ok().json(CustomerResponse::from(customer)))
}

/// GET /customers
///
/// Customers sorted by name, paginated with `page` (1-based) and `limit`.
#[utoipa::path(
    get,
    path = "/customers",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)"),
    ),
    responses(
        (status = 200, description = "Paginated list of customers", body = ListCustomersResponse),
    ),
    tag = "customers"
)]
pub async fn list_customers(
    svc: web::Data<SharedCustomerService>,
    query: web::Query<ListParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let (page, limit) = normalize_page(params.page, params.limit);

    let result = web::block(move || svc.list_customers(page, limit)).await??;

    Ok(HttpResponse::Ok().json(ListCustomersResponse {
        items: result.items.into_iter().map(CustomerResponse::from).collect(),
        total: result.total,
        page,
        limit,
    }))
}

/// PUT /customers/{id}
///
/// Replaces the customer's data, rates and special pieces. Existing
/// delivery notes keep the prices they were created with.
#[utoipa::path(
    put,
    path = "/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer UUID")),
    request_body = CustomerRequest,
    responses(
        (status = 200, description = "Customer updated", body = CustomerResponse),
        (status = 400, description = "Invalid customer data"),
        (status = 404, description = "Customer not found"),
    ),
    tag = "customers"
)]
pub async fn update_customer(
    svc: web::Data<SharedCustomerService>,
    path: web::Path<Uuid>,
    body: web::Json<CustomerRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let customer = body.into_inner().into_domain()?;
    let updated = web::block(move || svc.update_customer(id, customer)).await??;
    Ok(HttpResponse::Ok().json(CustomerResponse::from(updated)))
}

/// DELETE /customers/{id}
#[utoipa::path(
    delete,
    path = "/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer UUID")),
    responses(
        (status = 204, description = "Customer deleted"),
        (status = 404, description = "Customer not found"),
        (status = 409, description = "Customer still has delivery notes"),
    ),
    tag = "customers"
)]
pub async fn delete_customer(
    svc: web::Data<SharedCustomerService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    web::block(move || svc.delete_customer(id)).await??;
    Ok(HttpResponse::NoContent().finish())
}
