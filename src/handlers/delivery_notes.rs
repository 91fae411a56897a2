use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::customer_service::normalize_page;
use crate::application::SharedDeliveryNoteService;
use crate::domain::delivery_note::{DeliveryNote, ITEM_COLOR_MAX_CHARS, ITEM_NAME_MAX_CHARS};
use crate::domain::pricing::{
    LineItemRequest, Measurement, PricedLineItem, PricedNote, PricingError, RequestedItems,
};
use crate::errors::AppError;

use super::{default_limit, default_page, parse_decimal};

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct LineItemDto {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub color: String,
    pub quantity: i32,
    /// Decimal string. Mutually exclusive with `square_meters`; omit both to
    /// price the item as a special piece by `name`.
    #[serde(default)]
    pub linear_meters: Option<String>,
    #[serde(default)]
    pub square_meters: Option<String>,
    #[serde(default)]
    pub has_primer: bool,
}

impl LineItemDto {
    /// Parses the item. The inner error is a measurement the pricing engine
    /// reports at the item's position.
    fn into_domain(
        self,
        index: usize,
    ) -> Result<Result<LineItemRequest, PricingError>, AppError> {
        check_length(index, "name", &self.name, ITEM_NAME_MAX_CHARS)?;
        check_length(index, "color", &self.color, ITEM_COLOR_MAX_CHARS)?;
        let linear = self
            .linear_meters
            .as_deref()
            .map(|v| parse_decimal("linear_meters", v))
            .transpose()?;
        let square = self
            .square_meters
            .as_deref()
            .map(|v| parse_decimal("square_meters", v))
            .transpose()?;

        Ok(
            Measurement::from_parts(linear, square).map(|measurement| LineItemRequest {
                name: self.name,
                description: self.description,
                color: self.color,
                quantity: self.quantity,
                measurement,
                has_primer: self.has_primer,
            }),
        )
    }
}

fn check_length(index: usize, field: &str, value: &str, max: usize) -> Result<(), AppError> {
    if value.chars().count() > max {
        return Err(AppError::BadRequest(format!(
            "Item {}: {} must be at most {} characters",
            index, field, max
        )));
    }
    Ok(())
}

/// Converts items in order, stopping at the first one whose measurement
/// cannot be resolved.
fn items_into_domain(items: Vec<LineItemDto>) -> Result<RequestedItems, AppError> {
    let mut requested = RequestedItems::default();
    for (index, item) in items.into_iter().enumerate() {
        match item.into_domain(index)? {
            Ok(item) => requested.items.push(item),
            Err(cause) => {
                requested.rejected = Some((index, cause));
                break;
            }
        }
    }
    Ok(requested)
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDeliveryNoteRequest {
    pub customer_id: Uuid,
    #[serde(default)]
    pub observations: Option<String>,
    pub items: Vec<LineItemDto>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateDeliveryNoteRequest {
    #[serde(default)]
    pub observations: Option<String>,
    pub items: Vec<LineItemDto>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PreviewDeliveryNoteRequest {
    pub customer_id: Uuid,
    pub items: Vec<LineItemDto>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PricedLineItemResponse {
    pub name: String,
    pub description: String,
    pub color: String,
    pub quantity: i32,
    pub linear_meters: Option<String>,
    pub square_meters: Option<String>,
    pub has_primer: bool,
    pub unit_price: String,
    pub total_price: String,
}

impl From<PricedLineItem> for PricedLineItemResponse {
    fn from(item: PricedLineItem) -> Self {
        PricedLineItemResponse {
            linear_meters: item.measurement.linear_meters().map(|m| m.to_string()),
            square_meters: item.measurement.square_meters().map(|m| m.to_string()),
            name: item.name,
            description: item.description,
            color: item.color,
            quantity: item.quantity,
            has_primer: item.has_primer,
            unit_price: item.unit_price.to_string(),
            total_price: item.total_price.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeliveryNoteResponse {
    pub id: Uuid,
    pub note_number: i64,
    pub customer_id: Uuid,
    pub observations: Option<String>,
    pub items: Vec<PricedLineItemResponse>,
    pub items_total: String,
    pub total_amount: String,
    pub minimum_rate_applied: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<DeliveryNote> for DeliveryNoteResponse {
    fn from(note: DeliveryNote) -> Self {
        DeliveryNoteResponse {
            id: note.id,
            note_number: note.note_number,
            customer_id: note.customer_id,
            observations: note.observations,
            items: note
                .items
                .into_iter()
                .map(PricedLineItemResponse::from)
                .collect(),
            items_total: note.items_total.to_string(),
            total_amount: note.total_amount.to_string(),
            minimum_rate_applied: note.minimum_rate_applied,
            created_at: note.created_at.to_rfc3339(),
            updated_at: note.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PreviewDeliveryNoteResponse {
    pub items: Vec<PricedLineItemResponse>,
    pub items_total: String,
    pub total_amount: String,
    pub minimum_rate: String,
    pub minimum_rate_applied: bool,
}

impl From<PricedNote> for PreviewDeliveryNoteResponse {
    fn from(note: PricedNote) -> Self {
        PreviewDeliveryNoteResponse {
            items: note
                .items
                .into_iter()
                .map(PricedLineItemResponse::from)
                .collect(),
            items_total: note.totals.items_total.to_string(),
            total_amount: note.totals.total_amount.to_string(),
            minimum_rate: note.totals.minimum_rate.to_string(),
            minimum_rate_applied: note.totals.minimum_rate_applied,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListDeliveryNotesParams {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Only notes for this customer.
    #[serde(default)]
    pub customer_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListDeliveryNotesResponse {
    pub items: Vec<DeliveryNoteResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /delivery-notes
///
/// Prices every item with the customer's rates and stores the note and its
/// items in a single transaction. Nothing is stored if any item fails.
#[utoipa::path(
    post,
    path = "/delivery-notes",
    request_body = CreateDeliveryNoteRequest,
    responses(
        (status = 201, description = "Delivery note created", body = DeliveryNoteResponse),
        (status = 400, description = "Malformed request"),
        (status = 404, description = "Customer not found"),
        (status = 422, description = "An item could not be priced"),
    ),
    tag = "delivery-notes"
)]
pub async fn create_note(
    svc: web::Data<SharedDeliveryNoteService>,
    body: web::Json<CreateDeliveryNoteRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let items = items_into_domain(body.items)?;
    let customer_id = body.customer_id;
    let observations = body.observations;

    let note =
        web::block(move || svc.create_note(customer_id, observations, &items)).await??;

    Ok(HttpResponse::Created().json(DeliveryNoteResponse::from(note)))
}

/// POST /delivery-notes/preview
///
/// Prices the items without storing anything.
#[utoipa::path(
    post,
    path = "/delivery-notes/preview",
    request_body = PreviewDeliveryNoteRequest,
    responses(
        (status = 200, description = "Priced items and totals", body = PreviewDeliveryNoteResponse),
        (status = 404, description = "Customer not found"),
        (status = 422, description = "An item could not be priced"),
    ),
    tag = "delivery-notes"
)]
pub async fn preview_note(
    svc: web::Data<SharedDeliveryNoteService>,
    body: web::Json<PreviewDeliveryNoteRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let items = items_into_domain(body.items)?;
    let customer_id = body.customer_id;

    let priced = web::block(move || svc.preview_note(customer_id, &items)).await??;

    Ok(HttpResponse::Ok().json(PreviewDeliveryNoteResponse::from(priced)))
}

/// GET /delivery-notes/{id}
#[utoipa::path(
    get,
    path = "/delivery-notes/{id}",
    params(("id" = Uuid, Path, description = "Delivery note UUID")),
    responses(
        (status = 200, description = "Delivery note found", body = DeliveryNoteResponse),
        (status = 404, description = "Delivery note not found"),
    ),
    tag = "delivery-notes"
)]
pub async fn get_note(
    svc: web::Data<SharedDeliveryNoteService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let note = web::block(move || svc.get_note(id)).await??;
    Ok(HttpResponse::Ok().json(DeliveryNoteResponse::from(note)))
}

/// GET /delivery-notes
///
/// Newest first. Use `page` (1-based) and `limit` to paginate, and
/// `customer_id` to restrict to one customer.
#[utoipa::path(
    get,
    path = "/delivery-notes",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)"),
        ("customer_id" = Option<Uuid>, Query, description = "Filter by customer"),
    ),
    responses(
        (status = 200, description = "Paginated list of delivery notes", body = ListDeliveryNotesResponse),
    ),
    tag = "delivery-notes"
)]
pub async fn list_notes(
    svc: web::Data<SharedDeliveryNoteService>,
    query: web::Query<ListDeliveryNotesParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let (page, limit) = normalize_page(params.page, params.limit);
    let customer_id = params.customer_id;

    let result = web::block(move || svc.list_notes(page, limit, customer_id)).await??;

    Ok(HttpResponse::Ok().json(ListDeliveryNotesResponse {
        items: result
            .items
            .into_iter()
            .map(DeliveryNoteResponse::from)
            .collect(),
        total: result.total,
        page,
        limit,
    }))
}

/// PUT /delivery-notes/{id}
///
/// Replaces observations and items, re-pricing with the customer's current
/// rates. The note keeps its number.
#[utoipa::path(
    put,
    path = "/delivery-notes/{id}",
    params(("id" = Uuid, Path, description = "Delivery note UUID")),
    request_body = UpdateDeliveryNoteRequest,
    responses(
        (status = 200, description = "Delivery note re-priced", body = DeliveryNoteResponse),
        (status = 404, description = "Delivery note not found"),
        (status = 422, description = "An item could not be priced"),
    ),
    tag = "delivery-notes"
)]
pub async fn update_note(
    svc: web::Data<SharedDeliveryNoteService>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateDeliveryNoteRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let body = body.into_inner();
    let items = items_into_domain(body.items)?;
    let observations = body.observations;

    let note = web::block(move || svc.update_note(id, observations, &items)).await??;

    Ok(HttpResponse::Ok().json(DeliveryNoteResponse::from(note)))
}

/// DELETE /delivery-notes/{id}
#[utoipa::path(
    delete,
    path = "/delivery-notes/{id}",
    params(("id" = Uuid, Path, description = "Delivery note UUID")),
    responses(
        (status = 204, description = "Delivery note deleted"),
        (status = 404, description = "Delivery note not found"),
    ),
    tag = "delivery-notes"
)]
pub async fn delete_note(
    svc: web::Data<SharedDeliveryNoteService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    web::block(move || svc.delete_note(id)).await??;
    Ok(HttpResponse::NoContent().finish())
}
