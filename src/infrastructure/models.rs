use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::{customers, delivery_note_items, delivery_notes, special_pieces};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = customers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CustomerRow {
    pub id: Uuid,
    pub name: String,
    pub tax_id: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub price_per_linear_meter: BigDecimal,
    pub price_per_square_meter: BigDecimal,
    pub minimum_rate: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = customers)]
pub struct NewCustomerRow {
    pub id: Uuid,
    pub name: String,
    pub tax_id: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub price_per_linear_meter: BigDecimal,
    pub price_per_square_meter: BigDecimal,
    pub minimum_rate: BigDecimal,
}

/// `treat_none_as_null` so clearing an optional contact field sticks.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = customers)]
#[diesel(treat_none_as_null = true)]
pub struct CustomerChangeset {
    pub name: String,
    pub tax_id: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub price_per_linear_meter: BigDecimal,
    pub price_per_square_meter: BigDecimal,
    pub minimum_rate: BigDecimal,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = special_pieces)]
#[diesel(belongs_to(CustomerRow, foreign_key = customer_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SpecialPieceRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub sort_order: i32,
    pub name: String,
    pub price: BigDecimal,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = special_pieces)]
pub struct NewSpecialPieceRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub sort_order: i32,
    pub name: String,
    pub price: BigDecimal,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = delivery_notes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DeliveryNoteRow {
    pub id: Uuid,
    pub note_number: i64,
    pub customer_id: Uuid,
    pub observations: Option<String>,
    pub items_total: BigDecimal,
    pub total_amount: BigDecimal,
    pub minimum_rate_applied: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = delivery_notes)]
pub struct NewDeliveryNoteRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub observations: Option<String>,
    pub items_total: BigDecimal,
    pub total_amount: BigDecimal,
    pub minimum_rate_applied: bool,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = delivery_notes)]
#[diesel(treat_none_as_null = true)]
pub struct DeliveryNoteChangeset {
    pub observations: Option<String>,
    pub items_total: BigDecimal,
    pub total_amount: BigDecimal,
    pub minimum_rate_applied: bool,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = delivery_note_items)]
#[diesel(belongs_to(DeliveryNoteRow, foreign_key = delivery_note_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DeliveryNoteItemRow {
    pub id: Uuid,
    pub delivery_note_id: Uuid,
    pub sort_order: i32,
    pub name: String,
    pub description: String,
    pub color: String,
    pub quantity: i32,
    pub linear_meters: Option<BigDecimal>,
    pub square_meters: Option<BigDecimal>,
    pub has_primer: bool,
    pub unit_price: BigDecimal,
    pub total_price: BigDecimal,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = delivery_note_items)]
pub struct NewDeliveryNoteItemRow {
    pub id: Uuid,
    pub delivery_note_id: Uuid,
    pub sort_order: i32,
    pub name: String,
    pub description: String,
    pub color: String,
    pub quantity: i32,
    pub linear_meters: Option<BigDecimal>,
    pub square_meters: Option<BigDecimal>,
    pub has_primer: bool,
    pub unit_price: BigDecimal,
    pub total_price: BigDecimal,
}
