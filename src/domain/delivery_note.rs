use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::pricing::PricedLineItem;

#[derive(Debug, Clone)]
pub struct DeliveryNote {
    pub id: Uuid,
    pub note_number: i64,
    pub customer_id: Uuid,
    pub observations: Option<String>,
    /// In printed order.
    pub items: Vec<PricedLineItem>,
    pub items_total: BigDecimal,
    pub total_amount: BigDecimal,
    pub minimum_rate_applied: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ListResult<T> {
    pub items: Vec<T>,
    pub total: i64,
}

/// Column widths of `delivery_note_items`.
pub const ITEM_NAME_MAX_CHARS: usize = 255;
pub const ITEM_COLOR_MAX_CHARS: usize = 100;

/// Rows to skip for a 1-based `page`. Saturates instead of overflowing.
pub fn page_offset(page: i64, limit: i64) -> i64 {
    page.saturating_sub(1).saturating_mul(limit).max(0)
}
