use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::delivery_note::{page_offset, DeliveryNote, ListResult};
use crate::domain::errors::DomainError;
use crate::domain::ports::DeliveryNoteRepository;
use crate::domain::pricing::{Measurement, PricedLineItem, PricedNote};
use crate::schema::{delivery_note_items, delivery_notes};

use super::models::{
    DeliveryNoteChangeset, DeliveryNoteItemRow, DeliveryNoteRow, NewDeliveryNoteItemRow,
    NewDeliveryNoteRow,
};

fn to_item(row: DeliveryNoteItemRow) -> Result<PricedLineItem, DomainError> {
    let measurement = Measurement::from_parts(row.linear_meters, row.square_meters)
        .map_err(|e| DomainError::Internal(format!("stored item {}: {}", row.id, e)))?;
    Ok(PricedLineItem {
        name: row.name,
        description: row.description,
        color: row.color,
        quantity: row.quantity,
        measurement,
        has_primer: row.has_primer,
        unit_price: row.unit_price,
        total_price: row.total_price,
    })
}

fn to_note(
    row: DeliveryNoteRow,
    items: Vec<DeliveryNoteItemRow>,
) -> Result<DeliveryNote, DomainError> {
    Ok(DeliveryNote {
        id: row.id,
        note_number: row.note_number,
        customer_id: row.customer_id,
        observations: row.observations,
        items: items.into_iter().map(to_item).collect::<Result<_, _>>()?,
        items_total: row.items_total,
        total_amount: row.total_amount,
        minimum_rate_applied: row.minimum_rate_applied,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn insert_items(
    conn: &mut PgConnection,
    note_id: Uuid,
    items: &[PricedLineItem],
) -> QueryResult<()> {
    if items.is_empty() {
        return Ok(());
    }
    let rows: Vec<NewDeliveryNoteItemRow> = items
        .iter()
        .enumerate()
        .map(|(i, item)| NewDeliveryNoteItemRow {
            id: Uuid::new_v4(),
            delivery_note_id: note_id,
            sort_order: i as i32,
            name: item.name.clone(),
            description: item.description.clone(),
            color: item.color.clone(),
            quantity: item.quantity,
            linear_meters: item.measurement.linear_meters().cloned(),
            square_meters: item.measurement.square_meters().cloned(),
            has_primer: item.has_primer,
            unit_price: item.unit_price.clone(),
            total_price: item.total_price.clone(),
        })
        .collect();
    diesel::insert_into(delivery_note_items::table)
        .values(&rows)
        .execute(conn)?;
    Ok(())
}

fn load_note(conn: &mut PgConnection, id: Uuid) -> Result<Option<DeliveryNote>, DomainError> {
    let row = delivery_notes::table
        .find(id)
        .select(DeliveryNoteRow::as_select())
        .first(conn)
        .optional()?;

    let Some(row) = row else {
        return Ok(None);
    };

    let items = DeliveryNoteItemRow::belonging_to(&row)
        .select(DeliveryNoteItemRow::as_select())
        .order(delivery_note_items::sort_order.asc())
        .load(conn)?;

    Ok(Some(to_note(row, items)?))
}

pub struct DieselDeliveryNoteRepository {
    pool: DbPool,
}

impl DieselDeliveryNoteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl DeliveryNoteRepository for DieselDeliveryNoteRepository {
    fn create(
        &self,
        customer_id: Uuid,
        observations: Option<String>,
        note: PricedNote,
    ) -> Result<DeliveryNote, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let row = diesel::insert_into(delivery_notes::table)
                .values(&NewDeliveryNoteRow {
                    id: Uuid::new_v4(),
                    customer_id,
                    observations,
                    items_total: note.totals.items_total,
                    total_amount: note.totals.total_amount,
                    minimum_rate_applied: note.totals.minimum_rate_applied,
                })
                .returning(DeliveryNoteRow::as_returning())
                .get_result(conn)?;

            insert_items(conn, row.id, &note.items)?;

            Ok(DeliveryNote {
                id: row.id,
                note_number: row.note_number,
                customer_id: row.customer_id,
                observations: row.observations,
                items: note.items,
                items_total: row.items_total,
                total_amount: row.total_amount,
                minimum_rate_applied: row.minimum_rate_applied,
                created_at: row.created_at,
                updated_at: row.updated_at,
            })
        })
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<DeliveryNote>, DomainError> {
        let mut conn = self.pool.get()?;
        load_note(&mut conn, id)
    }

    fn list(
        &self,
        page: i64,
        limit: i64,
        customer_id: Option<Uuid>,
    ) -> Result<ListResult<DeliveryNote>, DomainError> {
        let mut conn = self.pool.get()?;

        let offset = page_offset(page, limit);
        conn.transaction::<_, DomainError, _>(|conn| {
            let mut count_query = delivery_notes::table.count().into_boxed();
            let mut rows_query = delivery_notes::table
                .select(DeliveryNoteRow::as_select())
                .into_boxed();
            if let Some(customer_id) = customer_id {
                count_query = count_query.filter(delivery_notes::customer_id.eq(customer_id));
                rows_query = rows_query.filter(delivery_notes::customer_id.eq(customer_id));
            }

            let total: i64 = count_query.get_result(conn)?;
            let rows = rows_query
                .order(delivery_notes::note_number.desc())
                .limit(limit)
                .offset(offset)
                .load(conn)?;

            let items = DeliveryNoteItemRow::belonging_to(&rows)
                .select(DeliveryNoteItemRow::as_select())
                .order(delivery_note_items::sort_order.asc())
                .load(conn)?
                .grouped_by(&rows);

            Ok(ListResult {
                items: rows
                    .into_iter()
                    .zip(items)
                    .map(|(row, items)| to_note(row, items))
                    .collect::<Result<_, _>>()?,
                total,
            })
        })
    }

    fn replace(
        &self,
        id: Uuid,
        observations: Option<String>,
        note: PricedNote,
    ) -> Result<Option<DeliveryNote>, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let updated = diesel::update(delivery_notes::table.find(id))
                .set((
                    &DeliveryNoteChangeset {
                        observations,
                        items_total: note.totals.items_total,
                        total_amount: note.totals.total_amount,
                        minimum_rate_applied: note.totals.minimum_rate_applied,
                    },
                    delivery_notes::updated_at.eq(diesel::dsl::now),
                ))
                .execute(conn)?;
            if updated == 0 {
                return Ok(None);
            }

            diesel::delete(
                delivery_note_items::table.filter(delivery_note_items::delivery_note_id.eq(id)),
            )
            .execute(conn)?;
            insert_items(conn, id, &note.items)?;

            load_note(conn, id)
        })
    }

    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(delivery_notes::table.find(id)).execute(&mut conn)?;
        Ok(deleted > 0)
    }

    fn count_for_customer(&self, customer_id: Uuid) -> Result<i64, DomainError> {
        let mut conn = self.pool.get()?;
        Ok(delivery_notes::table
            .filter(delivery_notes::customer_id.eq(customer_id))
            .count()
            .get_result(&mut conn)?)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;
    use uuid::Uuid;

    use super::DieselDeliveryNoteRepository;
    use crate::domain::customer::NewCustomer;
    use crate::domain::errors::DomainError;
    use crate::domain::ports::{CustomerRepository, DeliveryNoteRepository};
    use crate::domain::pricing::{
        price_note, LineItemRequest, Measurement, MinimumRatePolicy, PricedNote, RateConfig,
        SpecialPiece,
    };
    use crate::infrastructure::customer_repo::DieselCustomerRepository;
    use crate::infrastructure::test_support::setup_db;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("valid decimal")
    }

    fn rates() -> RateConfig {
        RateConfig {
            price_per_linear_meter: dec("10"),
            price_per_square_meter: dec("20"),
            minimum_rate: dec("0"),
            special_pieces: vec![SpecialPiece {
                name: "Corner".to_string(),
                price: dec("15"),
            }],
        }
    }

    fn priced(meters: &str) -> PricedNote {
        let items = vec![
            LineItemRequest {
                name: "Barandilla".to_string(),
                description: String::new(),
                color: "RAL 9005".to_string(),
                quantity: 2,
                measurement: Measurement::LinearMeters(dec(meters)),
                has_primer: false,
            },
            LineItemRequest {
                name: "Corner".to_string(),
                description: String::new(),
                color: "RAL 9005".to_string(),
                quantity: 1,
                measurement: Measurement::SpecialPiece,
                has_primer: true,
            },
        ];
        price_note(&items, &rates(), MinimumRatePolicy::Informational).expect("priced")
    }

    fn create_customer(repo: &DieselCustomerRepository) -> Uuid {
        repo.create(NewCustomer {
            name: "Forja Norte".to_string(),
            tax_id: None,
            address: None,
            phone: None,
            email: None,
            rates: rates(),
        })
        .expect("customer")
        .id
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn create_and_find_by_id_roundtrip() {
        let (_container, pool) = setup_db().await;
        let customer_id = create_customer(&DieselCustomerRepository::new(pool.clone()));
        let repo = DieselDeliveryNoteRepository::new(pool);

        let note = repo
            .create(customer_id, Some("Urgente".to_string()), priced("1.5"))
            .expect("create failed");
        let found = repo
            .find_by_id(note.id)
            .expect("find failed")
            .expect("note should exist");

        assert_eq!(found.note_number, note.note_number);
        assert_eq!(found.items.len(), 2);
        assert_eq!(found.items[0].name, "Barandilla");
        assert_eq!(found.items[0].measurement.linear_meters(), Some(&dec("1.5")));
        assert_eq!(found.items[1].measurement, Measurement::SpecialPiece);
        assert_eq!(found.total_amount, dec("60"));
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn note_numbers_increase() {
        let (_container, pool) = setup_db().await;
        let customer_id = create_customer(&DieselCustomerRepository::new(pool.clone()));
        let repo = DieselDeliveryNoteRepository::new(pool);

        let first = repo.create(customer_id, None, priced("1")).expect("create failed");
        let second = repo.create(customer_id, None, priced("1")).expect("create failed");
        assert!(second.note_number > first.note_number);
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn replace_swaps_items_and_totals() {
        let (_container, pool) = setup_db().await;
        let customer_id = create_customer(&DieselCustomerRepository::new(pool.clone()));
        let repo = DieselDeliveryNoteRepository::new(pool);
        let note = repo.create(customer_id, None, priced("1")).expect("create failed");

        let replaced = repo
            .replace(note.id, Some("Revisado".to_string()), priced("3"))
            .expect("replace failed")
            .expect("note should exist");

        assert_eq!(replaced.items.len(), 2);
        assert_eq!(replaced.items[0].total_price, dec("60"));
        assert_eq!(replaced.total_amount, dec("90"));
        assert_eq!(replaced.observations.as_deref(), Some("Revisado"));

        assert!(repo
            .replace(Uuid::new_v4(), None, priced("1"))
            .expect("replace failed")
            .is_none());
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn list_filters_by_customer() {
        let (_container, pool) = setup_db().await;
        let customers = DieselCustomerRepository::new(pool.clone());
        let a = create_customer(&customers);
        let b = create_customer(&customers);
        let repo = DieselDeliveryNoteRepository::new(pool);
        for _ in 0..3 {
            repo.create(a, None, priced("1")).expect("create failed");
        }
        repo.create(b, None, priced("1")).expect("create failed");

        let page = repo.list(1, 2, Some(a)).expect("list failed");
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 2);
        assert!(page.items[0].note_number > page.items[1].note_number);
        assert_eq!(repo.count_for_customer(b).expect("count failed"), 1);
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn customer_with_notes_cannot_be_deleted() {
        let (_container, pool) = setup_db().await;
        let customers = DieselCustomerRepository::new(pool.clone());
        let customer_id = create_customer(&customers);
        let repo = DieselDeliveryNoteRepository::new(pool);
        repo.create(customer_id, None, priced("1")).expect("create failed");

        let err = customers.delete(customer_id).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }
}
