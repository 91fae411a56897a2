use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::customer::{Customer, NewCustomer};
use crate::domain::delivery_note::{page_offset, ListResult};
use crate::domain::errors::DomainError;
use crate::domain::ports::CustomerRepository;
use crate::domain::pricing::{RateConfig, SpecialPiece};
use crate::schema::{customers, special_pieces};

use super::models::{
    CustomerChangeset, CustomerRow, NewCustomerRow, NewSpecialPieceRow, SpecialPieceRow,
};

fn to_customer(row: CustomerRow, pieces: Vec<SpecialPieceRow>) -> Customer {
    Customer {
        id: row.id,
        name: row.name,
        tax_id: row.tax_id,
        address: row.address,
        phone: row.phone,
        email: row.email,
        rates: RateConfig {
            price_per_linear_meter: row.price_per_linear_meter,
            price_per_square_meter: row.price_per_square_meter,
            minimum_rate: row.minimum_rate,
            special_pieces: pieces
                .into_iter()
                .map(|p| SpecialPiece {
                    name: p.name,
                    price: p.price,
                })
                .collect(),
        },
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

fn insert_pieces(
    conn: &mut PgConnection,
    customer_id: Uuid,
    pieces: &[SpecialPiece],
) -> QueryResult<()> {
    if pieces.is_empty() {
        return Ok(());
    }
    let rows: Vec<NewSpecialPieceRow> = pieces
        .iter()
        .enumerate()
        .map(|(i, p)| NewSpecialPieceRow {
            id: Uuid::new_v4(),
            customer_id,
            sort_order: i as i32,
            name: p.name.clone(),
            price: p.price.clone(),
        })
        .collect();
    diesel::insert_into(special_pieces::table)
        .values(&rows)
        .execute(conn)?;
    Ok(())
}

fn load_customer(conn: &mut PgConnection, id: Uuid) -> QueryResult<Option<Customer>> {
    let row = customers::table
        .find(id)
        .select(CustomerRow::as_select())
        .first(conn)
        .optional()?;

    let Some(row) = row else {
        return Ok(None);
    };

    let pieces = SpecialPieceRow::belonging_to(&row)
        .select(SpecialPieceRow::as_select())
        .order(special_pieces::sort_order.asc())
        .load(conn)?;

    Ok(Some(to_customer(row, pieces)))
}

pub struct DieselCustomerRepository {
    pool: DbPool,
}

impl DieselCustomerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl CustomerRepository for DieselCustomerRepository {
    fn create(&self, customer: NewCustomer) -> Result<Customer, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let id = Uuid::new_v4();
            diesel::insert_into(customers::table)
                .values(&NewCustomerRow {
                    id,
                    name: customer.name,
                    tax_id: customer.tax_id,
                    address: customer.address,
                    phone: customer.phone,
                    email: customer.email,
                    price_per_linear_meter: customer.rates.price_per_linear_meter,
                    price_per_square_meter: customer.rates.price_per_square_meter,
                    minimum_rate: customer.rates.minimum_rate,
                })
                .execute(conn)?;
            insert_pieces(conn, id, &customer.rates.special_pieces)?;

            load_customer(conn, id)?
                .ok_or_else(|| DomainError::Internal("customer vanished after insert".to_string()))
        })
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, DomainError> {
        let mut conn = self.pool.get()?;
        Ok(load_customer(&mut conn, id)?)
    }

    fn list(&self, page: i64, limit: i64) -> Result<ListResult<Customer>, DomainError> {
        let mut conn = self.pool.get()?;

        let offset = page_offset(page, limit);
        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = customers::table.count().get_result(conn)?;

            let rows = customers::table
                .select(CustomerRow::as_select())
                .order((customers::name.asc(), customers::id.asc()))
                .limit(limit)
                .offset(offset)
                .load(conn)?;

            let pieces = SpecialPieceRow::belonging_to(&rows)
                .select(SpecialPieceRow::as_select())
                .order(special_pieces::sort_order.asc())
                .load(conn)?
                .grouped_by(&rows);

            Ok(ListResult {
                items: rows
                    .into_iter()
                    .zip(pieces)
                    .map(|(row, pieces)| to_customer(row, pieces))
                    .collect(),
                total,
            })
        })
    }

    fn update(&self, id: Uuid, customer: NewCustomer) -> Result<Option<Customer>, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let updated = diesel::update(customers::table.find(id))
                .set((
                    &CustomerChangeset {
                        name: customer.name,
                        tax_id: customer.tax_id,
                        address: customer.address,
                        phone: customer.phone,
                        email: customer.email,
                        price_per_linear_meter: customer.rates.price_per_linear_meter,
                        price_per_square_meter: customer.rates.price_per_square_meter,
                        minimum_rate: customer.rates.minimum_rate,
                    },
                    customers::updated_at.eq(diesel::dsl::now),
                ))
                .execute(conn)?;
            if updated == 0 {
                return Ok(None);
            }

            diesel::delete(special_pieces::table.filter(special_pieces::customer_id.eq(id)))
                .execute(conn)?;
            insert_pieces(conn, id, &customer.rates.special_pieces)?;

            Ok(load_customer(conn, id)?)
        })
    }

    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(customers::table.find(id)).execute(&mut conn)?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;

    use super::DieselCustomerRepository;
    use crate::domain::customer::NewCustomer;
    use crate::domain::ports::CustomerRepository;
    use crate::domain::pricing::{RateConfig, SpecialPiece};
    use crate::infrastructure::test_support::setup_db;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("valid decimal")
    }

    fn new_customer(name: &str) -> NewCustomer {
        NewCustomer {
            name: name.to_string(),
            tax_id: Some("B00000000".to_string()),
            address: None,
            phone: Some("600000000".to_string()),
            email: None,
            rates: RateConfig {
                price_per_linear_meter: dec("10.5"),
                price_per_square_meter: dec("21"),
                minimum_rate: dec("60"),
                special_pieces: vec![
                    SpecialPiece {
                        name: "Llanta".to_string(),
                        price: dec("40"),
                    },
                    SpecialPiece {
                        name: "Corner".to_string(),
                        price: dec("15"),
                    },
                ],
            },
        }
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn create_and_find_keeps_special_piece_order() {
        let (_container, pool) = setup_db().await;
        let repo = DieselCustomerRepository::new(pool);

        let created = repo.create(new_customer("Forja Norte")).expect("create failed");
        let found = repo
            .find_by_id(created.id)
            .expect("find failed")
            .expect("customer should exist");

        assert_eq!(found.name, "Forja Norte");
        assert_eq!(found.rates.price_per_linear_meter, dec("10.5"));
        let names: Vec<&str> = found
            .rates
            .special_pieces
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["Llanta", "Corner"]);
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn update_replaces_special_pieces_and_clears_fields() {
        let (_container, pool) = setup_db().await;
        let repo = DieselCustomerRepository::new(pool);
        let created = repo.create(new_customer("Forja Norte")).expect("create failed");

        let mut changed = new_customer("Forja Norte SL");
        changed.phone = None;
        changed.rates.special_pieces.truncate(1);
        let updated = repo
            .update(created.id, changed)
            .expect("update failed")
            .expect("customer should exist");

        assert_eq!(updated.name, "Forja Norte SL");
        assert!(updated.phone.is_none());
        assert_eq!(updated.rates.special_pieces.len(), 1);
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn list_paginates_and_groups_pieces() {
        let (_container, pool) = setup_db().await;
        let repo = DieselCustomerRepository::new(pool);
        for name in ["C", "A", "B"] {
            repo.create(new_customer(name)).expect("create failed");
        }

        let page = repo.list(1, 2).expect("list failed");
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].name, "A");
        assert_eq!(page.items[1].rates.special_pieces.len(), 2);
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn delete_reports_missing_rows() {
        let (_container, pool) = setup_db().await;
        let repo = DieselCustomerRepository::new(pool);
        let created = repo.create(new_customer("Forja Norte")).expect("create failed");

        assert!(repo.delete(created.id).expect("delete failed"));
        assert!(!repo.delete(created.id).expect("delete failed"));
    }
}
