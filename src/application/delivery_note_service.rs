use uuid::Uuid;

use crate::domain::delivery_note::{DeliveryNote, ListResult};
use crate::domain::errors::DomainError;
use crate::domain::ports::{CustomerRepository, DeliveryNoteRepository};
use crate::domain::pricing::{price_requested, MinimumRatePolicy, PricedNote, RequestedItems};

use super::customer_service::normalize_page;

pub struct DeliveryNoteService<C, N> {
    customers: C,
    notes: N,
    policy: MinimumRatePolicy,
}

impl<C: CustomerRepository, N: DeliveryNoteRepository> DeliveryNoteService<C, N> {
    pub fn new(customers: C, notes: N, policy: MinimumRatePolicy) -> Self {
        Self {
            customers,
            notes,
            policy,
        }
    }

    /// Price `items` with the customer's current rates without storing anything.
    pub fn preview_note(
        &self,
        customer_id: Uuid,
        items: &RequestedItems,
    ) -> Result<PricedNote, DomainError> {
        let customer = self
            .customers
            .find_by_id(customer_id)?
            .ok_or(DomainError::NotFound)?;

        price_requested(items, &customer.rates, self.policy).map_err(|e| {
            log::warn!("Rejected pricing for customer {}: {}", customer_id, e);
            DomainError::from(e)
        })
    }

    pub fn create_note(
        &self,
        customer_id: Uuid,
        observations: Option<String>,
        items: &RequestedItems,
    ) -> Result<DeliveryNote, DomainError> {
        let priced = self.preview_note(customer_id, items)?;
        let note = self.notes.create(customer_id, observations, priced)?;
        log::info!(
            "Created delivery note #{} ({}) for customer {}: total {}",
            note.note_number,
            note.id,
            customer_id,
            note.total_amount
        );
        Ok(note)
    }

    pub fn get_note(&self, id: Uuid) -> Result<DeliveryNote, DomainError> {
        self.notes.find_by_id(id)?.ok_or(DomainError::NotFound)
    }

    pub fn list_notes(
        &self,
        page: i64,
        limit: i64,
        customer_id: Option<Uuid>,
    ) -> Result<ListResult<DeliveryNote>, DomainError> {
        let (page, limit) = normalize_page(page, limit);
        self.notes.list(page, limit, customer_id)
    }

    /// Re-prices the note against the customer's current rates and replaces
    /// its items.
    pub fn update_note(
        &self,
        id: Uuid,
        observations: Option<String>,
        items: &RequestedItems,
    ) -> Result<DeliveryNote, DomainError> {
        let existing = self.get_note(id)?;
        let priced = self.preview_note(existing.customer_id, items)?;
        let note = self
            .notes
            .replace(id, observations, priced)?
            .ok_or(DomainError::NotFound)?;
        log::info!(
            "Updated delivery note #{} ({}): total {}",
            note.note_number,
            note.id,
            note.total_amount
        );
        Ok(note)
    }

    pub fn delete_note(&self, id: Uuid) -> Result<(), DomainError> {
        if !self.notes.delete(id)? {
            return Err(DomainError::NotFound);
        }
        log::info!("Deleted delivery note {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;

    use super::*;
    use crate::domain::customer::NewCustomer;
    use crate::domain::pricing::{
        LineItemRequest, Measurement, PricingError, RateConfig, SpecialPiece,
    };
    use crate::infrastructure::memory::{
        InMemoryCustomerRepository, InMemoryDeliveryNoteRepository,
    };

    type Service = DeliveryNoteService<InMemoryCustomerRepository, InMemoryDeliveryNoteRepository>;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("valid decimal")
    }

    fn setup(policy: MinimumRatePolicy) -> (Service, InMemoryCustomerRepository, Uuid) {
        let customers = InMemoryCustomerRepository::new();
        let customer = customers
            .create(NewCustomer {
                name: "Cerrajería Luna".to_string(),
                tax_id: None,
                address: None,
                phone: None,
                email: None,
                rates: RateConfig {
                    price_per_linear_meter: dec("10"),
                    price_per_square_meter: dec("20"),
                    minimum_rate: dec("100"),
                    special_pieces: vec![SpecialPiece {
                        name: "Corner".to_string(),
                        price: dec("15"),
                    }],
                },
            })
            .expect("customer");
        let svc = DeliveryNoteService::new(
            customers.clone(),
            InMemoryDeliveryNoteRepository::new(),
            policy,
        );
        (svc, customers, customer.id)
    }

    fn items() -> RequestedItems {
        RequestedItems::from(vec![
            LineItemRequest {
                name: "Barandilla".to_string(),
                description: "Escalera exterior".to_string(),
                color: "RAL 7016".to_string(),
                quantity: 1,
                measurement: Measurement::LinearMeters(dec("2")),
                has_primer: true,
            },
            LineItemRequest {
                name: "Corner".to_string(),
                description: String::new(),
                color: "RAL 7016".to_string(),
                quantity: 1,
                measurement: Measurement::SpecialPiece,
                has_primer: true,
            },
        ])
    }

    #[test]
    fn create_prices_and_stores_note() {
        let (svc, _, customer_id) = setup(MinimumRatePolicy::Informational);
        let note = svc
            .create_note(customer_id, Some("Entrega lunes".to_string()), &items())
            .expect("create");

        assert_eq!(note.customer_id, customer_id);
        assert_eq!(note.items.len(), 2);
        assert_eq!(note.items[0].unit_price, dec("40"));
        assert_eq!(note.items[1].unit_price, dec("30"));
        assert_eq!(note.total_amount, dec("70"));
        assert!(!note.minimum_rate_applied);

        let stored = svc.get_note(note.id).expect("get");
        assert_eq!(stored.note_number, note.note_number);
        assert_eq!(stored.observations.as_deref(), Some("Entrega lunes"));
    }

    #[test]
    fn clamp_policy_is_applied_on_create() {
        let (svc, _, customer_id) = setup(MinimumRatePolicy::Clamp);
        let note = svc.create_note(customer_id, None, &items()).expect("create");
        assert_eq!(note.items_total, dec("70"));
        assert_eq!(note.total_amount, dec("100"));
        assert!(note.minimum_rate_applied);
    }

    #[test]
    fn unknown_customer_is_not_found() {
        let (svc, _, _) = setup(MinimumRatePolicy::Informational);
        let err = svc.create_note(Uuid::new_v4(), None, &items()).unwrap_err();
        assert!(matches!(err, DomainError::NotFound));
    }

    #[test]
    fn pricing_failure_stores_nothing() {
        let (svc, _, customer_id) = setup(MinimumRatePolicy::Informational);
        let mut bad = items();
        bad.items[1].name = "Radiador".to_string();

        let err = svc.create_note(customer_id, None, &bad).unwrap_err();
        match err {
            DomainError::Pricing(e) => {
                assert_eq!(e.item_index(), Some(1));
                assert!(matches!(
                    e,
                    PricingError::ItemFailed { ref source, .. }
                        if matches!(**source, PricingError::UnknownSpecialPiece { .. })
                ));
            }
            other => panic!("expected pricing error, got {:?}", other),
        }
        assert_eq!(svc.list_notes(1, 20, None).expect("list").total, 0);
    }

    #[test]
    fn rejected_item_is_reported_and_nothing_stored() {
        let (svc, _, customer_id) = setup(MinimumRatePolicy::Informational);
        let mut requested = items();
        requested.items.truncate(1);
        requested.rejected = Some((1, PricingError::AmbiguousMeasurement));

        let err = svc.create_note(customer_id, None, &requested).unwrap_err();
        match err {
            DomainError::Pricing(e) => {
                assert_eq!(e.kind(), "ambiguous_measurement");
                assert_eq!(e.item_index(), Some(1));
            }
            other => panic!("expected pricing error, got {:?}", other),
        }
        assert_eq!(svc.list_notes(1, 20, None).expect("list").total, 0);
    }

    #[test]
    fn update_reprices_with_current_rates() {
        let (svc, customers, customer_id) = setup(MinimumRatePolicy::Informational);
        let note = svc.create_note(customer_id, None, &items()).expect("create");

        let mut customer = customers
            .find_by_id(customer_id)
            .expect("find")
            .expect("exists");
        customer.rates.price_per_linear_meter = dec("12");
        customers
            .update(
                customer_id,
                NewCustomer {
                    name: customer.name,
                    tax_id: customer.tax_id,
                    address: customer.address,
                    phone: customer.phone,
                    email: customer.email,
                    rates: customer.rates,
                },
            )
            .expect("update customer");

        // Stored notes keep the price they were created with.
        assert_eq!(svc.get_note(note.id).expect("get").total_amount, dec("70"));

        let updated = svc
            .update_note(note.id, Some("Revisado".to_string()), &items())
            .expect("update");
        assert_eq!(updated.note_number, note.note_number);
        assert_eq!(updated.items[0].unit_price, dec("48"));
        assert_eq!(updated.total_amount, dec("78"));
        assert_eq!(updated.observations.as_deref(), Some("Revisado"));
    }

    #[test]
    fn update_unknown_note_is_not_found() {
        let (svc, _, _) = setup(MinimumRatePolicy::Informational);
        let err = svc.update_note(Uuid::new_v4(), None, &items()).unwrap_err();
        assert!(matches!(err, DomainError::NotFound));
    }

    #[test]
    fn preview_does_not_store() {
        let (svc, _, customer_id) = setup(MinimumRatePolicy::Informational);
        let priced = svc.preview_note(customer_id, &items()).expect("preview");
        assert_eq!(priced.totals.total_amount, dec("70"));
        assert_eq!(svc.list_notes(1, 20, None).expect("list").total, 0);
    }

    #[test]
    fn list_filters_by_customer_newest_first() {
        let (svc, customers, customer_id) = setup(MinimumRatePolicy::Informational);
        let other = customers
            .create(NewCustomer {
                name: "Otro".to_string(),
                tax_id: None,
                address: None,
                phone: None,
                email: None,
                rates: customers
                    .find_by_id(customer_id)
                    .expect("find")
                    .expect("exists")
                    .rates,
            })
            .expect("customer");

        let first = svc.create_note(customer_id, None, &items()).expect("create");
        svc.create_note(other.id, None, &items()).expect("create");
        let third = svc.create_note(customer_id, None, &items()).expect("create");

        let listed = svc.list_notes(1, 20, Some(customer_id)).expect("list");
        assert_eq!(listed.total, 2);
        assert_eq!(listed.items[0].id, third.id);
        assert_eq!(listed.items[1].id, first.id);
    }

    #[test]
    fn delete_removes_note() {
        let (svc, _, customer_id) = setup(MinimumRatePolicy::Informational);
        let note = svc.create_note(customer_id, None, &items()).expect("create");
        svc.delete_note(note.id).expect("delete");
        assert!(matches!(svc.get_note(note.id), Err(DomainError::NotFound)));
        assert!(matches!(svc.delete_note(note.id), Err(DomainError::NotFound)));
    }
}
