use uuid::Uuid;

use super::customer::{Customer, NewCustomer};
use super::delivery_note::{DeliveryNote, ListResult};
use super::errors::DomainError;
use super::pricing::PricedNote;

pub trait CustomerRepository: Send + Sync + 'static {
    fn create(&self, customer: NewCustomer) -> Result<Customer, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, DomainError>;
    fn list(&self, page: i64, limit: i64) -> Result<ListResult<Customer>, DomainError>;
    fn update(&self, id: Uuid, customer: NewCustomer) -> Result<Option<Customer>, DomainError>;
    fn delete(&self, id: Uuid) -> Result<bool, DomainError>;
}

pub trait DeliveryNoteRepository: Send + Sync + 'static {
    fn create(
        &self,
        customer_id: Uuid,
        observations: Option<String>,
        note: PricedNote,
    ) -> Result<DeliveryNote, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<DeliveryNote>, DomainError>;
    fn list(
        &self,
        page: i64,
        limit: i64,
        customer_id: Option<Uuid>,
    ) -> Result<ListResult<DeliveryNote>, DomainError>;
    /// Replaces observations, items and totals; `None` if the note is gone.
    fn replace(
        &self,
        id: Uuid,
        observations: Option<String>,
        note: PricedNote,
    ) -> Result<Option<DeliveryNote>, DomainError>;
    fn delete(&self, id: Uuid) -> Result<bool, DomainError>;
    fn count_for_customer(&self, customer_id: Uuid) -> Result<i64, DomainError>;
}

/// Keyed record storage, independent of what backs it.
pub trait KeyValueStore<K, V>: Send + Sync {
    /// Fails with `DomainError::Conflict` if `key` is already present.
    fn create(&self, key: K, value: V) -> Result<(), DomainError>;
    fn get(&self, key: &K) -> Result<Option<V>, DomainError>;
    /// Returns `false` without inserting when `key` is absent.
    fn update(&self, key: K, value: V) -> Result<bool, DomainError>;
    fn delete(&self, key: &K) -> Result<bool, DomainError>;
    fn exists(&self, key: &K) -> Result<bool, DomainError>;
    fn values(&self) -> Result<Vec<V>, DomainError>;
    fn clear(&self) -> Result<(), DomainError>;
}

impl<T: CustomerRepository + ?Sized> CustomerRepository for std::sync::Arc<T> {
    fn create(&self, customer: NewCustomer) -> Result<Customer, DomainError> {
        (**self).create(customer)
    }
    fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, DomainError> {
        (**self).find_by_id(id)
    }
    fn list(&self, page: i64, limit: i64) -> Result<ListResult<Customer>, DomainError> {
        (**self).list(page, limit)
    }
    fn update(&self, id: Uuid, customer: NewCustomer) -> Result<Option<Customer>, DomainError> {
        (**self).update(id, customer)
    }
    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        (**self).delete(id)
    }
}

impl<T: DeliveryNoteRepository + ?Sized> DeliveryNoteRepository for std::sync::Arc<T> {
    fn create(
        &self,
        customer_id: Uuid,
        observations: Option<String>,
        note: PricedNote,
    ) -> Result<DeliveryNote, DomainError> {
        (**self).create(customer_id, observations, note)
    }
    fn find_by_id(&self, id: Uuid) -> Result<Option<DeliveryNote>, DomainError> {
        (**self).find_by_id(id)
    }
    fn list(
        &self,
        page: i64,
        limit: i64,
        customer_id: Option<Uuid>,
    ) -> Result<ListResult<DeliveryNote>, DomainError> {
        (**self).list(page, limit, customer_id)
    }
    fn replace(
        &self,
        id: Uuid,
        observations: Option<String>,
        note: PricedNote,
    ) -> Result<Option<DeliveryNote>, DomainError> {
        (**self).replace(id, observations, note)
    }
    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        (**self).delete(id)
    }
    fn count_for_customer(&self, customer_id: Uuid) -> Result<i64, DomainError> {
        (**self).count_for_customer(customer_id)
    }
}
