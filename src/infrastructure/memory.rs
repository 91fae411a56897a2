//! In-memory storage: a [`KeyValueStore`] over a shared `HashMap`, and the
//! repositories built on it. Used by tests and by `STORAGE=memory` runs.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use uuid::Uuid;

use crate::domain::customer::{Customer, NewCustomer};
use crate::domain::delivery_note::{page_offset, DeliveryNote, ListResult};
use crate::domain::errors::DomainError;
use crate::domain::ports::{CustomerRepository, DeliveryNoteRepository, KeyValueStore};
use crate::domain::pricing::PricedNote;

// ── Key-value store ──────────────────────────────────────────────────────────

pub struct InMemoryStore<K, V> {
    entries: Arc<RwLock<HashMap<K, V>>>,
}

impl<K, V> InMemoryStore<K, V> {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<K, V>>, DomainError> {
        self.entries
            .read()
            .map_err(|_| DomainError::Internal("in-memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<K, V>>, DomainError> {
        self.entries
            .write()
            .map_err(|_| DomainError::Internal("in-memory store lock poisoned".to_string()))
    }
}

impl<K, V> Default for InMemoryStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

// Clones share the same map.
impl<K, V> Clone for InMemoryStore<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<K, V> KeyValueStore<K, V> for InMemoryStore<K, V>
where
    K: Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    fn create(&self, key: K, value: V) -> Result<(), DomainError> {
        let mut entries = self.write()?;
        if entries.contains_key(&key) {
            return Err(DomainError::Conflict("key already exists".to_string()));
        }
        entries.insert(key, value);
        Ok(())
    }

    fn get(&self, key: &K) -> Result<Option<V>, DomainError> {
        Ok(self.read()?.get(key).cloned())
    }

    fn update(&self, key: K, value: V) -> Result<bool, DomainError> {
        let mut entries = self.write()?;
        match entries.get_mut(&key) {
            Some(slot) => {
                *slot = value;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete(&self, key: &K) -> Result<bool, DomainError> {
        Ok(self.write()?.remove(key).is_some())
    }

    fn exists(&self, key: &K) -> Result<bool, DomainError> {
        Ok(self.read()?.contains_key(key))
    }

    fn values(&self) -> Result<Vec<V>, DomainError> {
        Ok(self.read()?.values().cloned().collect())
    }

    fn clear(&self) -> Result<(), DomainError> {
        self.write()?.clear();
        Ok(())
    }
}

fn paginate<T>(items: Vec<T>, page: i64, limit: i64) -> ListResult<T> {
    let total = items.len() as i64;
    let offset = usize::try_from(page_offset(page, limit)).unwrap_or(usize::MAX);
    ListResult {
        items: items
            .into_iter()
            .skip(offset)
            .take(limit.max(0) as usize)
            .collect(),
        total,
    }
}

// ── Customers ────────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct InMemoryCustomerRepository {
    store: InMemoryStore<Uuid, Customer>,
}

impl InMemoryCustomerRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CustomerRepository for InMemoryCustomerRepository {
    fn create(&self, customer: NewCustomer) -> Result<Customer, DomainError> {
        let now = Utc::now();
        let record = Customer {
            id: Uuid::new_v4(),
            name: customer.name,
            tax_id: customer.tax_id,
            address: customer.address,
            phone: customer.phone,
            email: customer.email,
            rates: customer.rates,
            created_at: now,
            updated_at: now,
        };
        self.store.create(record.id, record.clone())?;
        Ok(record)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, DomainError> {
        self.store.get(&id)
    }

    fn list(&self, page: i64, limit: i64) -> Result<ListResult<Customer>, DomainError> {
        let mut all = self.store.values()?;
        all.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(paginate(all, page, limit))
    }

    fn update(&self, id: Uuid, customer: NewCustomer) -> Result<Option<Customer>, DomainError> {
        let Some(existing) = self.store.get(&id)? else {
            return Ok(None);
        };
        let record = Customer {
            name: customer.name,
            tax_id: customer.tax_id,
            address: customer.address,
            phone: customer.phone,
            email: customer.email,
            rates: customer.rates,
            updated_at: Utc::now(),
            ..existing
        };
        if self.store.update(id, record.clone())? {
            Ok(Some(record))
        } else {
            Ok(None)
        }
    }

    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        self.store.delete(&id)
    }
}

// ── Delivery notes ───────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct InMemoryDeliveryNoteRepository {
    store: InMemoryStore<Uuid, DeliveryNote>,
    next_number: Arc<AtomicI64>,
}

impl InMemoryDeliveryNoteRepository {
    pub fn new() -> Self {
        Self {
            store: InMemoryStore::new(),
            next_number: Arc::new(AtomicI64::new(1)),
        }
    }
}

impl Default for InMemoryDeliveryNoteRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl DeliveryNoteRepository for InMemoryDeliveryNoteRepository {
    fn create(
        &self,
        customer_id: Uuid,
        observations: Option<String>,
        note: PricedNote,
    ) -> Result<DeliveryNote, DomainError> {
        let now = Utc::now();
        let record = DeliveryNote {
            id: Uuid::new_v4(),
            note_number: self.next_number.fetch_add(1, Ordering::SeqCst),
            customer_id,
            observations,
            items: note.items,
            items_total: note.totals.items_total,
            total_amount: note.totals.total_amount,
            minimum_rate_applied: note.totals.minimum_rate_applied,
            created_at: now,
            updated_at: now,
        };
        self.store.create(record.id, record.clone())?;
        Ok(record)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<DeliveryNote>, DomainError> {
        self.store.get(&id)
    }

    fn list(
        &self,
        page: i64,
        limit: i64,
        customer_id: Option<Uuid>,
    ) -> Result<ListResult<DeliveryNote>, DomainError> {
        let mut notes: Vec<DeliveryNote> = self
            .store
            .values()?
            .into_iter()
            .filter(|n| customer_id.map_or(true, |c| n.customer_id == c))
            .collect();
        notes.sort_by(|a, b| b.note_number.cmp(&a.note_number));
        Ok(paginate(notes, page, limit))
    }

    fn replace(
        &self,
        id: Uuid,
        observations: Option<String>,
        note: PricedNote,
    ) -> Result<Option<DeliveryNote>, DomainError> {
        let Some(existing) = self.store.get(&id)? else {
            return Ok(None);
        };
        let record = DeliveryNote {
            observations,
            items: note.items,
            items_total: note.totals.items_total,
            total_amount: note.totals.total_amount,
            minimum_rate_applied: note.totals.minimum_rate_applied,
            updated_at: Utc::now(),
            ..existing
        };
        if self.store.update(id, record.clone())? {
            Ok(Some(record))
        } else {
            Ok(None)
        }
    }

    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        self.store.delete(&id)
    }

    fn count_for_customer(&self, customer_id: Uuid) -> Result<i64, DomainError> {
        Ok(self
            .store
            .values()?
            .iter()
            .filter(|n| n.customer_id == customer_id)
            .count() as i64)
    }
}
