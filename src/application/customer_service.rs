use uuid::Uuid;

use crate::domain::customer::{Customer, NewCustomer};
use crate::domain::delivery_note::ListResult;
use crate::domain::errors::DomainError;
use crate::domain::ports::{CustomerRepository, DeliveryNoteRepository};

pub const MAX_PAGE_SIZE: i64 = 100;

/// Clamp user-supplied pagination to `page >= 1` and `1 <= limit <= 100`.
pub fn normalize_page(page: i64, limit: i64) -> (i64, i64) {
    (page.max(1), limit.clamp(1, MAX_PAGE_SIZE))
}

pub struct CustomerService<C, N> {
    repo: C,
    notes: N,
}

impl<C: CustomerRepository, N: DeliveryNoteRepository> CustomerService<C, N> {
    pub fn new(repo: C, notes: N) -> Self {
        Self { repo, notes }
    }

    pub fn create_customer(&self, customer: NewCustomer) -> Result<Customer, DomainError> {
        customer.validate()?;
        let created = self.repo.create(customer)?;
        log::info!("Created customer {} ({})", created.id, created.name);
        Ok(created)
    }

    pub fn get_customer(&self, id: Uuid) -> Result<Customer, DomainError> {
        self.repo.find_by_id(id)?.ok_or(DomainError::NotFound)
    }

    pub fn list_customers(
        &self,
        page: i64,
        limit: i64,
    ) -> Result<ListResult<Customer>, DomainError> {
        let (page, limit) = normalize_page(page, limit);
        self.repo.list(page, limit)
    }

    pub fn update_customer(
        &self,
        id: Uuid,
        customer: NewCustomer,
    ) -> Result<Customer, DomainError> {
        customer.validate()?;
        let updated = self.repo.update(id, customer)?.ok_or(DomainError::NotFound)?;
        log::info!("Updated customer {}", id);
        Ok(updated)
    }

    /// Customers with delivery notes cannot be deleted.
    pub fn delete_customer(&self, id: Uuid) -> Result<(), DomainError> {
        let notes = self.notes.count_for_customer(id)?;
        if notes > 0 {
            return Err(DomainError::Conflict(format!(
                "customer {} still has {} delivery notes",
                id, notes
            )));
        }
        if !self.repo.delete(id)? {
            return Err(DomainError::NotFound);
        }
        log::info!("Deleted customer {}", id);
        Ok(())
    }
}
