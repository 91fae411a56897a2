pub mod customer_repo;
pub mod delivery_note_repo;
pub mod memory;
pub mod models;

#[cfg(test)]
pub(crate) mod test_support;

pub use customer_repo::DieselCustomerRepository;
pub use delivery_note_repo::DieselDeliveryNoteRepository;
pub use memory::{InMemoryCustomerRepository, InMemoryDeliveryNoteRepository, InMemoryStore};

use diesel::result::{DatabaseErrorKind, Error as DieselError};

use crate::domain::errors::DomainError;

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<DieselError> for DomainError {
    fn from(e: DieselError) -> Self {
        match e {
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                DomainError::Conflict(info.message().to_string())
            }
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                DomainError::Conflict(info.message().to_string())
            }
            other => DomainError::Internal(other.to_string()),
        }
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}
