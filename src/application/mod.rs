pub mod customer_service;
pub mod delivery_note_service;

use std::sync::Arc;

use crate::domain::ports::{CustomerRepository, DeliveryNoteRepository};

pub use customer_service::CustomerService;
pub use delivery_note_service::DeliveryNoteService;

/// Services over type-erased repositories, as shared with the HTTP handlers.
pub type SharedCustomerService =
    CustomerService<Arc<dyn CustomerRepository>, Arc<dyn DeliveryNoteRepository>>;
pub type SharedDeliveryNoteService =
    DeliveryNoteService<Arc<dyn CustomerRepository>, Arc<dyn DeliveryNoteRepository>>;
