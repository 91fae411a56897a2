pub mod customer;
pub mod delivery_note;
pub mod errors;
pub mod ports;
pub mod pricing;
