//! Domain records, validation and persistence for the apiary ledger.

pub mod crop;
pub mod geo;
pub mod hive;
pub mod input;
pub mod store;
pub mod validate;
