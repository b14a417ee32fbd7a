pub mod error;
pub mod money;
pub mod price_mutator;
pub mod product_service;
pub mod review_ledger;

pub use error::CatalogError;
pub use price_mutator::PriceMutator;
pub use product_service::{ProductService, ProductUpdate};
pub use review_ledger::{ReviewLedger, ReviewSubmission, Reviewer};
