pub use errors::{ServiceError, ServiceResult};

pub mod campaigns;
pub mod categories;
pub mod dispatch;
pub mod errors;
pub mod ingestion;
pub mod products;
