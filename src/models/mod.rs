pub mod campaign;
pub mod category;
#[cfg(feature = "pipeline")]
pub mod config;
pub mod message;
pub mod product;
pub mod send_job;
