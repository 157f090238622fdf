pub mod campaign;
pub mod category;
pub mod message;
pub mod product;
pub mod send_job;
pub mod types;
