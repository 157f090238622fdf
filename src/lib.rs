//! Core library exports for the ofertas pipeline.
//!
//! The `data` feature exposes the persistence layer on its own (domain
//! entities, diesel models and repositories). The default `pipeline` feature
//! adds marketplace scraping, categorization, message composition and the
//! outbound WhatsApp dispatch queue used by the `ofertas` binary.

#[cfg(feature = "data")]
pub mod db;
#[cfg(feature = "data")]
pub mod domain;
#[cfg(feature = "data")]
pub mod error_conversions;
#[cfg(feature = "data")]
pub mod models;
#[cfg(feature = "data")]
pub mod repository;
#[cfg(feature = "data")]
pub mod schema;

#[cfg(feature = "pipeline")]
pub mod categorize;
#[cfg(feature = "pipeline")]
pub mod forms;
#[cfg(feature = "pipeline")]
pub mod messages;
#[cfg(feature = "pipeline")]
pub mod scraping;
#[cfg(feature = "pipeline")]
pub mod services;
#[cfg(feature = "pipeline")]
pub mod whatsapp;
#[cfg(feature = "pipeline")]
pub mod worker;
