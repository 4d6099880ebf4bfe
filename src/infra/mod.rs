//! Infrastructure adapters: relational store, document store,
//! telemetry.

pub mod db;
pub mod error;
pub mod mongo;
pub mod telemetry;

pub use error::InfraError;
