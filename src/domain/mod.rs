//! Domain model: entities, shared enumerations, validation rules.

pub mod entities;
pub mod error;
pub mod types;
pub mod validate;

pub use error::{DomainError, Entity};
