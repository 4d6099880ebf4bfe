//! Application layer: repository contracts, pagination, request
//! context and the cache-fronted content service.

pub mod content;
pub mod context;
pub mod pagination;
pub mod repos;
