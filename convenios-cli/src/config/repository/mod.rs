//! Repository layer for database operations

pub mod records;
pub mod schema;
pub mod sessions;
