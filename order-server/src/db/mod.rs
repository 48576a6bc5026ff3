//! Database layer - order document model and repository capability

pub mod models;
pub mod repository;
