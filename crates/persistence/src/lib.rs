//! Persistence layer for PairFlix settings.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - Repository implementations backing the domain store and audit ports

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
