//! Domain layer for the PairFlix settings backend.
//!
//! This crate contains:
//! - Domain models (settings, audit events)
//! - The settings resolution service (cache, merge, environment overrides)
//! - Collaborator ports (`SettingStore`, `AuditSink`, `EnvSource`)

pub mod models;
pub mod services;
