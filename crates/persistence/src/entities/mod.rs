//! Entity definitions (database row mappings).

pub mod audit_log;
pub mod setting;

pub use audit_log::AuditLogEntity;
pub use setting::{SettingEntity, UpsertedSettingEntity};
