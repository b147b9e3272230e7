//! Repository implementations.

pub mod audit_log;
pub mod setting;

pub use audit_log::AuditLogRepository;
pub use setting::SettingRepository;
