//! Domain models for PairFlix settings.

pub mod audit;
pub mod setting;

pub use audit::{AuditEvent, AuditLevel, AuditSink, MemoryAuditSink, TracingAuditSink};
pub use setting::{CompiledSettings, NewSetting, Setting, SettingCategory};
