//! Audit event types and the audit sink port.
//!
//! Every settings mutation and every recovered store failure is reported
//! through an [`AuditSink`]. Sinks are fire-and-forget: a failing sink must
//! swallow its own errors rather than disturb the operation being audited.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Mutex;
use uuid::Uuid;

/// Severity of an audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditLevel {
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for AuditLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditLevel::Info => write!(f, "info"),
            AuditLevel::Warn => write!(f, "warn"),
            AuditLevel::Error => write!(f, "error"),
        }
    }
}

/// A structured audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub level: AuditLevel,
    pub message: String,
    /// Component that emitted the event, e.g. `"settings-service"`.
    pub source: String,
    pub context: JsonValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        level: AuditLevel,
        message: impl Into<String>,
        source: impl Into<String>,
        context: JsonValue,
    ) -> Self {
        Self {
            level,
            message: message.into(),
            source: source.into(),
            context,
            actor_id: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach the acting user, when known.
    pub fn with_actor(mut self, actor_id: Option<Uuid>) -> Self {
        self.actor_id = actor_id;
        self
    }
}

/// Structured audit logging port.
#[async_trait::async_trait]
pub trait AuditSink: Send + Sync {
    /// Record an audit event. Implementations must not propagate failures.
    async fn log(&self, event: AuditEvent);

    async fn info(&self, message: &str, source: &str, context: JsonValue) {
        self.log(AuditEvent::new(AuditLevel::Info, message, source, context))
            .await;
    }

    async fn warn(&self, message: &str, source: &str, context: JsonValue) {
        self.log(AuditEvent::new(AuditLevel::Warn, message, source, context))
            .await;
    }

    async fn error(&self, message: &str, source: &str, context: JsonValue) {
        self.log(AuditEvent::new(AuditLevel::Error, message, source, context))
            .await;
    }
}

/// Audit sink that forwards events to the `tracing` subscriber.
///
/// Suitable for development and for deployments that collect the audit trail
/// from process logs instead of a database table.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

#[async_trait::async_trait]
impl AuditSink for TracingAuditSink {
    async fn log(&self, event: AuditEvent) {
        match event.level {
            AuditLevel::Info => tracing::info!(
                source = %event.source,
                context = %event.context,
                "{}", event.message
            ),
            AuditLevel::Warn => tracing::warn!(
                source = %event.source,
                context = %event.context,
                "{}", event.message
            ),
            AuditLevel::Error => tracing::error!(
                source = %event.source,
                context = %event.context,
                "{}", event.message
            ),
        }
    }
}

/// Recording audit sink for tests.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All events recorded so far, in order.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Number of recorded events at the given level.
    pub fn count_at(&self, level: AuditLevel) -> usize {
        self.events().iter().filter(|e| e.level == level).count()
    }
}

#[async_trait::async_trait]
impl AuditSink for MemoryAuditSink {
    async fn log(&self, event: AuditEvent) {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_audit_level_display() {
        assert_eq!(AuditLevel::Info.to_string(), "info");
        assert_eq!(AuditLevel::Warn.to_string(), "warn");
        assert_eq!(AuditLevel::Error.to_string(), "error");
    }

    #[test]
    fn test_audit_event_serialization() {
        let event = AuditEvent::new(
            AuditLevel::Info,
            "Setting updated",
            "settings-service",
            json!({"key": "general.siteName"}),
        );

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("Setting updated"));
        assert!(json.contains("settings-service"));
        assert!(!json.contains("actorId"));
    }

    #[test]
    fn test_audit_event_with_actor() {
        let actor = Uuid::new_v4();
        let event = AuditEvent::new(AuditLevel::Warn, "Setting deleted", "settings-service", json!({}))
            .with_actor(Some(actor));
        assert_eq!(event.actor_id, Some(actor));
    }

    #[tokio::test]
    async fn test_memory_sink_records_in_order() {
        let sink = MemoryAuditSink::new();
        sink.info("first", "test", json!({})).await;
        sink.error("second", "test", json!({})).await;

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].message, "first");
        assert_eq!(events[1].level, AuditLevel::Error);
        assert_eq!(sink.count_at(AuditLevel::Error), 1);
        assert_eq!(sink.count_at(AuditLevel::Warn), 0);
    }

    #[tokio::test]
    async fn test_tracing_sink_is_fire_and_forget() {
        let sink = TracingAuditSink;
        sink.warn("no subscriber installed", "test", json!({"key": "k"}))
            .await;
    }
}
