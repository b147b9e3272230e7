//! Audit log entity.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database entity for audit logs.
#[derive(Debug, Clone, FromRow)]
pub struct AuditLogEntity {
    /// Unique identifier.
    pub id: Uuid,

    /// Severity level (info, warn, error).
    pub level: String,

    /// Human-readable event message.
    pub message: String,

    /// Component that emitted the event.
    pub source: String,

    /// Structured event context.
    pub context: serde_json::Value,

    /// ID of the acting user, when known.
    pub actor_id: Option<Uuid>,

    /// Timestamp when the record was created.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_log_entity_creation() {
        let entity = AuditLogEntity {
            id: Uuid::new_v4(),
            level: "warn".to_string(),
            message: "Setting deleted".to_string(),
            source: "settings-service".to_string(),
            context: serde_json::json!({"key": "media.storageProvider"}),
            actor_id: None,
            created_at: Utc::now(),
        };
        assert_eq!(entity.level, "warn");
        assert!(entity.actor_id.is_none());
    }
}
