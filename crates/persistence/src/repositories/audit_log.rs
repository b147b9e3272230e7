//! Audit log repository for database operations.

use domain::models::{AuditEvent, AuditSink};
use sqlx::PgPool;

use crate::entities::AuditLogEntity;
use crate::metrics::QueryTimer;

/// Repository for audit log database operations.
#[derive(Clone)]
pub struct AuditLogRepository {
    pool: PgPool,
}

impl AuditLogRepository {
    /// Create a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new audit log entry.
    pub async fn insert(&self, event: &AuditEvent) -> Result<AuditLogEntity, sqlx::Error> {
        let timer = QueryTimer::new("insert_audit_log");
        let result = sqlx::query_as::<_, AuditLogEntity>(
            r#"
            INSERT INTO audit_logs (level, message, source, context, actor_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, level, message, source, context, actor_id, created_at
            "#,
        )
        .bind(event.level.to_string())
        .bind(&event.message)
        .bind(&event.source)
        .bind(&event.context)
        .bind(event.actor_id)
        .bind(event.timestamp)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Most recent audit log entries, newest first.
    pub async fn recent(&self, limit: i64) -> Result<Vec<AuditLogEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_audit_logs");
        let result = sqlx::query_as::<_, AuditLogEntity>(
            r#"
            SELECT id, level, message, source, context, actor_id, created_at
            FROM audit_logs
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}

#[async_trait::async_trait]
impl AuditSink for AuditLogRepository {
    /// Persist the event. Insert failures are logged and swallowed so a
    /// broken audit table never disturbs the operation being audited.
    async fn log(&self, event: AuditEvent) {
        if let Err(err) = self.insert(&event).await {
            tracing::warn!(
                source = %event.source,
                message = %event.message,
                error = %err,
                "failed to persist audit log entry"
            );
        }
    }
}
