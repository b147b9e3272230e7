//! Setting repository for database operations.
//!
//! Backs the domain [`SettingStore`] port with the `app_settings` table.

use domain::models::{NewSetting, Setting, SettingCategory};
use domain::services::{SettingStore, SettingsError};
use serde_json::Value as JsonValue;
use sqlx::PgPool;

use crate::entities::{SettingEntity, UpsertedSettingEntity};
use crate::metrics::QueryTimer;

/// Repository for setting-related database operations.
#[derive(Clone)]
pub struct SettingRepository {
    pool: PgPool,
}

impl SettingRepository {
    /// Creates a new SettingRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Get all settings rows.
    pub async fn list(&self) -> Result<Vec<SettingEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_settings");
        let result = sqlx::query_as::<_, SettingEntity>(
            r#"
            SELECT key, value, category, description, created_at, updated_at
            FROM app_settings
            ORDER BY key
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Get a setting row by key.
    pub async fn get(&self, key: &str) -> Result<Option<SettingEntity>, sqlx::Error> {
        let timer = QueryTimer::new("get_setting");
        let result = sqlx::query_as::<_, SettingEntity>(
            r#"
            SELECT key, value, category, description, created_at, updated_at
            FROM app_settings
            WHERE key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Create-or-update a setting row by key.
    ///
    /// A null description keeps any existing description. The `created` column
    /// reports whether the row was inserted rather than updated.
    pub async fn upsert_row(
        &self,
        key: &str,
        value: &JsonValue,
        category: SettingCategory,
        description: Option<&str>,
    ) -> Result<UpsertedSettingEntity, sqlx::Error> {
        let timer = QueryTimer::new("upsert_setting");
        let result = sqlx::query_as::<_, UpsertedSettingEntity>(
            r#"
            INSERT INTO app_settings (key, value, category, description)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (key)
            DO UPDATE SET
                value = $2,
                category = $3,
                description = COALESCE($4, app_settings.description),
                updated_at = NOW()
            RETURNING key, value, category, description, created_at, updated_at,
                      (xmax = 0) AS created
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(category.as_str())
        .bind(description)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Insert a new setting row, failing on a duplicate key.
    pub async fn insert_row(&self, setting: &NewSetting) -> Result<SettingEntity, sqlx::Error> {
        let timer = QueryTimer::new("insert_setting");
        let result = sqlx::query_as::<_, SettingEntity>(
            r#"
            INSERT INTO app_settings (key, value, category, description)
            VALUES ($1, $2, $3, $4)
            RETURNING key, value, category, description, created_at, updated_at
            "#,
        )
        .bind(&setting.key)
        .bind(&setting.value)
        .bind(setting.category.as_str())
        .bind(&setting.description)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Delete a setting row by key. Deleting a missing key is not an error.
    pub async fn remove(&self, key: &str) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("delete_setting");
        let result = sqlx::query("DELETE FROM app_settings WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await;
        timer.record();
        result.map(|_| ())
    }
}

#[async_trait::async_trait]
impl SettingStore for SettingRepository {
    async fn find_all(&self) -> Result<Vec<Setting>, SettingsError> {
        let rows = self.list().await.map_err(SettingsError::store)?;
        Ok(rows.into_iter().map(Setting::from).collect())
    }

    async fn find_by_key(&self, key: &str) -> Result<Option<Setting>, SettingsError> {
        let row = self.get(key).await.map_err(SettingsError::store)?;
        Ok(row.map(Setting::from))
    }

    async fn upsert(
        &self,
        key: &str,
        value: &JsonValue,
        category: SettingCategory,
        description: Option<&str>,
    ) -> Result<(Setting, bool), SettingsError> {
        let row = self
            .upsert_row(key, value, category, description)
            .await
            .map_err(SettingsError::store)?;
        Ok(row.into_record())
    }

    async fn create(&self, setting: NewSetting) -> Result<Setting, SettingsError> {
        let row = self
            .insert_row(&setting)
            .await
            .map_err(SettingsError::store)?;
        Ok(row.into())
    }

    async fn delete(&self, key: &str) -> Result<(), SettingsError> {
        self.remove(key).await.map_err(SettingsError::store)
    }
}
