//! Application settings resolution and caching.
//!
//! [`SettingsService`] fronts the persistent settings store with a
//! process-wide cache (one hour TTL), compiles flat dot-keyed records into a
//! nested configuration object, and overlays environment-sourced values for a
//! fixed set of operational and sensitive keys.
//!
//! Failure policy: read paths fall back to cached or built-in values and never
//! raise; write paths log an audit error and re-raise.

use serde_json::{json, Value as JsonValue};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::compile::{compile_settings, env_override};
use super::defaults::default_settings;
use crate::models::{
    AuditEvent, AuditLevel, AuditSink, CompiledSettings, NewSetting, Setting, SettingCategory,
};

/// Validity window of a full cache load.
pub const CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Keys whose values are never persisted in plaintext. They are stored as an
/// empty string and must be supplied through the environment.
pub const SENSITIVE_SETTINGS: &[&str] = &["email.smtpPassword"];

/// Placeholder written to audit logs instead of sensitive values.
pub const SENSITIVE_PLACEHOLDER: &str = "[SENSITIVE]";

/// Source tag on audit entries emitted by this service.
const AUDIT_SOURCE: &str = "settings-service";

/// Whether a key's value must be redacted at rest and in audit logs.
pub fn is_sensitive(key: &str) -> bool {
    SENSITIVE_SETTINGS.contains(&key)
}

/// Errors surfaced by settings write operations.
///
/// Read operations never fail; see the module docs.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The persistent store failed or rejected an operation.
    #[error("settings store error: {0}")]
    Store(String),

    /// One or more entries of a bulk update failed to persist.
    #[error("bulk settings update failed for keys: {}", keys.join(", "))]
    BulkUpdate { keys: Vec<String> },
}

impl SettingsError {
    pub fn store(err: impl std::fmt::Display) -> Self {
        SettingsError::Store(err.to_string())
    }
}

/// Persistent key-value store port for settings records.
#[async_trait::async_trait]
pub trait SettingStore: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Setting>, SettingsError>;

    async fn find_by_key(&self, key: &str) -> Result<Option<Setting>, SettingsError>;

    /// Create-or-update by key. Returns the stored record and whether it was
    /// created. A `None` description leaves any existing description in place.
    async fn upsert(
        &self,
        key: &str,
        value: &JsonValue,
        category: SettingCategory,
        description: Option<&str>,
    ) -> Result<(Setting, bool), SettingsError>;

    async fn create(&self, setting: NewSetting) -> Result<Setting, SettingsError>;

    async fn delete(&self, key: &str) -> Result<(), SettingsError>;
}

/// Read-only environment lookup capability.
///
/// Injected rather than read ambiently so tests can substitute fixed maps.
pub trait EnvSource: Send + Sync {
    fn var(&self, name: &str) -> Option<String>;
}

/// [`EnvSource`] backed by the real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

#[derive(Debug, Clone)]
struct CachedSetting {
    value: JsonValue,
    category: SettingCategory,
    description: Option<String>,
}

impl From<Setting> for CachedSetting {
    fn from(record: Setting) -> Self {
        CachedSetting {
            value: record.value,
            category: record.category,
            description: record.description,
        }
    }
}

/// Process-local mirror of the settings store.
///
/// Staleness up to the TTL and brief races between concurrent refreshes are
/// tolerated: the store stays authoritative and no caller depends on the
/// cache being linearizable.
#[derive(Debug, Default)]
struct SettingsCache {
    entries: HashMap<String, CachedSetting>,
    /// Stamped only on a successful full load from the store.
    last_fetch: Option<Instant>,
}

impl SettingsCache {
    fn is_fresh(&self, ttl: Duration) -> bool {
        !self.entries.is_empty() && self.last_fetch.is_some_and(|at| at.elapsed() < ttl)
    }

    fn replace(&mut self, records: Vec<Setting>) {
        self.entries = records
            .into_iter()
            .map(|record| (record.key.clone(), CachedSetting::from(record)))
            .collect();
        self.last_fetch = Some(Instant::now());
    }

    /// Seed from the built-in defaults without persisting anything.
    ///
    /// `last_fetch` is left unset so the next read retries the store.
    fn seed_defaults(&mut self) {
        self.entries = default_settings()
            .into_iter()
            .map(|default| {
                (
                    default.key.clone(),
                    CachedSetting {
                        value: default.value,
                        category: default.category,
                        description: default.description,
                    },
                )
            })
            .collect();
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.last_fetch = None;
    }

    fn flat(&self) -> impl Iterator<Item = (&str, &JsonValue)> {
        self.entries
            .iter()
            .map(|(key, entry)| (key.as_str(), &entry.value))
    }
}

/// Settings resolver: cached read/write access to named configuration values.
///
/// Owns its cache; construct once per process and share behind an `Arc`.
pub struct SettingsService {
    store: Arc<dyn SettingStore>,
    audit: Arc<dyn AuditSink>,
    env: Arc<dyn EnvSource>,
    cache: RwLock<SettingsCache>,
    ttl: Duration,
}

impl SettingsService {
    pub fn new(
        store: Arc<dyn SettingStore>,
        audit: Arc<dyn AuditSink>,
        env: Arc<dyn EnvSource>,
    ) -> Self {
        Self {
            store,
            audit,
            env,
            cache: RwLock::new(SettingsCache::default()),
            ttl: CACHE_TTL,
        }
    }

    /// Override the cache TTL. Intended for tests.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// The compiled, environment-overridden view of all settings.
    ///
    /// Serves from the cache while it is fresh unless `force_refresh` is set.
    /// An empty store is seeded with the built-in defaults first. Store
    /// failures are audited and recovered locally; this method never fails.
    pub async fn get_settings(&self, force_refresh: bool) -> CompiledSettings {
        {
            let cache = self.cache.read().await;
            if !force_refresh && cache.is_fresh(self.ttl) {
                return compile_settings(cache.flat(), self.env.as_ref());
            }
        }

        match self.load_all().await {
            Ok(records) => {
                let mut cache = self.cache.write().await;
                cache.replace(records);
                compile_settings(cache.flat(), self.env.as_ref())
            }
            Err(err) => {
                self.audit
                    .error(
                        "Failed to load settings from store",
                        AUDIT_SOURCE,
                        json!({
                            "operation": "get_settings",
                            "error": err.to_string(),
                        }),
                    )
                    .await;
                let mut cache = self.cache.write().await;
                if cache.entries.is_empty() {
                    cache.seed_defaults();
                }
                compile_settings(cache.flat(), self.env.as_ref())
            }
        }
    }

    /// Full load, initializing the default set when the store is empty.
    async fn load_all(&self) -> Result<Vec<Setting>, SettingsError> {
        let records = self.store.find_all().await?;
        if !records.is_empty() {
            return Ok(records);
        }
        self.initialize_default_settings(None).await?;
        self.store.find_all().await
    }

    /// A single setting value, environment-overridden.
    ///
    /// Cache-first with a read-through point lookup. Missing keys yield
    /// `default` (or `Null`); lookup failures are audited, never raised.
    pub async fn get_setting(&self, key: &str, default: Option<JsonValue>) -> JsonValue {
        if self.cache.read().await.entries.is_empty() {
            self.get_settings(false).await;
        }

        let cached = self
            .cache
            .read()
            .await
            .entries
            .get(key)
            .map(|entry| entry.value.clone());
        if let Some(value) = cached {
            return env_override(key, self.env.as_ref()).unwrap_or(value);
        }

        match self.store.find_by_key(key).await {
            Ok(Some(record)) => {
                let value = record.value.clone();
                self.cache
                    .write()
                    .await
                    .entries
                    .insert(record.key.clone(), CachedSetting::from(record));
                env_override(key, self.env.as_ref()).unwrap_or(value)
            }
            Ok(None) => default.unwrap_or(JsonValue::Null),
            Err(err) => {
                self.audit
                    .error(
                        "Failed to look up setting",
                        AUDIT_SOURCE,
                        json!({
                            "key": key,
                            "operation": "get_setting",
                            "error": err.to_string(),
                        }),
                    )
                    .await;
                default.unwrap_or(JsonValue::Null)
            }
        }
    }

    /// Create or update a setting.
    ///
    /// Sensitive keys persist an empty string while the cache keeps the
    /// original value, so in-process reads keep working without the plaintext
    /// ever reaching the store. Store failures are audited and re-raised.
    pub async fn update_setting(
        &self,
        key: &str,
        value: JsonValue,
        category: Option<SettingCategory>,
        description: Option<&str>,
        updated_by: Option<Uuid>,
    ) -> Result<(), SettingsError> {
        let previous = self.get_setting(key, None).await;
        let sensitive = is_sensitive(key);
        let stored = if sensitive {
            JsonValue::String(String::new())
        } else {
            value.clone()
        };
        let category = category.unwrap_or_else(|| SettingCategory::from_key(key));

        match self.store.upsert(key, &stored, category, description).await {
            Ok((record, created)) => {
                {
                    let mut cache = self.cache.write().await;
                    cache.entries.insert(
                        key.to_string(),
                        CachedSetting {
                            value: value.clone(),
                            category,
                            description: description.map(str::to_string).or(record.description),
                        },
                    );
                }

                let (old, new) = if sensitive {
                    (json!(SENSITIVE_PLACEHOLDER), json!(SENSITIVE_PLACEHOLDER))
                } else {
                    (previous, value)
                };
                let message = if created {
                    "Setting created"
                } else {
                    "Setting updated"
                };
                self.audit
                    .log(
                        AuditEvent::new(
                            AuditLevel::Info,
                            message,
                            AUDIT_SOURCE,
                            json!({
                                "key": key,
                                "category": category,
                                "old": old,
                                "new": new,
                            }),
                        )
                        .with_actor(updated_by),
                    )
                    .await;
                Ok(())
            }
            Err(err) => {
                self.audit
                    .error(
                        "Failed to persist setting",
                        AUDIT_SOURCE,
                        json!({
                            "key": key,
                            "operation": "update_setting",
                            "error": err.to_string(),
                        }),
                    )
                    .await;
                Err(err)
            }
        }
    }

    /// Apply several updates, attempting every entry.
    ///
    /// Failed keys are collected into a single [`SettingsError::BulkUpdate`];
    /// successful entries are not rolled back.
    pub async fn update_settings(
        &self,
        settings: HashMap<String, JsonValue>,
        updated_by: Option<Uuid>,
    ) -> Result<(), SettingsError> {
        let mut failed = Vec::new();
        for (key, value) in settings {
            if let Err(err) = self.update_setting(&key, value, None, None, updated_by).await {
                tracing::warn!(key = %key, error = %err, "bulk settings update entry failed");
                failed.push(key);
            }
        }
        if failed.is_empty() {
            Ok(())
        } else {
            failed.sort();
            Err(SettingsError::BulkUpdate { keys: failed })
        }
    }

    /// Delete a setting. Deleting a key that does not exist is a no-op.
    pub async fn delete_setting(
        &self,
        key: &str,
        deleted_by: Option<Uuid>,
    ) -> Result<(), SettingsError> {
        let existing = match self.store.find_by_key(key).await {
            Ok(existing) => existing,
            Err(err) => {
                self.audit
                    .error(
                        "Failed to look up setting for deletion",
                        AUDIT_SOURCE,
                        json!({
                            "key": key,
                            "operation": "delete_setting",
                            "error": err.to_string(),
                        }),
                    )
                    .await;
                return Err(err);
            }
        };
        let Some(record) = existing else {
            return Ok(());
        };

        match self.store.delete(key).await {
            Ok(()) => {
                self.cache.write().await.entries.remove(key);
                let old = if is_sensitive(key) {
                    json!(SENSITIVE_PLACEHOLDER)
                } else {
                    record.value
                };
                self.audit
                    .log(
                        AuditEvent::new(
                            AuditLevel::Warn,
                            "Setting deleted",
                            AUDIT_SOURCE,
                            json!({ "key": key, "old": old }),
                        )
                        .with_actor(deleted_by),
                    )
                    .await;
                Ok(())
            }
            Err(err) => {
                self.audit
                    .error(
                        "Failed to delete setting",
                        AUDIT_SOURCE,
                        json!({
                            "key": key,
                            "operation": "delete_setting",
                            "error": err.to_string(),
                        }),
                    )
                    .await;
                Err(err)
            }
        }
    }

    /// Drop the entire cache, forcing the next read to hit the store.
    pub async fn clear_cache(&self) {
        self.cache.write().await.clear();
    }

    /// Persist the built-in default set, redacting sensitive values.
    ///
    /// Returns the number of records created. Raises on the first persistence
    /// failure; records created before the failure are kept.
    pub async fn initialize_default_settings(
        &self,
        created_by: Option<Uuid>,
    ) -> Result<usize, SettingsError> {
        let mut created = 0usize;
        for mut record in default_settings() {
            if is_sensitive(&record.key) {
                record.value = JsonValue::String(String::new());
            }
            let key = record.key.clone();
            if let Err(err) = self.store.create(record).await {
                self.audit
                    .error(
                        "Failed to initialize default settings",
                        AUDIT_SOURCE,
                        json!({
                            "key": key,
                            "created": created,
                            "operation": "initialize_default_settings",
                            "error": err.to_string(),
                        }),
                    )
                    .await;
                return Err(err);
            }
            created += 1;
        }
        self.audit
            .log(
                AuditEvent::new(
                    AuditLevel::Info,
                    "Default settings initialized",
                    AUDIT_SOURCE,
                    json!({ "count": created }),
                )
                .with_actor(created_by),
            )
            .await;
        Ok(created)
    }

    /// The compiled built-in defaults, without touching the store or cache.
    ///
    /// Environment overrides still apply, matching `get_settings`.
    pub fn get_default_settings(&self) -> CompiledSettings {
        let defaults = default_settings();
        compile_settings(
            defaults.iter().map(|d| (d.key.as_str(), &d.value)),
            self.env.as_ref(),
        )
    }
}

/// In-memory settings store for development and tests.
///
/// Supports failure injection on the read and write paths and counts
/// `find_all` calls so cache behavior can be asserted.
#[derive(Debug, Default)]
pub struct InMemorySettingStore {
    records: Mutex<BTreeMap<String, Setting>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    find_all_calls: AtomicUsize,
}

impl InMemorySettingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent read operations fail.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent write operations fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of `find_all` calls attempted so far.
    pub fn find_all_calls(&self) -> usize {
        self.find_all_calls.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// The raw persisted value for a key, bypassing the resolver.
    pub fn persisted_value(&self, key: &str) -> Option<JsonValue> {
        self.lock().get(key).map(|record| record.value.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Setting>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_read(&self) -> Result<(), SettingsError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            Err(SettingsError::Store("injected read failure".to_string()))
        } else {
            Ok(())
        }
    }

    fn check_write(&self) -> Result<(), SettingsError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(SettingsError::Store("injected write failure".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl SettingStore for InMemorySettingStore {
    async fn find_all(&self) -> Result<Vec<Setting>, SettingsError> {
        self.find_all_calls.fetch_add(1, Ordering::SeqCst);
        self.check_read()?;
        Ok(self.lock().values().cloned().collect())
    }

    async fn find_by_key(&self, key: &str) -> Result<Option<Setting>, SettingsError> {
        self.check_read()?;
        Ok(self.lock().get(key).cloned())
    }

    async fn upsert(
        &self,
        key: &str,
        value: &JsonValue,
        category: SettingCategory,
        description: Option<&str>,
    ) -> Result<(Setting, bool), SettingsError> {
        self.check_write()?;
        let now = chrono::Utc::now();
        let mut records = self.lock();
        match records.get_mut(key) {
            Some(existing) => {
                existing.value = value.clone();
                existing.category = category;
                if let Some(description) = description {
                    existing.description = Some(description.to_string());
                }
                existing.updated_at = now;
                Ok((existing.clone(), false))
            }
            None => {
                let record = Setting {
                    key: key.to_string(),
                    value: value.clone(),
                    category,
                    description: description.map(str::to_string),
                    created_at: now,
                    updated_at: now,
                };
                records.insert(key.to_string(), record.clone());
                Ok((record, true))
            }
        }
    }

    async fn create(&self, setting: NewSetting) -> Result<Setting, SettingsError> {
        self.check_write()?;
        let now = chrono::Utc::now();
        let record = Setting {
            key: setting.key,
            value: setting.value,
            category: setting.category,
            description: setting.description,
            created_at: now,
            updated_at: now,
        };
        self.lock().insert(record.key.clone(), record.clone());
        Ok(record)
    }

    async fn delete(&self, key: &str) -> Result<(), SettingsError> {
        self.check_write()?;
        self.lock().remove(key);
        Ok(())
    }
}
