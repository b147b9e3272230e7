//! Setting entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::Setting;
use sqlx::FromRow;

/// Database row mapping for the app_settings table.
///
/// The category is stored as plain text; rows with an unrecognized category
/// fall back to the default category when mapped into the domain model.
#[derive(Debug, Clone, FromRow)]
pub struct SettingEntity {
    pub key: String,
    pub value: serde_json::Value,
    pub category: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SettingEntity> for Setting {
    fn from(entity: SettingEntity) -> Self {
        Setting {
            key: entity.key,
            value: entity.value,
            category: entity.category.parse().unwrap_or_default(),
            description: entity.description,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Row returned by the upsert query, carrying whether the row was inserted.
///
/// `created` comes from the `(xmax = 0)` check on the returned row.
#[derive(Debug, Clone, FromRow)]
pub struct UpsertedSettingEntity {
    pub key: String,
    pub value: serde_json::Value,
    pub category: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created: bool,
}

impl UpsertedSettingEntity {
    /// Split into the domain record and the created flag.
    pub fn into_record(self) -> (Setting, bool) {
        let created = self.created;
        let entity = SettingEntity {
            key: self.key,
            value: self.value,
            category: self.category,
            description: self.description,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        (entity.into(), created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::SettingCategory;
    use serde_json::json;

    fn entity(category: &str) -> SettingEntity {
        let now = Utc::now();
        SettingEntity {
            key: "email.smtpPort".to_string(),
            value: json!(587),
            category: category.to_string(),
            description: Some("SMTP relay port".to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_entity_maps_to_domain_record() {
        let record: Setting = entity("email").into();
        assert_eq!(record.key, "email.smtpPort");
        assert_eq!(record.value, json!(587));
        assert_eq!(record.category, SettingCategory::Email);
    }

    #[test]
    fn test_unknown_category_falls_back_to_default() {
        let record: Setting = entity("billing").into();
        assert_eq!(record.category, SettingCategory::General);
    }

    #[test]
    fn test_upserted_entity_splits_created_flag() {
        let now = Utc::now();
        let upserted = UpsertedSettingEntity {
            key: "general.siteName".to_string(),
            value: json!("PairFlix"),
            category: "general".to_string(),
            description: None,
            created_at: now,
            updated_at: now,
            created: true,
        };
        let (record, created) = upserted.into_record();
        assert!(created);
        assert_eq!(record.category, SettingCategory::General);
    }
}
