//! Setting domain models for application configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::str::FromStr;

/// Category for grouping settings in the admin UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingCategory {
    General,
    Security,
    Email,
    Media,
    Features,
}

impl SettingCategory {
    /// All known categories, in display order.
    pub const ALL: [SettingCategory; 5] = [
        SettingCategory::General,
        SettingCategory::Security,
        SettingCategory::Email,
        SettingCategory::Media,
        SettingCategory::Features,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingCategory::General => "general",
            SettingCategory::Security => "security",
            SettingCategory::Email => "email",
            SettingCategory::Media => "media",
            SettingCategory::Features => "features",
        }
    }

    /// Infer a category from a dot-delimited setting key.
    ///
    /// The first dot-segment wins when it names a known category. Otherwise any
    /// category name appearing anywhere in the key is used, and unrecognized
    /// keys fall back to `General`.
    pub fn from_key(key: &str) -> SettingCategory {
        let prefix = key.split('.').next().unwrap_or(key);
        if let Ok(category) = prefix.parse::<SettingCategory>() {
            return category;
        }
        for category in SettingCategory::ALL {
            if key.contains(category.as_str()) {
                return category;
            }
        }
        SettingCategory::General
    }
}

impl Default for SettingCategory {
    fn default() -> Self {
        SettingCategory::General
    }
}

impl std::fmt::Display for SettingCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SettingCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "general" => Ok(SettingCategory::General),
            "security" => Ok(SettingCategory::Security),
            "email" => Ok(SettingCategory::Email),
            "media" => Ok(SettingCategory::Media),
            "features" => Ok(SettingCategory::Features),
            _ => Err(format!("Unknown setting category: {}", s)),
        }
    }
}

/// A persisted configuration entry.
///
/// Keys are dot-delimited hierarchical paths (e.g. `"email.smtpServer"`) and
/// globally unique; the last write for a key wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Setting {
    pub key: String,
    pub value: JsonValue,
    pub category: SettingCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a setting record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSetting {
    pub key: String,
    pub value: JsonValue,
    pub category: SettingCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The nested-object view of all settings, environment-overridden, as consumed
/// by the rest of the application. Rebuilt on demand, never persisted.
pub type CompiledSettings = serde_json::Map<String, JsonValue>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_category_display() {
        assert_eq!(SettingCategory::General.to_string(), "general");
        assert_eq!(SettingCategory::Email.to_string(), "email");
        assert_eq!(SettingCategory::Features.to_string(), "features");
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!("security".parse(), Ok(SettingCategory::Security));
        assert_eq!("MEDIA".parse(), Ok(SettingCategory::Media));
        assert!("watchlist".parse::<SettingCategory>().is_err());
    }

    #[test]
    fn test_category_from_key_prefix() {
        assert_eq!(
            SettingCategory::from_key("email.smtpServer"),
            SettingCategory::Email
        );
        assert_eq!(
            SettingCategory::from_key("security.passwordPolicy.minLength"),
            SettingCategory::Security
        );
        assert_eq!(
            SettingCategory::from_key("features.enableMatching"),
            SettingCategory::Features
        );
    }

    #[test]
    fn test_category_from_key_substring() {
        assert_eq!(
            SettingCategory::from_key("notifications.emailFooter"),
            SettingCategory::Email
        );
        assert_eq!(
            SettingCategory::from_key("uploads.mediaQuota"),
            SettingCategory::Media
        );
    }

    #[test]
    fn test_category_from_key_fallback() {
        assert_eq!(SettingCategory::from_key("siteName"), SettingCategory::General);
        assert_eq!(
            SettingCategory::from_key("watchlist.maxEntries"),
            SettingCategory::General
        );
    }

    #[test]
    fn test_setting_serialization() {
        let setting = Setting {
            key: "general.siteName".to_string(),
            value: json!("PairFlix"),
            category: SettingCategory::General,
            description: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&setting).unwrap();
        assert!(json.contains("general.siteName"));
        assert!(json.contains("\"category\":\"general\""));
        assert!(!json.contains("description"));
    }

    #[test]
    fn test_new_setting_deserialize() {
        let json = r#"{"key":"media.imageQuality","value":85,"category":"media"}"#;
        let setting: NewSetting = serde_json::from_str(json).unwrap();
        assert_eq!(setting.key, "media.imageQuality");
        assert_eq!(setting.value, json!(85));
        assert_eq!(setting.category, SettingCategory::Media);
        assert!(setting.description.is_none());
    }
}
