//! Built-in default settings.
//!
//! This is the authoritative value set used to seed an empty store and as the
//! offline fallback when the store is unreachable.

use serde_json::{json, Value as JsonValue};

use crate::models::{NewSetting, SettingCategory};

fn entry(
    key: &str,
    value: JsonValue,
    category: SettingCategory,
    description: &str,
) -> NewSetting {
    NewSetting {
        key: key.to_string(),
        value,
        category,
        description: Some(description.to_string()),
    }
}

/// The built-in default settings, in declaration order.
pub fn default_settings() -> Vec<NewSetting> {
    use SettingCategory::{Email, Features, General, Media, Security};

    vec![
        // General
        entry(
            "general.siteName",
            json!("PairFlix"),
            General,
            "Name displayed in the site header and in outgoing emails",
        ),
        entry(
            "general.siteDescription",
            json!("Find your perfect movie match"),
            General,
            "Tagline shown on the landing page",
        ),
        entry(
            "general.maintenanceMode",
            json!(false),
            General,
            "When enabled, only administrators can access the application",
        ),
        entry(
            "general.defaultUserRole",
            json!("user"),
            General,
            "Role assigned to newly registered accounts",
        ),
        // Security
        entry(
            "security.sessionTimeout",
            json!(120),
            Security,
            "Idle session lifetime in minutes",
        ),
        entry(
            "security.maxLoginAttempts",
            json!(5),
            Security,
            "Failed login attempts allowed before lockout",
        ),
        entry(
            "security.passwordPolicy.minLength",
            json!(8),
            Security,
            "Minimum password length",
        ),
        entry(
            "security.passwordPolicy.requireUppercase",
            json!(true),
            Security,
            "Require at least one uppercase letter in passwords",
        ),
        entry(
            "security.passwordPolicy.requireLowercase",
            json!(true),
            Security,
            "Require at least one lowercase letter in passwords",
        ),
        entry(
            "security.passwordPolicy.requireNumbers",
            json!(true),
            Security,
            "Require at least one digit in passwords",
        ),
        entry(
            "security.passwordPolicy.requireSpecialChars",
            json!(false),
            Security,
            "Require at least one special character in passwords",
        ),
        entry(
            "security.twoFactorAuth.enabled",
            json!(false),
            Security,
            "Allow users to enable two-factor authentication",
        ),
        entry(
            "security.twoFactorAuth.requiredForAdmins",
            json!(false),
            Security,
            "Force two-factor authentication for administrator accounts",
        ),
        // Email
        entry(
            "email.smtpServer",
            json!("smtp.example.com"),
            Email,
            "SMTP relay host for outgoing mail",
        ),
        entry(
            "email.smtpPort",
            json!(587),
            Email,
            "SMTP relay port",
        ),
        entry(
            "email.smtpUsername",
            json!("notifications@pairflix.com"),
            Email,
            "SMTP authentication username",
        ),
        entry(
            "email.smtpPassword",
            json!(""),
            Email,
            "SMTP authentication password; supplied via SMTP_PASSWORD, never stored",
        ),
        entry(
            "email.senderEmail",
            json!("notifications@pairflix.com"),
            Email,
            "From address for outgoing mail",
        ),
        entry(
            "email.senderName",
            json!("PairFlix Notifications"),
            Email,
            "Display name for outgoing mail",
        ),
        entry(
            "email.emailTemplatesPath",
            json!("/templates/email"),
            Email,
            "Filesystem path to the email template directory",
        ),
        // Media
        entry(
            "media.maxUploadSize",
            json!(5),
            Media,
            "Maximum upload size in megabytes",
        ),
        entry(
            "media.allowedFileTypes",
            json!(["jpg", "jpeg", "png", "gif"]),
            Media,
            "File extensions accepted for uploads",
        ),
        entry(
            "media.imageQuality",
            json!(85),
            Media,
            "JPEG re-encode quality for processed images",
        ),
        entry(
            "media.storageProvider",
            json!("local"),
            Media,
            "Storage backend for uploaded media",
        ),
        // Features
        entry(
            "features.enableMatching",
            json!(true),
            Features,
            "Enable watchlist matching between paired users",
        ),
        entry(
            "features.enableUserProfiles",
            json!(true),
            Features,
            "Enable public user profile pages",
        ),
        entry(
            "features.enableNotifications",
            json!(true),
            Features,
            "Enable in-app notifications",
        ),
        entry(
            "features.enableActivityFeed",
            json!(true),
            Features,
            "Enable the partner activity feed",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_default_count() {
        assert_eq!(default_settings().len(), 28);
    }

    #[test]
    fn test_keys_are_unique() {
        let defaults = default_settings();
        let keys: HashSet<_> = defaults.iter().map(|d| d.key.as_str()).collect();
        assert_eq!(keys.len(), defaults.len());
    }

    #[test]
    fn test_every_key_matches_its_category_prefix() {
        for default in default_settings() {
            let prefix = default.key.split('.').next().unwrap();
            assert_eq!(
                prefix,
                default.category.as_str(),
                "key {} is filed under {}",
                default.key,
                default.category
            );
        }
    }

    #[test]
    fn test_smtp_password_defaults_to_empty() {
        let defaults = default_settings();
        let password = defaults
            .iter()
            .find(|d| d.key == "email.smtpPassword")
            .unwrap();
        assert_eq!(password.value, json!(""));
    }

    #[test]
    fn test_well_known_values() {
        let defaults = default_settings();
        let by_key = |key: &str| {
            defaults
                .iter()
                .find(|d| d.key == key)
                .unwrap_or_else(|| panic!("missing default {}", key))
                .value
                .clone()
        };

        assert_eq!(by_key("general.siteName"), json!("PairFlix"));
        assert_eq!(by_key("security.sessionTimeout"), json!(120));
        assert_eq!(by_key("email.smtpPort"), json!(587));
        assert_eq!(
            by_key("media.allowedFileTypes"),
            json!(["jpg", "jpeg", "png", "gif"])
        );
        assert_eq!(by_key("features.enableActivityFeed"), json!(true));
    }
}
