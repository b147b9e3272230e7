//! Compilation of flat dot-keyed settings into a nested configuration object.
//!
//! Keys are split on `.` and intermediate objects are created or merged as
//! needed. Environment-sourced values take precedence for a fixed set of
//! operational and sensitive keys, applied both per-entry and in a final
//! direct-override pass.

use serde_json::{Map, Value as JsonValue};

use super::settings::EnvSource;
use crate::models::CompiledSettings;

/// How an environment variable's raw string is coerced into a setting value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnvValueKind {
    String,
    /// Parsed as `i64`; unparsable values produce no override.
    Integer,
    /// Case-insensitive comparison with `"true"`.
    Boolean,
}

/// Setting keys resolved from the environment when the variable is set.
///
/// Deliberately broader than the sensitive-write allow-list: only the SMTP
/// password is redacted at rest, but operational toggles are overridable at
/// read time too.
const ENV_OVERRIDES: &[(&str, &str, EnvValueKind)] = &[
    ("email.smtpPassword", "SMTP_PASSWORD", EnvValueKind::String),
    ("email.smtpUsername", "SMTP_USERNAME", EnvValueKind::String),
    ("email.smtpServer", "SMTP_SERVER", EnvValueKind::String),
    ("email.smtpPort", "SMTP_PORT", EnvValueKind::Integer),
    ("email.senderEmail", "EMAIL_SENDER", EnvValueKind::String),
    ("email.senderName", "EMAIL_SENDER_NAME", EnvValueKind::String),
    ("general.maintenanceMode", "MAINTENANCE_MODE", EnvValueKind::Boolean),
    ("features.enableMatching", "ENABLE_MATCHING", EnvValueKind::Boolean),
];

/// Resolve the environment override for a setting key, if any.
///
/// Keys outside the mapping have no override and fall through to the cached
/// or default value unchanged.
pub fn env_override(key: &str, env: &dyn EnvSource) -> Option<JsonValue> {
    let (_, var, kind) = ENV_OVERRIDES.iter().find(|(k, _, _)| *k == key)?;
    let raw = env.var(var)?;
    match kind {
        EnvValueKind::String => Some(JsonValue::String(raw)),
        EnvValueKind::Integer => raw.trim().parse::<i64>().ok().map(JsonValue::from),
        EnvValueKind::Boolean => Some(JsonValue::Bool(raw.eq_ignore_ascii_case("true"))),
    }
}

/// Build the nested configuration object from flat `(key, value)` entries.
pub fn compile_settings<'a, I>(entries: I, env: &dyn EnvSource) -> CompiledSettings
where
    I: IntoIterator<Item = (&'a str, &'a JsonValue)>,
{
    let mut compiled = Map::new();
    for (key, value) in entries {
        let effective = env_override(key, env).unwrap_or_else(|| value.clone());
        insert_path(&mut compiled, key, effective);
    }
    // Second pass: direct overrides win over whatever merging produced, and
    // introduce their keys even when the store has no record for them.
    for (key, _, _) in ENV_OVERRIDES {
        if let Some(value) = env_override(key, env) {
            insert_path(&mut compiled, key, value);
        }
    }
    compiled
}

/// Set `value` at a dot-delimited `path`, creating intermediate objects.
///
/// An existing non-object value at an intermediate segment is replaced by an
/// object, so deeper keys always win.
fn insert_path(map: &mut Map<String, JsonValue>, path: &str, value: JsonValue) {
    match path.split_once('.') {
        None => {
            map.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let slot = map
                .entry(head.to_string())
                .or_insert_with(|| JsonValue::Object(Map::new()));
            if !slot.is_object() {
                *slot = JsonValue::Object(Map::new());
            }
            if let JsonValue::Object(child) = slot {
                insert_path(child, rest, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn no_env() -> HashMap<String, String> {
        HashMap::new()
    }

    fn env(vars: &[(&str, &str)]) -> HashMap<String, String> {
        vars.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_top_level_key_without_dot() {
        let value = json!("standalone");
        let compiled = compile_settings([("banner", &value)], &no_env());
        assert_eq!(compiled["banner"], json!("standalone"));
    }

    #[test]
    fn test_merge_keys_with_shared_prefix() {
        let name = json!("PairFlix");
        let maintenance = json!(false);
        let compiled = compile_settings(
            [
                ("general.siteName", &name),
                ("general.maintenanceMode", &maintenance),
            ],
            &no_env(),
        );

        let general = compiled["general"].as_object().unwrap();
        assert_eq!(general["siteName"], json!("PairFlix"));
        assert_eq!(general["maintenanceMode"], json!(false));
    }

    #[test]
    fn test_deeply_nested_key() {
        let value = json!(8);
        let compiled = compile_settings([("security.passwordPolicy.minLength", &value)], &no_env());
        assert_eq!(
            compiled["security"]["passwordPolicy"]["minLength"],
            json!(8)
        );
    }

    #[test]
    fn test_non_object_intermediate_is_replaced() {
        let scalar = json!("flat");
        let nested = json!(42);
        let compiled = compile_settings(
            [("email", &scalar), ("email.smtpPort", &nested)],
            &no_env(),
        );
        assert_eq!(compiled["email"]["smtpPort"], json!(42));
    }

    #[test]
    fn test_string_env_override_replaces_stored_value() {
        let stored = json!("smtp.example.com");
        let compiled = compile_settings(
            [("email.smtpServer", &stored)],
            &env(&[("SMTP_SERVER", "foo.test")]),
        );
        assert_eq!(compiled["email"]["smtpServer"], json!("foo.test"));
    }

    #[test]
    fn test_integer_env_override_parsing() {
        let stored = json!(587);
        let compiled = compile_settings(
            [("email.smtpPort", &stored)],
            &env(&[("SMTP_PORT", "2525")]),
        );
        assert_eq!(compiled["email"]["smtpPort"], json!(2525));
    }

    #[test]
    fn test_unparsable_integer_env_keeps_stored_value() {
        let stored = json!(587);
        let compiled = compile_settings(
            [("email.smtpPort", &stored)],
            &env(&[("SMTP_PORT", "not-a-port")]),
        );
        assert_eq!(compiled["email"]["smtpPort"], json!(587));
    }

    #[test]
    fn test_boolean_env_override_is_case_insensitive() {
        let stored = json!(false);
        let compiled = compile_settings(
            [("general.maintenanceMode", &stored)],
            &env(&[("MAINTENANCE_MODE", "TRUE")]),
        );
        assert_eq!(compiled["general"]["maintenanceMode"], json!(true));
    }

    #[test]
    fn test_boolean_env_override_non_true_yields_false() {
        let stored = json!(true);
        let compiled = compile_settings(
            [("features.enableMatching", &stored)],
            &env(&[("ENABLE_MATCHING", "off")]),
        );
        assert_eq!(compiled["features"]["enableMatching"], json!(false));
    }

    #[test]
    fn test_second_pass_introduces_missing_keys() {
        // No stored entries at all; the override pass still materializes the key.
        let compiled = compile_settings(
            std::iter::empty(),
            &env(&[("SMTP_SERVER", "relay.internal")]),
        );
        assert_eq!(compiled["email"]["smtpServer"], json!("relay.internal"));
    }

    #[test]
    fn test_unmapped_key_has_no_override() {
        assert_eq!(
            env_override("general.siteName", &env(&[("SITE_NAME", "Other")])),
            None
        );
    }
}
