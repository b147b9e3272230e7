//! Domain services for PairFlix settings.
//!
//! Services contain business logic that operates on domain models.

pub mod compile;
pub mod defaults;
pub mod settings;

pub use compile::{compile_settings, env_override};
pub use defaults::default_settings;
pub use settings::{
    is_sensitive, EnvSource, InMemorySettingStore, ProcessEnv, SettingStore, SettingsError,
    SettingsService, CACHE_TTL, SENSITIVE_PLACEHOLDER, SENSITIVE_SETTINGS,
};
