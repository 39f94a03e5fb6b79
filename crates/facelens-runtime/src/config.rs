//! Runtime configuration
//!
//! Loaded from JSON. Durations are written the human way (`"120s"`, `"2m"`,
//! `"5s 500ms"`). Every field has a default, so `{}` plus an `app_id` is a
//! complete file.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use facelens_core::{
    FacelensError, FacelensResult, PermissionSet, PresentationProfile, PropertyFlags,
    SessionConfig,
};
use facelens_session::{ControllerConfig, IdleTimeoutConfig};

/// Log output format
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Idle timeout section
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IdleSettings {
    pub enabled: bool,
    #[serde(with = "duration_str")]
    pub timeout: Duration,
    #[serde(with = "duration_str")]
    pub grace: Duration,
    pub message: String,
}

impl Default for IdleSettings {
    fn default() -> Self {
        let idle = IdleTimeoutConfig::default();
        IdleSettings {
            enabled: idle.enabled,
            timeout: idle.timeout,
            grace: idle.grace,
            message: ControllerConfig::DEFAULT_IDLE_MESSAGE.to_string(),
        }
    }
}

/// Runtime configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    pub app_id: String,
    pub log_format: LogFormat,
    /// `EnvFilter` directives used when `RUST_LOG` is unset
    pub log_filter: String,
    pub profile: PresentationProfile,
    pub property: PropertyFlags,
    pub permissions: PermissionSet,
    pub idle: IdleSettings,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            app_id: String::new(),
            log_format: LogFormat::default(),
            log_filter: "info".to_string(),
            profile: PresentationProfile::flagged_dual(),
            property: PropertyFlags::default(),
            permissions: PermissionSet::required(),
            idle: IdleSettings::default(),
        }
    }
}

impl RuntimeConfig {
    pub fn from_json_str(json: &str) -> FacelensResult<Self> {
        serde_json::from_str(json).map_err(|e| FacelensError::Config(format!("invalid config: {e}")))
    }

    pub fn from_path(path: impl AsRef<Path>) -> FacelensResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| FacelensError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> FacelensResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| FacelensError::Config(e.to_string()))
    }

    /// Normalized, validated controller configuration
    pub fn controller_config(&self) -> FacelensResult<ControllerConfig> {
        let config = ControllerConfig {
            app_id: self.app_id.clone(),
            session: SessionConfig::new(self.property, self.profile.expression),
            profile: self.profile,
            idle: IdleTimeoutConfig {
                enabled: self.idle.enabled,
                timeout: self.idle.timeout,
                grace: self.idle.grace,
            },
            permissions: PermissionSet::new(self.permissions.iter()),
            idle_message: self.idle.message.clone(),
        };
        config.validate()?;
        Ok(config)
    }
}

mod duration_str {
    use std::time::Duration;

    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&humantime::format_duration(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facelens_core::{ExpressionVariant, Permission};

    #[test]
    fn test_defaults_from_minimal_json() {
        let config = RuntimeConfig::from_json_str(r#"{ "app_id": "demo-app" }"#).unwrap();
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.idle.timeout, Duration::from_secs(120));
        assert_eq!(config.idle.grace, Duration::from_secs(5));

        let controller = config.controller_config().unwrap();
        assert_eq!(controller.app_id, "demo-app");
        assert_eq!(controller.permissions, PermissionSet::required());
        assert_eq!(controller.session, SessionConfig::default());
    }

    #[test]
    fn test_full_config() {
        let json = r#"{
            "app_id": "kiosk",
            "log_format": "json",
            "log_filter": "facelens=debug",
            "profile": { "expression": "single", "detection": "split_events" },
            "property": { "detect_landmark": false },
            "permissions": ["camera", "camera", "internet"],
            "idle": { "timeout": "2m 30s", "grace": "10s", "message": "closing" }
        }"#;
        let config = RuntimeConfig::from_json_str(json).unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.idle.timeout, Duration::from_secs(150));

        let controller = config.controller_config().unwrap();
        assert_eq!(controller.profile, PresentationProfile::split_single());
        assert_eq!(controller.session.expression_variant(), ExpressionVariant::Single);
        assert!(!controller.session.recognize_valence_expression());
        assert!(!controller.session.analyze_action_unit());
        assert_eq!(controller.permissions.len(), 2);
        assert!(controller.permissions.contains(Permission::Camera));
        assert_eq!(controller.idle.grace, Duration::from_secs(10));
        assert_eq!(controller.idle_message, "closing");
    }

    #[test]
    fn test_bad_duration() {
        let err = RuntimeConfig::from_json_str(r#"{ "idle": { "timeout": "soon" } }"#).unwrap_err();
        assert!(matches!(err, FacelensError::Config(_)));
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(RuntimeConfig::from_json_str(r#"{ "app": "x" }"#).is_err());
    }

    #[test]
    fn test_missing_app_id() {
        let config = RuntimeConfig::default();
        assert!(config.controller_config().is_err());
    }

    #[test]
    fn test_json_roundtrip_keeps_durations_readable() {
        let config = RuntimeConfig {
            app_id: "demo-app".into(),
            ..Default::default()
        };
        let json = config.to_json_string().unwrap();
        assert!(json.contains("\"2m\""));
        assert_eq!(RuntimeConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_from_path() {
        let path = std::env::temp_dir().join(format!("facelens-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "app_id": "from-file" }"#).unwrap();
        let config = RuntimeConfig::from_path(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.app_id, "from-file");

        assert!(RuntimeConfig::from_path(&path).is_err());
    }
}
