use crate::constants::{DEFAULT_LONG_PRESS_MS, DEFAULT_SAVE_TIMEOUT_MS};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Paint colors the controller forces on layers when a mode is set up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaintColors {
    pub node: String,
    pub node_hover: String,
    pub node_selected: String,
    pub segment: String,
    pub segment_hover: String,
    pub draft_line: String,
    pub draft_point: String,
}

impl Default for PaintColors {
    fn default() -> Self {
        Self {
            node: "#2b6cb0".to_string(),
            node_hover: "#f6ad55".to_string(),
            node_selected: "#e53e3e".to_string(),
            segment: "#4a5568".to_string(),
            segment_hover: "#d69e2e".to_string(),
            draft_line: "#38a169".to_string(),
            draft_point: "#276749".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingSettings {
    pub base_url: String,
    pub profile: String,
}

impl Default for RoutingSettings {
    fn default() -> Self {
        Self {
            base_url: "https://router.project-osrm.org".to_string(),
            profile: "foot".to_string(),
        }
    }
}

/// Editor configuration, loadable from JSON with every field optional
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    pub save_timeout_ms: u64,
    pub long_press_ms: u64,
    pub backend_url: String,
    pub routing: RoutingSettings,
    pub colors: PaintColors,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            save_timeout_ms: DEFAULT_SAVE_TIMEOUT_MS,
            long_press_ms: DEFAULT_LONG_PRESS_MS,
            backend_url: "ws://localhost:8080/ws".to_string(),
            routing: RoutingSettings::default(),
            colors: PaintColors::default(),
        }
    }
}

impl EditorSettings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse settings from JSON, filling missing fields with defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the settings are invalid
    pub fn from_json(json: &str) -> Result<Self, String> {
        let settings: Self =
            serde_json::from_str(json).map_err(|e| format!("Failed to parse settings: {e}"))?;
        settings.validate()?;
        Ok(settings)
    }

    /// # Errors
    ///
    /// Returns an error describing the first invalid field
    pub fn validate(&self) -> Result<(), String> {
        if self.save_timeout_ms == 0 {
            return Err("save_timeout_ms must be greater than zero".to_string());
        }
        if self.backend_url.trim().is_empty() {
            return Err("backend_url must not be empty".to_string());
        }
        if self.routing.base_url.trim().is_empty() {
            return Err("routing.base_url must not be empty".to_string());
        }
        Ok(())
    }

    #[must_use]
    pub fn save_timeout(&self) -> Duration {
        Duration::from_millis(self.save_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = EditorSettings::new();
        assert_eq!(settings.save_timeout(), Duration::from_secs(10));
        assert_eq!(settings.long_press_ms, 500);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings = EditorSettings::from_json(r##"{"save_timeout_ms": 2500, "colors": {"node": "#000000"}}"##)
            .expect("valid settings");
        assert_eq!(settings.save_timeout_ms, 2500);
        assert_eq!(settings.colors.node, "#000000");
        assert_eq!(settings.colors.node_hover, PaintColors::default().node_hover);
        assert_eq!(settings.routing, RoutingSettings::default());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = EditorSettings::from_json(r#"{"save_timeout_ms": 0}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_json_rejected() {
        let result = EditorSettings::from_json("{not json");
        assert!(result.expect_err("malformed").starts_with("Failed to parse settings"));
    }
}
