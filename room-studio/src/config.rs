use std::path::PathBuf;

use egui::Vec2;

/// Read from `config.json` next to the binary; every field falls back to a
/// default, so a partial (or missing) file is fine.
#[derive(Debug, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where generated renders are persisted and re-listed from.
    pub session_dir: PathBuf,
    pub api: ApiConfig,
    pub egui: UiConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session_dir: "renders".into(),
            api: Default::default(),
            egui: Default::default(),
        }
    }
}

#[derive(Debug, serde::Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Text model used to describe the current room.
    pub analyze_model: String,
    /// Multimodal model used for renders and upscales.
    pub image_model: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".into(),
            analyze_model: "gemini-2.5-flash".into(),
            image_model: "gemini-2.5-flash-image".into(),
        }
    }
}

#[derive(Debug, serde::Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub viewport: Vec2,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            viewport: [1200.0, 800.0].into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_missing_fields() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.session_dir, PathBuf::from("renders"));
        assert_eq!(config.api.analyze_model, "gemini-2.5-flash");
        assert_eq!(config.egui.viewport, Vec2::new(1200.0, 800.0));
    }
}
