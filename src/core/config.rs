use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use crate::core::media::DEFAULT_VIDEO_EXTENSIONS;
use crate::stack::StackGeometry;

/// How the showcase's simulated video elements answer unmuted play requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutoplayPolicy {
    /// Every play request succeeds.
    AllowAll,
    /// Unmuted play is refused until the user has interacted once with the page.
    RequireGesture,
    /// Unmuted play is always refused.
    BlockUnmuted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShowcaseConfig {
    pub autoplay_policy: AutoplayPolicy,
    pub clip_seconds: f32,
    pub surfaces: Vec<Vec<String>>,
}

impl Default for ShowcaseConfig {
    fn default() -> Self {
        let surface = |prefix: &str| {
            vec![
                format!("media/{}/opening.mp4", prefix),
                format!("media/{}/stage.jpg", prefix),
                format!("media/{}/crowd.webm", prefix),
                format!("media/{}/backstage.jpg", prefix),
                format!("media/{}/finale.mov", prefix),
            ]
        };

        Self {
            autoplay_policy: AutoplayPolicy::RequireGesture,
            clip_seconds: 8.0,
            surfaces: vec![surface("hero"), surface("gallery"), surface("testimonials")],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReelConfig {
    pub geometry: StackGeometry,
    /// Intersection ratio at or above which a surface counts as on screen.
    pub visibility_threshold: f32,
    pub video_extensions: Vec<String>,
    pub showcase: ShowcaseConfig,
}

impl Default for ReelConfig {
    fn default() -> Self {
        Self {
            geometry: StackGeometry::default(),
            visibility_threshold: 0.5,
            video_extensions: DEFAULT_VIDEO_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
            showcase: ShowcaseConfig::default(),
        }
    }
}

impl ReelConfig {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &PathBuf) -> anyhow::Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .map_err(|e| anyhow::anyhow!("Failed to read config file at {}: {}", config_path.display(), e))?;

            match serde_json::from_str::<Self>(&content) {
                Ok(config) => {
                    log::info!("Loaded existing config from {}", config_path.display());
                    Ok(config.sanitized())
                }
                Err(e) => {
                    log::warn!("Config file exists but has issues ({}), creating new one with defaults", e);
                    let new_config = Self::default();
                    new_config.save_to(config_path)
                        .map_err(|save_err| anyhow::anyhow!("Failed to save new config: {}", save_err))?;
                    log::info!("Created new config file at {}", config_path.display());
                    Ok(new_config)
                }
            }
        } else {
            log::info!("No config file found, creating default config");
            let config = Self::default();
            config.save_to(config_path)
                .map_err(|e| anyhow::anyhow!("Failed to save default config: {}", e))?;
            log::info!("Created new config file at {}", config_path.display());
            Ok(config)
        }
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, config_path: &PathBuf) -> anyhow::Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("reel-stack")
            .join("config.json")
    }

    /// Clamp values a hand-edited file could push out of range.
    pub(crate) fn sanitized(mut self) -> Self {
        if !self.visibility_threshold.is_finite() {
            log::warn!("visibility_threshold is not a number, using default");
            self.visibility_threshold = Self::default().visibility_threshold;
        } else if !(0.0..=1.0).contains(&self.visibility_threshold) {
            log::warn!(
                "visibility_threshold {} is outside [0, 1], clamping",
                self.visibility_threshold
            );
            self.visibility_threshold = self.visibility_threshold.clamp(0.0, 1.0);
        }
        if self.video_extensions.is_empty() {
            log::warn!("No video extensions configured, falling back to defaults");
            self.video_extensions = DEFAULT_VIDEO_EXTENSIONS.iter().map(|ext| ext.to_string()).collect();
        }
        if !self.showcase.clip_seconds.is_finite() || self.showcase.clip_seconds <= 0.0 {
            self.showcase.clip_seconds = ShowcaseConfig::default().clip_seconds;
        }
        self
    }
}
