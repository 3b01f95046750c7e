#[cfg(test)]
mod tests {

    use std::path::PathBuf;
    use crate::core::{AutoplayPolicy, ReelConfig, ShowcaseConfig};

    fn scratch_config_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("reel-stack-test-{}", uuid::Uuid::new_v4()))
            .join("config.json")
    }

    #[test]
    fn test_reel_config_default() {
        let config = ReelConfig::default();
        assert_eq!(config.visibility_threshold, 0.5);
        assert_eq!(config.video_extensions, vec!["mp4", "webm", "mov"]);
        assert_eq!(config.showcase.autoplay_policy, AutoplayPolicy::RequireGesture);
        assert_eq!(config.showcase.surfaces.len(), 3);
    }

    #[test]
    fn test_reel_config_serialization() {
        let mut config = ReelConfig::default();
        config.visibility_threshold = 0.25;
        config.geometry.neighbor_offset = 72.0;
        config.showcase.autoplay_policy = AutoplayPolicy::BlockUnmuted;

        let serialized = serde_json::to_string(&config).expect("Failed to serialize config");
        let deserialized: ReelConfig = serde_json::from_str(&serialized).expect("Failed to deserialize config");

        assert_eq!(deserialized.visibility_threshold, 0.25);
        assert_eq!(deserialized.geometry.neighbor_offset, 72.0);
        assert_eq!(deserialized.showcase.autoplay_policy, AutoplayPolicy::BlockUnmuted);
    }

    #[test]
    fn test_config_backward_compatibility() {
        // Files written before geometry and showcase settings existed
        let old_config_json = r#"{
            "visibility_threshold": 0.75,
            "video_extensions": ["mp4"]
        }"#;

        let config: ReelConfig = serde_json::from_str(old_config_json).expect("Failed to parse old config");

        assert_eq!(config.visibility_threshold, 0.75);
        assert_eq!(config.video_extensions, vec!["mp4"]);
        assert_eq!(config.geometry.neighbor_offset, ReelConfig::default().geometry.neighbor_offset);
        assert_eq!(config.showcase.clip_seconds, ShowcaseConfig::default().clip_seconds);
    }

    #[test]
    fn test_load_creates_default_file() {
        let path = scratch_config_path();
        assert!(!path.exists());

        let config = ReelConfig::load_from(&path).expect("Failed to load config");
        assert!(path.exists());
        assert_eq!(config.visibility_threshold, 0.5);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_load_replaces_unparseable_file() {
        let path = scratch_config_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ not json").unwrap();

        let config = ReelConfig::load_from(&path).expect("Failed to load config");
        assert_eq!(config.visibility_threshold, 0.5);

        let rewritten = std::fs::read_to_string(&path).unwrap();
        assert!(serde_json::from_str::<ReelConfig>(&rewritten).is_ok());

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_load_clamps_out_of_range_values() {
        let path = scratch_config_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{ "visibility_threshold": 3.0, "video_extensions": [] }"#).unwrap();

        let config = ReelConfig::load_from(&path).expect("Failed to load config");
        assert_eq!(config.visibility_threshold, 1.0);
        assert_eq!(config.video_extensions.len(), 3);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_sanitized_replaces_non_finite_values() {
        let mut config = ReelConfig::default();
        config.visibility_threshold = f32::NAN;
        config.showcase.clip_seconds = f32::NAN;

        let config = config.sanitized();
        assert_eq!(config.visibility_threshold, ReelConfig::default().visibility_threshold);
        assert_eq!(config.showcase.clip_seconds, ReelConfig::default().showcase.clip_seconds);

        let mut config = ReelConfig::default();
        config.visibility_threshold = f32::INFINITY;
        config.showcase.clip_seconds = -2.0;

        let config = config.sanitized();
        assert_eq!(config.visibility_threshold, 0.5);
        assert_eq!(config.showcase.clip_seconds, 8.0);
    }
}
