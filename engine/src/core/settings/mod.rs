//! Creator Settings
//!
//! The flat option mapping consumed by the template resolver and the shot
//! builder. Keys follow the host's preset names (`clipName`, `vSyncOn`, ...).
//!
//! Loading is tolerant: unknown keys are ignored, missing keys take defaults
//! and out-of-range values are corrected by [`CreatorSettings::normalize`].

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::template::ShotCounter;
use crate::core::{fs, CoreError, CoreResult};

/// Review track value meaning "no review product"
pub const REVIEW_TRACK_DISABLED: &str = "< none >";

/// Variant value meaning "use the clip's track name"
pub const VARIANT_FROM_TRACK: &str = "<track_name>";

/// Creator settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreatorSettings {
    /// Only consider clips carrying the selection color
    #[serde(default = "default_true", alias = "use_selection")]
    pub use_selection: bool,

    // -------------------------------------------------------------------------
    // Hierarchy and rename
    // -------------------------------------------------------------------------
    /// Parent hierarchy template
    #[serde(default = "default_hierarchy")]
    pub hierarchy: String,
    /// Rename clips to their shot name
    #[serde(default)]
    pub clip_rename: bool,
    /// Shot name template
    #[serde(default = "default_clip_name")]
    pub clip_name: String,
    #[serde(default = "default_count")]
    pub count_from: i64,
    #[serde(default = "default_count")]
    pub count_steps: i64,

    // -------------------------------------------------------------------------
    // Hierarchy data fields
    // -------------------------------------------------------------------------
    #[serde(default = "default_folder")]
    pub folder: String,
    #[serde(default = "default_episode")]
    pub episode: String,
    #[serde(default = "default_sequence")]
    pub sequence: String,
    #[serde(default = "default_track")]
    pub track: String,
    #[serde(default = "default_shot")]
    pub shot: String,

    // -------------------------------------------------------------------------
    // Vertical sync
    // -------------------------------------------------------------------------
    #[serde(default = "default_true")]
    pub v_sync_on: bool,
    /// Hero track name
    #[serde(default)]
    pub v_sync_track: String,

    // -------------------------------------------------------------------------
    // Publish settings
    // -------------------------------------------------------------------------
    #[serde(default = "default_variant")]
    pub variant: String,
    #[serde(default = "default_product_type")]
    pub product_type: String,
    #[serde(default = "default_review_track")]
    pub review_track: String,
    #[serde(default)]
    pub audio: bool,
    /// Take resolution from the source media instead of the timeline
    #[serde(default)]
    pub source_resolution: bool,

    // -------------------------------------------------------------------------
    // Shot attributes
    // -------------------------------------------------------------------------
    #[serde(default = "default_workfile_frame_start")]
    pub workfile_frame_start: i64,
    #[serde(default)]
    pub handle_start: i64,
    #[serde(default)]
    pub handle_end: i64,
}

fn default_true() -> bool {
    true
}

fn default_hierarchy() -> String {
    "{folder}/{sequence}".to_string()
}

fn default_clip_name() -> String {
    "{sequence}{shot}".to_string()
}

fn default_count() -> i64 {
    10
}

fn default_folder() -> String {
    "shots".to_string()
}

fn default_episode() -> String {
    "ep01".to_string()
}

fn default_sequence() -> String {
    "sq01".to_string()
}

fn default_track() -> String {
    "{_track_}".to_string()
}

fn default_shot() -> String {
    "sh###".to_string()
}

fn default_variant() -> String {
    VARIANT_FROM_TRACK.to_string()
}

fn default_product_type() -> String {
    "plate".to_string()
}

fn default_review_track() -> String {
    REVIEW_TRACK_DISABLED.to_string()
}

fn default_workfile_frame_start() -> i64 {
    1001
}

impl Default for CreatorSettings {
    fn default() -> Self {
        Self {
            use_selection: true,
            hierarchy: default_hierarchy(),
            clip_rename: false,
            clip_name: default_clip_name(),
            count_from: default_count(),
            count_steps: default_count(),
            folder: default_folder(),
            episode: default_episode(),
            sequence: default_sequence(),
            track: default_track(),
            shot: default_shot(),
            v_sync_on: true,
            v_sync_track: String::new(),
            variant: default_variant(),
            product_type: default_product_type(),
            review_track: default_review_track(),
            audio: false,
            source_resolution: false,
            workfile_frame_start: default_workfile_frame_start(),
            handle_start: 0,
            handle_end: 0,
        }
    }
}

impl CreatorSettings {
    /// Normalizes values so a run always sees usable settings. Corrects
    /// instead of failing.
    pub fn normalize(&mut self) {
        if self.count_steps < 1 {
            warn!("countSteps {} is not positive, using 1", self.count_steps);
            self.count_steps = 1;
        }
        self.handle_start = self.handle_start.max(0);
        self.handle_end = self.handle_end.max(0);

        fill_blank(&mut self.hierarchy, default_hierarchy);
        fill_blank(&mut self.clip_name, default_clip_name);
        fill_blank(&mut self.shot, default_shot);
        fill_blank(&mut self.variant, default_variant);
        fill_blank(&mut self.product_type, default_product_type);

        self.v_sync_track = self.v_sync_track.trim().to_string();
        if self.review_track.trim().is_empty() {
            self.review_track = default_review_track();
        }
    }

    /// Parses settings from JSON and normalizes them
    pub fn from_json_str(content: &str) -> CoreResult<Self> {
        let mut settings: CreatorSettings = serde_json::from_str(content)
            .map_err(|e| CoreError::InvalidSettings(e.to_string()))?;
        settings.normalize();
        Ok(settings)
    }

    /// Loads settings from disk, returning defaults if the file doesn't exist
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            info!("Settings file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Saves normalized settings to disk
    pub fn save(&self, path: &Path) -> CoreResult<()> {
        let mut normalized = self.clone();
        normalized.normalize();
        fs::atomic_write_json_pretty(path, &normalized)
    }

    /// Hero track driving vertical sync, if enabled
    pub fn hero_track(&self) -> Option<&str> {
        if self.v_sync_on && !self.v_sync_track.is_empty() {
            Some(self.v_sync_track.as_str())
        } else {
            None
        }
    }

    /// Review track name, or `None` when review is disabled
    pub fn review_track(&self) -> Option<&str> {
        let track = self.review_track.trim();
        if track.is_empty() || track == REVIEW_TRACK_DISABLED {
            None
        } else {
            Some(track)
        }
    }

    /// Product variant for a clip on `track_name`
    pub fn variant_for(&self, track_name: &str) -> String {
        if self.variant == VARIANT_FROM_TRACK {
            track_name.to_string()
        } else {
            self.variant.clone()
        }
    }

    /// Counter seeded for a fresh selection pass
    pub fn shot_counter(&self) -> ShotCounter {
        ShotCounter::new(self.count_from, self.count_steps)
    }

    /// Static hierarchy data fields, in resolution order
    pub fn hierarchy_fields(&self) -> [(&'static str, &str); 5] {
        [
            ("folder", self.folder.as_str()),
            ("episode", self.episode.as_str()),
            ("sequence", self.sequence.as_str()),
            ("track", self.track.as_str()),
            ("shot", self.shot.as_str()),
        ]
    }
}

fn fill_blank(value: &mut String, default: fn() -> String) {
    if value.trim().is_empty() {
        *value = default();
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = CreatorSettings::default();
        assert_eq!(settings.hierarchy, "{folder}/{sequence}");
        assert_eq!(settings.clip_name, "{sequence}{shot}");
        assert_eq!(settings.count_from, 10);
        assert_eq!(settings.count_steps, 10);
        assert_eq!(settings.workfile_frame_start, 1001);
        assert!(settings.review_track().is_none());
        assert!(settings.hero_track().is_none());
    }

    #[test]
    fn test_parse_host_keys() {
        let settings = CreatorSettings::from_json_str(
            r#"{
                "hierarchy": "{folder}/{episode}",
                "clipRename": true,
                "countFrom": 100,
                "countSteps": 5,
                "vSyncOn": true,
                "vSyncTrack": "V1",
                "reviewTrack": "V2",
                "sourceResolution": true,
                "handleStart": 8,
                "use_selection": false,
                "somethingElse": 1
            }"#,
        )
        .unwrap();

        assert_eq!(settings.hierarchy, "{folder}/{episode}");
        assert!(settings.clip_rename);
        assert_eq!(settings.shot_counter().value(), 100);
        assert_eq!(settings.shot_counter().step(), 5);
        assert_eq!(settings.hero_track(), Some("V1"));
        assert_eq!(settings.review_track(), Some("V2"));
        assert!(settings.source_resolution);
        assert_eq!(settings.handle_start, 8);
        assert!(!settings.use_selection);
        assert_eq!(settings.folder, "shots");
    }

    #[test]
    fn test_hero_track_requires_v_sync() {
        let settings = CreatorSettings {
            v_sync_on: false,
            v_sync_track: "V1".to_string(),
            ..CreatorSettings::default()
        };
        assert!(settings.hero_track().is_none());
    }

    #[test]
    fn test_normalize_corrects_bad_values() {
        let mut settings = CreatorSettings {
            count_steps: 0,
            handle_start: -4,
            shot: "  ".to_string(),
            review_track: String::new(),
            v_sync_track: " V1 ".to_string(),
            ..CreatorSettings::default()
        };
        settings.normalize();

        assert_eq!(settings.count_steps, 1);
        assert_eq!(settings.handle_start, 0);
        assert_eq!(settings.shot, "sh###");
        assert_eq!(settings.review_track, REVIEW_TRACK_DISABLED);
        assert_eq!(settings.v_sync_track, "V1");
    }

    #[test]
    fn test_invalid_json_is_settings_error() {
        let err = CreatorSettings::from_json_str("{not json").unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_variant_for() {
        let mut settings = CreatorSettings::default();
        assert_eq!(settings.variant_for("V2"), "V2");
        settings.variant = "main".to_string();
        assert_eq!(settings.variant_for("V2"), "main");
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = CreatorSettings::load(&dir.path().join("settings.json")).unwrap();
        assert_eq!(settings, CreatorSettings::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");

        let settings = CreatorSettings {
            clip_name: "{episode}_{shot}".to_string(),
            count_steps: -1,
            ..CreatorSettings::default()
        };
        settings.save(&path).unwrap();

        let loaded = CreatorSettings::load(&path).unwrap();
        assert_eq!(loaded.clip_name, "{episode}_{shot}");
        assert_eq!(loaded.count_steps, 1);

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"vSyncOn\""));
        assert!(raw.contains("\"workfileFrameStart\""));
    }
}
