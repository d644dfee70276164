//! Sub-Product Registry
//!
//! Tagged builders keyed by creator identifier. Each one turns the same
//! build input into its own `SubProductSettings`, or declines.

use std::collections::BTreeMap;

use crate::core::settings::CreatorSettings;
use crate::core::{CreatorId, Resolution};

use super::models::{product_name, SubProductSettings};

pub const SHOT_CREATOR: &str = "io.shotline.creators.shot";
pub const REVIEW_CREATOR: &str = "io.shotline.creators.review";
pub const PLATE_CREATOR: &str = "io.shotline.creators.plate";

/// What every sub-product builder sees
#[derive(Clone, Debug)]
pub struct SubProductInput<'a> {
    pub settings: &'a CreatorSettings,
    pub variant: &'a str,
    /// False for clips synced under a hero clip
    pub hero: bool,
    pub source_resolution: Option<&'a Resolution>,
}

impl SubProductInput<'_> {
    fn base(&self, product_type: &str, product_name: String) -> SubProductSettings {
        SubProductSettings {
            product_type: product_type.to_string(),
            product_name,
            variant: self.variant.to_string(),
            review_track: None,
            audio: false,
            source_resolution: self.settings.source_resolution,
            clip_source_resolution: self.source_resolution.cloned(),
        }
    }
}

pub type SubProductBuildFn = fn(&SubProductInput<'_>) -> Option<SubProductSettings>;

/// Ordered set of sub-product builders
#[derive(Clone)]
pub struct SubProductRegistry {
    builders: Vec<(CreatorId, SubProductBuildFn)>,
}

impl SubProductRegistry {
    /// Registry with no builders
    pub fn empty() -> Self {
        Self { builders: vec![] }
    }

    /// Shot, review and plate builders
    pub fn standard() -> Self {
        Self::empty()
            .register(SHOT_CREATOR, build_shot)
            .register(REVIEW_CREATOR, build_review)
            .register(PLATE_CREATOR, build_plate)
    }

    /// Adds a builder; a later registration under the same identifier replaces
    /// the earlier one
    pub fn register(mut self, creator_identifier: &str, build: SubProductBuildFn) -> Self {
        self.builders.retain(|(id, _)| id != creator_identifier);
        self.builders.push((creator_identifier.to_string(), build));
        self
    }

    pub fn identifiers(&self) -> Vec<&str> {
        self.builders.iter().map(|(id, _)| id.as_str()).collect()
    }

    pub fn contains(&self, creator_identifier: &str) -> bool {
        self.builders.iter().any(|(id, _)| id == creator_identifier)
    }

    /// Runs every builder against `input`
    pub fn build_all(&self, input: &SubProductInput<'_>) -> BTreeMap<CreatorId, SubProductSettings> {
        self.builders
            .iter()
            .filter_map(|(id, build)| build(input).map(|settings| (id.clone(), settings)))
            .collect()
    }
}

impl Default for SubProductRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for SubProductRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubProductRegistry")
            .field("builders", &self.identifiers())
            .finish()
    }
}

// =============================================================================
// Standard Builders
// =============================================================================

fn build_shot(input: &SubProductInput<'_>) -> Option<SubProductSettings> {
    if !input.hero {
        return None;
    }
    Some(input.base("shot", "shotMain".to_string()))
}

fn build_review(input: &SubProductInput<'_>) -> Option<SubProductSettings> {
    if !input.hero {
        return None;
    }
    let mut settings = input.base("review", product_name("review", input.variant));
    settings.review_track = input.settings.review_track().map(str::to_string);
    settings.audio = input.settings.audio;
    Some(settings)
}

fn build_plate(input: &SubProductInput<'_>) -> Option<SubProductSettings> {
    let product_type = input.settings.product_type.as_str();
    let mut settings = input.base(product_type, product_name(product_type, input.variant));
    settings.audio = input.settings.audio;
    Some(settings)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn input(settings: &CreatorSettings, hero: bool) -> SubProductInput<'_> {
        SubProductInput {
            settings,
            variant: "main",
            hero,
            source_resolution: None,
        }
    }

    #[test]
    fn test_standard_registry_for_hero_clip() {
        let settings = CreatorSettings {
            review_track: "V2".to_string(),
            audio: true,
            ..CreatorSettings::default()
        };
        let built = SubProductRegistry::standard().build_all(&input(&settings, true));

        assert_eq!(built.len(), 3);
        assert_eq!(built[SHOT_CREATOR].product_name, "shotMain");

        let review = &built[REVIEW_CREATOR];
        assert_eq!(review.product_name, "reviewMain");
        assert_eq!(review.review_track.as_deref(), Some("V2"));
        assert!(review.audio);

        assert_eq!(built[PLATE_CREATOR].product_name, "plateMain");
    }

    #[test]
    fn test_synced_clip_only_gets_plate() {
        let settings = CreatorSettings::default();
        let built = SubProductRegistry::standard().build_all(&input(&settings, false));
        assert_eq!(built.keys().collect::<Vec<_>>(), vec![PLATE_CREATOR]);
    }

    #[test]
    fn test_review_disabled_sentinel() {
        let settings = CreatorSettings::default();
        let built = SubProductRegistry::standard().build_all(&input(&settings, true));
        assert!(built[REVIEW_CREATOR].review_track.is_none());
    }

    #[test]
    fn test_source_resolution_carried_on_every_product() {
        let settings = CreatorSettings {
            source_resolution: true,
            ..CreatorSettings::default()
        };
        let res = Resolution::new(2048, 858, 2.0);
        let built = SubProductRegistry::standard().build_all(&SubProductInput {
            settings: &settings,
            variant: "main",
            hero: true,
            source_resolution: Some(&res),
        });
        for product in built.values() {
            assert!(product.source_resolution);
            assert_eq!(product.clip_source_resolution.as_ref(), Some(&res));
        }
    }

    #[test]
    fn test_register_replaces_existing() {
        fn audio_only(input: &SubProductInput<'_>) -> Option<SubProductSettings> {
            Some(input.base("audio", "audioMain".to_string()))
        }

        let registry = SubProductRegistry::empty()
            .register(PLATE_CREATOR, build_plate)
            .register(PLATE_CREATOR, audio_only);
        assert_eq!(registry.identifiers(), vec![PLATE_CREATOR]);

        let settings = CreatorSettings::default();
        let built = registry.build_all(&input(&settings, true));
        assert_eq!(built[PLATE_CREATOR].product_type, "audio");
    }
}
