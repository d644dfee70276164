//! Shot Model Definitions
//!
//! `ShotDescriptor` is what gets persisted on a clip; `SubProduct` is the
//! per-consumer view (shot, review, plate) derived from it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::{ClipIndex, CreatorId, Frame, Resolution};

// =============================================================================
// Frame Data
// =============================================================================

/// Timing of a shot on the timeline, in the workfile and in its source
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameData {
    pub workfile_frame_start: Frame,
    pub handle_start: Frame,
    pub handle_end: Frame,
    /// Workfile range (inclusive)
    pub frame_start: Frame,
    pub frame_end: Frame,
    /// Timeline range (inclusive)
    pub clip_in: Frame,
    pub clip_out: Frame,
    pub clip_duration: Frame,
    /// Source media range (inclusive)
    pub source_in: Frame,
    pub source_out: Frame,
}

// =============================================================================
// Sub-Product Settings
// =============================================================================

/// Publishing settings of one sub-product, keyed by creator identifier
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubProductSettings {
    pub product_type: String,
    pub product_name: String,
    pub variant: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_track: Option<String>,
    #[serde(default)]
    pub audio: bool,
    /// Resolution comes from the clip's source instead of the timeline
    #[serde(default)]
    pub source_resolution: bool,
    #[serde(
        default,
        rename = "clip_source_resolution",
        skip_serializing_if = "Option::is_none"
    )]
    pub clip_source_resolution: Option<Resolution>,
}

// =============================================================================
// Shot Descriptor
// =============================================================================

/// Derived shot for one selected clip
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShotDescriptor {
    #[serde(rename = "clip_index")]
    pub clip_index: ClipIndex,
    pub shot_name: String,
    /// Parent hierarchy, e.g. `shots/sq01`
    pub hierarchy: String,
    /// Full folder path, e.g. `/shots/sq01/sh010`
    pub hierarchy_path: String,
    /// Resolved template fields (`folder`, `episode`, `sequence`, `track`, `shot`)
    pub hierarchy_data: BTreeMap<String, String>,
    pub frames: FrameData,
    /// False for clips synced under a hero-track clip
    pub hero_track: bool,
    /// Hero clip this one was synced to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_clip_index: Option<ClipIndex>,
    pub sub_products: BTreeMap<CreatorId, SubProductSettings>,
}

impl ShotDescriptor {
    /// Per-consumer views of this shot, ordered by creator identifier
    pub fn sub_product_views(&self) -> Vec<SubProduct> {
        self.sub_products
            .iter()
            .map(|(creator, settings)| SubProduct::from_descriptor(self, creator, settings))
            .collect()
    }

    /// Settings stored for a creator, if that sub-product exists
    pub fn settings_for(&self, creator_identifier: &str) -> Option<&SubProductSettings> {
        self.sub_products.get(creator_identifier)
    }
}

// =============================================================================
// Sub-Product
// =============================================================================

/// A shot as seen by one downstream consumer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubProduct {
    pub creator_identifier: CreatorId,
    #[serde(rename = "clip_index")]
    pub clip_index: ClipIndex,
    pub shot_name: String,
    pub hierarchy_path: String,
    pub label: String,
    pub settings: SubProductSettings,
}

impl SubProduct {
    pub fn from_descriptor(
        descriptor: &ShotDescriptor,
        creator_identifier: &str,
        settings: &SubProductSettings,
    ) -> Self {
        Self {
            creator_identifier: creator_identifier.to_string(),
            clip_index: descriptor.clip_index,
            shot_name: descriptor.shot_name.clone(),
            hierarchy_path: descriptor.hierarchy_path.clone(),
            label: format!("{} {}", descriptor.hierarchy_path, settings.product_type),
            settings: settings.clone(),
        }
    }
}

/// `plate` + `main` → `plateMain`
pub fn product_name(product_type: &str, variant: &str) -> String {
    let mut chars = variant.chars();
    match chars.next() {
        Some(first) => format!(
            "{}{}{}",
            product_type,
            first.to_uppercase(),
            chars.as_str()
        ),
        None => product_type.to_string(),
    }
}

// =============================================================================
// Tests
// =============================================================================
