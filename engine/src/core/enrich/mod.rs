//! Metadata Enrichment Pass
//!
//! Matches collected shots to the interchange timeline and fills in what the
//! publish stage needs: resolution, frame rate, folder path and families.
//!
//! Resolution comes from the first source that yields width, height and
//! pixel aspect together. Sources are never merged:
//!
//! 1. the sub-product's own source resolution, when `sourceResolution` is set
//! 2. the interchange timeline's metadata
//! 3. a timeline-wide data marker
//!
//! When none yields, the shot fails with [`CoreError::MissingResolution`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::core::interchange::{find_clip_by_index, timeline_data_markers, InterchangeTimeline};
use crate::core::shots::{ShotDescriptor, SubProductSettings, PLATE_CREATOR, SHOT_CREATOR};
use crate::core::{ClipIndex, CoreError, CoreResult, CreatorId, Resolution};

/// Family added to plate records
pub const CLIP_FAMILY: &str = "clip";

/// Marker key holding sub-product settings written at export time
pub const MARKER_SUB_PRODUCTS_KEY: &str = "subProducts";

// =============================================================================
// Resolution Metadata
// =============================================================================

/// Where a shot's resolution came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResolutionSource {
    ClipOverride,
    TimelineMetadata,
    DataMarker,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionMetadata {
    #[serde(flatten)]
    pub resolution: Resolution,
    pub fps: f64,
    pub source: ResolutionSource,
}

/// Picks the resolution for one sub-product
pub fn resolve_resolution(
    settings: &SubProductSettings,
    timeline: &InterchangeTimeline,
) -> Option<(Resolution, ResolutionSource)> {
    if settings.source_resolution {
        match settings.clip_source_resolution.clone() {
            Some(resolution) => return Some((resolution, ResolutionSource::ClipOverride)),
            None => debug!("sourceResolution set but no clip resolution stored"),
        }
    }

    if let Some(resolution) = Resolution::from_metadata(&timeline.metadata) {
        return Some((resolution, ResolutionSource::TimelineMetadata));
    }

    timeline_data_markers(timeline)
        .find_map(|marker| Resolution::from_metadata(&marker.metadata))
        .map(|resolution| (resolution, ResolutionSource::DataMarker))
}

// =============================================================================
// Enriched Shot
// =============================================================================

/// A sub-product ready for publishing
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedShot {
    pub creator_identifier: CreatorId,
    #[serde(rename = "clip_index")]
    pub clip_index: ClipIndex,
    pub shot_name: String,
    pub folder_path: String,
    pub product_type: String,
    pub product_name: String,
    pub variant: String,
    pub families: Vec<String>,
    /// False for shot records, which carry no representation
    pub integrate: bool,
    /// Name of the matched interchange clip
    pub interchange_clip: String,
    #[serde(flatten)]
    pub metadata: ResolutionMetadata,
}

/// Enriches one sub-product of `descriptor`.
///
/// Settings stored on the clip's data marker take precedence over the
/// descriptor's own. `fps` is the owning timeline's rate.
pub fn enrich(
    descriptor: &ShotDescriptor,
    creator_identifier: &str,
    timeline: &InterchangeTimeline,
    fps: f64,
) -> CoreResult<EnrichedShot> {
    let matched = find_clip_by_index(timeline, descriptor.clip_index)
        .ok_or(CoreError::InterchangeClipNotFound(descriptor.clip_index))?;

    let settings = marker_settings(&matched.marker_metadata(), creator_identifier)
        .or_else(|| descriptor.settings_for(creator_identifier).cloned())
        .ok_or_else(|| {
            CoreError::Configuration(format!(
                "Shot {} has no {} sub-product",
                descriptor.shot_name, creator_identifier
            ))
        })?;

    let (resolution, source) = resolve_resolution(&settings, timeline).ok_or(
        CoreError::MissingResolution {
            clip_index: descriptor.clip_index,
        },
    )?;

    let mut families = vec![settings.product_type.clone()];
    if creator_identifier == PLATE_CREATOR {
        families.push(CLIP_FAMILY.to_string());
    }

    debug!(
        "Shot {} ({}) resolution {}x{} from {:?}",
        descriptor.shot_name, creator_identifier, resolution.width, resolution.height, source
    );

    Ok(EnrichedShot {
        creator_identifier: creator_identifier.to_string(),
        clip_index: descriptor.clip_index,
        shot_name: descriptor.shot_name.clone(),
        folder_path: descriptor.hierarchy_path.clone(),
        product_type: settings.product_type,
        product_name: settings.product_name,
        variant: settings.variant,
        families,
        integrate: creator_identifier != SHOT_CREATOR,
        interchange_clip: matched.clip.name.clone(),
        metadata: ResolutionMetadata {
            resolution,
            fps,
            source,
        },
    })
}

fn marker_settings(
    metadata: &serde_json::Map<String, Value>,
    creator_identifier: &str,
) -> Option<SubProductSettings> {
    let raw = metadata.get(MARKER_SUB_PRODUCTS_KEY)?.get(creator_identifier)?;
    match serde_json::from_value(raw.clone()) {
        Ok(settings) => Some(settings),
        Err(e) => {
            warn!(
                "Ignoring marker settings for {}: {}",
                creator_identifier, e
            );
            None
        }
    }
}

// =============================================================================
// Batch
// =============================================================================

/// A sub-product that could not be enriched
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichFailure {
    pub creator_identifier: CreatorId,
    #[serde(rename = "clip_index")]
    pub clip_index: ClipIndex,
    pub message: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichReport {
    pub enriched: Vec<EnrichedShot>,
    pub failures: Vec<EnrichFailure>,
}

/// Enriches every sub-product of every descriptor.
///
/// Per-item failures are logged and reported; anything else aborts.
pub fn enrich_all(
    descriptors: &[ShotDescriptor],
    timeline: &InterchangeTimeline,
    fps: f64,
) -> CoreResult<EnrichReport> {
    let mut report = EnrichReport::default();

    for descriptor in descriptors {
        for creator_identifier in descriptor.sub_products.keys() {
            match enrich(descriptor, creator_identifier, timeline, fps) {
                Ok(shot) => report.enriched.push(shot),
                Err(e) if e.is_item_error() => {
                    warn!(
                        "Skipping {} for shot {}: {}",
                        creator_identifier, descriptor.shot_name, e
                    );
                    report.failures.push(EnrichFailure {
                        creator_identifier: creator_identifier.clone(),
                        clip_index: descriptor.clip_index,
                        message: e.to_user_message(),
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }

    info!(
        "Enriched {} sub-product(s), {} failed",
        report.enriched.len(),
        report.failures.len()
    );
    Ok(report)
}

// =============================================================================
// Tests
// =============================================================================
