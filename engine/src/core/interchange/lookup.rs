//! Clip lookup by `clip_index` and data marker unwrapping.

use serde_json::Value;
use tracing::debug;

use crate::core::ClipIndex;

use super::models::{InterchangeClip, InterchangeTimeline, Marker, Metadata};

/// Name of markers carrying pipeline data, on clips and on the root stack
pub const DATA_MARKER_NAME: &str = "ShotlineData";

/// Metadata key some exporters nest marker payloads under
pub const HOST_METADATA_KEY: &str = "host";
pub const HOST_NOTE_KEY: &str = "note";

/// An interchange clip matched to a shot
#[derive(Clone, Debug, PartialEq)]
pub struct ClipMatch<'a> {
    pub clip: &'a InterchangeClip,
    /// The clip's data marker, unwrapped
    pub marker: Option<Marker>,
}

impl ClipMatch<'_> {
    /// Marker metadata, or an empty map when the clip has no data marker
    pub fn marker_metadata(&self) -> Metadata {
        self.marker
            .as_ref()
            .map(|m| m.metadata.clone())
            .unwrap_or_default()
    }
}

/// Returns a copy of `marker` with a payload stored as a JSON string under
/// `host.note` lifted into plain metadata. Other markers come back as-is.
pub fn unwrap_marker(marker: &Marker) -> Marker {
    let note = marker
        .metadata
        .get(HOST_METADATA_KEY)
        .and_then(|host| host.get(HOST_NOTE_KEY))
        .and_then(Value::as_str);

    let Some(note) = note else {
        return marker.clone();
    };
    match serde_json::from_str::<Value>(note) {
        Ok(Value::Object(metadata)) => Marker::new(&marker.name, metadata),
        _ => {
            debug!("Marker {} note is not a JSON object, keeping it wrapped", marker.name);
            marker.clone()
        }
    }
}

/// First data marker on `clip`, unwrapped
pub fn data_marker(clip: &InterchangeClip) -> Option<Marker> {
    clip.markers
        .iter()
        .find(|m| m.name == DATA_MARKER_NAME)
        .map(unwrap_marker)
}

fn marker_clip_index(marker: &Marker) -> Option<ClipIndex> {
    marker
        .metadata
        .get("clip_index")
        .and_then(|v| {
            v.as_u64()
                .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
        })
        .and_then(|v| usize::try_from(v).ok())
}

/// Finds the interchange clip for `clip_index`.
///
/// A clip whose data marker records that `clip_index` wins; otherwise the
/// clip at that position among video clips is used.
pub fn find_clip_by_index(
    timeline: &InterchangeTimeline,
    clip_index: ClipIndex,
) -> Option<ClipMatch<'_>> {
    let tagged = timeline.video_clips().find_map(|clip| {
        data_marker(clip)
            .filter(|m| marker_clip_index(m) == Some(clip_index))
            .map(|marker| ClipMatch {
                clip,
                marker: Some(marker),
            })
    });
    if tagged.is_some() {
        return tagged;
    }

    timeline.video_clips().nth(clip_index).map(|clip| ClipMatch {
        clip,
        marker: data_marker(clip),
    })
}

/// Timeline-wide data markers, unwrapped
pub fn timeline_data_markers(timeline: &InterchangeTimeline) -> impl Iterator<Item = Marker> + '_ {
    timeline
        .markers()
        .iter()
        .filter(|m| m.name == DATA_MARKER_NAME)
        .map(unwrap_marker)
}

// =============================================================================
// Tests
// =============================================================================
