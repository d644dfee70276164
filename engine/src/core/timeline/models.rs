//! Timeline Model Definitions
//!
//! Host-side editorial structure: Timeline, Track, Clip and the media pool.
//! This is a snapshot of what the host editor exposes through its scripting
//! API; the pipeline only reads structure and writes color, name and the
//! per-item metadata blob.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::bins::MediaPool;
use crate::core::{ClipIndex, Frame, Resolution};

// =============================================================================
// Clip Color
// =============================================================================

/// Host clip color tags
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClipColor {
    Orange,
    Apricot,
    Yellow,
    Lime,
    Olive,
    Green,
    Teal,
    Navy,
    Blue,
    Purple,
    Violet,
    Pink,
    Tan,
    Beige,
    Brown,
    Chocolate,
}

/// Color marking clips the user wants turned into shots
pub const SELECTION_CLIP_COLOR: ClipColor = ClipColor::Chocolate;

/// Color assigned to clips once they carry a shot annotation
pub const PUBLISH_CLIP_COLOR: ClipColor = ClipColor::Pink;

impl std::str::FromStr for ClipColor {
    type Err = String;

    /// Parse color from string (case-insensitive)
    fn from_str(s: &str) -> Result<ClipColor, Self::Err> {
        match s.to_lowercase().as_str() {
            "orange" => Ok(ClipColor::Orange),
            "apricot" => Ok(ClipColor::Apricot),
            "yellow" => Ok(ClipColor::Yellow),
            "lime" => Ok(ClipColor::Lime),
            "olive" => Ok(ClipColor::Olive),
            "green" => Ok(ClipColor::Green),
            "teal" => Ok(ClipColor::Teal),
            "navy" => Ok(ClipColor::Navy),
            "blue" => Ok(ClipColor::Blue),
            "purple" => Ok(ClipColor::Purple),
            "violet" => Ok(ClipColor::Violet),
            "pink" => Ok(ClipColor::Pink),
            "tan" => Ok(ClipColor::Tan),
            "beige" => Ok(ClipColor::Beige),
            "brown" => Ok(ClipColor::Brown),
            "chocolate" => Ok(ClipColor::Chocolate),
            _ => Err(format!("Unknown clip color: {}", s)),
        }
    }
}

// =============================================================================
// Media Source
// =============================================================================

/// Source media behind a clip (the host's media pool item)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaSource {
    pub name: String,
    /// First used frame within the source
    pub source_in: Frame,
    /// Last used frame within the source (exclusive)
    pub source_out: Frame,
    /// Native resolution of the source, when the host reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
}

// =============================================================================
// Clip
// =============================================================================

/// Clip (placed media occurrence on a track)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    pub name: String,
    /// Timeline start frame
    pub start: Frame,
    /// Timeline end frame (exclusive)
    pub end: Frame,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<ClipColor>,
    /// Generators, titles and offline items have no source media
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaSource>,
    /// Host key/value metadata slots
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl Clip {
    /// Creates a clip spanning `start..end` on the timeline
    pub fn new(name: &str, start: Frame, end: Frame) -> Self {
        Self {
            name: name.to_string(),
            start,
            end,
            color: None,
            media: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Attaches source media covering the clip's duration from `source_in`
    pub fn with_media(mut self, source_name: &str, source_in: Frame) -> Self {
        self.media = Some(MediaSource {
            name: source_name.to_string(),
            source_in,
            source_out: source_in + self.duration(),
            resolution: None,
        });
        self
    }

    /// Sets the source resolution (requires media)
    pub fn with_source_resolution(mut self, resolution: Resolution) -> Self {
        if let Some(media) = self.media.as_mut() {
            media.resolution = Some(resolution);
        }
        self
    }

    pub fn with_color(mut self, color: ClipColor) -> Self {
        self.color = Some(color);
        self
    }

    /// Duration in frames
    pub fn duration(&self) -> Frame {
        (self.end - self.start).max(0)
    }

    /// Whether this clip's range lies within `other`'s range
    pub fn is_within(&self, other: &Clip) -> bool {
        self.start >= other.start && self.end <= other.end
    }
}

// =============================================================================
// Track
// =============================================================================

/// Track type/kind enumeration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrackKind {
    Video,
    Audio,
}

/// Track (contains clips in timeline order)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub name: String,
    pub kind: TrackKind,
    #[serde(default)]
    pub clips: Vec<Clip>,
}

impl Track {
    pub fn new(name: &str, kind: TrackKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            clips: vec![],
        }
    }

    pub fn new_video(name: &str) -> Self {
        Self::new(name, TrackKind::Video)
    }

    pub fn new_audio(name: &str) -> Self {
        Self::new(name, TrackKind::Audio)
    }

    pub fn add_clip(&mut self, clip: Clip) {
        self.clips.push(clip);
    }

    pub fn with_clip(mut self, clip: Clip) -> Self {
        self.clips.push(clip);
        self
    }

    /// Returns true if this is a video track
    pub fn is_video(&self) -> bool {
        matches!(self.kind, TrackKind::Video)
    }
}

// =============================================================================
// Clip Handle
// =============================================================================

/// Live reference to a clip inside a [`Timeline`].
///
/// Runtime-only: never persisted, re-attached by `clip_index` on collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ClipHandle {
    pub track: usize,
    pub item: usize,
}

// =============================================================================
// Timeline
// =============================================================================

/// Timeline (sequence of tracks)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    pub name: String,
    pub fps: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
    #[serde(default)]
    pub tracks: Vec<Track>,
    /// Host key/value metadata slots of the timeline's own pool item
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl Timeline {
    pub fn new(name: &str, fps: f64) -> Self {
        Self {
            name: name.to_string(),
            fps,
            resolution: None,
            tracks: vec![],
            metadata: BTreeMap::new(),
        }
    }

    pub fn add_track(&mut self, track: Track) {
        self.tracks.push(track);
    }

    pub fn with_track(mut self, track: Track) -> Self {
        self.tracks.push(track);
        self
    }

    /// Enumerates video clips in timeline order: tracks bottom-up, then
    /// clips left to right. The position in this sequence is the clip index.
    pub fn clip_handles(&self) -> impl Iterator<Item = (ClipIndex, ClipHandle)> + '_ {
        self.tracks
            .iter()
            .enumerate()
            .filter(|(_, track)| track.is_video())
            .flat_map(|(track_idx, track)| {
                (0..track.clips.len()).map(move |item| ClipHandle {
                    track: track_idx,
                    item,
                })
            })
            .enumerate()
    }

    /// Resolves a clip index back to its live handle
    pub fn handle_for_index(&self, clip_index: ClipIndex) -> Option<ClipHandle> {
        self.clip_handles()
            .find(|(index, _)| *index == clip_index)
            .map(|(_, handle)| handle)
    }

    pub fn clip(&self, handle: ClipHandle) -> Option<&Clip> {
        self.tracks.get(handle.track)?.clips.get(handle.item)
    }

    pub fn clip_mut(&mut self, handle: ClipHandle) -> Option<&mut Clip> {
        self.tracks.get_mut(handle.track)?.clips.get_mut(handle.item)
    }

    pub fn track(&self, handle: ClipHandle) -> Option<&Track> {
        self.tracks.get(handle.track)
    }

    /// Names of all video tracks, bottom-up
    pub fn video_track_names(&self) -> Vec<String> {
        self.tracks
            .iter()
            .filter(|t| t.is_video())
            .map(|t| t.name.clone())
            .collect()
    }
}

// =============================================================================
// Host Project
// =============================================================================

/// What the host editor has open: an optional current timeline plus the
/// media pool it lives in.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostProject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline: Option<Timeline>,
    #[serde(default)]
    pub media_pool: MediaPool,
}

impl HostProject {
    pub fn with_timeline(timeline: Timeline) -> Self {
        Self {
            timeline: Some(timeline),
            media_pool: MediaPool::default(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
