//! Interchange Model Definitions
//!
//! A parsed interchange timeline as written by the export step: a root
//! stack of tracks, tracks holding clips and gaps, markers on clips and on
//! the root stack. Every node carries a free-form metadata map.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::CoreResult;

pub type Metadata = Map<String, Value>;

/// Named point on a clip or on the root stack
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub name: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Marker {
    pub fn new(name: &str, metadata: Metadata) -> Self {
        Self {
            name: name.to_string(),
            metadata,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InterchangeClip {
    pub name: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub markers: Vec<Marker>,
}

impl InterchangeClip {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            metadata: Metadata::new(),
            markers: vec![],
        }
    }

    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }
}

/// Child of a track
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum TrackItem {
    Clip(InterchangeClip),
    Gap {
        #[serde(default)]
        duration: i64,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterchangeTrackKind {
    #[default]
    Video,
    Audio,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InterchangeTrack {
    pub name: String,
    #[serde(default)]
    pub kind: InterchangeTrackKind,
    #[serde(default)]
    pub children: Vec<TrackItem>,
}

impl InterchangeTrack {
    pub fn video(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: InterchangeTrackKind::Video,
            children: vec![],
        }
    }

    pub fn audio(name: &str) -> Self {
        Self {
            kind: InterchangeTrackKind::Audio,
            ..Self::video(name)
        }
    }

    pub fn with_clip(mut self, clip: InterchangeClip) -> Self {
        self.children.push(TrackItem::Clip(clip));
        self
    }

    pub fn with_gap(mut self, duration: i64) -> Self {
        self.children.push(TrackItem::Gap { duration });
        self
    }

    pub fn clips(&self) -> impl Iterator<Item = &InterchangeClip> {
        self.children.iter().filter_map(|item| match item {
            TrackItem::Clip(clip) => Some(clip),
            TrackItem::Gap { .. } => None,
        })
    }
}

/// Root stack: the tracks plus timeline-wide markers
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Stack {
    #[serde(default)]
    pub markers: Vec<Marker>,
    #[serde(default)]
    pub children: Vec<InterchangeTrack>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InterchangeTimeline {
    pub name: String,
    /// Timeline-wide metadata; some exporters leave it empty
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub tracks: Stack,
}

impl InterchangeTimeline {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            metadata: Metadata::new(),
            tracks: Stack::default(),
        }
    }

    pub fn with_track(mut self, track: InterchangeTrack) -> Self {
        self.tracks.children.push(track);
        self
    }

    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.tracks.markers.push(marker);
        self
    }

    /// Timeline-wide markers
    pub fn markers(&self) -> &[Marker] {
        &self.tracks.markers
    }

    /// Video clips in clip-index order: tracks bottom-up, clips left to right
    pub fn video_clips(&self) -> impl Iterator<Item = &InterchangeClip> {
        self.tracks
            .children
            .iter()
            .filter(|t| t.kind == InterchangeTrackKind::Video)
            .flat_map(|t| t.clips())
    }

    pub fn from_json_str(content: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(content)?)
    }
}
