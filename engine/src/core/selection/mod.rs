//! Track Item Selector
//!
//! Picks the clips a run works on and orders them for vertical sync:
//! hero-track clips first, everything else after, each group keeping the
//! timeline's own order.

use tracing::debug;

use crate::core::annotations::has_shot_annotation;
use crate::core::timeline::{
    ClipColor, ClipHandle, Timeline, PUBLISH_CLIP_COLOR, SELECTION_CLIP_COLOR,
};
use crate::core::{ClipIndex, CoreError, CoreResult};

// =============================================================================
// Filter
// =============================================================================

/// Predicate deciding which clips take part in a run
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClipFilter {
    /// Every clip on every video track
    All,
    /// Clips tagged with the given color
    Color(ClipColor),
    /// Clips already carrying a shot annotation
    Annotated,
    /// Annotated clips still tagged with the publish color
    Published,
}

impl ClipFilter {
    /// Filter used by the create stage for a `useSelection` flag
    pub fn for_selection(use_selection: bool) -> Self {
        if use_selection {
            ClipFilter::Color(SELECTION_CLIP_COLOR)
        } else {
            ClipFilter::All
        }
    }

    fn matches(&self, timeline: &Timeline, handle: ClipHandle) -> bool {
        let Some(clip) = timeline.clip(handle) else {
            return false;
        };
        match self {
            ClipFilter::All => true,
            ClipFilter::Color(color) => clip.color == Some(*color),
            ClipFilter::Annotated => has_shot_annotation(clip),
            ClipFilter::Published => {
                clip.color == Some(PUBLISH_CLIP_COLOR) && has_shot_annotation(clip)
            }
        }
    }

    fn describe(&self) -> String {
        match self {
            ClipFilter::All => "any clip".to_string(),
            ClipFilter::Color(color) => format!("{:?}-colored clips", color),
            ClipFilter::Annotated => "annotated clips".to_string(),
            ClipFilter::Published => "published clips".to_string(),
        }
    }
}

// =============================================================================
// Selection
// =============================================================================

/// A clip chosen for processing
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectedClip {
    pub clip_index: ClipIndex,
    pub handle: ClipHandle,
    pub track_name: String,
}

/// Selects and orders clips from `timeline`.
///
/// With `require_match`, an empty result is a configuration error; without
/// it an empty result is returned as-is. `hero_track` of `None` (or empty)
/// keeps timeline order.
pub fn select(
    timeline: &Timeline,
    filter: &ClipFilter,
    require_match: bool,
    hero_track: Option<&str>,
) -> CoreResult<Vec<SelectedClip>> {
    let selected: Vec<SelectedClip> = timeline
        .clip_handles()
        .filter(|(_, handle)| filter.matches(timeline, *handle))
        .filter_map(|(clip_index, handle)| {
            timeline.track(handle).map(|track| SelectedClip {
                clip_index,
                handle,
                track_name: track.name.clone(),
            })
        })
        .collect();

    if selected.is_empty() && require_match {
        return Err(CoreError::NoMatchingClips(format!(
            "No {} found on timeline {}. Try changing clip(s) color or disable clip color restriction.",
            filter.describe(),
            timeline.name
        )));
    }

    debug!(
        "Selected {} clip(s) on timeline {} ({})",
        selected.len(),
        timeline.name,
        filter.describe()
    );

    Ok(order_by_hero_track(selected, hero_track))
}

/// Stable partition: hero-track clips first, then the rest
pub fn order_by_hero_track(
    clips: Vec<SelectedClip>,
    hero_track: Option<&str>,
) -> Vec<SelectedClip> {
    let Some(hero) = hero_track.filter(|h| !h.is_empty()) else {
        return clips;
    };

    let (mut hero_clips, others): (Vec<_>, Vec<_>) =
        clips.into_iter().partition(|c| c.track_name == hero);
    hero_clips.extend(others);
    hero_clips
}

// =============================================================================
// Tests
// =============================================================================
