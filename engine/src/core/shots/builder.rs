//! Shot Descriptor Builder
//!
//! Turns one selected clip into a `ShotDescriptor` plus its sub-products,
//! and applies the host-side effects of doing so: the timeline bin, the
//! publish color and the optional rename.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::core::bins::MediaPool;
use crate::core::selection::SelectedClip;
use crate::core::settings::CreatorSettings;
use crate::core::template::{resolve, resolve_shot, ShotCounter, TokenContext};
use crate::core::timeline::{Clip, Timeline, PUBLISH_CLIP_COLOR};
use crate::core::{BinId, ClipIndex, CoreError, CoreResult};

use super::models::{FrameData, ShotDescriptor, SubProduct};
use super::registry::{SubProductInput, SubProductRegistry};

// =============================================================================
// Built Shot
// =============================================================================

/// Output of a successful build
#[derive(Clone, Debug, PartialEq)]
pub struct BuiltShot {
    pub descriptor: ShotDescriptor,
    pub sub_products: Vec<SubProduct>,
}

/// Naming a synced clip inherits from its hero clip
#[derive(Clone, Debug)]
struct HeroShot {
    clip_index: ClipIndex,
    clip: Clip,
    shot_name: String,
    hierarchy: String,
    hierarchy_path: String,
    hierarchy_data: BTreeMap<String, String>,
}

impl HeroShot {
    fn covers(&self, clip: &Clip) -> bool {
        clip.is_within(&self.clip)
    }
}

// =============================================================================
// Shot Builder
// =============================================================================

/// Builds shots for one selection pass.
///
/// Holds the pass-local state: hero shots seen so far and the timeline bin.
/// The shot counter stays with the caller.
pub struct ShotBuilder<'a> {
    settings: &'a CreatorSettings,
    registry: &'a SubProductRegistry,
    heroes: Vec<HeroShot>,
    bin_id: Option<BinId>,
}

impl<'a> ShotBuilder<'a> {
    pub fn new(settings: &'a CreatorSettings, registry: &'a SubProductRegistry) -> Self {
        Self {
            settings,
            registry,
            heroes: vec![],
            bin_id: None,
        }
    }

    /// Bin the pass filed its shots into, once one was requested
    pub fn bin_id(&self) -> Option<&str> {
        self.bin_id.as_deref()
    }

    /// Builds the shot for `selected`.
    ///
    /// Returns `None` for clips that cannot become a shot (no source media or
    /// zero length). Every selected clip consumes one shot number, built or
    /// not; the returned counter is what the next clip should use.
    pub fn build(
        &mut self,
        timeline: &mut Timeline,
        media_pool: &mut MediaPool,
        selected: &SelectedClip,
        counter: ShotCounter,
    ) -> CoreResult<(Option<BuiltShot>, ShotCounter)> {
        let clip = timeline
            .clip(selected.handle)
            .cloned()
            .ok_or(CoreError::ClipNotFound(selected.clip_index))?;

        let next = counter.advanced();

        let Some(media) = clip.media.as_ref() else {
            debug!(
                "Skipping clip {} ({}): no source media to convert",
                selected.clip_index, clip.name
            );
            return Ok((None, next));
        };
        if clip.duration() <= 0 {
            debug!(
                "Skipping clip {} ({}): zero-length range",
                selected.clip_index, clip.name
            );
            return Ok((None, next));
        }

        let dynamic = dynamic_context(&clip, &selected.track_name, &timeline.name);

        let synced_hero = self
            .settings
            .hero_track()
            .filter(|hero| *hero != selected.track_name)
            .and_then(|_| self.heroes.iter().find(|h| h.covers(&clip)))
            .cloned();

        let (naming, parent_clip_index) = match synced_hero {
            Some(hero) => {
                debug!(
                    "Clip {} synced to hero clip {} as {}",
                    selected.clip_index, hero.clip_index, hero.shot_name
                );
                let naming = Naming {
                    shot_name: hero.shot_name,
                    hierarchy: hero.hierarchy,
                    hierarchy_path: hero.hierarchy_path,
                    hierarchy_data: hero.hierarchy_data,
                };
                (naming, Some(hero.clip_index))
            }
            None => (self.resolve_naming(&dynamic, counter)?, None),
        };

        if self.settings.hero_track() == Some(selected.track_name.as_str()) {
            self.heroes.push(HeroShot {
                clip_index: selected.clip_index,
                clip: clip.clone(),
                shot_name: naming.shot_name.clone(),
                hierarchy: naming.hierarchy.clone(),
                hierarchy_path: naming.hierarchy_path.clone(),
                hierarchy_data: naming.hierarchy_data.clone(),
            });
        }

        let variant = self.settings.variant_for(&selected.track_name);
        let hero = parent_clip_index.is_none();
        let sub_products = self.registry.build_all(&SubProductInput {
            settings: self.settings,
            variant: &variant,
            hero,
            source_resolution: media.resolution.as_ref(),
        });

        let frames = self.frame_data(&clip);
        let descriptor = ShotDescriptor {
            clip_index: selected.clip_index,
            shot_name: naming.shot_name,
            hierarchy: naming.hierarchy,
            hierarchy_path: naming.hierarchy_path,
            hierarchy_data: naming.hierarchy_data,
            frames,
            hero_track: hero,
            parent_clip_index,
            sub_products,
        };

        self.apply_host_effects(timeline, media_pool, selected, &descriptor)?;

        info!(
            "Built shot {} for clip {} ({} sub-product(s))",
            descriptor.hierarchy_path,
            selected.clip_index,
            descriptor.sub_products.len()
        );

        let sub_products = descriptor.sub_product_views();
        Ok((
            Some(BuiltShot {
                descriptor,
                sub_products,
            }),
            next,
        ))
    }

    /// Resolves hierarchy fields, then the hierarchy and shot name templates
    fn resolve_naming(&self, dynamic: &TokenContext, counter: ShotCounter) -> CoreResult<Naming> {
        let mut hierarchy_data = BTreeMap::new();

        for (key, template) in self.settings.hierarchy_fields() {
            let value = if key == "shot" {
                resolve_shot(template, dynamic, counter)?.0
            } else {
                resolve(template, dynamic)?
            };
            hierarchy_data.insert(key.to_string(), value);
        }

        let mut context = dynamic.clone();
        context.extend(hierarchy_data.clone());

        let hierarchy = resolve(&self.settings.hierarchy, &context)?;
        let shot_name = resolve(&self.settings.clip_name, &context)?;
        let hierarchy_path = format!("/{}/{}", hierarchy.trim_matches('/'), shot_name);

        Ok(Naming {
            shot_name,
            hierarchy,
            hierarchy_path,
            hierarchy_data,
        })
    }

    fn frame_data(&self, clip: &Clip) -> FrameData {
        let duration = clip.duration();
        let (source_in, source_out) = clip
            .media
            .as_ref()
            .map(|m| (m.source_in, m.source_in + duration - 1))
            .unwrap_or((0, duration - 1));
        let frame_start = self.settings.workfile_frame_start;

        FrameData {
            workfile_frame_start: frame_start,
            handle_start: self.settings.handle_start,
            handle_end: self.settings.handle_end,
            frame_start,
            frame_end: frame_start + duration - 1,
            clip_in: clip.start,
            clip_out: clip.end - 1,
            clip_duration: duration,
            source_in,
            source_out,
        }
    }

    fn apply_host_effects(
        &mut self,
        timeline: &mut Timeline,
        media_pool: &mut MediaPool,
        selected: &SelectedClip,
        descriptor: &ShotDescriptor,
    ) -> CoreResult<()> {
        let bin_id = match self.bin_id.clone() {
            Some(id) => id,
            None => {
                let id = media_pool.ensure_named_bin(&timeline.name);
                self.bin_id = Some(id.clone());
                id
            }
        };
        if let Some(bin) = media_pool.get_mut(&bin_id) {
            bin.add_item(&descriptor.shot_name);
        }

        let clip = timeline
            .clip_mut(selected.handle)
            .ok_or(CoreError::ClipNotFound(selected.clip_index))?;
        if self.settings.clip_rename {
            clip.name = descriptor.shot_name.clone();
        }
        clip.color = Some(PUBLISH_CLIP_COLOR);
        Ok(())
    }
}

struct Naming {
    shot_name: String,
    hierarchy: String,
    hierarchy_path: String,
    hierarchy_data: BTreeMap<String, String>,
}

/// Per-clip tokens usable inside the hierarchy data fields
fn dynamic_context(clip: &Clip, track_name: &str, timeline_name: &str) -> TokenContext {
    let mut context = TokenContext::new();
    context.insert("_clip_".to_string(), clip.name.clone());
    context.insert("_track_".to_string(), track_name.to_string());
    context.insert("_sequence_".to_string(), timeline_name.to_string());
    context
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::selection::{select, ClipFilter};
    use crate::core::shots::{PLATE_CREATOR, REVIEW_CREATOR, SHOT_CREATOR};
    use crate::core::timeline::Track;
    use crate::core::Resolution;

    fn run(
        timeline: &mut Timeline,
        pool: &mut MediaPool,
        settings: &CreatorSettings,
    ) -> CoreResult<Vec<BuiltShot>> {
        let registry = SubProductRegistry::standard();
        let selected = select(timeline, &ClipFilter::All, false, settings.hero_track())?;
        let mut builder = ShotBuilder::new(settings, &registry);
        let mut counter = settings.shot_counter();
        let mut built = vec![];
        for clip in &selected {
            let (shot, next) = builder.build(timeline, pool, clip, counter)?;
            counter = next;
            built.extend(shot);
        }
        Ok(built)
    }

    fn two_clip_timeline() -> Timeline {
        Timeline::new("reel_01", 24.0).with_track(
            Track::new_video("V1")
                .with_clip(Clip::new("plate_a", 0, 48).with_media("a.mov", 1001))
                .with_clip(Clip::new("plate_b", 48, 72).with_media("b.mov", 0)),
        )
    }

    #[test]
    fn test_build_names_and_paths() {
        let mut timeline = two_clip_timeline();
        let mut pool = MediaPool::default();
        let built = run(&mut timeline, &mut pool, &CreatorSettings::default()).unwrap();

        assert_eq!(built.len(), 2);
        let first = &built[0].descriptor;
        assert_eq!(first.shot_name, "sq01sh010");
        assert_eq!(first.hierarchy, "shots/sq01");
        assert_eq!(first.hierarchy_path, "/shots/sq01/sq01sh010");
        assert_eq!(first.hierarchy_data["track"], "V1");
        assert_eq!(first.hierarchy_data["shot"], "sh010");
        assert_eq!(built[1].descriptor.shot_name, "sq01sh020");
    }

    #[test]
    fn test_build_frame_data() {
        let mut timeline = two_clip_timeline();
        let mut pool = MediaPool::default();
        let settings = CreatorSettings {
            handle_start: 5,
            handle_end: 7,
            ..CreatorSettings::default()
        };
        let built = run(&mut timeline, &mut pool, &settings).unwrap();

        let frames = &built[0].descriptor.frames;
        assert_eq!(frames.frame_start, 1001);
        assert_eq!(frames.frame_end, 1048);
        assert_eq!(frames.clip_in, 0);
        assert_eq!(frames.clip_out, 47);
        assert_eq!(frames.clip_duration, 48);
        assert_eq!(frames.source_in, 1001);
        assert_eq!(frames.source_out, 1048);
        assert_eq!(frames.handle_start, 5);
        assert_eq!(frames.handle_end, 7);
    }

    #[test]
    fn test_build_host_effects() {
        let mut timeline = two_clip_timeline();
        let mut pool = MediaPool::default();
        let settings = CreatorSettings {
            clip_rename: true,
            ..CreatorSettings::default()
        };
        run(&mut timeline, &mut pool, &settings).unwrap();

        let clips = &timeline.tracks[0].clips;
        assert_eq!(clips[0].name, "sq01sh010");
        assert_eq!(clips[0].color, Some(PUBLISH_CLIP_COLOR));
        assert_eq!(clips[1].name, "sq01sh020");

        assert_eq!(pool.bins.len(), 1);
        assert_eq!(pool.bins[0].name, "reel_01");
        assert_eq!(pool.bins[0].items, vec!["sq01sh010", "sq01sh020"]);
    }

    #[test]
    fn test_bin_reused_across_passes() {
        let mut timeline = two_clip_timeline();
        let mut pool = MediaPool::default();
        run(&mut timeline, &mut pool, &CreatorSettings::default()).unwrap();
        run(&mut timeline, &mut pool, &CreatorSettings::default()).unwrap();

        assert_eq!(pool.bins.len(), 1);
        assert_eq!(pool.bins[0].items.len(), 2);
    }

    #[test]
    fn test_no_rename_keeps_clip_name() {
        let mut timeline = two_clip_timeline();
        let mut pool = MediaPool::default();
        run(&mut timeline, &mut pool, &CreatorSettings::default()).unwrap();
        assert_eq!(timeline.tracks[0].clips[0].name, "plate_a");
    }

    #[test]
    fn test_clip_without_media_is_skipped() {
        let mut timeline = Timeline::new("reel_01", 24.0).with_track(
            Track::new_video("V1")
                .with_clip(Clip::new("title", 0, 24))
                .with_clip(Clip::new("plate", 24, 48).with_media("p.mov", 0)),
        );
        let mut pool = MediaPool::default();
        let built = run(&mut timeline, &mut pool, &CreatorSettings::default()).unwrap();

        assert_eq!(built.len(), 1);
        assert_eq!(built[0].descriptor.clip_index, 1);
        // The title still consumed sh010.
        assert_eq!(built[0].descriptor.shot_name, "sq01sh020");
        assert_eq!(timeline.tracks[0].clips[0].color, None);
    }

    #[test]
    fn test_zero_length_clip_is_skipped() {
        let mut timeline = Timeline::new("reel_01", 24.0).with_track(
            Track::new_video("V1")
                .with_clip(Clip::new("flash", 24, 24).with_media("f.mov", 0))
                .with_clip(Clip::new("plate", 24, 48).with_media("p.mov", 0)),
        );
        let mut pool = MediaPool::default();
        let built = run(&mut timeline, &mut pool, &CreatorSettings::default()).unwrap();

        assert_eq!(built.len(), 1);
        let frames = &built[0].descriptor.frames;
        assert_eq!(built[0].descriptor.clip_index, 1);
        assert!(frames.frame_end >= frames.frame_start);
        assert!(frames.clip_out >= frames.clip_in);
        assert_eq!(timeline.tracks[0].clips[0].color, None);
    }

    #[test]
    fn test_bin_named_after_timeline_verbatim() {
        for (name, expected) in [
            ("reel/v2", "reel/v2"),
            ("reel\\01", "reel\\01"),
            ("  ", crate::core::bins::UNTITLED_BIN_NAME),
        ] {
            let mut timeline = Timeline::new(name, 24.0).with_track(
                Track::new_video("V1").with_clip(Clip::new("a", 0, 10).with_media("a.mov", 0)),
            );
            let mut pool = MediaPool::default();
            let built = run(&mut timeline, &mut pool, &CreatorSettings::default()).unwrap();

            assert_eq!(built.len(), 1);
            assert_eq!(pool.bins.len(), 1);
            assert_eq!(pool.bins[0].name, expected);
            assert_eq!(pool.bins[0].items, vec!["sq01sh010"]);
        }
    }

    #[test]
    fn test_dynamic_tokens_in_fields() {
        let mut timeline = two_clip_timeline();
        let mut pool = MediaPool::default();
        let settings = CreatorSettings {
            sequence: "{_sequence_}".to_string(),
            shot: "{_clip_}_##".to_string(),
            clip_name: "{shot}".to_string(),
            count_from: 1,
            count_steps: 1,
            ..CreatorSettings::default()
        };
        let built = run(&mut timeline, &mut pool, &settings).unwrap();

        assert_eq!(built[0].descriptor.shot_name, "plate_a_01");
        assert_eq!(built[1].descriptor.shot_name, "plate_b_02");
        assert_eq!(built[0].descriptor.hierarchy, "shots/reel_01");
    }

    #[test]
    fn test_unknown_token_aborts() {
        let mut timeline = two_clip_timeline();
        let mut pool = MediaPool::default();
        let settings = CreatorSettings {
            hierarchy: "{folder}/{reel}".to_string(),
            ..CreatorSettings::default()
        };
        let err = run(&mut timeline, &mut pool, &settings).unwrap_err();
        assert!(matches!(err, CoreError::UnknownToken { ref token, .. } if token == "reel"));
    }

    #[test]
    fn test_sub_products_for_hero_clip() {
        let mut timeline = two_clip_timeline();
        let mut pool = MediaPool::default();
        let built = run(&mut timeline, &mut pool, &CreatorSettings::default()).unwrap();

        let creators: Vec<_> = built[0]
            .sub_products
            .iter()
            .map(|s| s.creator_identifier.as_str())
            .collect();
        assert_eq!(creators, vec![PLATE_CREATOR, REVIEW_CREATOR, SHOT_CREATOR]);
        for sub in &built[0].sub_products {
            assert_eq!(sub.clip_index, 0);
            assert_eq!(sub.hierarchy_path, "/shots/sq01/sq01sh010");
        }
    }

    #[test]
    fn test_vertical_sync_shares_hero_naming() {
        let mut timeline = Timeline::new("reel_01", 24.0)
            .with_track(
                Track::new_video("V1")
                    .with_clip(Clip::new("bg", 0, 48).with_media("bg.mov", 0))
                    .with_clip(Clip::new("bg2", 48, 96).with_media("bg2.mov", 0)),
            )
            .with_track(
                Track::new_video("V2")
                    .with_clip(Clip::new("fg", 10, 40).with_media("fg.mov", 0))
                    .with_clip(Clip::new("loose", 90, 120).with_media("l.mov", 0)),
            );
        let mut pool = MediaPool::default();
        let settings = CreatorSettings {
            v_sync_on: true,
            v_sync_track: "V2".to_string(),
            ..CreatorSettings::default()
        };
        let built = run(&mut timeline, &mut pool, &settings).unwrap();

        // Hero track V2 goes first: fg (sh010), loose (sh020), then bg, bg2.
        let by_clip: BTreeMap<_, _> = built
            .iter()
            .map(|b| (b.descriptor.clip_index, &b.descriptor))
            .collect();

        let fg = by_clip[&2];
        assert!(fg.hero_track);
        assert_eq!(fg.shot_name, "sq01sh010");

        let loose = by_clip[&3];
        assert_eq!(loose.shot_name, "sq01sh020");

        // bg (0..48) does not fit inside fg (10..40): its own shot.
        let bg = by_clip[&0];
        assert!(bg.hero_track);
        assert_eq!(bg.shot_name, "sq01sh030");

        let bg2 = by_clip[&1];
        assert_eq!(bg2.shot_name, "sq01sh040");
        assert!(bg2.parent_clip_index.is_none());
    }

    #[test]
    fn test_vertical_sync_child_gets_plate_only() {
        let mut timeline = Timeline::new("reel_01", 24.0)
            .with_track(
                Track::new_video("V1").with_clip(
                    Clip::new("hero", 0, 100)
                        .with_media("hero.mov", 0)
                        .with_source_resolution(Resolution::new(1920, 1080, 1.0)),
                ),
            )
            .with_track(
                Track::new_video("V2").with_clip(Clip::new("fg", 20, 80).with_media("fg.mov", 0)),
            );
        let mut pool = MediaPool::default();
        let settings = CreatorSettings {
            v_sync_track: "V1".to_string(),
            variant: "main".to_string(),
            ..CreatorSettings::default()
        };
        let built = run(&mut timeline, &mut pool, &settings).unwrap();
        assert_eq!(built.len(), 2);

        let child = &built[1].descriptor;
        assert_eq!(child.clip_index, 1);
        assert!(!child.hero_track);
        assert_eq!(child.parent_clip_index, Some(0));
        assert_eq!(child.shot_name, built[0].descriptor.shot_name);
        assert_eq!(child.hierarchy_path, built[0].descriptor.hierarchy_path);
        assert_eq!(
            child.sub_products.keys().collect::<Vec<_>>(),
            vec![PLATE_CREATOR]
        );

        assert_eq!(child.hierarchy_data["shot"], "sh010");
    }

    #[test]
    fn test_vertical_sync_child_consumes_a_number() {
        let mut timeline = Timeline::new("reel_01", 24.0)
            .with_track(
                Track::new_video("V1").with_clip(Clip::new("hero", 0, 100).with_media("h.mov", 0)),
            )
            .with_track(
                Track::new_video("V2")
                    .with_clip(Clip::new("fg", 20, 80).with_media("fg.mov", 0))
                    .with_clip(Clip::new("tail", 120, 150).with_media("t.mov", 0)),
            );
        let mut pool = MediaPool::default();
        let settings = CreatorSettings {
            v_sync_track: "V1".to_string(),
            ..CreatorSettings::default()
        };
        let built = run(&mut timeline, &mut pool, &settings).unwrap();

        let names: Vec<_> = built
            .iter()
            .map(|b| (b.descriptor.clip_index, b.descriptor.shot_name.as_str()))
            .collect();
        assert_eq!(
            names,
            vec![(0, "sq01sh010"), (1, "sq01sh010"), (2, "sq01sh030")]
        );
    }
}
