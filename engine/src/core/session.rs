//! Shot Session
//!
//! Drives one run of the create or collect stage against a host project and
//! keeps the shots it produced or found. Every tracked shot carries the live
//! handle of its clip; handles are never persisted and are re-attached by
//! `clip_index` when shots are collected again.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::core::annotations::AnnotationStore;
use crate::core::selection::{select, ClipFilter};
use crate::core::settings::CreatorSettings;
use crate::core::shots::{ShotBuilder, ShotDescriptor, SubProduct, SubProductRegistry};
use crate::core::timeline::{ClipHandle, HostProject, Timeline};
use crate::core::{ClipIndex, CoreError, CoreResult, CreatorId};

/// Key of a publish instance
pub type InstanceKey = (CreatorId, ClipIndex);

/// A shot tracked by the session
#[derive(Clone, Debug, PartialEq)]
pub struct TrackedShot {
    pub descriptor: ShotDescriptor,
    /// Live clip reference (runtime-only)
    pub handle: ClipHandle,
}

/// One sub-product of a tracked shot
#[derive(Clone, Debug, PartialEq)]
pub struct ShotInstance {
    pub sub_product: SubProduct,
    pub handle: ClipHandle,
}

/// Per-run shot bookkeeping
#[derive(Debug)]
pub struct ShotSession {
    settings: CreatorSettings,
    registry: SubProductRegistry,
    store: AnnotationStore,
    shots: BTreeMap<ClipIndex, TrackedShot>,
}

impl ShotSession {
    pub fn new(settings: CreatorSettings) -> Self {
        Self {
            settings,
            registry: SubProductRegistry::standard(),
            store: AnnotationStore::new(),
            shots: BTreeMap::new(),
        }
    }

    pub fn with_registry(mut self, registry: SubProductRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_store(mut self, store: AnnotationStore) -> Self {
        self.store = store;
        self
    }

    pub fn settings(&self) -> &CreatorSettings {
        &self.settings
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    // =========================================================================
    // Stages
    // =========================================================================

    /// Selects clips, builds their shots and persists each descriptor on its
    /// clip. Returns the new descriptors in build order.
    ///
    /// Naming errors abort before anything is persisted.
    pub fn create(&mut self, project: &mut HostProject) -> CoreResult<Vec<ShotDescriptor>> {
        let HostProject {
            timeline,
            media_pool,
        } = project;
        let timeline = timeline.as_mut().ok_or(CoreError::NoActiveTimeline)?;

        let use_selection = self.settings.use_selection;
        let selected = select(
            timeline,
            &ClipFilter::for_selection(use_selection),
            use_selection,
            self.settings.hero_track(),
        )?;
        if selected.is_empty() {
            return Err(CoreError::Configuration(
                "No clips found on current timeline.".to_string(),
            ));
        }

        let mut builder = ShotBuilder::new(&self.settings, &self.registry);
        let mut counter = self.settings.shot_counter();
        let mut built = Vec::with_capacity(selected.len());
        for clip in &selected {
            let (shot, next) = builder.build(timeline, media_pool, clip, counter)?;
            counter = next;
            if let Some(shot) = shot {
                built.push((shot.descriptor, clip.handle));
            }
        }

        let mut created = Vec::with_capacity(built.len());
        for (descriptor, handle) in built {
            self.persist(timeline, handle, &descriptor)?;
            created.push(descriptor.clone());
            self.shots
                .insert(descriptor.clip_index, TrackedShot { descriptor, handle });
        }

        info!(
            "Created {} shot(s) on timeline {}",
            created.len(),
            timeline.name
        );
        Ok(created)
    }

    /// Reads shot annotations back from clips carrying the publish color.
    ///
    /// Corrupt blobs are logged and skipped. Re-collecting an untouched
    /// timeline yields the descriptors `create` persisted. A clip that moved
    /// since creation is re-attached at its current position: `clip_index`
    /// (and any `parent_clip_index` pointing at a moved hero) is rewritten.
    pub fn collect(&mut self, project: &HostProject) -> CoreResult<Vec<ShotDescriptor>> {
        let timeline = project
            .timeline
            .as_ref()
            .ok_or(CoreError::NoActiveTimeline)?;

        let annotated = select(timeline, &ClipFilter::Published, false, None)?;
        let mut found = vec![];
        // Stored hero index -> live index; `None` once two heroes claim it
        let mut moved_heroes: BTreeMap<ClipIndex, Option<ClipIndex>> = BTreeMap::new();
        for clip in annotated {
            let Some(live) = timeline.clip(clip.handle) else {
                continue;
            };
            let Some(mut descriptor) = self.store.read::<ShotDescriptor>(live) else {
                continue;
            };
            if descriptor.clip_index != clip.clip_index {
                warn!(
                    "Shot {} was created for clip {} but now sits at clip {}; re-attaching",
                    descriptor.shot_name, descriptor.clip_index, clip.clip_index
                );
            }
            if descriptor.hero_track {
                moved_heroes
                    .entry(descriptor.clip_index)
                    .and_modify(|live| *live = None)
                    .or_insert(Some(clip.clip_index));
            }
            descriptor.clip_index = clip.clip_index;
            found.push((descriptor, clip.handle));
        }

        let mut collected = Vec::with_capacity(found.len());
        for (mut descriptor, handle) in found {
            if let Some(parent) = descriptor.parent_clip_index {
                match moved_heroes.get(&parent) {
                    Some(Some(live)) => descriptor.parent_clip_index = Some(*live),
                    Some(None) => warn!(
                        "Shot {} at clip {}: parent clip {} is ambiguous",
                        descriptor.shot_name, descriptor.clip_index, parent
                    ),
                    None => {}
                }
            }
            collected.push(descriptor.clone());
            self.shots
                .insert(descriptor.clip_index, TrackedShot { descriptor, handle });
        }

        info!(
            "Collected {} shot(s) from timeline {}",
            collected.len(),
            timeline.name
        );
        Ok(collected)
    }

    /// Re-persists an edited descriptor on its clip
    pub fn update(
        &mut self,
        project: &mut HostProject,
        descriptor: ShotDescriptor,
    ) -> CoreResult<()> {
        let timeline = project
            .timeline
            .as_mut()
            .ok_or(CoreError::NoActiveTimeline)?;
        let handle = self.handle_for(timeline, descriptor.clip_index)?;

        self.persist(timeline, handle, &descriptor)?;
        self.shots
            .insert(descriptor.clip_index, TrackedShot { descriptor, handle });
        Ok(())
    }

    /// Clears the clip's annotation and stops tracking it.
    ///
    /// Returns whether the session was tracking the shot.
    pub fn remove(&mut self, project: &mut HostProject, clip_index: ClipIndex) -> CoreResult<bool> {
        let timeline = project
            .timeline
            .as_mut()
            .ok_or(CoreError::NoActiveTimeline)?;
        let handle = self.handle_for(timeline, clip_index)?;

        let clip = timeline
            .clip_mut(handle)
            .ok_or(CoreError::ClipNotFound(clip_index))?;
        self.store.clear(clip);
        Ok(self.shots.remove(&clip_index).is_some())
    }

    /// Collects and then removes every shot on the timeline
    pub fn remove_all(&mut self, project: &mut HostProject) -> CoreResult<usize> {
        let collected = self.collect(project)?;
        for descriptor in &collected {
            self.remove(project, descriptor.clip_index)?;
        }
        Ok(collected.len())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn shot(&self, clip_index: ClipIndex) -> Option<&TrackedShot> {
        self.shots.get(&clip_index)
    }

    /// Tracked descriptors ordered by clip index
    pub fn descriptors(&self) -> Vec<&ShotDescriptor> {
        self.shots.values().map(|s| &s.descriptor).collect()
    }

    /// Every publish instance, keyed by creator and clip index
    pub fn instances(&self) -> BTreeMap<InstanceKey, ShotInstance> {
        self.shots
            .values()
            .flat_map(|shot| {
                shot.descriptor
                    .sub_product_views()
                    .into_iter()
                    .map(move |sub_product| {
                        (
                            (sub_product.creator_identifier.clone(), sub_product.clip_index),
                            ShotInstance {
                                sub_product,
                                handle: shot.handle,
                            },
                        )
                    })
            })
            .collect()
    }

    pub fn instance(&self, creator_identifier: &str, clip_index: ClipIndex) -> Option<ShotInstance> {
        let shot = self.shots.get(&clip_index)?;
        let settings = shot.descriptor.settings_for(creator_identifier)?;
        Some(ShotInstance {
            sub_product: SubProduct::from_descriptor(&shot.descriptor, creator_identifier, settings),
            handle: shot.handle,
        })
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn persist(
        &self,
        timeline: &mut Timeline,
        handle: ClipHandle,
        descriptor: &ShotDescriptor,
    ) -> CoreResult<()> {
        let clip = timeline
            .clip_mut(handle)
            .ok_or(CoreError::ClipNotFound(descriptor.clip_index))?;
        self.store.write(clip, descriptor)
    }

    fn handle_for(&self, timeline: &Timeline, clip_index: ClipIndex) -> CoreResult<ClipHandle> {
        self.shots
            .get(&clip_index)
            .map(|s| s.handle)
            .or_else(|| timeline.handle_for_index(clip_index))
            .ok_or(CoreError::ClipNotFound(clip_index))
    }
}

// =============================================================================
// Tests
// =============================================================================
