//! Metadata slots and the blob adapter on top of them.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::core::timeline::{Clip, Timeline};
use crate::core::{CoreError, CoreResult};

/// Metadata slot the pipeline owns on every item
pub const ANNOTATION_KEY: &str = "shotline";

/// Payload meaning "no annotation"
pub const EMPTY_ANNOTATION: &str = "{}";

// =============================================================================
// Metadata Store
// =============================================================================

/// Key/value metadata capability of a host item
pub trait MetadataStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
}

impl MetadataStore for Clip {
    fn get(&self, key: &str) -> Option<String> {
        self.metadata.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.metadata.insert(key.to_string(), value);
    }
}

impl MetadataStore for Timeline {
    fn get(&self, key: &str) -> Option<String> {
        self.metadata.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.metadata.insert(key.to_string(), value);
    }
}

/// Standalone store for items that live outside a timeline
#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    entries: HashMap<String, String>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MetadataStore for InMemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }
}

// =============================================================================
// Annotation Store
// =============================================================================

/// Reads and writes annotation payloads through a [`MetadataStore`]
#[derive(Clone, Debug)]
pub struct AnnotationStore {
    key: String,
}

impl Default for AnnotationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::with_key(ANNOTATION_KEY)
    }

    pub fn with_key(key: &str) -> Self {
        Self {
            key: key.to_string(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Serializes `payload` into the item's slot, replacing what was there
    pub fn write<T: Serialize>(
        &self,
        target: &mut impl MetadataStore,
        payload: &T,
    ) -> CoreResult<()> {
        let blob = serde_json::to_string(payload)?;
        target.set(&self.key, blob);
        Ok(())
    }

    /// Reads the item's annotation.
    ///
    /// A missing or cleared slot is `Ok(None)`; a blob that does not parse
    /// as `T` is [`CoreError::CorruptAnnotation`].
    pub fn try_read<T: DeserializeOwned>(
        &self,
        target: &impl MetadataStore,
    ) -> CoreResult<Option<T>> {
        let Some(blob) = target.get(&self.key) else {
            return Ok(None);
        };
        if is_cleared(&blob) {
            return Ok(None);
        }

        let value: Value = serde_json::from_str(&blob)
            .map_err(|e| CoreError::CorruptAnnotation(format!("not JSON: {}", e)))?;
        if value.as_object().is_some_and(|o| o.is_empty()) {
            return Ok(None);
        }

        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| CoreError::CorruptAnnotation(e.to_string()))
    }

    /// Like [`try_read`](Self::try_read), but a corrupt blob is logged and
    /// treated as no annotation
    pub fn read<T: DeserializeOwned>(&self, target: &impl MetadataStore) -> Option<T> {
        match self.try_read(target) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Ignoring annotation in slot {}: {}", self.key, e);
                None
            }
        }
    }

    /// Empties the slot
    pub fn clear(&self, target: &mut impl MetadataStore) {
        target.set(&self.key, EMPTY_ANNOTATION.to_string());
    }

    /// Whether the slot holds anything besides the empty payload
    pub fn is_annotated(&self, target: &impl MetadataStore) -> bool {
        target.get(&self.key).is_some_and(|blob| !is_cleared(&blob))
    }
}

/// Blank, `{}` and whitespace-padded variants such as `{ }`
fn is_cleared(blob: &str) -> bool {
    let compact: String = blob.chars().filter(|c| !c.is_whitespace()).collect();
    compact.is_empty() || compact == EMPTY_ANNOTATION
}

/// Whether a clip carries a shot annotation in the default slot
pub fn has_shot_annotation(clip: &Clip) -> bool {
    AnnotationStore::new().is_annotated(clip)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde::Deserialize;

    use super::*;
    use crate::core::shots::{FrameData, ShotDescriptor};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Note {
        text: String,
    }

    fn descriptor() -> ShotDescriptor {
        let mut hierarchy_data = BTreeMap::new();
        hierarchy_data.insert("shot".to_string(), "sh010".to_string());
        ShotDescriptor {
            clip_index: 3,
            shot_name: "sq01sh010".to_string(),
            hierarchy: "shots/sq01".to_string(),
            hierarchy_path: "/shots/sq01/sq01sh010".to_string(),
            hierarchy_data,
            frames: FrameData {
                workfile_frame_start: 1001,
                handle_start: 10,
                handle_end: 10,
                frame_start: 1001,
                frame_end: 1024,
                clip_in: 86400,
                clip_out: 86423,
                clip_duration: 24,
                source_in: 0,
                source_out: 23,
            },
            hero_track: false,
            parent_clip_index: Some(1),
            sub_products: BTreeMap::new(),
        }
    }

    #[test]
    fn test_round_trip_on_clip() {
        let store = AnnotationStore::new();
        let mut clip = Clip::new("a", 0, 24);
        let original = descriptor();

        store.write(&mut clip, &original).unwrap();
        let read: ShotDescriptor = store.read(&clip).unwrap();
        assert_eq!(read, original);
        assert!(has_shot_annotation(&clip));
    }

    #[test]
    fn test_round_trip_on_in_memory_store() {
        let store = AnnotationStore::with_key("custom");
        let mut slots = InMemoryStore::new();
        store
            .write(&mut slots, &Note { text: "hi".to_string() })
            .unwrap();

        assert_eq!(slots.len(), 1);
        assert_eq!(
            store.read::<Note>(&slots),
            Some(Note {
                text: "hi".to_string()
            })
        );
        assert!(store.read::<Note>(&InMemoryStore::new()).is_none());
    }

    #[test]
    fn test_clear_then_read_is_none() {
        let store = AnnotationStore::new();
        let mut clip = Clip::new("a", 0, 24);
        store.write(&mut clip, &descriptor()).unwrap();

        store.clear(&mut clip);

        assert_eq!(clip.metadata[ANNOTATION_KEY], EMPTY_ANNOTATION);
        assert!(store.try_read::<ShotDescriptor>(&clip).unwrap().is_none());
        assert!(!has_shot_annotation(&clip));
    }

    #[test]
    fn test_empty_object_with_whitespace_is_cleared() {
        let store = AnnotationStore::new();
        let mut clip = Clip::new("a", 0, 24);
        for blob in ["{ }", " {\n} ", "   "] {
            clip.set(ANNOTATION_KEY, blob.to_string());
            assert!(store.try_read::<ShotDescriptor>(&clip).unwrap().is_none());
            assert!(!store.is_annotated(&clip));
            assert!(!has_shot_annotation(&clip));
        }
    }

    #[test]
    fn test_corrupt_blob() {
        let store = AnnotationStore::new();
        let mut clip = Clip::new("a", 0, 24);

        clip.set(ANNOTATION_KEY, "{broken".to_string());
        let err = store.try_read::<ShotDescriptor>(&clip).unwrap_err();
        assert!(matches!(err, CoreError::CorruptAnnotation(_)));
        assert!(err.is_item_error());
        assert!(store.read::<ShotDescriptor>(&clip).is_none());

        clip.set(ANNOTATION_KEY, r#"{"unrelated": 1}"#.to_string());
        assert!(store.read::<ShotDescriptor>(&clip).is_none());
    }

    #[test]
    fn test_timeline_slot_is_separate_from_clips() {
        let store = AnnotationStore::new();
        let mut timeline = Timeline::new("edit", 24.0);
        store
            .write(&mut timeline, &Note { text: "pkg".to_string() })
            .unwrap();
        assert!(store.is_annotated(&timeline));
        assert!(!has_shot_annotation(&Clip::new("a", 0, 1)));
    }
}
