//! Editorial package: a timeline-level annotation publishing the whole cut.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::timeline::Timeline;
use crate::core::CoreResult;

use super::store::AnnotationStore;

pub const EDITORIAL_PRODUCT_TYPE: &str = "editorial_pkg";

/// Publish block of an editorial package
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorialPublish {
    pub product_type: String,
    pub product_name: String,
    pub folder_path: String,
}

/// Editorial package stored on the timeline
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EditorialPackage {
    pub publish: EditorialPublish,
    /// Timeline name at creation time
    pub label: String,
}

impl EditorialPackage {
    pub fn new(timeline_name: &str, folder_path: &str, product_name: &str) -> Self {
        Self {
            publish: EditorialPublish {
                product_type: EDITORIAL_PRODUCT_TYPE.to_string(),
                product_name: product_name.to_string(),
                folder_path: folder_path.to_string(),
            },
            label: timeline_name.to_string(),
        }
    }
}

/// Creates the package for `timeline` and stores it on the timeline
pub fn create_editorial_package(
    store: &AnnotationStore,
    timeline: &mut Timeline,
    folder_path: &str,
    product_name: &str,
) -> CoreResult<EditorialPackage> {
    let package = EditorialPackage::new(&timeline.name, folder_path, product_name);
    store.write(timeline, &package)?;
    info!(
        "Created editorial package {} on timeline {}",
        product_name, timeline.name
    );
    Ok(package)
}

/// Reads the timeline's package, skipping blobs of any other product type
pub fn collect_editorial_package(
    store: &AnnotationStore,
    timeline: &Timeline,
) -> Option<EditorialPackage> {
    let package: EditorialPackage = store.read(timeline)?;
    if package.publish.product_type != EDITORIAL_PRODUCT_TYPE {
        debug!(
            "Timeline {} carries a {} annotation, not an editorial package",
            timeline.name, package.publish.product_type
        );
        return None;
    }
    Some(package)
}

pub fn update_editorial_package(
    store: &AnnotationStore,
    timeline: &mut Timeline,
    package: &EditorialPackage,
) -> CoreResult<()> {
    store.write(timeline, package)
}

pub fn remove_editorial_package(store: &AnnotationStore, timeline: &mut Timeline) {
    store.clear(timeline);
}

// =============================================================================
// Tests
// =============================================================================
