//! Shotline Core Type Definitions
//!
//! Defines fundamental types used throughout the pipeline.

use serde::{Deserialize, Serialize};

// =============================================================================
// ID Types
// =============================================================================

/// Position of a clip in the timeline's flattened clip order.
///
/// Stable for the lifetime of one resolution run; every cross-reference
/// (sub-products, interchange lookup) keys off this, never off the clip itself.
pub type ClipIndex = usize;

/// Bin (media pool folder) unique identifier (ULID)
pub type BinId = String;

/// Creator identifier of a sub-product builder
pub type CreatorId = String;

// =============================================================================
// Time Types
// =============================================================================

/// Time in frames (integer)
pub type Frame = i64;

// =============================================================================
// Resolution
// =============================================================================

/// Frame size plus pixel aspect
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
    pub pixel_aspect: f64,
}

impl Resolution {
    pub fn new(width: u32, height: u32, pixel_aspect: f64) -> Self {
        Self {
            width,
            height,
            pixel_aspect,
        }
    }

    /// Reads `width`, `height` and `pixelAspect` from a metadata map.
    ///
    /// Returns `None` unless all three are present and numeric.
    pub fn from_metadata(metadata: &serde_json::Map<String, serde_json::Value>) -> Option<Self> {
        let width = metadata.get("width").and_then(json_u32)?;
        let height = metadata.get("height").and_then(json_u32)?;
        let pixel_aspect = metadata.get("pixelAspect").and_then(json_f64)?;
        Some(Self::new(width, height, pixel_aspect))
    }
}

/// Hosts export numbers as strings as often as not.
fn json_u32(value: &serde_json::Value) -> Option<u32> {
    match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as u64))
            .and_then(|v| u32::try_from(v).ok()),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn json_f64(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolution_from_metadata() {
        let meta = json!({"width": 1920, "height": "1080", "pixelAspect": 1.0});
        let res = Resolution::from_metadata(meta.as_object().unwrap()).unwrap();
        assert_eq!(res, Resolution::new(1920, 1080, 1.0));
    }

    #[test]
    fn test_resolution_from_partial_metadata() {
        let meta = json!({"width": 1920, "height": 1080});
        assert!(Resolution::from_metadata(meta.as_object().unwrap()).is_none());
    }
}
