//! Bins/Folders Module
//!
//! Media pool bins the build stage files converted clips into.
//! Bin creation is get-or-create: asking twice for the same name yields the
//! same bin.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::BinId;

/// Bin used when a timeline has a blank name
pub const UNTITLED_BIN_NAME: &str = "Untitled Timeline";

// =============================================================================
// Bin Model
// =============================================================================

/// A bin (folder) in the host media pool
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bin {
    /// Unique bin identifier
    pub id: BinId,
    /// Bin name (display name)
    pub name: String,
    /// Creation timestamp (ISO 8601)
    pub created_at: String,
    /// Names of pool items filed into this bin
    #[serde(default)]
    pub items: Vec<String>,
}

impl Bin {
    /// Creates a new bin with a generated ID
    pub fn new(name: &str) -> Self {
        Self {
            id: format!("bin_{}", ulid::Ulid::new().to_string().to_lowercase()),
            name: name.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            items: vec![],
        }
    }

    /// Files an item into the bin; returns false if it was already there
    pub fn add_item(&mut self, item_name: &str) -> bool {
        if self.items.iter().any(|i| i == item_name) {
            return false;
        }
        self.items.push(item_name.to_string());
        true
    }
}

// =============================================================================
// Media Pool
// =============================================================================

/// Flat store of bins
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaPool {
    #[serde(default)]
    pub bins: Vec<Bin>,
}

impl MediaPool {
    pub fn find_by_name(&self, name: &str) -> Option<&Bin> {
        self.bins.iter().find(|b| b.name == name)
    }

    pub fn get(&self, bin_id: &str) -> Option<&Bin> {
        self.bins.iter().find(|b| b.id == bin_id)
    }

    pub fn get_mut(&mut self, bin_id: &str) -> Option<&mut Bin> {
        self.bins.iter_mut().find(|b| b.id == bin_id)
    }

    /// Returns the bin called `name`, creating it when missing.
    ///
    /// The name is taken verbatim, separators included. A blank name maps to
    /// `UNTITLED_BIN_NAME`.
    pub fn ensure_named_bin(&mut self, name: &str) -> BinId {
        let name = if name.trim().is_empty() {
            UNTITLED_BIN_NAME
        } else {
            name
        };

        if let Some(bin) = self.find_by_name(name) {
            return bin.id.clone();
        }

        let bin = Bin::new(name);
        let id = bin.id.clone();
        debug!("Created media pool bin {} ({})", name, id);
        self.bins.push(bin);
        id
    }
}

// =============================================================================
// Tests
// =============================================================================
