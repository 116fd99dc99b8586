//! Renderer configuration.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Options controlling how the reconciler patches.
///
/// Missing fields take their defaults when loaded from JSON:
///
/// ```json
/// { "propagate_props": true }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Re-render an already mounted child component when its parent passes
    /// it different props. Off by default: a child only re-renders when
    /// reactive state it read changes.
    pub propagate_props: bool,

    /// Skip `patch_prop` for props whose value is unchanged.
    pub skip_equal_props: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            propagate_props: false,
            skip_equal_props: true,
        }
    }
}

impl RendererConfig {
    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
