//! Error types for the Trellis runtime.
//!
//! Lookup misses (an unknown slot name, an unresolved proxy key) are not
//! errors: they resolve to an empty fragment or `None`. Everything else that
//! can go wrong while mounting or re-rendering surfaces as [`Error`].

use thiserror::Error;

use crate::host::HostNode;

/// Errors reported by a [`HostAdapter`](crate::host::HostAdapter).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The adapter has no node with this handle.
    #[error("unknown host node {0}")]
    UnknownNode(HostNode),

    /// An element-only operation was applied to a non-element node.
    #[error("host node {0} is not an element")]
    NotAnElement(HostNode),

    /// An insertion anchor is not a child of the target parent.
    #[error("host node {anchor} is not a child of {parent}")]
    NotAChild {
        /// The anchor that was passed to `insert`.
        anchor: HostNode,
        /// The parent the node was being inserted into.
        parent: HostNode,
    },
}

/// Errors returned by mount, patch and reactive write operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A host operation failed.
    #[error("host operation failed: {0}")]
    Host(#[from] HostError),

    /// A component's setup function failed.
    #[error("setup of component `{component}` failed: {message}")]
    Setup {
        /// Name of the failing component.
        component: String,
        /// Error message from the setup function.
        message: String,
    },

    /// A component's render function failed.
    #[error("render of component `{component}` failed: {message}")]
    Render {
        /// Name of the failing component.
        component: String,
        /// Error message from the render function.
        message: String,
    },

    /// The container passed to `App::mount` could not be resolved.
    #[error("no container matches `{0}`")]
    ContainerNotFound(String),

    /// A node that must already be in the host tree has no host node.
    #[error("virtual node has not been mounted")]
    NotMounted,

    /// `App::mount` was called on an application that is already mounted.
    #[error("application is already mounted")]
    AlreadyMounted,

    /// Renderer configuration could not be parsed.
    #[error("invalid renderer config: {0}")]
    Config(#[from] serde_json::Error),
}

impl Error {
    /// Build a setup failure for the named component.
    pub fn setup(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Setup {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Build a render failure for the named component.
    pub fn render(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Render {
            component: component.into(),
            message: message.into(),
        }
    }
}

/// Result type for Trellis operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
