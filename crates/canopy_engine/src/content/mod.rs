//! Content pipeline boundary
//!
//! The engine requests typed assets by name and receives opaque handles;
//! import formats, caching, and device upload are the provider's concern.
//! Load failures propagate as a generic error with no core-level retry.

use crate::render::GeometryHandle;

/// Handle to a loaded model's geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelHandle(pub u64);

/// Handle to a loaded font
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontHandle(pub u64);

/// Handle to a compiled shader technique
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TechniqueHandle(pub u64);

/// Errors raised by a content provider
#[derive(thiserror::Error, Debug)]
pub enum ContentError {
    /// No asset exists under the requested name
    #[error("asset not found: {0}")]
    NotFound(String),

    /// The asset exists but could not be loaded
    #[error("failed to load asset '{0}': {1}")]
    LoadFailed(String, String),
}

/// Typed asset loading interface supplied by the host
pub trait ContentProvider {
    /// Load a model by path and return its handle plus drawable geometry
    fn load_model(&mut self, path: &str) -> Result<(ModelHandle, GeometryHandle), ContentError>;

    /// Load a font by path
    fn load_font(&mut self, path: &str) -> Result<FontHandle, ContentError>;

    /// Resolve a shader technique by name
    fn load_technique(&mut self, name: &str) -> Result<TechniqueHandle, ContentError>;
}
