//! Rendering boundary types
//!
//! The engine never talks to a graphics device. It hands [`DrawItem`]s,
//! built from opaque [`GeometryHandle`]s and cached world matrices, to a
//! [`RenderBackend`] supplied by the host application.

pub mod post;

pub use post::{EffectParam, PostChain, PostEffect};

use crate::foundation::math::Mat4;

/// Primitive topology of a geometry buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveTopology {
    /// Independent triangles
    TriangleList,
    /// Independent line segments
    LineList,
}

/// Opaque handle to loaded geometry buffers
///
/// The engine carries buffer ids and counts through to the backend without
/// interpreting them; the content pipeline assigns the ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryHandle {
    /// Backend vertex buffer id
    pub vertex_buffer: u64,

    /// Backend index buffer id
    pub index_buffer: u64,

    /// Number of indices to draw
    pub index_count: u32,

    /// Primitive topology
    pub topology: PrimitiveTopology,
}

impl GeometryHandle {
    /// Create a triangle-list geometry handle
    pub fn new(vertex_buffer: u64, index_buffer: u64, index_count: u32) -> Self {
        Self {
            vertex_buffer,
            index_buffer,
            index_count,
            topology: PrimitiveTopology::TriangleList,
        }
    }
}

/// One drawable collected from the scene for the current frame
#[derive(Debug, Clone)]
pub struct DrawItem {
    /// Geometry to draw
    pub geometry: GeometryHandle,

    /// World transform, valid for this frame
    pub world: Mat4,

    /// Draw-order sort key; lower layers draw first
    pub layer: i32,

    /// Whether this item contributes to shadow passes
    pub cast_shadows: bool,
}

/// Backend-agnostic scene rendering interface
pub trait RenderBackend {
    /// Begin drawing one item (bind pipeline state)
    fn begin_draw(&mut self, item: &DrawItem) -> Result<(), Box<dyn std::error::Error>>;

    /// Issue the draw call for one item
    fn draw(&mut self, item: &DrawItem) -> Result<(), Box<dyn std::error::Error>>;

    /// End drawing one item
    fn end_draw(&mut self, item: &DrawItem) -> Result<(), Box<dyn std::error::Error>>;
}

/// Draw a frame's collected items through the backend, sorted by layer
///
/// The sort is stable, so items on the same layer keep scene traversal
/// order. In debug builds, items with empty geometry trip an assertion with
/// context; release builds pass them through and let the backend's own draw
/// call fail.
pub fn draw_scene(
    backend: &mut dyn RenderBackend,
    mut items: Vec<DrawItem>,
) -> Result<(), Box<dyn std::error::Error>> {
    items.sort_by_key(|item| item.layer);
    for item in &items {
        debug_assert!(
            item.geometry.index_count > 0,
            "draw item on layer {} has empty geometry (vertex buffer {})",
            item.layer,
            item.geometry.vertex_buffer
        );
        log::debug!(
            "draw layer {} geometry vb={} ib={} indices={}",
            item.layer,
            item.geometry.vertex_buffer,
            item.geometry.index_buffer,
            item.geometry.index_count
        );
        backend.begin_draw(item)?;
        backend.draw(item)?;
        backend.end_draw(item)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingBackend {
        calls: Vec<(String, i32)>,
    }

    impl RenderBackend for RecordingBackend {
        fn begin_draw(&mut self, item: &DrawItem) -> Result<(), Box<dyn std::error::Error>> {
            self.calls.push(("begin".into(), item.layer));
            Ok(())
        }

        fn draw(&mut self, item: &DrawItem) -> Result<(), Box<dyn std::error::Error>> {
            self.calls.push(("draw".into(), item.layer));
            Ok(())
        }

        fn end_draw(&mut self, item: &DrawItem) -> Result<(), Box<dyn std::error::Error>> {
            self.calls.push(("end".into(), item.layer));
            Ok(())
        }
    }

    fn item(layer: i32) -> DrawItem {
        DrawItem {
            geometry: GeometryHandle::new(1, 1, 3),
            world: Mat4::identity(),
            layer,
            cast_shadows: false,
        }
    }

    #[test]
    fn test_draw_scene_sorts_by_layer() {
        let mut backend = RecordingBackend::default();
        draw_scene(&mut backend, vec![item(2), item(0), item(1)]).unwrap();
        let layers: Vec<i32> = backend
            .calls
            .iter()
            .filter(|(phase, _)| phase == "draw")
            .map(|(_, layer)| *layer)
            .collect();
        assert_eq!(layers, vec![0, 1, 2]);
    }

    #[test]
    fn test_draw_scene_brackets_each_item() {
        let mut backend = RecordingBackend::default();
        draw_scene(&mut backend, vec![item(0)]).unwrap();
        let phases: Vec<&str> = backend.calls.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(phases, vec!["begin", "draw", "end"]);
    }
}
