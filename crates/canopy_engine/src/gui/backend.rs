//! GUI render backend trait
//!
//! Keeps the widget system independent of any graphics API: the manager
//! flattens the visible widget tree into draw commands in screen
//! coordinates, and the host's backend turns them into geometry.

use crate::foundation::math::Vec4;

/// One backend-agnostic GUI draw command, in absolute screen coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum GuiDrawCommand {
    /// Filled rectangle
    Quad {
        /// Left edge
        x: f32,
        /// Top edge
        y: f32,
        /// Width in pixels
        width: f32,
        /// Height in pixels
        height: f32,
        /// Fill color
        color: Vec4,
    },
    /// Text run
    Text {
        /// Left edge of the first glyph
        x: f32,
        /// Top edge of the line
        y: f32,
        /// Text to draw
        text: String,
        /// Font size in pixels
        font_size: f32,
        /// Text color
        color: Vec4,
    },
}

/// Backend-agnostic GUI rendering interface
pub trait GuiBackend {
    /// Begin the GUI rendering pass
    fn begin_gui_pass(&mut self) -> Result<(), Box<dyn std::error::Error>>;

    /// Consume one draw command; commands arrive in draw order
    fn draw_command(&mut self, command: &GuiDrawCommand) -> Result<(), Box<dyn std::error::Error>>;

    /// End the GUI rendering pass
    fn end_gui_pass(&mut self) -> Result<(), Box<dyn std::error::Error>>;
}
