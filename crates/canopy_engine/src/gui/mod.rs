//! Retained-mode GUI
//!
//! Widgets live in a tree and carry three independent dirty flags
//! (properties, size, layout). [`GuiManager::update`] validates the tree in
//! three phases, each completing tree-wide before the next: commit dirty
//! properties top-down, measure preferred sizes bottom-up, assign child
//! positions top-down. Rendering is emitted as backend-agnostic
//! [`GuiDrawCommand`]s.

pub mod backend;
pub mod manager;
pub mod widget;

pub use backend::{GuiBackend, GuiDrawCommand};
pub use manager::{GuiManager, WidgetKey};
pub use widget::{
    ButtonState, HorizontalAlign, Invalidation, VerticalAlign, Widget, WidgetKind,
};

/// Errors raised by widget tree operations
#[derive(thiserror::Error, Debug)]
pub enum GuiError {
    /// A widget key did not resolve to a live widget
    #[error("widget not found in tree")]
    WidgetNotFound,

    /// The target widget cannot hold children
    #[error("widget is not a container")]
    NotAContainer,

    /// The operation does not apply to this widget kind
    #[error("operation does not apply to this widget kind")]
    WrongKind,
}
