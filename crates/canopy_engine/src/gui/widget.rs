//! Widget data model
//!
//! A widget is its bounds, its dirty-state machine, and a [`WidgetKind`]
//! declaring what it is. Kinds are a tagged enum rather than an inheritance
//! chain; layout code matches on the kind.

use bitflags::bitflags;

use crate::foundation::math::Vec4;

bitflags! {
    /// Dirty flags driving the three validation phases
    ///
    /// All three are set at construction. `PROPERTIES` is cleared by the
    /// commit-properties phase, `SIZE` by measure, `LAYOUT` by
    /// layout-children.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Invalidation: u8 {
        /// A property affecting rendering or behavior changed
        const PROPERTIES = 1 << 0;
        /// A property affecting preferred size changed
        const SIZE = 1 << 1;
        /// Child sizes or alignment changed
        const LAYOUT = 1 << 2;
    }
}

/// Horizontal alignment for VBox children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizontalAlign {
    /// Align left edges
    Left,
    /// Center children
    Center,
    /// Align right edges
    Right,
}

/// Vertical alignment for HBox children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalAlign {
    /// Align top edges
    Top,
    /// Center children
    Middle,
    /// Align bottom edges
    Bottom,
}

/// Interaction state of a button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    /// Idle
    Normal,
    /// Pointer over the button
    Hovered,
    /// Pointer pressed on the button
    Pressed,
}

/// What a widget is; layout and drawing match on this
#[derive(Debug, Clone)]
pub enum WidgetKind {
    /// Colored rectangle; children keep their manually set positions
    Panel {
        /// Fill color
        color: Vec4,
    },
    /// Text line
    Label {
        /// Displayed text
        text: String,
        /// Font size in pixels; doubles as line height
        font_size: f32,
        /// Text color
        color: Vec4,
    },
    /// Clickable labelled rectangle
    Button {
        /// Button caption
        label: String,
        /// Caption font size in pixels
        font_size: f32,
        /// Space between caption and edges
        padding: f32,
        /// Interaction state
        state: ButtonState,
        /// Fill color while idle
        normal_color: Vec4,
        /// Fill color while hovered
        hover_color: Vec4,
        /// Fill color while pressed
        pressed_color: Vec4,
        /// Fill color committed from the current state
        current_color: Vec4,
    },
    /// Lays children out left to right
    HBox {
        /// Vertical alignment of children
        align: VerticalAlign,
        /// Space between consecutive children
        gap: f32,
    },
    /// Lays children out top to bottom
    VBox {
        /// Horizontal alignment of children
        align: HorizontalAlign,
        /// Space between consecutive children
        gap: f32,
    },
}

/// A node in the widget tree
#[derive(Debug, Clone)]
pub struct Widget {
    /// Horizontal position, assigned by the parent's layout pass
    pub x: f32,

    /// Vertical position, assigned by the parent's layout pass
    pub y: f32,

    /// Actual width, assigned during layout
    pub width: f32,

    /// Actual height, assigned during layout
    pub height: f32,

    /// Preferred width, computed by measure
    pub preferred_width: f32,

    /// Preferred height, computed by measure
    pub preferred_height: f32,

    /// Overrides the measured preferred width when set
    pub explicit_width: Option<f32>,

    /// Overrides the measured preferred height when set
    pub explicit_height: Option<f32>,

    /// Invisible widgets draw nothing (subtree included) but still occupy
    /// their layout slot
    pub visible: bool,

    /// Dirty-state machine
    pub invalid: Invalidation,

    /// What the widget is
    pub kind: WidgetKind,
}

impl Widget {
    /// Create a widget of the given kind, fully invalidated
    pub fn new(kind: WidgetKind) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            preferred_width: 0.0,
            preferred_height: 0.0,
            explicit_width: None,
            explicit_height: None,
            visible: true,
            invalid: Invalidation::all(),
            kind,
        }
    }

    /// A panel with the given fill color
    pub fn panel(color: Vec4) -> Self {
        Self::new(WidgetKind::Panel { color })
    }

    /// A text label
    pub fn label(text: impl Into<String>, font_size: f32) -> Self {
        Self::new(WidgetKind::Label {
            text: text.into(),
            font_size,
            color: Vec4::new(1.0, 1.0, 1.0, 1.0),
        })
    }

    /// A button with default colors
    pub fn button(label: impl Into<String>, font_size: f32) -> Self {
        let normal = Vec4::new(0.25, 0.25, 0.3, 1.0);
        Self::new(WidgetKind::Button {
            label: label.into(),
            font_size,
            padding: 8.0,
            state: ButtonState::Normal,
            normal_color: normal,
            hover_color: Vec4::new(0.35, 0.35, 0.4, 1.0),
            pressed_color: Vec4::new(0.15, 0.15, 0.2, 1.0),
            current_color: normal,
        })
    }

    /// A vertical box container
    pub fn vbox(align: HorizontalAlign, gap: f32) -> Self {
        Self::new(WidgetKind::VBox { align, gap })
    }

    /// A horizontal box container
    pub fn hbox(align: VerticalAlign, gap: f32) -> Self {
        Self::new(WidgetKind::HBox { align, gap })
    }

    /// Builder-style: fix the preferred size
    pub fn with_explicit_size(mut self, width: f32, height: f32) -> Self {
        self.explicit_width = Some(width);
        self.explicit_height = Some(height);
        self
    }

    /// Whether this widget kind can hold children
    pub fn is_container(&self) -> bool {
        matches!(
            self.kind,
            WidgetKind::Panel { .. } | WidgetKind::HBox { .. } | WidgetKind::VBox { .. }
        )
    }

    /// Commit dirty properties into derived state
    ///
    /// Called by the properties validation phase; the flag itself is cleared
    /// by the caller.
    pub(crate) fn commit_properties(&mut self) {
        if let WidgetKind::Button {
            state,
            normal_color,
            hover_color,
            pressed_color,
            current_color,
            ..
        } = &mut self.kind
        {
            *current_color = match state {
                ButtonState::Normal => *normal_color,
                ButtonState::Hovered => *hover_color,
                ButtonState::Pressed => *pressed_color,
            };
        }
    }

    /// Intrinsic preferred size of a leaf widget
    ///
    /// Containers aggregate child sizes instead; see the manager's measure
    /// pass. Text extents use a fixed-advance estimate; the real font
    /// metrics live behind the content boundary.
    pub(crate) fn intrinsic_size(&self) -> (f32, f32) {
        match &self.kind {
            WidgetKind::Label { text, font_size, .. } => {
                (text_width(text, *font_size), *font_size)
            }
            WidgetKind::Button {
                label,
                font_size,
                padding,
                ..
            } => (
                text_width(label, *font_size) + 2.0 * padding,
                font_size + 2.0 * padding,
            ),
            _ => (0.0, 0.0),
        }
    }
}

fn text_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * 0.6
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_widget_is_fully_invalid() {
        let widget = Widget::label("hello", 16.0);
        assert_eq!(widget.invalid, Invalidation::all());
    }

    #[test]
    fn test_label_intrinsic_size() {
        let widget = Widget::label("hi", 10.0);
        let (w, h) = widget.intrinsic_size();
        assert!((w - 12.0).abs() < 1e-3);
        assert_eq!(h, 10.0);
    }

    #[test]
    fn test_button_commit_picks_state_color() {
        let mut widget = Widget::button("ok", 16.0);
        if let WidgetKind::Button { state, .. } = &mut widget.kind {
            *state = ButtonState::Pressed;
        }
        widget.commit_properties();
        if let WidgetKind::Button {
            current_color,
            pressed_color,
            ..
        } = &widget.kind
        {
            assert_eq!(current_color, pressed_color);
        } else {
            unreachable!();
        }
    }
}
