//! GUI manager: widget tree, validation cascade, draw command emission
//!
//! Mutations go through the manager's setters, which mark the right dirty
//! flags and propagate size invalidation to ancestors; [`GuiManager::update`]
//! then validates the whole tree in three phases. Setters return whether a
//! change actually occurred.

use crate::config::GuiConfig;
use crate::foundation::math::Vec4;
use crate::plugin::{Plugin, PluginCore};
use crate::scene::{NodeArena, NodeKey};

use super::backend::{GuiBackend, GuiDrawCommand};
use super::widget::{
    ButtonState, HorizontalAlign, Invalidation, VerticalAlign, Widget, WidgetKind,
};
use super::GuiError;

/// Stable handle to a widget in the tree
pub type WidgetKey = NodeKey;

enum LayoutPlan {
    VBox(HorizontalAlign, f32, f32),
    HBox(VerticalAlign, f32, f32),
    Panel,
}

/// Widget tree and per-frame validation driver
pub struct GuiManager {
    core: PluginCore,
    tree: NodeArena<Widget>,
    reference_width: f32,
    reference_height: f32,
}

impl GuiManager {
    /// Create an empty GUI
    pub fn new(config: &GuiConfig) -> Self {
        Self {
            core: PluginCore::new("gui", 20),
            tree: NodeArena::new(),
            reference_width: config.reference_width,
            reference_height: config.reference_height,
        }
    }

    /// Reference screen size widget coordinates are authored against
    pub fn reference_size(&self) -> (f32, f32) {
        (self.reference_width, self.reference_height)
    }

    /// Add a root widget
    pub fn add_root(&mut self, widget: Widget) -> WidgetKey {
        self.tree.insert(widget)
    }

    /// Add a widget as the last child of `parent`
    ///
    /// Fails unless `parent` is a container kind. The parent's size is
    /// invalidated: a new child changes its aggregate preferred size.
    pub fn add_child(&mut self, parent: WidgetKey, widget: Widget) -> Result<WidgetKey, GuiError> {
        let container = self
            .tree
            .get(parent)
            .ok_or(GuiError::WidgetNotFound)?
            .is_container();
        if !container {
            return Err(GuiError::NotAContainer);
        }
        let key = self
            .tree
            .insert_child(parent, widget)
            .map_err(|_| GuiError::WidgetNotFound)?;
        self.invalidate_size(parent);
        Ok(key)
    }

    /// Remove a widget and its subtree
    pub fn remove(&mut self, key: WidgetKey) -> Result<(), GuiError> {
        let parent = self.tree.parent(key);
        self.tree.remove(key).map_err(|_| GuiError::WidgetNotFound)?;
        if let Some(parent) = parent {
            self.invalidate_size(parent);
        }
        Ok(())
    }

    /// Access a widget
    pub fn widget(&self, key: WidgetKey) -> Option<&Widget> {
        self.tree.get(key)
    }

    /// A widget's current dirty flags
    pub fn invalidation(&self, key: WidgetKey) -> Option<Invalidation> {
        self.tree.get(key).map(|w| w.invalid)
    }

    /// Number of live widgets
    pub fn widget_count(&self) -> usize {
        self.tree.len()
    }

    /// Set label or button caption text; returns whether it changed
    pub fn set_text(&mut self, key: WidgetKey, text: &str) -> Result<bool, GuiError> {
        let widget = self.tree.get_mut(key).ok_or(GuiError::WidgetNotFound)?;
        let slot = match &mut widget.kind {
            WidgetKind::Label { text, .. } => text,
            WidgetKind::Button { label, .. } => label,
            _ => return Err(GuiError::WrongKind),
        };
        if slot.as_str() == text {
            return Ok(false);
        }
        *slot = text.to_string();
        widget.invalid.insert(Invalidation::PROPERTIES);
        self.invalidate_size(key);
        Ok(true)
    }

    /// Set visibility; returns whether it changed
    ///
    /// Invisible widgets keep their layout slot, so this never invalidates
    /// size or layout.
    pub fn set_visible(&mut self, key: WidgetKey, visible: bool) -> Result<bool, GuiError> {
        let widget = self.tree.get_mut(key).ok_or(GuiError::WidgetNotFound)?;
        if widget.visible == visible {
            return Ok(false);
        }
        widget.visible = visible;
        widget.invalid.insert(Invalidation::PROPERTIES);
        Ok(true)
    }

    /// Override (or clear) the preferred width
    pub fn set_explicit_width(&mut self, key: WidgetKey, width: Option<f32>) -> Result<bool, GuiError> {
        let widget = self.tree.get_mut(key).ok_or(GuiError::WidgetNotFound)?;
        if widget.explicit_width == width {
            return Ok(false);
        }
        widget.explicit_width = width;
        self.invalidate_size(key);
        Ok(true)
    }

    /// Override (or clear) the preferred height
    pub fn set_explicit_height(&mut self, key: WidgetKey, height: Option<f32>) -> Result<bool, GuiError> {
        let widget = self.tree.get_mut(key).ok_or(GuiError::WidgetNotFound)?;
        if widget.explicit_height == height {
            return Ok(false);
        }
        widget.explicit_height = height;
        self.invalidate_size(key);
        Ok(true)
    }

    /// Set a widget's position within a panel parent
    ///
    /// Box containers overwrite positions during layout; this is for
    /// free-placed panel children.
    pub fn set_position(&mut self, key: WidgetKey, x: f32, y: f32) -> Result<(), GuiError> {
        let widget = self.tree.get_mut(key).ok_or(GuiError::WidgetNotFound)?;
        widget.x = x;
        widget.y = y;
        if let Some(parent) = self.tree.parent(key) {
            self.invalidate_size(parent);
        }
        Ok(())
    }

    /// Set the inter-child gap of a box container
    pub fn set_gap(&mut self, key: WidgetKey, gap: f32) -> Result<bool, GuiError> {
        let widget = self.tree.get_mut(key).ok_or(GuiError::WidgetNotFound)?;
        let slot = match &mut widget.kind {
            WidgetKind::VBox { gap, .. } | WidgetKind::HBox { gap, .. } => gap,
            _ => return Err(GuiError::WrongKind),
        };
        if *slot == gap {
            return Ok(false);
        }
        *slot = gap;
        self.invalidate_size(key);
        Ok(true)
    }

    /// Set a VBox's horizontal child alignment
    pub fn set_vbox_alignment(
        &mut self,
        key: WidgetKey,
        align: HorizontalAlign,
    ) -> Result<bool, GuiError> {
        let widget = self.tree.get_mut(key).ok_or(GuiError::WidgetNotFound)?;
        match &mut widget.kind {
            WidgetKind::VBox { align: slot, .. } => {
                if *slot == align {
                    return Ok(false);
                }
                *slot = align;
                widget.invalid.insert(Invalidation::LAYOUT);
                Ok(true)
            }
            _ => Err(GuiError::WrongKind),
        }
    }

    /// Set an HBox's vertical child alignment
    pub fn set_hbox_alignment(
        &mut self,
        key: WidgetKey,
        align: VerticalAlign,
    ) -> Result<bool, GuiError> {
        let widget = self.tree.get_mut(key).ok_or(GuiError::WidgetNotFound)?;
        match &mut widget.kind {
            WidgetKind::HBox { align: slot, .. } => {
                if *slot == align {
                    return Ok(false);
                }
                *slot = align;
                widget.invalid.insert(Invalidation::LAYOUT);
                Ok(true)
            }
            _ => Err(GuiError::WrongKind),
        }
    }

    /// Set a button's interaction state
    pub fn set_button_state(&mut self, key: WidgetKey, state: ButtonState) -> Result<bool, GuiError> {
        let widget = self.tree.get_mut(key).ok_or(GuiError::WidgetNotFound)?;
        match &mut widget.kind {
            WidgetKind::Button { state: slot, .. } => {
                if *slot == state {
                    return Ok(false);
                }
                *slot = state;
                widget.invalid.insert(Invalidation::PROPERTIES);
                Ok(true)
            }
            _ => Err(GuiError::WrongKind),
        }
    }

    /// Validate the whole tree: commit properties, measure, layout
    ///
    /// Each phase completes tree-wide before the next begins. Properties
    /// commit top-down; measure runs bottom-up so containers aggregate
    /// already-validated child preferred sizes; layout runs top-down from
    /// each container's already-final size. Re-running with no intervening
    /// mutation is a no-op.
    pub fn update(&mut self) {
        let pre = self.pre_order();

        for &key in &pre {
            if let Some(widget) = self.tree.get_mut(key) {
                if widget.invalid.contains(Invalidation::PROPERTIES) {
                    widget.commit_properties();
                    widget.invalid.remove(Invalidation::PROPERTIES);
                }
            }
        }

        // Reverse pre-order visits every child before its parent.
        for &key in pre.iter().rev() {
            let needs = self
                .tree
                .get(key)
                .is_some_and(|w| w.invalid.contains(Invalidation::SIZE));
            if !needs {
                continue;
            }
            let (measured_w, measured_h) = self.measure(key);
            if let Some(widget) = self.tree.get_mut(key) {
                widget.preferred_width = widget.explicit_width.unwrap_or(measured_w);
                widget.preferred_height = widget.explicit_height.unwrap_or(measured_h);
                widget.invalid.remove(Invalidation::SIZE);
            }
        }

        for &key in &pre {
            if self.tree.parent(key).is_none() {
                if let Some(widget) = self.tree.get_mut(key) {
                    widget.width = widget.preferred_width;
                    widget.height = widget.preferred_height;
                }
            }
            let needs = self
                .tree
                .get(key)
                .is_some_and(|w| w.invalid.contains(Invalidation::LAYOUT));
            if needs {
                self.layout_children(key);
                if let Some(widget) = self.tree.get_mut(key) {
                    widget.invalid.remove(Invalidation::LAYOUT);
                }
            }
        }
    }

    /// Flatten the visible widget tree into draw commands
    ///
    /// Commands are in tree order (parents before children, children in
    /// sibling order) with positions resolved to absolute coordinates. An
    /// invisible widget suppresses its whole subtree.
    pub fn draw_commands(&self) -> Vec<GuiDrawCommand> {
        let mut commands = Vec::new();
        for &root in self.tree.roots() {
            self.collect_commands(root, 0.0, 0.0, &mut commands);
        }
        commands
    }

    /// Emit this frame's draw commands through a backend
    pub fn draw(&self, backend: &mut dyn GuiBackend) -> Result<(), Box<dyn std::error::Error>> {
        backend.begin_gui_pass()?;
        for command in self.draw_commands() {
            backend.draw_command(&command)?;
        }
        backend.end_gui_pass()
    }

    fn collect_commands(&self, key: WidgetKey, ox: f32, oy: f32, out: &mut Vec<GuiDrawCommand>) {
        let widget = match self.tree.get(key) {
            Some(w) => w,
            None => return,
        };
        if !widget.visible {
            return;
        }
        let x = ox + widget.x;
        let y = oy + widget.y;
        match &widget.kind {
            WidgetKind::Panel { color } => out.push(GuiDrawCommand::Quad {
                x,
                y,
                width: widget.width,
                height: widget.height,
                color: *color,
            }),
            WidgetKind::Label {
                text,
                font_size,
                color,
            } => out.push(GuiDrawCommand::Text {
                x,
                y,
                text: text.clone(),
                font_size: *font_size,
                color: *color,
            }),
            WidgetKind::Button {
                label,
                font_size,
                padding,
                current_color,
                ..
            } => {
                out.push(GuiDrawCommand::Quad {
                    x,
                    y,
                    width: widget.width,
                    height: widget.height,
                    color: *current_color,
                });
                out.push(GuiDrawCommand::Text {
                    x: x + padding,
                    y: y + padding,
                    text: label.clone(),
                    font_size: *font_size,
                    color: Vec4::new(1.0, 1.0, 1.0, 1.0),
                });
            }
            WidgetKind::HBox { .. } | WidgetKind::VBox { .. } => {}
        }
        for &child in self.tree.children(key) {
            self.collect_commands(child, x, y, out);
        }
    }

    fn pre_order(&self) -> Vec<WidgetKey> {
        let mut keys = Vec::with_capacity(self.tree.len());
        for &root in self.tree.roots() {
            keys.push(root);
            keys.extend(self.tree.descendants(root));
        }
        keys
    }

    /// Mark `key` and every ancestor as needing measure and layout
    ///
    /// A child's preferred size feeds its parent's aggregate, so size
    /// invalidation always climbs to the root.
    fn invalidate_size(&mut self, key: WidgetKey) {
        let mut current = Some(key);
        while let Some(k) = current {
            if let Some(widget) = self.tree.get_mut(k) {
                widget.invalid.insert(Invalidation::SIZE | Invalidation::LAYOUT);
            }
            current = self.tree.parent(k);
        }
    }

    fn measure(&self, key: WidgetKey) -> (f32, f32) {
        let widget = match self.tree.get(key) {
            Some(w) => w,
            None => return (0.0, 0.0),
        };
        let children = self.tree.children(key);
        match &widget.kind {
            WidgetKind::VBox { gap, .. } => {
                let mut width = 0.0f32;
                let mut height = 0.0f32;
                for (i, &child) in children.iter().enumerate() {
                    if let Some(c) = self.tree.get(child) {
                        width = width.max(c.preferred_width);
                        height += c.preferred_height;
                        if i + 1 < children.len() {
                            height += gap;
                        }
                    }
                }
                (width, height)
            }
            WidgetKind::HBox { gap, .. } => {
                let mut width = 0.0f32;
                let mut height = 0.0f32;
                for (i, &child) in children.iter().enumerate() {
                    if let Some(c) = self.tree.get(child) {
                        height = height.max(c.preferred_height);
                        width += c.preferred_width;
                        if i + 1 < children.len() {
                            width += gap;
                        }
                    }
                }
                (width, height)
            }
            WidgetKind::Panel { .. } => {
                let mut width = 0.0f32;
                let mut height = 0.0f32;
                for &child in children {
                    if let Some(c) = self.tree.get(child) {
                        width = width.max(c.x + c.preferred_width);
                        height = height.max(c.y + c.preferred_height);
                    }
                }
                (width, height)
            }
            _ => widget.intrinsic_size(),
        }
    }

    fn layout_children(&mut self, key: WidgetKey) {
        let plan = match self.tree.get(key) {
            Some(w) => match w.kind {
                WidgetKind::VBox { align, gap } => LayoutPlan::VBox(align, gap, w.width),
                WidgetKind::HBox { align, gap } => LayoutPlan::HBox(align, gap, w.height),
                WidgetKind::Panel { .. } => LayoutPlan::Panel,
                _ => return,
            },
            None => return,
        };
        let children: Vec<WidgetKey> = self.tree.children(key).to_vec();

        match plan {
            LayoutPlan::VBox(align, gap, width) => {
                let reference_x = match align {
                    HorizontalAlign::Left => 0.0,
                    HorizontalAlign::Center => width / 2.0,
                    HorizontalAlign::Right => width,
                };
                let mut y = 0.0;
                for child in children {
                    if let Some(c) = self.tree.get_mut(child) {
                        c.width = c.preferred_width;
                        c.height = c.preferred_height;
                        c.x = reference_x
                            - match align {
                                HorizontalAlign::Left => 0.0,
                                HorizontalAlign::Center => c.width / 2.0,
                                HorizontalAlign::Right => c.width,
                            };
                        c.y = y;
                        y += c.height + gap;
                    }
                }
            }
            LayoutPlan::HBox(align, gap, height) => {
                let reference_y = match align {
                    VerticalAlign::Top => 0.0,
                    VerticalAlign::Middle => height / 2.0,
                    VerticalAlign::Bottom => height,
                };
                let mut x = 0.0;
                for child in children {
                    if let Some(c) = self.tree.get_mut(child) {
                        c.width = c.preferred_width;
                        c.height = c.preferred_height;
                        c.y = reference_y
                            - match align {
                                VerticalAlign::Top => 0.0,
                                VerticalAlign::Middle => c.height / 2.0,
                                VerticalAlign::Bottom => c.height,
                            };
                        c.x = x;
                        x += c.width + gap;
                    }
                }
            }
            LayoutPlan::Panel => {
                // Free placement: children keep their positions, sizes
                // snap to preferred.
                for child in children {
                    if let Some(c) = self.tree.get_mut(child) {
                        c.width = c.preferred_width;
                        c.height = c.preferred_height;
                    }
                }
            }
        }
    }
}

impl Plugin for GuiManager {
    fn core(&self) -> &PluginCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut PluginCore {
        &mut self.core
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec4;

    fn manager() -> GuiManager {
        GuiManager::new(&GuiConfig::default())
    }

    fn sized_panel(width: f32, height: f32) -> Widget {
        Widget::panel(Vec4::new(0.5, 0.5, 0.5, 1.0)).with_explicit_size(width, height)
    }

    #[test]
    fn test_vbox_left_stacks_children() {
        let mut gui = manager();
        let vbox = gui.add_root(Widget::vbox(HorizontalAlign::Left, 5.0));
        let children: Vec<WidgetKey> = [10.0, 20.0, 30.0]
            .iter()
            .map(|&h| gui.add_child(vbox, sized_panel(h, h)).unwrap())
            .collect();

        gui.update();

        let root = gui.widget(vbox).unwrap();
        assert_eq!(root.height, 10.0 + 20.0 + 30.0 + 5.0 * 2.0);
        assert_eq!(root.width, 30.0);

        let ys: Vec<f32> = children.iter().map(|&k| gui.widget(k).unwrap().y).collect();
        assert_eq!(ys, vec![0.0, 15.0, 40.0]);
        let xs: Vec<f32> = children.iter().map(|&k| gui.widget(k).unwrap().x).collect();
        assert_eq!(xs, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_vbox_center_offsets_by_half_child_width() {
        let mut gui = manager();
        let vbox = gui.add_root(Widget::vbox(HorizontalAlign::Center, 0.0));
        let narrow = gui.add_child(vbox, sized_panel(10.0, 10.0)).unwrap();
        let wide = gui.add_child(vbox, sized_panel(20.0, 10.0)).unwrap();

        gui.update();

        assert_eq!(gui.widget(vbox).unwrap().width, 20.0);
        assert_eq!(gui.widget(narrow).unwrap().x, 5.0);
        assert_eq!(gui.widget(wide).unwrap().x, 0.0);
    }

    #[test]
    fn test_vbox_right_aligns_right_edges() {
        let mut gui = manager();
        let vbox = gui.add_root(Widget::vbox(HorizontalAlign::Right, 0.0));
        let narrow = gui.add_child(vbox, sized_panel(10.0, 10.0)).unwrap();
        let wide = gui.add_child(vbox, sized_panel(20.0, 10.0)).unwrap();

        gui.update();

        assert_eq!(gui.widget(narrow).unwrap().x, 10.0);
        assert_eq!(gui.widget(wide).unwrap().x, 0.0);
    }

    #[test]
    fn test_hbox_is_transposed_mirror() {
        let mut gui = manager();
        let hbox = gui.add_root(Widget::hbox(VerticalAlign::Bottom, 5.0));
        let short = gui.add_child(hbox, sized_panel(10.0, 10.0)).unwrap();
        let tall = gui.add_child(hbox, sized_panel(20.0, 20.0)).unwrap();

        gui.update();

        let root = gui.widget(hbox).unwrap();
        assert_eq!(root.width, 35.0);
        assert_eq!(root.height, 20.0);
        assert_eq!(gui.widget(short).unwrap().y, 10.0);
        assert_eq!(gui.widget(tall).unwrap().y, 0.0);
        assert_eq!(gui.widget(short).unwrap().x, 0.0);
        assert_eq!(gui.widget(tall).unwrap().x, 15.0);
    }

    #[test]
    fn test_size_invalidation_climbs_to_ancestors() {
        let mut gui = manager();
        let vbox = gui.add_root(Widget::vbox(HorizontalAlign::Left, 0.0));
        let child = gui.add_child(vbox, sized_panel(10.0, 10.0)).unwrap();
        gui.update();
        assert!(gui.invalidation(vbox).unwrap().is_empty());

        assert!(gui.set_explicit_height(child, Some(25.0)).unwrap());

        let child_flags = gui.invalidation(child).unwrap();
        assert!(child_flags.contains(Invalidation::SIZE));
        let parent_flags = gui.invalidation(vbox).unwrap();
        assert!(parent_flags.contains(Invalidation::SIZE | Invalidation::LAYOUT));

        gui.update();
        assert!(gui.invalidation(child).unwrap().is_empty());
        assert!(gui.invalidation(vbox).unwrap().is_empty());
        assert_eq!(gui.widget(vbox).unwrap().height, 25.0);
    }

    #[test]
    fn test_validation_is_idempotent() {
        let mut gui = manager();
        let vbox = gui.add_root(Widget::vbox(HorizontalAlign::Center, 2.0));
        let child = gui.add_child(vbox, sized_panel(10.0, 10.0)).unwrap();
        gui.update();

        let before = gui.widget(child).unwrap().clone();
        gui.update();
        let after = gui.widget(child).unwrap();
        assert_eq!(before.x, after.x);
        assert_eq!(before.y, after.y);
        assert!(after.invalid.is_empty());
    }

    #[test]
    fn test_set_text_marks_properties_and_size() {
        let mut gui = manager();
        let label = gui.add_root(Widget::label("hp: 100", 16.0));
        gui.update();

        assert!(gui.set_text(label, "hp: 99").unwrap());
        let flags = gui.invalidation(label).unwrap();
        assert!(flags.contains(Invalidation::PROPERTIES));
        assert!(flags.contains(Invalidation::SIZE));

        // No change reported for identical text
        assert!(!gui.set_text(label, "hp: 99").unwrap());
    }

    #[test]
    fn test_add_child_to_leaf_rejected() {
        let mut gui = manager();
        let label = gui.add_root(Widget::label("leaf", 16.0));
        assert!(matches!(
            gui.add_child(label, sized_panel(1.0, 1.0)),
            Err(GuiError::NotAContainer)
        ));
    }

    #[test]
    fn test_invisible_subtree_emits_no_commands() {
        let mut gui = manager();
        let vbox = gui.add_root(Widget::vbox(HorizontalAlign::Left, 0.0));
        let panel = gui.add_child(vbox, sized_panel(10.0, 10.0)).unwrap();
        gui.add_child(panel, sized_panel(5.0, 5.0)).unwrap();
        gui.update();
        assert_eq!(gui.draw_commands().len(), 2);

        gui.set_visible(panel, false).unwrap();
        gui.update();
        assert!(gui.draw_commands().is_empty());
    }

    #[test]
    fn test_draw_commands_use_absolute_coordinates() {
        let mut gui = manager();
        let vbox = gui.add_root(Widget::vbox(HorizontalAlign::Left, 5.0));
        gui.add_child(vbox, sized_panel(10.0, 10.0)).unwrap();
        let second = gui.add_child(vbox, sized_panel(10.0, 10.0)).unwrap();
        gui.add_child(second, sized_panel(4.0, 4.0)).unwrap();
        gui.update();

        let commands = gui.draw_commands();
        // Second panel at y=15; its child inherits that origin.
        match &commands[1] {
            GuiDrawCommand::Quad { y, .. } => assert_eq!(*y, 15.0),
            other => panic!("unexpected command {other:?}"),
        }
        match &commands[2] {
            GuiDrawCommand::Quad { y, .. } => assert_eq!(*y, 15.0),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_button_state_committed_on_update() {
        let mut gui = manager();
        let button = gui.add_root(Widget::button("fire", 16.0));
        gui.update();

        gui.set_button_state(button, ButtonState::Hovered).unwrap();
        gui.update();

        if let WidgetKind::Button {
            current_color,
            hover_color,
            ..
        } = &gui.widget(button).unwrap().kind
        {
            assert_eq!(current_color, hover_color);
        } else {
            unreachable!();
        }
    }
}
