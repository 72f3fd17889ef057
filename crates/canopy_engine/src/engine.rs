//! Engine coordinator
//!
//! Owns the three per-frame managers and dispatches their updates in
//! update-order each frame (lower orders first, construction order breaking
//! ties). The frame model is single-threaded and synchronous: every update
//! completes within the calling frame.

use crate::config::EngineConfig;
use crate::foundation::time::Timer;
use crate::gui::{GuiBackend, GuiManager};
use crate::physics::PhysicsManager;
use crate::plugin::Plugin;
use crate::render::{self, PostChain, RenderBackend};
use crate::scene::SceneManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ManagerSlot {
    Physics,
    Scene,
    Gui,
}

/// Top-level engine owning all managers
pub struct Engine {
    physics: PhysicsManager,
    scene: SceneManager,
    gui: GuiManager,
    post: PostChain,
    timer: Timer,
}

impl Engine {
    /// Create an engine from configuration
    pub fn new(config: EngineConfig) -> Self {
        log::info!("initializing engine");
        Self {
            physics: PhysicsManager::new(&config.physics),
            scene: SceneManager::new(),
            gui: GuiManager::new(&config.gui),
            post: PostChain::new(),
            timer: Timer::new(),
        }
    }

    /// The physics manager
    pub fn physics(&self) -> &PhysicsManager {
        &self.physics
    }

    /// The physics manager, mutable
    pub fn physics_mut(&mut self) -> &mut PhysicsManager {
        &mut self.physics
    }

    /// The scene manager
    pub fn scene(&self) -> &SceneManager {
        &self.scene
    }

    /// The scene manager, mutable
    pub fn scene_mut(&mut self) -> &mut SceneManager {
        &mut self.scene
    }

    /// Split mutable access to scene and physics managers
    ///
    /// Entity operations cascade into physics, so the two are usually
    /// borrowed together.
    pub fn managers_mut(&mut self) -> (&mut SceneManager, &mut PhysicsManager) {
        (&mut self.scene, &mut self.physics)
    }

    /// The GUI manager
    pub fn gui(&self) -> &GuiManager {
        &self.gui
    }

    /// The GUI manager, mutable
    pub fn gui_mut(&mut self) -> &mut GuiManager {
        &mut self.gui
    }

    /// The post-process chain
    pub fn post_chain(&self) -> &PostChain {
        &self.post
    }

    /// The post-process chain, mutable
    pub fn post_chain_mut(&mut self) -> &mut PostChain {
        &mut self.post
    }

    /// Frame timing
    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    /// Advance one frame using wall-clock elapsed time
    pub fn update(&mut self) {
        self.timer.update();
        let dt = self.timer.delta_time();
        self.advance(dt);
    }

    /// Advance one frame by an explicit timestep
    ///
    /// Enabled managers run in ascending update-order; ties keep
    /// construction order (physics, scene, GUI). The sort reads each
    /// manager's live `update_order`, so reordering takes effect the next
    /// frame.
    pub fn advance(&mut self, dt: f32) {
        let mut order = [
            (self.physics.update_order(), 0usize, ManagerSlot::Physics),
            (self.scene.update_order(), 1, ManagerSlot::Scene),
            (self.gui.update_order(), 2, ManagerSlot::Gui),
        ];
        order.sort_by_key(|&(update_order, index, _)| (update_order, index));

        for (_, _, slot) in order {
            match slot {
                ManagerSlot::Physics => {
                    if self.physics.is_enabled() {
                        self.physics.update(dt);
                    }
                }
                ManagerSlot::Scene => {
                    if self.scene.is_enabled() {
                        self.scene.update(dt, &mut self.physics);
                    }
                }
                ManagerSlot::Gui => {
                    if self.gui.is_enabled() {
                        self.gui.update();
                    }
                }
            }
        }
    }

    /// Draw the frame: layer-sorted scene pass, then the GUI pass
    ///
    /// World matrices must be current, which [`advance`](Self::advance)
    /// guarantees. The post chain rides along as an opaque pipeline stage
    /// the render backend may consume via [`post_chain`](Self::post_chain).
    pub fn draw(
        &mut self,
        renderer: &mut dyn RenderBackend,
        gui_backend: &mut dyn GuiBackend,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let items = self.scene.graph().collect_drawables();
        render::draw_scene(renderer, items)?;
        self.gui.draw(gui_backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::factory;
    use crate::foundation::math::Vec3;
    use crate::gui::{HorizontalAlign, Widget};
    use crate::render::GeometryHandle;

    #[test]
    fn test_frame_advances_physics_and_scene() {
        let mut engine = Engine::new(EngineConfig::default());
        let (scene, physics) = engine.managers_mut();
        factory::physics_plane(scene, physics, "floor", Vec3::y_axis()).unwrap();
        let crate_key = factory::physics_crate(
            scene,
            physics,
            "crate",
            Vec3::new(0.5, 0.5, 0.5),
            Vec3::new(0.0, 4.0, 0.0),
            GeometryHandle::new(1, 1, 36),
        )
        .unwrap();

        for _ in 0..30 {
            engine.advance(1.0 / 60.0);
        }

        let node = engine.scene().entity(crate_key).unwrap().spatial().unwrap().node;
        let y = engine.scene().graph().node(node).unwrap().local.position.y;
        assert!(y < 4.0, "crate should have fallen, y = {y}");
    }

    #[test]
    fn test_disabled_gui_keeps_dirty_flags() {
        let mut engine = Engine::new(EngineConfig::default());
        let label = engine.gui_mut().add_root(Widget::label("score", 16.0));
        engine.gui_mut().set_enabled(false);

        engine.advance(1.0 / 60.0);
        assert!(!engine.gui().invalidation(label).unwrap().is_empty());

        engine.gui_mut().set_enabled(true);
        engine.advance(1.0 / 60.0);
        assert!(engine.gui().invalidation(label).unwrap().is_empty());
    }

    #[test]
    fn test_vbox_hud_validates_through_engine() {
        let mut engine = Engine::new(EngineConfig::default());
        let hud = engine.gui_mut().add_root(Widget::vbox(HorizontalAlign::Left, 4.0));
        engine.gui_mut().add_child(hud, Widget::label("hp", 16.0)).unwrap();
        engine.gui_mut().add_child(hud, Widget::label("ammo", 16.0)).unwrap();

        engine.advance(1.0 / 60.0);
        assert_eq!(engine.gui().widget(hud).unwrap().height, 16.0 + 4.0 + 16.0);
    }
}
