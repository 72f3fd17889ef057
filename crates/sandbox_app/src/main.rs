//! Headless sandbox scene
//!
//! Builds a physics floor, drops a stack of crates onto it, and runs a VBox
//! HUD, stepping a fixed number of frames against recording backends. Run
//! with `RUST_LOG=info` to watch the crates settle.

use canopy_engine::entity::factory;
use canopy_engine::gui::GuiError;
use canopy_engine::prelude::*;
use canopy_engine::scene::SceneError;

/// Render backend that counts draw calls instead of issuing them
#[derive(Default)]
struct RecordingRenderer {
    draws: usize,
    layers: Vec<i32>,
}

impl RenderBackend for RecordingRenderer {
    fn begin_draw(&mut self, _item: &DrawItem) -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }

    fn draw(&mut self, item: &DrawItem) -> Result<(), Box<dyn std::error::Error>> {
        self.draws += 1;
        self.layers.push(item.layer);
        Ok(())
    }

    fn end_draw(&mut self, _item: &DrawItem) -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }
}

/// GUI backend that counts commands
#[derive(Default)]
struct RecordingGui {
    commands: usize,
}

impl GuiBackend for RecordingGui {
    fn begin_gui_pass(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }

    fn draw_command(&mut self, _command: &GuiDrawCommand) -> Result<(), Box<dyn std::error::Error>> {
        self.commands += 1;
        Ok(())
    }

    fn end_gui_pass(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }
}

fn build_scene(engine: &mut Engine) -> Result<Vec<EntityKey>, SceneError> {
    let (scene, physics) = engine.managers_mut();
    factory::physics_plane(scene, physics, "floor", Vec3::y_axis())?;

    let crate_geometry = GeometryHandle::new(1, 1, 36);
    let mut crates = Vec::new();
    for i in 0..4 {
        let name = format!("crate_{i}");
        let key = factory::physics_crate(
            scene,
            physics,
            &name,
            Vec3::new(0.5, 0.5, 0.5),
            Vec3::new(0.1 * i as f32, 2.0 + 1.5 * i as f32, 0.0),
            crate_geometry,
        )?;
        crates.push(key);
    }
    Ok(crates)
}

fn build_hud(engine: &mut Engine) -> Result<WidgetKey, GuiError> {
    let gui = engine.gui_mut();
    let hud = gui.add_root(Widget::vbox(HorizontalAlign::Left, 4.0));
    gui.add_child(hud, Widget::label("canopy sandbox", 20.0))?;
    gui.add_child(hud, Widget::label("crates: 4", 16.0))?;
    gui.add_child(hud, Widget::button("reset", 16.0))?;
    Ok(hud)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = match EngineConfig::load_from_file("sandbox.toml") {
        Ok(config) => config,
        Err(_) => EngineConfig::default(),
    };
    let mut engine = Engine::new(config);

    let crates = build_scene(&mut engine)?;
    build_hud(&mut engine)?;

    let mut renderer = RecordingRenderer::default();
    let mut gui_backend = RecordingGui::default();

    const FRAMES: u32 = 240;
    const DT: f32 = 1.0 / 60.0;
    for frame in 0..FRAMES {
        engine.advance(DT);
        engine.draw(&mut renderer, &mut gui_backend)?;

        if frame % 60 == 0 {
            for &key in &crates {
                let entity = engine.scene().entity(key).expect("crate entity");
                let node = entity.spatial().expect("crate node").node;
                let position = engine.scene().graph().node(node).expect("live node").local.position;
                log::info!(
                    "frame {frame}: {} at ({:.2}, {:.2}, {:.2})",
                    entity.name(),
                    position.x,
                    position.y,
                    position.z
                );
            }
        }
    }

    log::info!(
        "ran {FRAMES} frames: {} scene draws, {} gui commands",
        renderer.draws,
        gui_backend.commands
    );

    // All crates should have settled on or above the floor plane.
    for &key in &crates {
        let node = engine.scene().entity(key).unwrap().spatial().unwrap().node;
        let y = engine.scene().graph().node(node).unwrap().local.position.y;
        assert!(y > 0.0, "crate fell through the floor (y = {y})");
    }

    Ok(())
}
