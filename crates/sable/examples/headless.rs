//! Runs a small scene against the headless surface and prints what it drew.
//!
//! A "wanderer" sprite patrols left and right over a tile floor, a wall
//! pushes it back, and a screen-space button is clicked on frame 3.
//!
//! Run with: `cargo run -p sable --example headless`
//! (set `RUST_LOG=debug` to see scene bookkeeping)

use std::time::Duration;

use sable::prelude::*;
use sable::render::DrawCall;

/// Walks horizontally, turning around every `turn_after` seconds.
struct Patrol {
    speed: f32,
    turn_after: f32,
    walked: f32,
}

impl Module for Patrol {
    fn init(&mut self, ctx: &mut ModuleContext<'_>) {
        log::info!("{} starts patrolling at {}", ctx.entity().name(), ctx.position());
    }

    fn update(&mut self, ctx: &mut ModuleContext<'_>) -> HookResult {
        let dt = ctx.time().delta_secs();
        self.walked += dt;
        if self.walked >= self.turn_after {
            self.walked = 0.0;
            self.speed = -self.speed;
        }
        let next = ctx.position() + Vec2::new(self.speed * dt, 0.0);
        ctx.set_position(next);
        Ok(())
    }
}

impl ModuleMeta for Patrol {
    const PRIORITY: i32 = 10;

    fn requirements() -> Vec<Requirement> {
        vec![Requirement::module::<SpriteDisplay>()]
    }
}

fn main() {
    init_logger();

    let mut engine = Engine::new(EngineConfig {
        title: "headless demo".to_string(),
        ..EngineConfig::default()
    });
    engine.register_module::<Patrol>();

    let mut level = engine.create_scene("level");
    level.spawn(
        engine
            .entity("wanderer")
            .at(-2.0, 0.0)
            .with_module(SpriteDisplay::new().size(1.0, 1.0).color(Color::BLUE))
            .with_module(BoxCollider::new(1.0, 1.0))
            .with_module(Patrol {
                speed: 4.0,
                turn_after: 1.0,
                walked: 0.0,
            }),
    );
    level.spawn(
        engine
            .entity("wall")
            .at(1.5, 0.0)
            .with_module(SpriteDisplay::new().size(1.0, 3.0).color(Color::RED))
            .with_module(BoxCollider::new(1.0, 3.0).fixed()),
    );

    let mut floor = TileMap::new(TextureHandle::WHITE, SpriteSheet::new(1, 1, Vec2::ONE), 12, 2);
    floor.fill(0);
    level.spawn(engine.entity("floor").at(-6.0, -3.0).with_module(floor));

    let button = Button::new().on_click(|| log::info!("Button clicked"));
    let hud = engine
        .entity("hud")
        .with_transform(Transform::new().at(Vec2::new(400.0, 40.0)).with_size(Vec2::new(800.0, 80.0)))
        .with_module(Canvas::screen().with_color(Color::BLACK.with_alpha(0.5)))
        .with_child(
            engine
                .entity("pause")
                .with_transform(Transform::new().at(Vec2::new(-340.0, 0.0)).with_size(Vec2::new(100.0, 40.0)))
                .with_module(button),
        )
        .with_child(
            engine
                .entity("logo")
                .with_transform(Transform::new().at(Vec2::new(340.0, 0.0)).with_size(Vec2::new(64.0, 64.0)))
                .with_module(Image::screen(TextureHandle::WHITE).with_tint(Color::GREEN)),
        );
    level.spawn(hud);

    if let Err(e) = engine.scenes_mut().add_scene(level) {
        log::error!("{e}");
        return;
    }
    engine.scenes_mut().load_scene("level");

    let mut surface = HeadlessSurface::default();
    for frame in 0..6 {
        if frame == 3 {
            engine.input_mut().set_cursor(Vec2::new(60.0, 40.0));
            engine.input_mut().press(Binding::Mouse(MouseButton::Left));
        }
        engine.frame_with_delta(&mut surface, Duration::from_millis(250));

        let calls = surface.take_calls();
        let quads = calls.iter().filter(|c| matches!(c, DrawCall::Quad(_))).count();
        let rects = calls.iter().filter(|c| matches!(c, DrawCall::Rect { .. })).count();
        println!("frame {frame}: {quads} quads, {rects} rects");

        if let Some(scene) = engine.scenes().active() {
            if let Some(wanderer) = scene.find("wanderer") {
                println!("  wanderer at {}", wanderer.position());
            }
        }
    }

    for log in sable::logging::drain_captured_logs(usize::MAX) {
        println!("[{:>5}] {}", log.level, log.message);
    }
}
