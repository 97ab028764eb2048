//! # UI — Canvases and Clickable Elements
//!
//! A [`Canvas`] is a rectangle-transform entity whose *children* are its UI
//! elements. A canvas lives either in screen space (positions are window
//! pixels) or in world space (positions are world units, seen through the
//! camera).
//!
//! ```text
//! Canvas "hud" (Screen, layer 0)
//!  ├ "play"  Button   rect (100, 40) centered at (400, 300)
//!  └ "quit"  Button   rect (100, 40) centered at (400, 360)
//! ```
//!
//! ## Interaction
//!
//! [`UiHandler::update`] runs once per frame after the physics pass. Canvases
//! are ordered by (mode, layer), screen canvases first. On a left-mouse
//! press, each canvas hit-tests its children's rectangles against the cursor
//! and clicks every [`Clickable`] module on each child that was hit. The
//! first canvas with a hit consumes the press.

use crate::camera::CameraView;
use crate::ecs::{
    Capability, Clickable, Entity, EntityId, EntityStore, Module, ModuleId, ModuleMeta,
    ModuleType, Requirement, Transform,
};
use crate::input::{InputState, MouseButton};
use crate::math::{BoundingBox, Rect, Vec2};
use crate::render::{Color, Quad, RenderMode, Renderable, Surface, TextureHandle};

// ── Canvas ──────────────────────────────────────────────────────────────

/// Root of a group of UI elements.
///
/// The render mode decides which draw list the canvas joins, and is read
/// when the canvas is attached.
#[derive(Debug, Clone)]
pub struct Canvas {
    pub layer: i32,
    mode: RenderMode,
    /// Background fill. Transparent canvases draw nothing.
    pub color: Color,
}

impl Canvas {
    pub fn screen() -> Self {
        Self {
            layer: 0,
            mode: RenderMode::Screen,
            color: Color::TRANSPARENT,
        }
    }

    pub fn world() -> Self {
        Self {
            mode: RenderMode::World,
            ..Self::screen()
        }
    }

    pub fn with_layer(mut self, layer: i32) -> Self {
        self.layer = layer;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }
}

/// A rectangle transform's rectangle in pixels.
fn pixel_rect(mode: RenderMode, transform: &Transform, view: &CameraView) -> Option<BoundingBox> {
    let rect = transform.rect()?;
    Some(match mode {
        RenderMode::Screen => rect,
        RenderMode::World => {
            let a = view.world_to_screen(rect.min);
            let b = view.world_to_screen(rect.max);
            BoundingBox::new(a.min(b), a.max(b))
        }
    })
}

fn rect_visible(mode: RenderMode, transform: &Transform, view: &CameraView) -> bool {
    let Some(rect) = transform.rect() else {
        return false;
    };
    match mode {
        RenderMode::Screen => rect.intersects(&view.screen_bounds),
        RenderMode::World => rect.intersects(&view.world_bounds),
    }
}

impl Renderable for Canvas {
    fn layer(&self) -> i32 {
        self.layer
    }

    fn is_visible(&self, transform: &Transform, view: &CameraView) -> bool {
        rect_visible(self.mode, transform, view)
    }

    fn draw(&self, transform: &Transform, view: &CameraView, surface: &mut dyn Surface) {
        if self.color.a <= 0.0 {
            return;
        }
        if let Some(rect) = pixel_rect(self.mode, transform, view) {
            surface.draw_rect(rect, self.color, true);
        }
    }
}

impl Module for Canvas {
    fn render_screen(&self) -> Option<&dyn Renderable> {
        (self.mode == RenderMode::Screen).then_some(self as &dyn Renderable)
    }

    fn render_world(&self) -> Option<&dyn Renderable> {
        (self.mode == RenderMode::World).then_some(self as &dyn Renderable)
    }
}

impl ModuleMeta for Canvas {
    fn requirements() -> Vec<Requirement> {
        vec![Requirement::RectTransform]
    }
}

// ── Image ───────────────────────────────────────────────────────────────

/// A texture stretched over its entity's rectangle.
#[derive(Debug, Clone)]
pub struct Image {
    pub texture: TextureHandle,
    pub region: Rect,
    pub tint: Color,
    pub layer: i32,
    mode: RenderMode,
}

impl Image {
    pub fn screen(texture: TextureHandle) -> Self {
        Self {
            texture,
            region: Rect::FULL,
            tint: Color::WHITE,
            layer: 0,
            mode: RenderMode::Screen,
        }
    }

    pub fn world(texture: TextureHandle) -> Self {
        Self {
            mode: RenderMode::World,
            ..Self::screen(texture)
        }
    }

    pub fn with_region(mut self, region: Rect) -> Self {
        self.region = region;
        self
    }

    pub fn with_tint(mut self, tint: Color) -> Self {
        self.tint = tint;
        self
    }

    pub fn with_layer(mut self, layer: i32) -> Self {
        self.layer = layer;
        self
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }
}

impl Renderable for Image {
    fn layer(&self) -> i32 {
        self.layer
    }

    fn is_visible(&self, transform: &Transform, view: &CameraView) -> bool {
        rect_visible(self.mode, transform, view)
    }

    fn draw(&self, transform: &Transform, view: &CameraView, surface: &mut dyn Surface) {
        let Some(rect) = pixel_rect(self.mode, transform, view) else {
            return;
        };
        let rotation = match self.mode {
            RenderMode::Screen => transform.rotation,
            RenderMode::World => transform.rotation + view.rotation,
        };
        surface.draw_quad(&Quad {
            texture: self.texture,
            region: self.region,
            position: rect.center(),
            size: rect.size(),
            rotation,
            tint: self.tint,
        });
    }
}

impl Module for Image {
    fn render_screen(&self) -> Option<&dyn Renderable> {
        (self.mode == RenderMode::Screen).then_some(self as &dyn Renderable)
    }

    fn render_world(&self) -> Option<&dyn Renderable> {
        (self.mode == RenderMode::World).then_some(self as &dyn Renderable)
    }
}

impl ModuleMeta for Image {
    fn requirements() -> Vec<Requirement> {
        vec![Requirement::RectTransform]
    }
}

// ── Button ──────────────────────────────────────────────────────────────

/// A clickable UI element. Counts clicks and runs its callbacks on each one.
#[derive(Default)]
pub struct Button {
    clicks: u32,
    unread: u32,
    callbacks: Vec<Box<dyn FnMut()>>,
}

impl Button {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: run `callback` on every click.
    pub fn on_click(mut self, callback: impl FnMut() + 'static) -> Self {
        self.callbacks.push(Box::new(callback));
        self
    }

    /// Total clicks received.
    pub fn clicks(&self) -> u32 {
        self.clicks
    }

    /// Whether the button was clicked since the last call.
    pub fn take_clicked(&mut self) -> bool {
        std::mem::take(&mut self.unread) > 0
    }
}

impl Clickable for Button {
    fn click(&mut self) {
        self.clicks += 1;
        self.unread += 1;
        for callback in &mut self.callbacks {
            callback();
        }
    }
}

impl Module for Button {
    fn clickable_mut(&mut self) -> Option<&mut dyn Clickable> {
        Some(self)
    }
}

impl ModuleMeta for Button {
    fn requirements() -> Vec<Requirement> {
        vec![Requirement::RectTransform]
    }
}

// ── UiHandler ───────────────────────────────────────────────────────────

/// The per-scene UI pass.
#[derive(Default)]
pub struct UiHandler {
    canvases: Vec<(EntityId, ModuleId)>,
}

impl UiHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entity(&mut self, entity: &Entity) {
        let ids = entity.module_ids::<Canvas>();
        if ids.is_empty() {
            return;
        }
        for module in ids {
            self.canvases.push((entity.id(), *module));
        }
        log::debug!(
            "Registered canvas from entity {} ({}), {} total",
            entity.id(),
            entity.name(),
            self.canvases.len()
        );
    }

    pub fn remove_entity(&mut self, entity: EntityId) {
        self.canvases.retain(|(e, _)| *e != entity);
    }

    pub fn module_changed(&mut self, entity: EntityId, module: ModuleId, ty: ModuleType, added: bool) {
        if ty != ModuleType::of::<Canvas>() {
            return;
        }
        if added {
            self.canvases.push((entity, module));
        } else {
            self.canvases.retain(|(_, m)| *m != module);
        }
    }

    /// Canvas modules in interaction order.
    pub fn canvases(&self) -> &[(EntityId, ModuleId)] {
        &self.canvases
    }

    /// Order the canvases and deliver this frame's click. Returns how many
    /// clickables were clicked.
    pub fn update(&mut self, entities: &mut EntityStore, input: &InputState, view: &CameraView) -> usize {
        self.canvases.sort_by_key(|(entity, module)| {
            canvas_of(entities, *entity, *module).map_or((RenderMode::World, i32::MAX), |c| (c.mode, c.layer))
        });

        if !input.mouse.just_pressed(MouseButton::Left) {
            return 0;
        }

        for (entity, module) in &self.canvases {
            let Some(mode) = canvas_of(entities, *entity, *module).map(Canvas::mode) else {
                continue;
            };
            let point = match mode {
                RenderMode::Screen => input.cursor,
                RenderMode::World => view.screen_to_world(input.cursor),
            };
            let clicked = click_children(entities, *entity, point);
            if clicked > 0 {
                return clicked;
            }
        }
        0
    }

    pub fn clear(&mut self) {
        self.canvases.clear();
    }
}

fn canvas_of(entities: &EntityStore, entity: EntityId, module: ModuleId) -> Option<&Canvas> {
    entities.get(entity)?.module_dyn(module)?.downcast_ref::<Canvas>()
}

/// Click every clickable on each child of `canvas` whose rectangle contains
/// `point`.
fn click_children(entities: &mut EntityStore, canvas: EntityId, point: Vec2) -> usize {
    let Some(children) = entities.get(canvas).map(|e| e.transform().children().to_vec()) else {
        return 0;
    };

    let mut clicked = 0;
    for child in children {
        let Some(entity) = entities.get_mut(child) else {
            continue;
        };
        if !entity.transform().rect().is_some_and(|r| r.contains_point(point)) {
            continue;
        }
        for module in entity.capability(Capability::Clickable).to_vec() {
            if let Some(target) = entity.module_dyn_mut(module).and_then(|m| m.clickable_mut()) {
                target.click();
                clicked += 1;
            }
        }
        log::debug!("Clicked {} ({})", entity.id(), entity.name());
    }
    clicked
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::ecs::{Runtime, TransformKind};
    use crate::render::{DrawCall, HeadlessSurface};

    /// A canvas entity with one button child, stored with links set up the
    /// way the scene would.
    fn canvas_with_button(
        runtime: &Runtime,
        store: &mut EntityStore,
        canvas: Canvas,
        button_at: Vec2,
    ) -> (EntityId, EntityId) {
        let mut root = runtime
            .entity(format!("canvas{}", store.len()))
            .with_transform(Transform::new().with_size(Vec2::new(800.0, 600.0)))
            .with_module(canvas);
        let mut button = runtime
            .entity(format!("button{}", store.len()))
            .with_transform(Transform::new().at(button_at).with_size(Vec2::new(100.0, 40.0)))
            .with_module(Button::new());
        root.transform_mut().children.push(button.id());
        button.transform_mut().parent = Some(root.id());
        let ids = (root.id(), button.id());
        assert!(store.insert(root).is_ok());
        assert!(store.insert(button).is_ok());
        ids
    }

    fn button(store: &mut EntityStore, id: EntityId) -> &mut Button {
        store.get_mut(id).unwrap().module_mut::<Button>(0).unwrap()
    }

    fn click_at(cursor: Vec2) -> InputState {
        let mut input = InputState::new();
        input.set_cursor(cursor);
        input.mouse.press(MouseButton::Left);
        input
    }

    #[test]
    fn requirements_convert_to_rect() {
        let runtime = Runtime::with_builtins();
        let e = runtime.entity("hud").with_module(Canvas::screen());
        assert_eq!(e.transform().kind(), TransformKind::Rect { size: Vec2::ZERO });
    }

    #[test]
    fn screen_click_hits_button_and_runs_callbacks() {
        let runtime = Runtime::with_builtins();
        let mut store = EntityStore::new();
        let (_, btn) = canvas_with_button(&runtime, &mut store, Canvas::screen(), Vec2::new(400.0, 300.0));
        let fired = Rc::new(Cell::new(0));
        let counter = fired.clone();
        *button(&mut store, btn) = Button::new().on_click(move || counter.set(counter.get() + 1));

        let mut ui = UiHandler::new();
        for id in store.ids().to_vec() {
            ui.add_entity(store.get(id).unwrap());
        }

        let view = CameraView::default();
        assert_eq!(ui.update(&mut store, &click_at(Vec2::new(420.0, 310.0)), &view), 1);
        assert!(button(&mut store, btn).take_clicked());
        assert!(!button(&mut store, btn).take_clicked());
        assert_eq!(fired.get(), 1);

        assert_eq!(ui.update(&mut store, &click_at(Vec2::new(10.0, 10.0)), &view), 0);
        assert_eq!(button(&mut store, btn).clicks(), 1);
    }

    #[test]
    fn no_click_without_fresh_press() {
        let runtime = Runtime::with_builtins();
        let mut store = EntityStore::new();
        let (_, btn) = canvas_with_button(&runtime, &mut store, Canvas::screen(), Vec2::new(400.0, 300.0));
        let mut ui = UiHandler::new();
        for id in store.ids().to_vec() {
            ui.add_entity(store.get(id).unwrap());
        }

        let mut input = click_at(Vec2::new(400.0, 300.0));
        input.end_frame();
        assert_eq!(ui.update(&mut store, &input, &CameraView::default()), 0);
        assert_eq!(button(&mut store, btn).clicks(), 0);
    }

    #[test]
    fn world_canvas_uses_camera() {
        let runtime = Runtime::with_builtins();
        let mut store = EntityStore::new();
        let (_, btn) = canvas_with_button(&runtime, &mut store, Canvas::world(), Vec2::new(2.0, 0.0));
        let mut ui = UiHandler::new();
        for id in store.ids().to_vec() {
            ui.add_entity(store.get(id).unwrap());
        }

        // World (2, 0) is 32 px right of the viewport center.
        let view = CameraView::default();
        assert_eq!(ui.update(&mut store, &click_at(Vec2::new(432.0, 300.0)), &view), 1);
        assert_eq!(button(&mut store, btn).clicks(), 1);
    }

    #[test]
    fn first_canvas_with_a_hit_consumes_the_press() {
        let runtime = Runtime::with_builtins();
        let mut store = EntityStore::new();
        let (_, high_layer) = canvas_with_button(
            &runtime,
            &mut store,
            Canvas::screen().with_layer(5),
            Vec2::new(400.0, 300.0),
        );
        let (_, low_layer) = canvas_with_button(&runtime, &mut store, Canvas::screen(), Vec2::new(400.0, 300.0));
        let mut ui = UiHandler::new();
        for id in store.ids().to_vec() {
            ui.add_entity(store.get(id).unwrap());
        }

        ui.update(&mut store, &click_at(Vec2::new(400.0, 300.0)), &CameraView::default());

        assert_eq!(button(&mut store, low_layer).clicks(), 1);
        assert_eq!(button(&mut store, high_layer).clicks(), 0);
    }

    #[test]
    fn canvas_draws_its_fill_in_pixels() {
        let canvas = Canvas::world().with_color(Color::BLUE);
        let transform = Transform::new().with_size(Vec2::new(2.0, 2.0));
        let view = CameraView::default();
        let mut surface = HeadlessSurface::default();

        assert!(canvas.is_visible(&transform, &view));
        canvas.draw(&transform, &view, &mut surface);

        assert_eq!(
            surface.calls(),
            &[DrawCall::Rect {
                bounds: BoundingBox::new(Vec2::new(384.0, 284.0), Vec2::new(416.0, 316.0)),
                color: Color::BLUE,
                filled: true,
            }]
        );
    }

    #[test]
    fn screen_image_fills_its_rect() {
        let image = Image::screen(TextureHandle(2)).with_tint(Color::RED);
        let transform = Transform::new().at(Vec2::new(100.0, 50.0)).with_size(Vec2::new(64.0, 32.0));
        let view = CameraView::default();
        let mut surface = HeadlessSurface::default();

        assert!(image.is_visible(&transform, &view));
        image.draw(&transform, &view, &mut surface);

        let quad = surface.quads().next().copied().unwrap();
        assert_eq!(quad.position, Vec2::new(100.0, 50.0));
        assert_eq!(quad.size, Vec2::new(64.0, 32.0));
        assert_eq!(quad.texture, TextureHandle(2));
        assert_eq!(quad.tint, Color::RED);
    }

    #[test]
    fn world_image_goes_through_the_camera() {
        let image = Image::world(TextureHandle::WHITE);
        let transform = Transform::new().at(Vec2::new(1.0, 1.0)).with_size(Vec2::new(2.0, 2.0));
        let view = CameraView::default();
        let mut surface = HeadlessSurface::default();
        image.draw(&transform, &view, &mut surface);

        let quad = surface.quads().next().copied().unwrap();
        assert_eq!(quad.position, Vec2::new(416.0, 284.0));
        assert_eq!(quad.size, Vec2::new(32.0, 32.0));

        let far = Transform::new().at(Vec2::new(500.0, 0.0)).with_size(Vec2::new(2.0, 2.0));
        assert!(!image.is_visible(&far, &view));
    }

    #[test]
    fn image_joins_the_list_of_its_mode() {
        let image = Image::screen(TextureHandle::WHITE);
        assert!(image.render_screen().is_some());
        assert!(image.render_world().is_none());
        assert!(Image::world(TextureHandle::WHITE).render_world().is_some());

        let runtime = Runtime::with_builtins();
        let entity = runtime.entity("icon").with_module(image);
        assert!(entity.transform().is_rect());
    }
}
