//! Keyboard, mouse and gamepad input state.
//!
//! [`Input`] tracks which keys or buttons are currently pressed, just pressed
//! this frame, or just released this frame. [`InputState`] bundles one per
//! device plus the cursor, gamepad axes and a named [`InputLayout`].
//!
//! The platform layer feeds events in with `press`/`release`, and the engine
//! calls [`InputState::end_frame`] after every frame.
//!
//! ## Actions
//!
//! ```text
//! "jump" → [Key(Space), Gamepad(South)]
//! "fire" → [Mouse(Left), Key(KeyF)]
//! ```
//!
//! An action is pressed if ANY of its bindings is pressed.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

pub use winit::event::MouseButton;
pub use winit::keyboard::KeyCode;

use winit::event::{ElementState, WindowEvent};
use winit::keyboard::PhysicalKey;

use crate::math::Vec2;

/// Tracks the state of a set of inputs (keys or buttons).
///
/// - `pressed`: currently held down
/// - `just_pressed`: pressed this frame (not held last frame)
/// - `just_released`: released this frame
#[derive(Debug, Clone)]
pub struct Input<T: Eq + Hash + Copy> {
    pressed: HashSet<T>,
    just_pressed: HashSet<T>,
    just_released: HashSet<T>,
}

impl<T: Eq + Hash + Copy> Input<T> {
    pub fn new() -> Self {
        Self {
            pressed: HashSet::new(),
            just_pressed: HashSet::new(),
            just_released: HashSet::new(),
        }
    }

    pub fn pressed(&self, input: T) -> bool {
        self.pressed.contains(&input)
    }

    pub fn just_pressed(&self, input: T) -> bool {
        self.just_pressed.contains(&input)
    }

    pub fn just_released(&self, input: T) -> bool {
        self.just_released.contains(&input)
    }

    /// Record a press. Repeats while already held are ignored.
    pub fn press(&mut self, input: T) {
        if self.pressed.insert(input) {
            self.just_pressed.insert(input);
        }
    }

    pub fn release(&mut self, input: T) {
        if self.pressed.remove(&input) {
            self.just_released.insert(input);
        }
    }

    /// Release every held input, marking each as just released.
    pub fn release_all(&mut self) {
        self.just_released.extend(self.pressed.drain());
    }

    /// Clear per-frame state.
    pub fn clear_just(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
    }
}

impl<T: Eq + Hash + Copy> Default for Input<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Gamepad buttons, named by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GamepadButton {
    South,
    East,
    West,
    North,
    LeftBumper,
    RightBumper,
    LeftTrigger,
    RightTrigger,
    Select,
    Start,
    LeftStick,
    RightStick,
    DPadUp,
    DPadDown,
    DPadLeft,
    DPadRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GamepadAxis {
    LeftStickX,
    LeftStickY,
    RightStickX,
    RightStickY,
    LeftTrigger,
    RightTrigger,
}

/// One physical input an action can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Binding {
    Key(KeyCode),
    Mouse(MouseButton),
    Gamepad(GamepadButton),
}

/// Named actions mapped to physical inputs.
#[derive(Debug, Clone, Default)]
pub struct InputLayout {
    actions: HashMap<String, Vec<Binding>>,
}

impl InputLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `binding` to `action`. Binding the same input twice is a no-op.
    ///
    /// # Panics
    ///
    /// Panics if `action` is empty.
    pub fn add_binding(&mut self, action: &str, binding: Binding) {
        assert!(!action.is_empty(), "Input action name must not be empty");
        let bindings = self.actions.entry(action.to_string()).or_default();
        if !bindings.contains(&binding) {
            bindings.push(binding);
        }
    }

    /// Builder form of [`add_binding`](Self::add_binding).
    pub fn with_binding(mut self, action: &str, binding: Binding) -> Self {
        self.add_binding(action, binding);
        self
    }

    pub fn bindings(&self, action: &str) -> &[Binding] {
        self.actions.get(action).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, action: &str) -> bool {
        self.actions.contains_key(action)
    }

    pub fn remove_action(&mut self, action: &str) -> bool {
        self.actions.remove(action).is_some()
    }
}

/// Everything the platform layer reported for the current frame.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    pub keys: Input<KeyCode>,
    pub mouse: Input<MouseButton>,
    pub gamepad: Input<GamepadButton>,
    axes: HashMap<GamepadAxis, f32>,
    /// Cursor position in window pixels, origin top-left.
    pub cursor: Vec2,
    pub layout: InputLayout,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layout(mut self, layout: InputLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Current axis value in `-1.0..=1.0`, 0 when never reported.
    pub fn axis(&self, axis: GamepadAxis) -> f32 {
        self.axes.get(&axis).copied().unwrap_or(0.0)
    }

    pub fn set_axis(&mut self, axis: GamepadAxis, value: f32) {
        self.axes.insert(axis, value.clamp(-1.0, 1.0));
    }

    pub fn set_cursor(&mut self, position: Vec2) {
        self.cursor = position;
    }

    pub fn press(&mut self, binding: Binding) {
        match binding {
            Binding::Key(key) => self.keys.press(key),
            Binding::Mouse(button) => self.mouse.press(button),
            Binding::Gamepad(button) => self.gamepad.press(button),
        }
    }

    pub fn release(&mut self, binding: Binding) {
        match binding {
            Binding::Key(key) => self.keys.release(key),
            Binding::Mouse(button) => self.mouse.release(button),
            Binding::Gamepad(button) => self.gamepad.release(button),
        }
    }

    pub fn binding_pressed(&self, binding: Binding) -> bool {
        match binding {
            Binding::Key(key) => self.keys.pressed(key),
            Binding::Mouse(button) => self.mouse.pressed(button),
            Binding::Gamepad(button) => self.gamepad.pressed(button),
        }
    }

    pub fn binding_just_pressed(&self, binding: Binding) -> bool {
        match binding {
            Binding::Key(key) => self.keys.just_pressed(key),
            Binding::Mouse(button) => self.mouse.just_pressed(button),
            Binding::Gamepad(button) => self.gamepad.just_pressed(button),
        }
    }

    pub fn binding_just_released(&self, binding: Binding) -> bool {
        match binding {
            Binding::Key(key) => self.keys.just_released(key),
            Binding::Mouse(button) => self.mouse.just_released(button),
            Binding::Gamepad(button) => self.gamepad.just_released(button),
        }
    }

    pub fn action_pressed(&self, action: &str) -> bool {
        self.layout
            .bindings(action)
            .iter()
            .any(|b| self.binding_pressed(*b))
    }

    pub fn action_just_pressed(&self, action: &str) -> bool {
        self.layout
            .bindings(action)
            .iter()
            .any(|b| self.binding_just_pressed(*b))
    }

    pub fn action_just_released(&self, action: &str) -> bool {
        self.layout
            .bindings(action)
            .iter()
            .any(|b| self.binding_just_released(*b))
    }

    /// Feed a winit window event in. Returns whether it was an input event.
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if event.repeat {
                    return true;
                }
                if let PhysicalKey::Code(key) = event.physical_key {
                    match event.state {
                        ElementState::Pressed => self.keys.press(key),
                        ElementState::Released => self.keys.release(key),
                    }
                }
                true
            }
            WindowEvent::MouseInput { state, button, .. } => {
                match state {
                    ElementState::Pressed => self.mouse.press(*button),
                    ElementState::Released => self.mouse.release(*button),
                }
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Vec2::new(position.x as f32, position.y as f32);
                true
            }
            WindowEvent::Focused(false) => {
                self.release_all();
                true
            }
            _ => false,
        }
    }

    /// Release everything held, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        self.keys.release_all();
        self.mouse.release_all();
        self.gamepad.release_all();
    }

    /// Clear per-frame state. Held inputs, axes and the cursor persist.
    pub fn end_frame(&mut self) {
        self.keys.clear_just();
        self.mouse.clear_just();
        self.gamepad.clear_just();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> InputLayout {
        InputLayout::new()
            .with_binding("jump", Binding::Key(KeyCode::Space))
            .with_binding("jump", Binding::Gamepad(GamepadButton::South))
    }

    #[test]
    fn press_then_release_across_frames() {
        let mut keys = Input::new();
        keys.press(KeyCode::KeyA);
        assert!(keys.pressed(KeyCode::KeyA));
        assert!(keys.just_pressed(KeyCode::KeyA));

        keys.clear_just();
        keys.press(KeyCode::KeyA);
        assert!(!keys.just_pressed(KeyCode::KeyA));

        keys.release(KeyCode::KeyA);
        assert!(keys.just_released(KeyCode::KeyA));
        assert!(!keys.pressed(KeyCode::KeyA));
    }

    #[test]
    fn action_is_active_if_any_binding_is() {
        let mut input = InputState::new().with_layout(layout());
        assert!(!input.action_pressed("jump"));

        input.press(Binding::Gamepad(GamepadButton::South));
        assert!(input.action_pressed("jump"));
        assert!(input.action_just_pressed("jump"));

        input.end_frame();
        assert!(input.action_pressed("jump"));
        assert!(!input.action_just_pressed("jump"));

        input.release(Binding::Gamepad(GamepadButton::South));
        assert!(input.action_just_released("jump"));
        assert!(!input.action_pressed("unbound"));
    }

    #[test]
    fn duplicate_bindings_are_ignored() {
        let mut layout = layout();
        layout.add_binding("jump", Binding::Key(KeyCode::Space));
        assert_eq!(layout.bindings("jump").len(), 2);
    }

    #[test]
    #[should_panic(expected = "must not be empty")]
    fn empty_action_name_panics() {
        InputLayout::new().add_binding("", Binding::Mouse(MouseButton::Left));
    }

    #[test]
    fn axes_are_clamped() {
        let mut input = InputState::new();
        input.set_axis(GamepadAxis::LeftStickX, 3.0);
        assert_eq!(input.axis(GamepadAxis::LeftStickX), 1.0);
        assert_eq!(input.axis(GamepadAxis::RightStickY), 0.0);
    }

    #[test]
    fn losing_focus_releases_everything() {
        let mut input = InputState::new();
        input.press(Binding::Key(KeyCode::KeyW));
        input.press(Binding::Mouse(MouseButton::Left));
        input.end_frame();

        assert!(input.handle_window_event(&WindowEvent::Focused(false)));
        assert!(!input.binding_pressed(Binding::Key(KeyCode::KeyW)));
        assert!(input.binding_just_released(Binding::Mouse(MouseButton::Left)));
        assert!(!input.handle_window_event(&WindowEvent::Focused(true)));
    }
}
