//! Keyboard and mouse input, turned into discrete actions.
//!
//! [`Input`] tracks raw key state from window events: which keys are held,
//! and which went down or up during the current frame. Scene logic never
//! looks at keys directly. Instead it consumes:
//!
//! - [`Action`]s, emitted once per physical key press through [`Bindings`]
//! - [`CameraControls`], the continuous held-key and mouse state for flying
//!
//! # Usage
//!
//! ```ignore
//! input.handle_event(&window_event);
//!
//! // Once per frame:
//! let actions = input.actions(&bindings);
//! let controls = input.controls();
//! scene.advance_frame(&mut clock, now, &actions, &controls);
//! input.begin_frame();
//! ```

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode as WinitKeyCode, PhysicalKey};

use crate::camera::CameraControls;

/// Keyboard key codes the scene can bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    // Letters
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,

    // Numbers
    Key0, Key1, Key2, Key3, Key4, Key5, Key6, Key7, Key8, Key9,

    // Arrows
    Up, Down, Left, Right,

    // Common keys
    Space, Enter, Escape, Tab, Shift, Control,

    // Other
    Other(u32),
}

impl From<WinitKeyCode> for KeyCode {
    fn from(key: WinitKeyCode) -> Self {
        match key {
            WinitKeyCode::KeyA => KeyCode::A,
            WinitKeyCode::KeyB => KeyCode::B,
            WinitKeyCode::KeyC => KeyCode::C,
            WinitKeyCode::KeyD => KeyCode::D,
            WinitKeyCode::KeyE => KeyCode::E,
            WinitKeyCode::KeyF => KeyCode::F,
            WinitKeyCode::KeyG => KeyCode::G,
            WinitKeyCode::KeyH => KeyCode::H,
            WinitKeyCode::KeyI => KeyCode::I,
            WinitKeyCode::KeyJ => KeyCode::J,
            WinitKeyCode::KeyK => KeyCode::K,
            WinitKeyCode::KeyL => KeyCode::L,
            WinitKeyCode::KeyM => KeyCode::M,
            WinitKeyCode::KeyN => KeyCode::N,
            WinitKeyCode::KeyO => KeyCode::O,
            WinitKeyCode::KeyP => KeyCode::P,
            WinitKeyCode::KeyQ => KeyCode::Q,
            WinitKeyCode::KeyR => KeyCode::R,
            WinitKeyCode::KeyS => KeyCode::S,
            WinitKeyCode::KeyT => KeyCode::T,
            WinitKeyCode::KeyU => KeyCode::U,
            WinitKeyCode::KeyV => KeyCode::V,
            WinitKeyCode::KeyW => KeyCode::W,
            WinitKeyCode::KeyX => KeyCode::X,
            WinitKeyCode::KeyY => KeyCode::Y,
            WinitKeyCode::KeyZ => KeyCode::Z,

            WinitKeyCode::Digit0 | WinitKeyCode::Numpad0 => KeyCode::Key0,
            WinitKeyCode::Digit1 | WinitKeyCode::Numpad1 => KeyCode::Key1,
            WinitKeyCode::Digit2 | WinitKeyCode::Numpad2 => KeyCode::Key2,
            WinitKeyCode::Digit3 | WinitKeyCode::Numpad3 => KeyCode::Key3,
            WinitKeyCode::Digit4 | WinitKeyCode::Numpad4 => KeyCode::Key4,
            WinitKeyCode::Digit5 | WinitKeyCode::Numpad5 => KeyCode::Key5,
            WinitKeyCode::Digit6 | WinitKeyCode::Numpad6 => KeyCode::Key6,
            WinitKeyCode::Digit7 | WinitKeyCode::Numpad7 => KeyCode::Key7,
            WinitKeyCode::Digit8 | WinitKeyCode::Numpad8 => KeyCode::Key8,
            WinitKeyCode::Digit9 | WinitKeyCode::Numpad9 => KeyCode::Key9,

            WinitKeyCode::ArrowUp => KeyCode::Up,
            WinitKeyCode::ArrowDown => KeyCode::Down,
            WinitKeyCode::ArrowLeft => KeyCode::Left,
            WinitKeyCode::ArrowRight => KeyCode::Right,

            WinitKeyCode::Space => KeyCode::Space,
            WinitKeyCode::Enter | WinitKeyCode::NumpadEnter => KeyCode::Enter,
            WinitKeyCode::Escape => KeyCode::Escape,
            WinitKeyCode::Tab => KeyCode::Tab,
            WinitKeyCode::ShiftLeft | WinitKeyCode::ShiftRight => KeyCode::Shift,
            WinitKeyCode::ControlLeft | WinitKeyCode::ControlRight => KeyCode::Control,

            _ => KeyCode::Other(key as u32),
        }
    }
}

/// A logical, edge-triggered command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Freeze or resume animation time.
    TogglePause,
    /// Enter selection mode, or focus the next body when already in it.
    CycleSelection,
    /// Leave selection mode.
    ExitSelection,
    /// Switch to the first-person view.
    FirstPerson,
    /// Switch to the third-person view.
    ThirdPerson,
    /// Start the collapse effect.
    ActivateCollapse,
    /// Restore the starting layout.
    ResetCollapse,
    /// Close the application.
    Exit,
}

/// One key bound to one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    /// The physical key.
    pub key: KeyCode,
    /// The action it emits.
    pub action: Action,
}

/// Ordered key-to-action table.
///
/// Several keys may emit the same action; an action is still emitted at
/// most once per frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bindings(Vec<Binding>);

impl Bindings {
    /// An empty table.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Add a binding.
    pub fn bind(mut self, key: KeyCode, action: Action) -> Self {
        self.0.push(Binding { key, action });
        self
    }

    /// Keys bound to `action`, in table order.
    pub fn keys_for(&self, action: Action) -> impl Iterator<Item = KeyCode> + '_ {
        self.0
            .iter()
            .filter(move |b| b.action == action)
            .map(|b| b.key)
    }

    /// All bindings, in table order.
    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.0.iter()
    }
}

impl Default for Bindings {
    fn default() -> Self {
        Self::empty()
            .bind(KeyCode::Space, Action::TogglePause)
            .bind(KeyCode::Key1, Action::FirstPerson)
            .bind(KeyCode::Key2, Action::ThirdPerson)
            .bind(KeyCode::Key3, Action::CycleSelection)
            .bind(KeyCode::Key4, Action::ExitSelection)
            .bind(KeyCode::X, Action::ActivateCollapse)
            .bind(KeyCode::R, Action::ResetCollapse)
            .bind(KeyCode::Escape, Action::Exit)
    }
}

/// Input state tracking for keyboard and mouse.
///
/// Tracks both instantaneous events (pressed/released this frame) and
/// continuous state (currently held).
#[derive(Debug, Default)]
pub struct Input {
    keys_held: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,
    keys_released: HashSet<KeyCode>,

    /// Accumulated pointer motion this frame, in pixels.
    mouse_delta: Vec2,
    last_cursor: Option<Vec2>,
}

impl Input {
    /// Create a new input tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a key went down this frame.
    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Check if a key is currently held down.
    pub fn key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    /// Check if a key went up this frame.
    pub fn key_released(&self, key: KeyCode) -> bool {
        self.keys_released.contains(&key)
    }

    /// Pointer motion accumulated this frame.
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    /// Record a key going down. Repeats while held are ignored.
    pub fn press_key(&mut self, key: KeyCode) {
        if self.keys_held.insert(key) {
            self.keys_pressed.insert(key);
        }
    }

    /// Record a key going up.
    pub fn release_key(&mut self, key: KeyCode) {
        if self.keys_held.remove(&key) {
            self.keys_released.insert(key);
        }
    }

    /// Add relative pointer motion (raw device motion or cursor movement).
    pub fn add_mouse_motion(&mut self, dx: f32, dy: f32) {
        self.mouse_delta += Vec2::new(dx, dy);
    }

    /// Actions triggered by keys pressed this frame, in binding order.
    pub fn actions(&self, bindings: &Bindings) -> Vec<Action> {
        let mut actions = Vec::new();
        for binding in bindings.iter() {
            if self.key_pressed(binding.key) && !actions.contains(&binding.action) {
                actions.push(binding.action);
            }
        }
        actions
    }

    /// Continuous camera controls from held keys and pointer motion.
    pub fn controls(&self) -> CameraControls {
        CameraControls {
            forward: self.key_held(KeyCode::W),
            backward: self.key_held(KeyCode::S),
            left: self.key_held(KeyCode::A),
            right: self.key_held(KeyCode::D),
            up: self.key_held(KeyCode::Q),
            down: self.key_held(KeyCode::E),
            sprint: self.key_held(KeyCode::Shift),
            look_left: self.key_held(KeyCode::Left),
            look_right: self.key_held(KeyCode::Right),
            look_up: self.key_held(KeyCode::Up),
            look_down: self.key_held(KeyCode::Down),
            mouse_delta: self.mouse_delta,
        }
    }

    /// Clear per-frame state. Call after the frame consumed its input.
    pub fn begin_frame(&mut self) {
        self.keys_pressed.clear();
        self.keys_released.clear();
        self.mouse_delta = Vec2::ZERO;
    }

    /// Process a winit window event.
    ///
    /// Cursor movement only contributes motion while the cursor is free;
    /// with a grabbed cursor, feed raw device motion through
    /// [`Input::add_mouse_motion`] instead.
    pub fn handle_event(&mut self, event: &WindowEvent, cursor_grabbed: bool) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(keycode) = event.physical_key {
                    let key = KeyCode::from(keycode);
                    match event.state {
                        ElementState::Pressed => self.press_key(key),
                        ElementState::Released => self.release_key(key),
                    }
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                let pos = Vec2::new(position.x as f32, position.y as f32);
                if let Some(last) = self.last_cursor {
                    if !cursor_grabbed {
                        self.mouse_delta += pos - last;
                    }
                }
                self.last_cursor = Some(pos);
            }

            WindowEvent::CursorLeft { .. } => {
                self.last_cursor = None;
            }

            // Keys released while unfocused never report an up event.
            WindowEvent::Focused(false) => {
                self.keys_held.clear();
            }

            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_state() {
        let mut input = Input::new();

        assert!(!input.key_held(KeyCode::Space));
        assert!(!input.key_pressed(KeyCode::Space));

        input.press_key(KeyCode::Space);
        assert!(input.key_held(KeyCode::Space));
        assert!(input.key_pressed(KeyCode::Space));

        // After begin_frame, pressed is cleared but held remains
        input.begin_frame();
        assert!(input.key_held(KeyCode::Space));
        assert!(!input.key_pressed(KeyCode::Space));

        input.release_key(KeyCode::Space);
        assert!(!input.key_held(KeyCode::Space));
        assert!(input.key_released(KeyCode::Space));
    }

    #[test]
    fn test_action_emitted_once_per_press() {
        let bindings = Bindings::default();
        let mut input = Input::new();

        input.press_key(KeyCode::X);
        assert_eq!(input.actions(&bindings), vec![Action::ActivateCollapse]);
        input.begin_frame();

        // Held across frames (and OS key repeat) does not re-emit
        input.press_key(KeyCode::X);
        assert!(input.actions(&bindings).is_empty());
        input.begin_frame();
        assert!(input.actions(&bindings).is_empty());

        input.release_key(KeyCode::X);
        input.begin_frame();
        input.press_key(KeyCode::X);
        assert_eq!(input.actions(&bindings), vec![Action::ActivateCollapse]);
    }

    #[test]
    fn test_actions_follow_binding_order() {
        let bindings = Bindings::default();
        let mut input = Input::new();

        input.press_key(KeyCode::R);
        input.press_key(KeyCode::Space);
        input.press_key(KeyCode::W);

        assert_eq!(
            input.actions(&bindings),
            vec![Action::TogglePause, Action::ResetCollapse]
        );
    }

    #[test]
    fn test_duplicate_bindings_emit_once() {
        let bindings = Bindings::empty()
            .bind(KeyCode::Escape, Action::Exit)
            .bind(KeyCode::Q, Action::Exit);
        let mut input = Input::new();
        input.press_key(KeyCode::Escape);
        input.press_key(KeyCode::Q);

        assert_eq!(input.actions(&bindings), vec![Action::Exit]);
        assert_eq!(bindings.keys_for(Action::Exit).count(), 2);
    }

    #[test]
    fn test_controls_from_held_keys() {
        let mut input = Input::new();
        input.press_key(KeyCode::W);
        input.press_key(KeyCode::Shift);
        input.add_mouse_motion(3.0, -1.0);
        input.add_mouse_motion(1.0, 0.5);

        let controls = input.controls();
        assert!(controls.forward);
        assert!(controls.sprint);
        assert!(!controls.backward);
        assert_eq!(controls.mouse_delta, Vec2::new(4.0, -0.5));

        input.begin_frame();
        assert_eq!(input.controls().mouse_delta, Vec2::ZERO);
        assert!(input.controls().forward);
    }

    #[test]
    fn test_bindings_from_json() {
        let json = r#"[{"key": "P", "action": "toggle_pause"}]"#;
        let bindings: Bindings = serde_json::from_str(json).unwrap();
        assert_eq!(bindings.keys_for(Action::TogglePause).next(), Some(KeyCode::P));
    }
}
