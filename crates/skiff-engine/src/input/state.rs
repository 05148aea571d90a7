use std::collections::HashSet;

use super::frame::InputFrame;
use super::types::{InputEvent, Key, MouseButton};

/// Current input state for the window.
///
/// Holds "is down" information and the current cursor position. Per-frame
/// transitions are recorded into an `InputFrame`.
#[derive(Debug, Default)]
pub struct InputState {
    /// Whether the window is focused.
    pub focused: bool,

    /// Cursor position in physical pixels, `None` until the cursor has
    /// entered the window.
    pub cursor: Option<(f32, f32)>,

    /// Set of currently held keys.
    pub keys_down: HashSet<Key>,

    /// Set of currently held mouse buttons.
    pub buttons_down: HashSet<MouseButton>,
}

impl InputState {
    /// Applies an input event to the current state and writes deltas to `frame`.
    pub fn apply_event(&mut self, frame: &mut InputFrame, ev: InputEvent) {
        match ev {
            InputEvent::KeyDown { key, repeat } => {
                let inserted = self.keys_down.insert(key);
                // A repeat for a key we never saw go down (focus regained
                // mid-repeat) must not count as a fresh press either.
                if inserted && !repeat {
                    frame.keys_pressed.insert(key);
                }
            }

            InputEvent::KeyUp { key } => {
                let removed = self.keys_down.remove(&key);
                if removed {
                    frame.keys_released.insert(key);
                }
            }

            InputEvent::MouseDown { button } => {
                let inserted = self.buttons_down.insert(button);
                if inserted {
                    frame.buttons_pressed.insert(button);
                }
            }

            InputEvent::MouseUp { button } => {
                let removed = self.buttons_down.remove(&button);
                if removed {
                    frame.buttons_released.insert(button);
                }
            }

            InputEvent::MouseMove { position } => {
                self.cursor = Some(position);
            }

            InputEvent::MouseWheel { delta } => {
                frame.wheel.0 += delta.0;
                frame.wheel.1 += delta.1;
            }
        }

        frame.push_event(ev);
    }

    /// Records a focus change.
    ///
    /// On focus loss the "down" sets are cleared; release events delivered to
    /// an unfocused window are unreliable and keys would stay stuck.
    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
        if !focused {
            self.keys_down.clear();
            self.buttons_down.clear();
        }
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    pub fn button_down(&self, button: MouseButton) -> bool {
        self.buttons_down.contains(&button)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_repeats_do_not_retrigger_pressed() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        state.apply_event(
            &mut frame,
            InputEvent::KeyDown {
                key: Key::W,
                repeat: false,
            },
        );
        assert!(frame.keys_pressed.contains(&Key::W));
        assert!(state.key_down(Key::W));

        frame.clear();
        state.apply_event(
            &mut frame,
            InputEvent::KeyDown {
                key: Key::W,
                repeat: true,
            },
        );
        assert!(frame.keys_pressed.is_empty());
        assert!(state.key_down(Key::W));
    }

    #[test]
    fn repeat_after_focus_loss_is_not_a_press() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        state.apply_event(
            &mut frame,
            InputEvent::KeyDown {
                key: Key::A,
                repeat: false,
            },
        );
        state.set_focused(false);
        frame.clear();

        state.apply_event(
            &mut frame,
            InputEvent::KeyDown {
                key: Key::A,
                repeat: true,
            },
        );
        assert!(frame.keys_pressed.is_empty());
    }

    #[test]
    fn release_without_press_is_ignored() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        state.apply_event(&mut frame, InputEvent::KeyUp { key: Key::Escape });
        assert!(frame.keys_released.is_empty());

        state.apply_event(
            &mut frame,
            InputEvent::MouseUp {
                button: MouseButton::Left,
            },
        );
        assert!(frame.buttons_released.is_empty());
    }

    #[test]
    fn focus_loss_clears_held_state() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        state.apply_event(
            &mut frame,
            InputEvent::KeyDown {
                key: Key::Shift,
                repeat: false,
            },
        );
        state.apply_event(
            &mut frame,
            InputEvent::MouseDown {
                button: MouseButton::Right,
            },
        );

        state.set_focused(false);
        assert!(!state.key_down(Key::Shift));
        assert!(!state.button_down(MouseButton::Right));
    }

    #[test]
    fn wheel_accumulates_over_the_frame() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        state.apply_event(&mut frame, InputEvent::MouseWheel { delta: (0.0, 1.0) });
        state.apply_event(&mut frame, InputEvent::MouseWheel { delta: (0.5, -3.0) });
        assert_eq!(frame.wheel, (0.5, -2.0));

        frame.clear();
        assert_eq!(frame.wheel, (0.0, 0.0));
    }

    #[test]
    fn cursor_tracks_the_latest_move() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        assert_eq!(state.cursor, None);
        state.apply_event(
            &mut frame,
            InputEvent::MouseMove {
                position: (10.0, 20.0),
            },
        );
        state.apply_event(
            &mut frame,
            InputEvent::MouseMove {
                position: (11.0, 19.0),
            },
        );
        assert_eq!(state.cursor, Some((11.0, 19.0)));
        assert_eq!(frame.events.len(), 2);
    }
}
