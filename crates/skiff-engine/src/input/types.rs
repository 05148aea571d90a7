/// Keyboard key identifier.
///
/// The runtime maps platform keycodes into these variants where possible.
/// Unsupported keys surface as `Key::Unknown(u32)` with a stable platform
/// code. Left/right modifier pairs are merged; apps that care about the
/// distinction can extend this enum later.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    // Common control keys
    Escape,
    Enter,
    Tab,
    Backspace,
    Space,

    Insert,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,

    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,

    // Modifiers as keys
    Shift,
    Control,
    Alt,
    Meta,

    // Letters
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,

    // Digits
    Digit0, Digit1, Digit2, Digit3, Digit4,
    Digit5, Digit6, Digit7, Digit8, Digit9,

    // Function keys
    F1, F2, F3, F4, F5, F6,
    F7, F8, F9, F10, F11, F12,

    /// Platform-dependent key not yet represented here.
    Unknown(u32),
}

/// Mouse button identifier.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Back,
    Forward,
    Other(u16),
}

/// Platform-agnostic input events emitted by the runtime.
///
/// Positions and deltas are in physical pixels, matching viewport and
/// surface coordinates.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum InputEvent {
    KeyDown {
        key: Key,
        /// True when the event is an OS key-repeat of a held key.
        repeat: bool,
    },
    KeyUp {
        key: Key,
    },

    MouseDown {
        button: MouseButton,
    },
    MouseUp {
        button: MouseButton,
    },

    MouseMove {
        position: (f32, f32),
    },

    /// Scroll delta in lines. Pixel-precision deltas are converted by the
    /// runtime before they reach the app.
    MouseWheel {
        delta: (f32, f32),
    },
}
