use anyhow::Result;

use crate::gfx::RenderDevice;
use crate::input::InputEvent;

use super::ctx::{FrameCtx, InitCtx};

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by higher layers.
pub trait App {
    /// Called once after the window and render device exist. Create
    /// long-lived resources here.
    fn init(&mut self, ctx: &mut InitCtx<'_>) -> Result<()>;

    /// Called for each translated input event.
    fn on_event(&mut self, event: &InputEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// Called once per rendered frame, between `begin_frame` and the replay
    /// of recorded commands.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl;

    /// Called once when the event loop is shutting down, before the render
    /// device is dropped.
    fn on_exit(&mut self, device: &mut RenderDevice) {
        let _ = device;
    }
}
