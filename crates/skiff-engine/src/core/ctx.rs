use winit::dpi::PhysicalSize;

use crate::gfx::RenderDevice;
use crate::input::{InputFrame, InputState};
use crate::time::FrameTime;

/// One-time context passed to `core::App::init`.
pub struct InitCtx<'a> {
    pub device: &'a mut RenderDevice,

    /// Surface size in physical pixels at creation time.
    pub surface_size: PhysicalSize<u32>,
}

/// Per-frame context passed to `core::App::on_frame`.
///
/// Commands recorded through `device` are replayed against the surface after
/// the callback returns.
pub struct FrameCtx<'a> {
    pub device: &'a mut RenderDevice,

    /// Current input state (held keys/buttons, cursor position).
    pub input: &'a InputState,

    /// Input transitions since the previous frame.
    pub input_frame: &'a InputFrame,

    /// Frame timing snapshot for this frame.
    pub time: FrameTime,

    /// Current surface size in physical pixels.
    pub surface_size: PhysicalSize<u32>,
}
