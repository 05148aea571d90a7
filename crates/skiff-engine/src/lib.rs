//! Skiff engine crate.
//!
//! A small render-device abstraction over wgpu plus the window/input/timing
//! runtime needed to drive it. Applications implement [`core::App`] and hand
//! it to [`window::Runtime::run`]; all GPU resources are created and bound
//! through [`gfx::RenderDevice`].

pub mod core;
pub mod device;
pub mod gfx;
pub mod input;
pub mod logging;
pub mod time;
pub mod window;
