//! Core engine-facing contracts.
//!
//! This module defines the stable interface between the runtime (platform
//! loop) and application code: the `App` trait plus the contexts handed to
//! its callbacks. It avoids leaking runtime internals into user code.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, InitCtx};
