use std::sync::Arc;

use anyhow::{Context, Result};

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, MouseButton as WinitMouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::core::{App, AppControl, FrameCtx, InitCtx};
use crate::device::{Gpu, GpuInit, SurfaceErrorAction};
use crate::gfx::{DefaultFramebuffer, RenderDevice};
use crate::input::{InputEvent, InputFrame, InputState, Key, MouseButton};
use crate::time::FrameClock;

/// Rough conversion for pixel-precision scroll deltas (touchpads) so both
/// winit delta kinds reach the app in lines.
const WHEEL_PIXELS_PER_LINE: f32 = 16.0;

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,

    /// Back the window surface with a depth-stencil buffer.
    pub default_depth: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "skiff".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
            default_depth: true,
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Runs `app` inside a winit event loop until it requests exit or the
    /// window closes.
    pub fn run<A>(config: RuntimeConfig, app: A) -> Result<()>
    where
        A: App + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = RuntimeState {
            config,
            app,
            window: None,
            exit_requested: false,
        };

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        Ok(())
    }
}

/// Everything owned per window. The window is held by `Arc` so the surface
/// inside `Gpu` can outlive borrows of this struct.
struct WindowState {
    window: Arc<Window>,
    gpu: Gpu,
    device: RenderDevice,
    input: InputState,
    input_frame: InputFrame,
    clock: FrameClock,
}

struct RuntimeState<A>
where
    A: App + 'static,
{
    config: RuntimeConfig,
    app: A,
    window: Option<WindowState>,
    exit_requested: bool,
}

impl<A> RuntimeState<A>
where
    A: App + 'static,
{
    fn init_window(&mut self, event_loop: &ActiveEventLoop) -> Result<WindowState> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        let gpu_init = GpuInit {
            default_depth: self.config.default_depth,
            ..GpuInit::default()
        };
        let gpu = pollster::block_on(Gpu::new(window.clone(), gpu_init))?;

        let mut device = RenderDevice::new(
            gpu.device().clone(),
            gpu.queue().clone(),
            gpu.surface_format(),
            gpu.depth_format(),
        )?;

        {
            let mut ctx = InitCtx {
                device: &mut device,
                surface_size: gpu.size(),
            };
            self.app.init(&mut ctx).context("app init failed")?;
        }

        window.request_redraw();

        Ok(WindowState {
            window,
            gpu,
            device,
            input: InputState::default(),
            input_frame: InputFrame::default(),
            clock: FrameClock::default(),
        })
    }

    /// Drives one frame: tick the clock, let the app record commands, then
    /// replay them against the acquired surface texture and present.
    fn render_frame(&mut self) -> AppControl {
        let (app, window) = (&mut self.app, &mut self.window);
        let Some(state) = window.as_mut() else {
            return AppControl::Continue;
        };

        let time = state.clock.tick();
        let size = state.gpu.size();

        // Minimized; nothing to acquire.
        if size.width == 0 || size.height == 0 {
            state.input_frame.clear();
            return AppControl::Continue;
        }

        state.device.begin_frame();

        let control = {
            let mut ctx = FrameCtx {
                device: &mut state.device,
                input: &state.input,
                input_frame: &state.input_frame,
                time,
                surface_size: size,
            };
            app.on_frame(&mut ctx)
        };

        let mut frame = match state.gpu.begin_frame() {
            Ok(frame) => frame,
            Err(err) => {
                let action = state.gpu.handle_surface_error(err);
                state.device.end_frame();
                state.input_frame.clear();
                if action == SurfaceErrorAction::Fatal {
                    log::error!("surface error was fatal; shutting down");
                    return AppControl::Exit;
                }
                return control;
            }
        };

        let surface = DefaultFramebuffer {
            color: &frame.view,
            depth: state.gpu.depth_view(),
            width: size.width,
            height: size.height,
        };
        state.device.replay(&mut frame.encoder, &surface);

        state.window.pre_present_notify();
        state.gpu.submit(frame);

        state.device.end_frame();
        state.input_frame.clear();

        control
    }
}

impl<A> ApplicationHandler for RuntimeState<A>
where
    A: App + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        match self.init_window(event_loop) {
            Ok(state) => self.window = Some(state),
            Err(e) => {
                log::error!("failed to create initial window: {e:#}");
                self.exit_requested = true;
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw; frame pacing comes from the present mode.
        if let Some(state) = &self.window {
            state.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        // Input translation + app event hook. Track exit requests in a local
        // so `self` stays free for the lifecycle handling below.
        let mut exit_from_app = false;
        {
            let (app, window) = (&mut self.app, &mut self.window);
            let Some(state) = window.as_mut() else {
                return;
            };

            if let WindowEvent::Focused(focused) = &event {
                state.input.set_focused(*focused);
            }

            if let Some(ev) = translate_input_event(&event) {
                state.input.apply_event(&mut state.input_frame, ev);
                if app.on_event(&ev) == AppControl::Exit {
                    exit_from_app = true;
                }
            }
        }

        if exit_from_app {
            self.exit_requested = true;
            event_loop.exit();
            return;
        }

        // Runtime-managed window lifecycle / resize / redraw handling.
        match event {
            WindowEvent::CloseRequested => {
                self.exit_requested = true;
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => {
                if let Some(state) = self.window.as_mut() {
                    state.gpu.resize(new_size);
                    state.window.request_redraw();
                }
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(state) = self.window.as_mut() {
                    let new_size = state.window.inner_size();
                    state.gpu.resize(new_size);
                    state.window.request_redraw();
                }
            }

            WindowEvent::RedrawRequested => {
                if self.render_frame() == AppControl::Exit {
                    self.exit_requested = true;
                    event_loop.exit();
                }
            }

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        let (app, window) = (&mut self.app, &mut self.window);
        if let Some(state) = window.as_mut() {
            app.on_exit(&mut state.device);
        }
    }
}

/// Translates a winit `WindowEvent` into an engine `InputEvent`.
///
/// Returns `None` for events not represented by the input subsystem.
fn translate_input_event(event: &WindowEvent) -> Option<InputEvent> {
    match event {
        WindowEvent::KeyboardInput { event, .. } => {
            let key = map_key(event.physical_key);
            Some(match event.state {
                ElementState::Pressed => InputEvent::KeyDown {
                    key,
                    repeat: event.repeat,
                },
                ElementState::Released => InputEvent::KeyUp { key },
            })
        }

        WindowEvent::MouseInput { state, button, .. } => {
            let button = map_mouse_button(*button);
            Some(match state {
                ElementState::Pressed => InputEvent::MouseDown { button },
                ElementState::Released => InputEvent::MouseUp { button },
            })
        }

        WindowEvent::CursorMoved { position, .. } => Some(InputEvent::MouseMove {
            position: (position.x as f32, position.y as f32),
        }),

        WindowEvent::MouseWheel { delta, .. } => {
            let delta = match delta {
                MouseScrollDelta::LineDelta(x, y) => (*x, *y),
                MouseScrollDelta::PixelDelta(p) => (
                    p.x as f32 / WHEEL_PIXELS_PER_LINE,
                    p.y as f32 / WHEEL_PIXELS_PER_LINE,
                ),
            };
            Some(InputEvent::MouseWheel { delta })
        }

        _ => None,
    }
}

fn map_mouse_button(b: WinitMouseButton) -> MouseButton {
    match b {
        WinitMouseButton::Left => MouseButton::Left,
        WinitMouseButton::Right => MouseButton::Right,
        WinitMouseButton::Middle => MouseButton::Middle,
        WinitMouseButton::Back => MouseButton::Back,
        WinitMouseButton::Forward => MouseButton::Forward,
        WinitMouseButton::Other(v) => MouseButton::Other(v),
    }
}

fn map_key(pk: PhysicalKey) -> Key {
    match pk {
        PhysicalKey::Code(code) => match code {
            KeyCode::Escape => Key::Escape,
            KeyCode::Enter => Key::Enter,
            KeyCode::Tab => Key::Tab,
            KeyCode::Backspace => Key::Backspace,
            KeyCode::Space => Key::Space,

            KeyCode::Insert => Key::Insert,
            KeyCode::Delete => Key::Delete,
            KeyCode::Home => Key::Home,
            KeyCode::End => Key::End,
            KeyCode::PageUp => Key::PageUp,
            KeyCode::PageDown => Key::PageDown,

            KeyCode::ArrowUp => Key::ArrowUp,
            KeyCode::ArrowDown => Key::ArrowDown,
            KeyCode::ArrowLeft => Key::ArrowLeft,
            KeyCode::ArrowRight => Key::ArrowRight,

            KeyCode::ShiftLeft | KeyCode::ShiftRight => Key::Shift,
            KeyCode::ControlLeft | KeyCode::ControlRight => Key::Control,
            KeyCode::AltLeft | KeyCode::AltRight => Key::Alt,
            KeyCode::SuperLeft | KeyCode::SuperRight => Key::Meta,

            KeyCode::KeyA => Key::A,
            KeyCode::KeyB => Key::B,
            KeyCode::KeyC => Key::C,
            KeyCode::KeyD => Key::D,
            KeyCode::KeyE => Key::E,
            KeyCode::KeyF => Key::F,
            KeyCode::KeyG => Key::G,
            KeyCode::KeyH => Key::H,
            KeyCode::KeyI => Key::I,
            KeyCode::KeyJ => Key::J,
            KeyCode::KeyK => Key::K,
            KeyCode::KeyL => Key::L,
            KeyCode::KeyM => Key::M,
            KeyCode::KeyN => Key::N,
            KeyCode::KeyO => Key::O,
            KeyCode::KeyP => Key::P,
            KeyCode::KeyQ => Key::Q,
            KeyCode::KeyR => Key::R,
            KeyCode::KeyS => Key::S,
            KeyCode::KeyT => Key::T,
            KeyCode::KeyU => Key::U,
            KeyCode::KeyV => Key::V,
            KeyCode::KeyW => Key::W,
            KeyCode::KeyX => Key::X,
            KeyCode::KeyY => Key::Y,
            KeyCode::KeyZ => Key::Z,

            KeyCode::Digit0 => Key::Digit0,
            KeyCode::Digit1 => Key::Digit1,
            KeyCode::Digit2 => Key::Digit2,
            KeyCode::Digit3 => Key::Digit3,
            KeyCode::Digit4 => Key::Digit4,
            KeyCode::Digit5 => Key::Digit5,
            KeyCode::Digit6 => Key::Digit6,
            KeyCode::Digit7 => Key::Digit7,
            KeyCode::Digit8 => Key::Digit8,
            KeyCode::Digit9 => Key::Digit9,

            KeyCode::F1 => Key::F1,
            KeyCode::F2 => Key::F2,
            KeyCode::F3 => Key::F3,
            KeyCode::F4 => Key::F4,
            KeyCode::F5 => Key::F5,
            KeyCode::F6 => Key::F6,
            KeyCode::F7 => Key::F7,
            KeyCode::F8 => Key::F8,
            KeyCode::F9 => Key::F9,
            KeyCode::F10 => Key::F10,
            KeyCode::F11 => Key::F11,
            KeyCode::F12 => Key::F12,

            other => Key::Unknown(other as u32),
        },

        // NativeKeyCode carries no stable numeric in winit 0.30.
        PhysicalKey::Unidentified(_) => Key::Unknown(0),
    }
}
