use std::sync::Arc;

use log::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::*,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorGrabMode, Window, WindowId},
};

use crate::asset::FileAssets;
use crate::error::{Error, Result};
use crate::gpu::WgpuContext;
use crate::input::MovementKeys;
use crate::settings::ViewerSettings;
use crate::time::Instant;
use crate::viewer::Viewer;

pub struct App {
    settings: ViewerSettings,
    window: Option<Arc<Window>>,
    viewer: Option<Viewer<WgpuContext>>,
    failure: Option<Error>,
}

impl App {
    pub fn new(settings: ViewerSettings) -> Self {
        Self {
            settings,
            window: None,
            viewer: None,
            failure: None,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let resolution = &self.settings.resolution;
        let attributes = Window::default_attributes()
            .with_title("Biome Viewer")
            .with_inner_size(PhysicalSize::new(resolution.width, resolution.height));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .map_err(|err| Error::Context(format!("failed to create window: {err}")))?,
        );

        // Not every platform can lock the pointer; confining is the fallback.
        if let Err(err) = window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined))
        {
            warn!("Could not grab the pointer: {}", err);
        }
        window.set_cursor_visible(false);

        let gpu = pollster::block_on(WgpuContext::new(window.clone(), &self.settings))?;
        let size = gpu.size();
        let assets = FileAssets::new(self.settings.asset_root.clone());
        let viewer = Viewer::new(gpu, &assets, &self.settings, size)?;

        window.request_redraw();
        self.window = Some(window);
        self.viewer = Some(viewer);
        Ok(())
    }

    /// Tears down GPU resources and leaves the loop, keeping the first error.
    fn shutdown(&mut self, event_loop: &ActiveEventLoop, failure: Option<Error>) {
        if let Some(err) = failure {
            error!("{}", err);
            self.failure.get_or_insert(err);
        }
        if let Some(viewer) = self.viewer.as_mut() {
            if let Err(err) = viewer.destroy() {
                error!("Failed to release GPU resources: {}", err);
            }
        }
        self.viewer = None;
        event_loop.exit();
    }

    pub fn into_result(self) -> Result<()> {
        match self.failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.failure.is_some() {
            return;
        }
        if let Err(err) = self.start(event_loop) {
            self.shutdown(event_loop, Some(err));
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        if self.window.as_ref().map(|w| w.id()) != Some(id) {
            return;
        }
        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested");
                self.shutdown(event_loop, None);
            }
            WindowEvent::Resized(size) => {
                viewer.gpu_mut().resize(size.width, size.height);
                viewer.resize(size.width, size.height);
            }
            WindowEvent::Focused(false) => {
                viewer.input_mut().release_all();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if code == KeyCode::Escape && state == ElementState::Pressed {
                    self.shutdown(event_loop, None);
                } else if let Some(keys) = MovementKeys::from_key_code(code) {
                    viewer
                        .input_mut()
                        .set_key(keys, state == ElementState::Pressed);
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(err) = viewer.frame() {
                    self.shutdown(event_loop, Some(err));
                }
            }
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _id: DeviceId, event: DeviceEvent) {
        if let (DeviceEvent::MouseMotion { delta: (dx, dy) }, Some(viewer)) =
            (event, self.viewer.as_mut())
        {
            viewer.input_mut().pointer_moved(dx, dy);
        }
    }

    // Frame pacing: sleep until the next frame is due, then redraw.
    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(window), Some(viewer)) = (&self.window, &self.viewer) else {
            return;
        };
        let next = viewer.next_frame_at();
        if Instant::now() >= next {
            window.request_redraw();
        } else {
            event_loop.set_control_flow(ControlFlow::WaitUntil(next));
        }
    }
}

/// Opens the window and runs until Escape or close.
pub fn run(settings: ViewerSettings) -> anyhow::Result<()> {
    let event_loop = EventLoop::new()?;
    let mut app = App::new(settings);
    event_loop.run_app(&mut app)?;
    app.into_result()?;
    info!("Viewer shut down cleanly");
    Ok(())
}
