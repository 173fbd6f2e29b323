use std::sync::Arc;

use renderkit_render::{FrameOutcome, RenderError};
use renderkit_wgpu::{RendererConfig, WgpuBackend, WgpuRenderer};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

/// Window and renderer settings for [`run`].
#[derive(Debug, Clone)]
pub struct ViewConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub renderer: RendererConfig,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            title: "renderkit".into(),
            width: 1280,
            height: 720,
            renderer: RendererConfig::default(),
        }
    }
}

/// Errors that stop the view before or while it runs.
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("window creation failed: {0}")]
    Window(#[from] winit::error::OsError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Application hook called once the renderer exists.
///
/// This is where instances are added and the per-frame update hook is
/// installed.
pub trait ViewHandler {
    fn setup(&mut self, renderer: &mut WgpuRenderer) -> Result<(), RenderError>;
}

impl<F> ViewHandler for F
where
    F: FnMut(&mut WgpuRenderer) -> Result<(), RenderError>,
{
    fn setup(&mut self, renderer: &mut WgpuRenderer) -> Result<(), RenderError> {
        self(renderer)
    }
}

/// Owns the window and the renderer and routes window events to it.
struct ViewAdapter<H> {
    config: ViewConfig,
    handler: H,
    window: Option<Arc<Window>>,
    renderer: Option<WgpuRenderer>,
    error: Option<ViewError>,
    skipped: u64,
}

impl<H: ViewHandler> ViewAdapter<H> {
    fn new(config: ViewConfig, handler: H) -> Self {
        Self {
            config,
            handler,
            window: None,
            renderer: None,
            error: None,
            skipped: 0,
        }
    }

    fn create(&mut self, event_loop: &ActiveEventLoop) -> Result<(), ViewError> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let size = window.inner_size();
        let backend = WgpuBackend::new(
            window.clone(),
            size.width,
            size.height,
            &self.config.renderer,
        )?;
        let mut renderer = WgpuRenderer::new(backend);
        self.handler.setup(&mut renderer)?;

        tracing::info!(
            width = size.width,
            height = size.height,
            instances = renderer.instance_count(),
            "view ready"
        );
        self.window = Some(window);
        self.renderer = Some(renderer);
        Ok(())
    }
}

impl<H: ViewHandler> ApplicationHandler for ViewAdapter<H> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.create(event_loop) {
            tracing::error!("view setup failed: {e}");
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                if let Some(renderer) = &mut self.renderer {
                    if renderer.draw() == FrameOutcome::Skipped {
                        self.skipped += 1;
                    }
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        tracing::debug!(skipped = self.skipped, "view closing");
    }
}

/// Open a window, hand the renderer to `handler`, and redraw continuously
/// until the window closes.
pub fn run<H: ViewHandler>(config: ViewConfig, handler: H) -> Result<(), ViewError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut adapter = ViewAdapter::new(config, handler);
    event_loop.run_app(&mut adapter)?;

    match adapter.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
