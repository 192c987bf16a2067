use anyhow::Result;
use log::*;
use renderer::Renderer;
use winit::dpi::LogicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::{Window, WindowBuilder};

pub mod config;
mod renderer;
mod vulkan;

pub use config::EngineConfig;
pub use vulkan::{ErrorKind, FrameStatus, SurfaceProvider, VulkanError};

pub struct Engine {
    window: Window,
    renderer: Renderer,
    event_loop: EventLoop<()>,
}

impl Engine {
    pub fn new(config: &EngineConfig) -> Result<Engine> {
        // Window
        let event_loop = EventLoop::new()?;
        let window = WindowBuilder::new()
            .with_title(config.title.as_str())
            .with_inner_size(LogicalSize::new(config.width, config.height))
            .build(&event_loop)?;

        let renderer = unsafe { Renderer::create(&window, config)? };

        Ok(Engine {
            window,
            renderer,
            event_loop,
        })
    }

    /// Draws frames until the window is closed or a frame fails, then tears
    /// the renderer down.
    pub fn run(mut self) -> Result<()> {
        self.event_loop.set_control_flow(ControlFlow::Poll);
        self.event_loop.run(move |event, elwt| match event {
            // Request a redraw when all events were processed.
            Event::AboutToWait => self.window.request_redraw(),
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::RedrawRequested if !elwt.exiting() => {
                    if let Err(err) = unsafe { self.renderer.render() } {
                        error!("Frame failed: {}", err);
                        elwt.exit();
                    }
                }
                WindowEvent::CloseRequested => elwt.exit(),
                _ => {}
            },
            Event::LoopExiting => unsafe {
                if let Err(err) = self.renderer.wait_idle() {
                    warn!("Device did not go idle before teardown: {}", err);
                }
                self.renderer.destroy();
            },
            _ => {}
        })?;

        Ok(())
    }
}
