use anyhow::{Ok, Result};
use log::*;
use renderer::Renderer;
use winit::dpi::LogicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::EventLoop;
use winit::window::{Window, WindowBuilder};

pub mod config;
mod renderer;
pub mod vulkan;

pub use config::EngineConfig;

#[derive(Debug)]
pub struct Engine {
    window: Window,
    renderer: Renderer,
    event_loop: EventLoop<()>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Engine> {
        // Window
        let event_loop = EventLoop::new()?;
        let window = WindowBuilder::new()
            .with_title(config.title.as_str())
            .with_inner_size(LogicalSize::new(config.width, config.height))
            .with_resizable(false)
            .build(&event_loop)?;

        let renderer = unsafe { Renderer::create(&window, &config)? };

        Ok(Engine {
            window,
            renderer,
            event_loop,
        })
    }

    /// Renders until the window is closed or a frame fails.
    ///
    /// The renderer is torn down on the way out either way; the window is
    /// dropped after it.
    pub fn run(self) -> Result<()> {
        let Engine {
            window,
            mut renderer,
            event_loop,
        } = self;
        let mut failure = None;

        event_loop.run(|event, elwt| {
            match event {
                // Request a redraw when all events were processed.
                Event::AboutToWait => window.request_redraw(),
                Event::WindowEvent { event, .. } => match event {
                    // Render a frame unless we are already shutting down.
                    WindowEvent::RedrawRequested if !elwt.exiting() => {
                        if let Err(error) = unsafe { renderer.render() } {
                            failure = Some(error);
                            elwt.exit();
                        }
                    }
                    WindowEvent::CloseRequested => {
                        info!("Close requested after {} frames.", renderer.frames_rendered());
                        elwt.exit();
                    }
                    _ => {}
                },
                Event::LoopExiting => unsafe { renderer.destroy() },
                _ => {}
            }
        })?;

        drop(window);

        match failure {
            Some(error) => Err(error.context("Failed to render frame")),
            None => Ok(()),
        }
    }
}
