use anyhow::Result;
use winit::window::Window;

use crate::config::EngineConfig;
use crate::vulkan::frame::FrameSubmission;
use crate::vulkan::VulkanRenderer;

#[derive(Debug)]
pub struct Renderer {
    pub vk_renderer: VulkanRenderer,
    frames_rendered: u64,
}

impl Renderer {
    /// Creates the Vulkan renderer for `window`.
    pub unsafe fn create(window: &Window, config: &EngineConfig) -> Result<Self> {
        let vk_renderer = VulkanRenderer::new(window, config)?;

        Ok(Self {
            vk_renderer,
            frames_rendered: 0,
        })
    }

    /// Renders one frame.
    pub unsafe fn render(&mut self) -> Result<FrameSubmission> {
        let submission = self.vk_renderer.render()?;
        self.frames_rendered += 1;
        Ok(submission)
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Destroys the Vulkan renderer after the GPU has gone idle.
    pub unsafe fn destroy(&mut self) {
        self.vk_renderer.destroy();
    }
}
