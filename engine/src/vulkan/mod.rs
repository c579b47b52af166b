use anyhow::{anyhow, Result};
use buffer::{Mesh, QUAD_INDICES, QUAD_VERTICES};
use command_buffer::VulkanCommandBuffer;
use context::VulkanContext;
use device::VulkanDevice;
use frame::{FramePipeline, FrameSubmission, VulkanFrameDevice};
use framebuffer::VulkanFramebuffer;
use instance::VulkanInstance;
use log::*;
use pipeline::VulkanPipeline;
use render_pass::VulkanRenderPass;
use swapchain::VulkanSwapchain;
use vulkanalia::{
    loader::{LibloadingLoader, LIBRARY},
    vk, Entry,
};
use winit::window::Window;

use crate::config::EngineConfig;

pub mod adapter;
mod buffer;
mod command_buffer;
pub mod constants;
mod context;
mod device;
pub mod error;
pub mod frame;
mod framebuffer;
mod instance;
pub mod ledger;
mod pipeline;
mod render_pass;
pub mod swapchain;

#[derive(Debug)]
pub struct VulkanRenderer {
    pub instance: VulkanInstance,
    pub device: VulkanDevice,
    frames: FramePipeline,
    context: VulkanContext,
    _entry: Entry,
}

impl VulkanRenderer {
    pub unsafe fn new(window: &Window, config: &EngineConfig) -> Result<VulkanRenderer> {
        if config.frames_in_flight == 0 {
            return Err(anyhow!("At least one frame in flight is required."));
        }

        let loader = LibloadingLoader::new(LIBRARY)?;
        let entry = Entry::new(loader).map_err(|b| anyhow!("{}", b))?;

        let mut context = VulkanContext::default();
        let instance = VulkanInstance::new(window, &entry, config.validation, &mut context)?;
        let device = VulkanDevice::new(&entry, &instance, &mut context)?;

        let size = window.inner_size();
        let window_size = vk::Extent2D {
            width: size.width,
            height: size.height,
        };
        VulkanSwapchain::create(
            window_size,
            &device.support,
            device.indices,
            &device,
            &mut context,
        )?;
        VulkanSwapchain::create_image_views(&device, &mut context)?;

        VulkanRenderPass::create(&device, &mut context)?;
        VulkanPipeline::create(
            &device,
            &config.vertex_shader,
            &config.fragment_shader,
            &mut context,
        )?;
        VulkanFramebuffer::create(&device, &mut context)?;
        VulkanCommandBuffer::create_command_pool(&device, &mut context)?;

        let mesh = Mesh::create(
            &instance,
            &device,
            &mut context,
            &QUAD_VERTICES,
            &QUAD_INDICES,
        )?;
        VulkanCommandBuffer::create_command_buffers(&device, &mesh, &mut context)?;

        let frames = FramePipeline::create(&device, config.frames_in_flight, &mut context)?;

        info!(
            "Renderer ready: {} indices, {} swapchain images, {} frames in flight, {} tracked resources.",
            mesh.index_count(),
            context.swapchain_images.len(),
            config.frames_in_flight,
            context.ledger.len()
        );

        Ok(VulkanRenderer {
            instance,
            device,
            frames,
            context,
            _entry: entry,
        })
    }

    pub unsafe fn render(&mut self) -> Result<FrameSubmission> {
        let mut target = VulkanFrameDevice::new(&self.device, &self.context);
        Ok(self.frames.render_one_frame(&mut target)?)
    }

    /// Waits for the GPU to drain, then releases every handle newest first.
    pub unsafe fn destroy(&mut self) {
        if let Err(error) = self.device.wait_idle() {
            error!("Tearing down without an idle device: {}", error);
        }

        let instance = &self.instance.vk_instance;
        let device = &self.device.vk_device;
        let mut destroyed = 0;
        self.context.ledger.teardown(|resource| {
            resource.destroy(instance, device);
            destroyed += 1;
        });

        debug!("Destroyed {} Vulkan resources.", destroyed);
    }
}
