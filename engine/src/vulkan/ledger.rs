use vulkanalia::prelude::v1_0::*;
use vulkanalia::vk::Handle;
use vulkanalia::vk::{ExtDebugUtilsExtension, KhrSurfaceExtension, KhrSwapchainExtension};

/// Records owned resources in creation order and releases them in reverse.
#[derive(Debug)]
pub struct ResourceLedger<R> {
    entries: Vec<R>,
}

impl<R> Default for ResourceLedger<R> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<R> ResourceLedger<R> {
    pub fn track(&mut self, resource: R) {
        self.entries.push(resource);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hands every tracked resource to `destroy`, newest first.
    ///
    /// The ledger is empty afterwards, so calling this twice is harmless.
    pub fn teardown<F>(&mut self, mut destroy: F)
    where
        F: FnMut(R),
    {
        while let Some(resource) = self.entries.pop() {
            destroy(resource);
        }
    }
}

/// Every handle kind the renderer creates.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VulkanResource {
    Instance,
    DebugMessenger(vk::DebugUtilsMessengerEXT),
    Surface(vk::SurfaceKHR),
    Device,
    Swapchain(vk::SwapchainKHR),
    ImageView(vk::ImageView),
    RenderPass(vk::RenderPass),
    PipelineLayout(vk::PipelineLayout),
    Pipeline(vk::Pipeline),
    Framebuffer(vk::Framebuffer),
    CommandPool(vk::CommandPool),
    Buffer {
        buffer: vk::Buffer,
        memory: vk::DeviceMemory,
    },
    Semaphore(vk::Semaphore),
    Fence(vk::Fence),
}

impl VulkanResource {
    /// Destroys the handle. Null handles are skipped.
    ///
    /// # Safety
    ///
    /// No pending GPU work may reference the handle, and every resource
    /// created after it must already be destroyed.
    pub unsafe fn destroy(self, instance: &Instance, device: &Device) {
        match self {
            VulkanResource::Instance => instance.destroy_instance(None),
            VulkanResource::DebugMessenger(messenger) if !messenger.is_null() => {
                instance.destroy_debug_utils_messenger_ext(messenger, None)
            }
            VulkanResource::Surface(surface) if !surface.is_null() => {
                instance.destroy_surface_khr(surface, None)
            }
            VulkanResource::Device => device.destroy_device(None),
            VulkanResource::Swapchain(swapchain) if !swapchain.is_null() => {
                device.destroy_swapchain_khr(swapchain, None)
            }
            VulkanResource::ImageView(view) if !view.is_null() => {
                device.destroy_image_view(view, None)
            }
            VulkanResource::RenderPass(pass) if !pass.is_null() => {
                device.destroy_render_pass(pass, None)
            }
            VulkanResource::PipelineLayout(layout) if !layout.is_null() => {
                device.destroy_pipeline_layout(layout, None)
            }
            VulkanResource::Pipeline(pipeline) if !pipeline.is_null() => {
                device.destroy_pipeline(pipeline, None)
            }
            VulkanResource::Framebuffer(framebuffer) if !framebuffer.is_null() => {
                device.destroy_framebuffer(framebuffer, None)
            }
            VulkanResource::CommandPool(pool) if !pool.is_null() => {
                device.destroy_command_pool(pool, None)
            }
            VulkanResource::Buffer { buffer, memory } => {
                if !buffer.is_null() {
                    device.destroy_buffer(buffer, None);
                }
                if !memory.is_null() {
                    device.free_memory(memory, None);
                }
            }
            VulkanResource::Semaphore(semaphore) if !semaphore.is_null() => {
                device.destroy_semaphore(semaphore, None)
            }
            VulkanResource::Fence(fence) if !fence.is_null() => device.destroy_fence(fence, None),
            _ => {}
        }
    }
}
