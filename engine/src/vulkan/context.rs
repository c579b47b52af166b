use vulkanalia::vk;

use super::ledger::{ResourceLedger, VulkanResource};

/// The Vulkan handles and associated properties used by the renderer.
///
/// Every handle created through the context is also recorded in `ledger`,
/// which owns the order they are released in.
#[derive(Debug, Default)]
pub struct VulkanContext {
    pub ledger: ResourceLedger<VulkanResource>,
    pub messenger: vk::DebugUtilsMessengerEXT,
    pub surface: vk::SurfaceKHR,
    pub physical_device: vk::PhysicalDevice,
    pub graphics_queue: vk::Queue,
    pub present_queue: vk::Queue,
    pub swapchain: vk::SwapchainKHR,
    pub swapchain_format: vk::Format,
    pub swapchain_extent: vk::Extent2D,
    pub swapchain_images: Vec<vk::Image>,
    pub swapchain_image_views: Vec<vk::ImageView>,
    pub render_pass: vk::RenderPass,
    pub pipeline_layout: vk::PipelineLayout,
    pub pipeline: vk::Pipeline,
    pub framebuffers: Vec<vk::Framebuffer>,
    pub command_pool: vk::CommandPool,
    pub command_buffers: Vec<vk::CommandBuffer>,
}
