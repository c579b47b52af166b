use super::error::VkResultExt;
use super::ledger::VulkanResource;
use super::{context::VulkanContext, device::VulkanDevice};
use anyhow::Result;
use vulkanalia::vk::{self, DeviceV1_0, HasBuilder};

pub struct VulkanFramebuffer;

impl VulkanFramebuffer {
    /// One framebuffer per swapchain image view, in swapchain order.
    pub unsafe fn create(device: &VulkanDevice, context: &mut VulkanContext) -> Result<()> {
        for view in &context.swapchain_image_views {
            let attachments = &[*view];
            let create_info = vk::FramebufferCreateInfo::builder()
                .render_pass(context.render_pass)
                .attachments(attachments)
                .width(context.swapchain_extent.width)
                .height(context.swapchain_extent.height)
                .layers(1);

            let framebuffer = device
                .vk_device
                .create_framebuffer(&create_info, None)
                .check("create framebuffer")?;
            context.ledger.track(VulkanResource::Framebuffer(framebuffer));
            context.framebuffers.push(framebuffer);
        }
        Ok(())
    }
}
