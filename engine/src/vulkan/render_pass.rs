use anyhow::Result;
use vulkanalia::prelude::v1_0::*;

use super::context::VulkanContext;
use super::device::VulkanDevice;
use super::error::VkResultExt;
use super::ledger::VulkanResource;

#[derive(Debug)]
pub struct VulkanRenderPass;

impl VulkanRenderPass {
    /// A single colour attachment cleared on load and handed to presentation.
    pub unsafe fn create(device: &VulkanDevice, context: &mut VulkanContext) -> Result<()> {
        let color_attachment = vk::AttachmentDescription::builder()
            .format(context.swapchain_format)
            .samples(vk::SampleCountFlags::_1)
            .load_op(vk::AttachmentLoadOp::CLEAR)
            .store_op(vk::AttachmentStoreOp::STORE)
            .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
            .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .final_layout(vk::ImageLayout::PRESENT_SRC_KHR);

        let color_attachment_ref = vk::AttachmentReference::builder()
            .attachment(0)
            .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);

        let color_attachments = &[color_attachment_ref];
        let subpass = vk::SubpassDescription::builder()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(color_attachments);

        // The image is only ready once the acquire semaphore has been waited on
        // at the colour output stage.
        let dependency = vk::SubpassDependency::builder()
            .src_subpass(vk::SUBPASS_EXTERNAL)
            .dst_subpass(0)
            .src_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
            .src_access_mask(vk::AccessFlags::empty())
            .dst_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
            .dst_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE);

        let attachments = &[color_attachment];
        let subpasses = &[subpass];
        let dependencies = &[dependency];
        let info = vk::RenderPassCreateInfo::builder()
            .attachments(attachments)
            .subpasses(subpasses)
            .dependencies(dependencies);

        context.render_pass = device
            .vk_device
            .create_render_pass(&info, None)
            .check("create render pass")?;
        context
            .ledger
            .track(VulkanResource::RenderPass(context.render_pass));

        Ok(())
    }
}
