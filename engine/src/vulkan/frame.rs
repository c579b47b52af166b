use anyhow::Result;
use log::*;
use vulkanalia::prelude::v1_0::*;
use vulkanalia::vk::Handle;
use vulkanalia::vk::KhrSwapchainExtension;

use super::context::VulkanContext;
use super::device::VulkanDevice;
use super::error::{VkResultExt, VulkanError};
use super::ledger::VulkanResource;

/// The driver calls one frame is made of.
///
/// Submission and presentation are addressed by swapchain image index, which
/// is unrelated to the slot whose sync objects guard them.
pub trait FrameDevice {
    fn wait_for_fence(&mut self, fence: vk::Fence) -> Result<(), VulkanError>;
    fn reset_fence(&mut self, fence: vk::Fence) -> Result<(), VulkanError>;
    fn acquire_next_image(&mut self, signal: vk::Semaphore) -> Result<u32, VulkanError>;
    fn submit(
        &mut self,
        image_index: u32,
        wait: vk::Semaphore,
        signal: vk::Semaphore,
        fence: vk::Fence,
    ) -> Result<(), VulkanError>;
    fn present(&mut self, image_index: u32, wait: vk::Semaphore) -> Result<(), VulkanError>;
}

/// Sync objects of one in-flight frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FrameSlot {
    pub image_available: vk::Semaphore,
    pub render_finished: vk::Semaphore,
    pub in_flight: vk::Fence,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FrameSubmission {
    pub slot: usize,
    pub image_index: u32,
}

/// Ring of in-flight slots driving acquire, submit and present.
#[derive(Debug)]
pub struct FramePipeline {
    slots: Vec<FrameSlot>,
    frame: usize,
}

impl FramePipeline {
    pub fn new(slots: Vec<FrameSlot>) -> Self {
        assert!(!slots.is_empty(), "frame ring needs at least one slot");
        Self { slots, frame: 0 }
    }

    /// Creates `frames_in_flight` slots. Fences start signalled so the first
    /// pass through each slot does not block.
    pub unsafe fn create(
        device: &VulkanDevice,
        frames_in_flight: usize,
        context: &mut VulkanContext,
    ) -> Result<Self> {
        let semaphore_info = vk::SemaphoreCreateInfo::builder();
        let fence_info = vk::FenceCreateInfo::builder().flags(vk::FenceCreateFlags::SIGNALED);

        let mut slots = Vec::with_capacity(frames_in_flight);
        for _ in 0..frames_in_flight {
            let image_available = device
                .vk_device
                .create_semaphore(&semaphore_info, None)
                .check("create semaphore")?;
            context.ledger.track(VulkanResource::Semaphore(image_available));

            let render_finished = device
                .vk_device
                .create_semaphore(&semaphore_info, None)
                .check("create semaphore")?;
            context.ledger.track(VulkanResource::Semaphore(render_finished));

            let in_flight = device
                .vk_device
                .create_fence(&fence_info, None)
                .check("create fence")?;
            context.ledger.track(VulkanResource::Fence(in_flight));

            slots.push(FrameSlot {
                image_available,
                render_finished,
                in_flight,
            });
        }

        Ok(Self::new(slots))
    }

    pub fn slot_index(&self) -> usize {
        self.frame
    }

    pub fn slots(&self) -> &[FrameSlot] {
        &self.slots
    }

    /// Renders one frame using the current slot, then advances the ring.
    pub fn render_one_frame<D: FrameDevice>(
        &mut self,
        device: &mut D,
    ) -> Result<FrameSubmission, VulkanError> {
        let slot = self.slots[self.frame];

        // The reset must follow the wait, or the next pass through this slot
        // could wait on a fence the GPU will never signal again.
        device.wait_for_fence(slot.in_flight)?;
        device.reset_fence(slot.in_flight)?;

        let image_index = device.acquire_next_image(slot.image_available)?;

        device.submit(
            image_index,
            slot.image_available,
            slot.render_finished,
            slot.in_flight,
        )?;
        device.present(image_index, slot.render_finished)?;

        let submission = FrameSubmission {
            slot: self.frame,
            image_index,
        };
        trace!("Presented image {} from slot {}.", image_index, self.frame);

        self.frame = (self.frame + 1) % self.slots.len();

        Ok(submission)
    }
}

/// [`FrameDevice`] backed by the renderer's device and swapchain.
pub struct VulkanFrameDevice<'a> {
    device: &'a Device,
    context: &'a VulkanContext,
}

impl<'a> VulkanFrameDevice<'a> {
    /// # Safety
    ///
    /// The swapchain, queues and command buffers in `context` must be live
    /// handles created from `device`.
    pub unsafe fn new(device: &'a VulkanDevice, context: &'a VulkanContext) -> Self {
        Self {
            device: &device.vk_device,
            context,
        }
    }
}

impl FrameDevice for VulkanFrameDevice<'_> {
    fn wait_for_fence(&mut self, fence: vk::Fence) -> Result<(), VulkanError> {
        unsafe { self.device.wait_for_fences(&[fence], true, u64::MAX) }
            .check("wait for in-flight fence")?;
        Ok(())
    }

    fn reset_fence(&mut self, fence: vk::Fence) -> Result<(), VulkanError> {
        unsafe { self.device.reset_fences(&[fence]) }.check("reset in-flight fence")?;
        Ok(())
    }

    fn acquire_next_image(&mut self, signal: vk::Semaphore) -> Result<u32, VulkanError> {
        let (image_index, _) = unsafe {
            self.device.acquire_next_image_khr(
                self.context.swapchain,
                u64::MAX,
                signal,
                vk::Fence::null(),
            )
        }
        .check("acquire swapchain image")?;
        Ok(image_index)
    }

    fn submit(
        &mut self,
        image_index: u32,
        wait: vk::Semaphore,
        signal: vk::Semaphore,
        fence: vk::Fence,
    ) -> Result<(), VulkanError> {
        let wait_semaphores = &[wait];
        let wait_stages = &[vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = &[self.context.command_buffers[image_index as usize]];
        let signal_semaphores = &[signal];
        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(wait_semaphores)
            .wait_dst_stage_mask(wait_stages)
            .command_buffers(command_buffers)
            .signal_semaphores(signal_semaphores);

        unsafe {
            self.device
                .queue_submit(self.context.graphics_queue, &[submit_info], fence)
        }
        .check("submit draw command buffer")?;
        Ok(())
    }

    fn present(&mut self, image_index: u32, wait: vk::Semaphore) -> Result<(), VulkanError> {
        let wait_semaphores = &[wait];
        let swapchains = &[self.context.swapchain];
        let image_indices = &[image_index];
        let present_info = vk::PresentInfoKHR::builder()
            .wait_semaphores(wait_semaphores)
            .swapchains(swapchains)
            .image_indices(image_indices);

        unsafe {
            self.device
                .queue_present_khr(self.context.present_queue, &present_info)
        }
        .check("present swapchain image")?;
        Ok(())
    }
}
