use anyhow::Result;
use log::*;
use vulkanalia::prelude::v1_0::*;
use vulkanalia::vk::Handle;
use vulkanalia::vk::KhrSwapchainExtension;

use super::adapter::{QueueFamilyIndices, SwapchainSupport};
use super::constants::{PREFERRED_COLOR_SPACE, PREFERRED_SURFACE_FORMAT};
use super::context::VulkanContext;
use super::device::VulkanDevice;
use super::error::VkResultExt;
use super::ledger::VulkanResource;

#[derive(Debug)]
pub struct VulkanSwapchain;

impl VulkanSwapchain {
    pub unsafe fn create(
        window_size: vk::Extent2D,
        support: &SwapchainSupport,
        indices: QueueFamilyIndices,
        device: &VulkanDevice,
        context: &mut VulkanContext,
    ) -> Result<()> {
        let surface_format = choose_surface_format(&support.formats);
        let present_mode = choose_present_mode(&support.present_modes);
        let extent = choose_extent(&support.capabilities, window_size);
        let image_count = compute_image_count(&support.capabilities);

        let (image_sharing_mode, queue_family_indices) = indices.sharing();

        let info = vk::SwapchainCreateInfoKHR::builder()
            .surface(context.surface)
            .min_image_count(image_count)
            .image_format(surface_format.format)
            .image_color_space(surface_format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(image_sharing_mode)
            .queue_family_indices(&queue_family_indices)
            .pre_transform(support.capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true)
            .old_swapchain(vk::SwapchainKHR::null());

        context.swapchain = device
            .vk_device
            .create_swapchain_khr(&info, None)
            .check("create swapchain")?;
        context.ledger.track(VulkanResource::Swapchain(context.swapchain));

        context.swapchain_images = device
            .vk_device
            .get_swapchain_images_khr(context.swapchain)
            .check("get swapchain images")?;
        context.swapchain_format = surface_format.format;
        context.swapchain_extent = extent;

        debug!(
            "Swapchain: {:?} / {:?}, {:?}, {}x{}, {} images (requested {}).",
            surface_format.format,
            surface_format.color_space,
            present_mode,
            extent.width,
            extent.height,
            context.swapchain_images.len(),
            image_count,
        );

        Ok(())
    }

    pub unsafe fn create_image_views(
        device: &VulkanDevice,
        context: &mut VulkanContext,
    ) -> Result<()> {
        let subresource_range = vk::ImageSubresourceRange::builder()
            .aspect_mask(vk::ImageAspectFlags::COLOR)
            .base_mip_level(0)
            .level_count(1)
            .base_array_layer(0)
            .layer_count(1)
            .build();

        for image in &context.swapchain_images {
            let info = vk::ImageViewCreateInfo::builder()
                .image(*image)
                .view_type(vk::ImageViewType::_2D)
                .format(context.swapchain_format)
                .subresource_range(subresource_range);

            let view = device
                .vk_device
                .create_image_view(&info, None)
                .check("create image view")?;
            context.ledger.track(VulkanResource::ImageView(view));
            context.swapchain_image_views.push(view);
        }

        Ok(())
    }
}

/// The preferred sRGB format if offered, otherwise whatever comes first.
pub fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> vk::SurfaceFormatKHR {
    formats
        .iter()
        .cloned()
        .find(|f| f.format == PREFERRED_SURFACE_FORMAT && f.color_space == PREFERRED_COLOR_SPACE)
        .unwrap_or_else(|| formats[0])
}

/// Mailbox when available; FIFO is guaranteed to exist.
pub fn choose_present_mode(present_modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    present_modes
        .iter()
        .cloned()
        .find(|m| *m == vk::PresentModeKHR::MAILBOX)
        .unwrap_or(vk::PresentModeKHR::FIFO)
}

pub fn choose_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    window_size: vk::Extent2D,
) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }

    let clamp = |min: u32, max: u32, v: u32| min.max(max.min(v));
    vk::Extent2D::builder()
        .width(clamp(
            capabilities.min_image_extent.width,
            capabilities.max_image_extent.width,
            window_size.width,
        ))
        .height(clamp(
            capabilities.min_image_extent.height,
            capabilities.max_image_extent.height,
            window_size.height,
        ))
        .build()
}

/// One more than the minimum; a maximum of zero means unbounded.
pub fn compute_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let count = capabilities.min_image_count + 1;
    if capabilities.max_image_count != 0 && count > capabilities.max_image_count {
        capabilities.max_image_count
    } else {
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extent(width: u32, height: u32) -> vk::Extent2D {
        vk::Extent2D { width, height }
    }

    fn capabilities(current: vk::Extent2D) -> vk::SurfaceCapabilitiesKHR {
        vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 0,
            current_extent: current,
            min_image_extent: extent(640, 480),
            max_image_extent: extent(1920, 1080),
            ..Default::default()
        }
    }

    #[test]
    fn image_count_with_unbounded_max() {
        let caps = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 0,
            ..Default::default()
        };
        assert_eq!(compute_image_count(&caps), 3);
    }

    #[test]
    fn image_count_is_clamped_to_max() {
        let caps = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 2,
            ..Default::default()
        };
        assert_eq!(compute_image_count(&caps), 2);
    }

    #[test]
    fn image_count_below_max_is_untouched() {
        let caps = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 8,
            ..Default::default()
        };
        assert_eq!(compute_image_count(&caps), 3);
    }

    #[test]
    fn sentinel_extent_uses_window_size() {
        let caps = capabilities(extent(u32::MAX, u32::MAX));
        assert_eq!(choose_extent(&caps, extent(800, 600)), extent(800, 600));
    }

    #[test]
    fn sentinel_extent_clamps_window_size() {
        let caps = capabilities(extent(u32::MAX, u32::MAX));
        assert_eq!(choose_extent(&caps, extent(320, 4000)), extent(640, 1080));
    }

    #[test]
    fn current_extent_is_taken_verbatim() {
        let caps = capabilities(extent(1024, 768));
        assert_eq!(choose_extent(&caps, extent(800, 600)), extent(1024, 768));
        assert_eq!(choose_extent(&caps, extent(10, 10)), extent(1024, 768));
    }

    #[test]
    fn present_mode_prefers_mailbox() {
        let modes = [
            vk::PresentModeKHR::FIFO,
            vk::PresentModeKHR::MAILBOX,
            vk::PresentModeKHR::IMMEDIATE,
        ];
        assert_eq!(choose_present_mode(&modes), vk::PresentModeKHR::MAILBOX);
    }

    #[test]
    fn present_mode_falls_back_to_fifo() {
        let modes = [vk::PresentModeKHR::IMMEDIATE, vk::PresentModeKHR::FIFO_RELAXED];
        assert_eq!(choose_present_mode(&modes), vk::PresentModeKHR::FIFO);
    }

    #[test]
    fn surface_format_prefers_srgb_pair() {
        let formats = [
            vk::SurfaceFormatKHR {
                format: vk::Format::R8G8B8A8_UNORM,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
            vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_SRGB,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
        ];
        assert_eq!(choose_surface_format(&formats), formats[1]);
    }

    #[test]
    fn surface_format_falls_back_to_first() {
        let formats = [
            vk::SurfaceFormatKHR {
                format: vk::Format::R8G8B8A8_UNORM,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
            vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_SRGB,
                color_space: vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT,
            },
        ];
        assert_eq!(choose_surface_format(&formats), formats[0]);
    }
}
