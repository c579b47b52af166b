use anyhow::{Ok, Result};
use log::*;
use std::collections::HashSet;
use vulkanalia::prelude::v1_0::*;

use super::adapter::{
    collect_candidates, select_adapter, AdapterCandidate, QueueFamilyIndices, SwapchainSupport,
};
use super::constants;
use super::context::VulkanContext;
use super::error::VkResultExt;
use super::instance::VulkanInstance;
use super::ledger::VulkanResource;

#[derive(Debug)]
pub struct VulkanDevice {
    pub vk_device: Device,
    pub indices: QueueFamilyIndices,
    pub support: SwapchainSupport,
}

impl VulkanDevice {
    unsafe fn pick_physical_device(
        instance: &VulkanInstance,
        context: &mut VulkanContext,
    ) -> Result<(QueueFamilyIndices, SwapchainSupport)> {
        let physical_devices = instance
            .vk_instance
            .enumerate_physical_devices()
            .check("enumerate physical devices")?;

        let surface = context.surface;
        let candidates = collect_candidates(physical_devices, |physical_device| {
            AdapterCandidate::query(
                &instance.vk_instance,
                surface,
                physical_device,
                constants::DEVICE_EXTENSIONS,
            )
        });

        let (selected, indices) = select_adapter(&candidates, constants::DEVICE_EXTENSIONS)?;
        context.physical_device = selected.physical_device;

        Ok((indices, selected.support.clone()))
    }

    pub unsafe fn new(
        entry: &Entry,
        instance: &VulkanInstance,
        context: &mut VulkanContext,
    ) -> Result<VulkanDevice> {
        let (indices, support) = VulkanDevice::pick_physical_device(instance, context)?;

        let mut unique_indices = HashSet::new();
        unique_indices.insert(indices.graphics);
        unique_indices.insert(indices.present);

        let queue_priorities = &[1.0];
        let queue_infos = unique_indices
            .iter()
            .map(|i| {
                vk::DeviceQueueCreateInfo::builder()
                    .queue_family_index(*i)
                    .queue_priorities(queue_priorities)
            })
            .collect::<Vec<_>>();

        let layers = if instance.validation {
            vec![constants::VALIDATION_LAYER.as_ptr()]
        } else {
            vec![]
        };

        let mut extensions = constants::DEVICE_EXTENSIONS
            .iter()
            .map(|n| n.as_ptr())
            .collect::<Vec<_>>();

        // Required by Vulkan SDK on macOS since 1.3.216.
        if cfg!(target_os = "macos") && entry.version()? >= constants::PORTABILITY_MACOS_VERSION {
            extensions.push(vk::KHR_PORTABILITY_SUBSET_EXTENSION.name.as_ptr());
        }

        let features = vk::PhysicalDeviceFeatures::builder();

        let info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_infos)
            .enabled_layer_names(&layers)
            .enabled_extension_names(&extensions)
            .enabled_features(&features);

        let device = instance
            .vk_instance
            .create_device(context.physical_device, &info, None)
            .check("create logical device")?;
        context.ledger.track(VulkanResource::Device);

        context.graphics_queue = device.get_device_queue(indices.graphics, 0);
        context.present_queue = device.get_device_queue(indices.present, 0);

        debug!(
            "Queue families: graphics = {}, present = {}.",
            indices.graphics, indices.present
        );

        Ok(VulkanDevice {
            vk_device: device,
            indices,
            support,
        })
    }

    pub unsafe fn wait_idle(&self) -> Result<()> {
        self.vk_device
            .device_wait_idle()
            .check("wait for device idle")?;
        Ok(())
    }
}
