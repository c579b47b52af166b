use std::collections::HashSet;

use log::*;
use vulkanalia::prelude::v1_0::*;
use vulkanalia::vk::KhrSurfaceExtension;

use super::error::{VkResultExt, VulkanError};

/// A snapshot of one physical device, taken against the target surface.
///
/// Selection works on these snapshots only, so it never touches the driver.
#[derive(Clone, Debug)]
pub struct AdapterCandidate {
    pub physical_device: vk::PhysicalDevice,
    pub name: String,
    pub queue_families: Vec<QueueFamily>,
    pub extensions: HashSet<vk::ExtensionName>,
    pub support: SwapchainSupport,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct QueueFamily {
    pub flags: vk::QueueFlags,
    pub present: bool,
}

#[derive(Clone, Debug, Default)]
pub struct SwapchainSupport {
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    pub graphics: u32,
    pub present: u32,
}

impl QueueFamilyIndices {
    /// First graphics family and, independently, first present family.
    pub fn resolve(families: &[QueueFamily]) -> Result<Self, VulkanError> {
        let graphics = families
            .iter()
            .position(|f| f.flags.contains(vk::QueueFlags::GRAPHICS))
            .map(|i| i as u32);

        let present = families.iter().position(|f| f.present).map(|i| i as u32);

        if let (Some(graphics), Some(present)) = (graphics, present) {
            Ok(Self { graphics, present })
        } else {
            Err(VulkanError::Suitability("required queue families"))
        }
    }

    /// Family indices the swapchain images are shared between.
    pub fn sharing(&self) -> (vk::SharingMode, Vec<u32>) {
        if self.graphics != self.present {
            (
                vk::SharingMode::CONCURRENT,
                vec![self.graphics, self.present],
            )
        } else {
            (vk::SharingMode::EXCLUSIVE, vec![])
        }
    }
}

impl AdapterCandidate {
    /// Snapshots `physical_device`. Surface capabilities, formats and present
    /// modes are only queried once the device has the queue families and
    /// extensions it needs; otherwise they stay empty and `check` rejects it.
    pub unsafe fn query(
        instance: &Instance,
        surface: vk::SurfaceKHR,
        physical_device: vk::PhysicalDevice,
        required_extensions: &[vk::ExtensionName],
    ) -> Result<Self, VulkanError> {
        let properties = instance.get_physical_device_properties(physical_device);

        let mut queue_families = Vec::new();
        for (index, family) in instance
            .get_physical_device_queue_family_properties(physical_device)
            .iter()
            .enumerate()
        {
            let present = instance
                .get_physical_device_surface_support_khr(physical_device, index as u32, surface)
                .check("query surface support")?;
            queue_families.push(QueueFamily {
                flags: family.queue_flags,
                present,
            });
        }

        let extensions = instance
            .enumerate_device_extension_properties(physical_device, None)
            .check("enumerate device extensions")?
            .iter()
            .map(|e| e.extension_name)
            .collect::<HashSet<_>>();

        let mut candidate = Self {
            physical_device,
            name: properties.device_name.to_string(),
            queue_families,
            extensions,
            support: SwapchainSupport::default(),
        };

        if candidate.can_present(required_extensions) {
            candidate.support = SwapchainSupport::query(instance, surface, physical_device)?;
        }

        Ok(candidate)
    }

    /// Whether the surface may be queried for swapchain support at all.
    pub fn can_present(&self, required_extensions: &[vk::ExtensionName]) -> bool {
        QueueFamilyIndices::resolve(&self.queue_families).is_ok()
            && self.has_extensions(required_extensions)
    }

    fn has_extensions(&self, required_extensions: &[vk::ExtensionName]) -> bool {
        required_extensions
            .iter()
            .all(|e| self.extensions.contains(e))
    }

    /// Queue families that satisfy the requirements, or why not.
    pub fn check(
        &self,
        required_extensions: &[vk::ExtensionName],
    ) -> Result<QueueFamilyIndices, VulkanError> {
        let indices = QueueFamilyIndices::resolve(&self.queue_families)?;

        if !self.has_extensions(required_extensions) {
            return Err(VulkanError::Suitability("required device extensions"));
        }

        if self.support.formats.is_empty() || self.support.present_modes.is_empty() {
            return Err(VulkanError::Suitability("swapchain support"));
        }

        Ok(indices)
    }
}

impl SwapchainSupport {
    pub unsafe fn query(
        instance: &Instance,
        surface: vk::SurfaceKHR,
        physical_device: vk::PhysicalDevice,
    ) -> Result<Self, VulkanError> {
        Ok(Self {
            capabilities: instance
                .get_physical_device_surface_capabilities_khr(physical_device, surface)
                .check("query surface capabilities")?,
            formats: instance
                .get_physical_device_surface_formats_khr(physical_device, surface)
                .check("query surface formats")?,
            present_modes: instance
                .get_physical_device_surface_present_modes_khr(physical_device, surface)
                .check("query surface present modes")?,
        })
    }
}

/// Snapshots every physical device. A device whose queries fail is logged
/// and left out; the rest are still considered.
pub fn collect_candidates<I, F>(physical_devices: I, mut query: F) -> Vec<AdapterCandidate>
where
    I: IntoIterator<Item = vk::PhysicalDevice>,
    F: FnMut(vk::PhysicalDevice) -> Result<AdapterCandidate, VulkanError>,
{
    physical_devices
        .into_iter()
        .filter_map(|physical_device| match query(physical_device) {
            Ok(candidate) => Some(candidate),
            Err(error) => {
                warn!("Skipping physical device ({:?}): {}", physical_device, error);
                None
            }
        })
        .collect()
}

/// Picks the first candidate, in enumeration order, that can render and present.
pub fn select_adapter<'a>(
    candidates: &'a [AdapterCandidate],
    required_extensions: &[vk::ExtensionName],
) -> Result<(&'a AdapterCandidate, QueueFamilyIndices), VulkanError> {
    for candidate in candidates {
        match candidate.check(required_extensions) {
            Ok(indices) => {
                info!("Selected physical device (`{}`).", candidate.name);
                return Ok((candidate, indices));
            }
            Err(error) => warn!(
                "Skipping physical device (`{}`): {}",
                candidate.name, error
            ),
        }
    }

    Err(VulkanError::NoSuitableDevice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vulkan::constants::DEVICE_EXTENSIONS;
    use vulkanalia::vk::Handle;

    fn family(flags: vk::QueueFlags, present: bool) -> QueueFamily {
        QueueFamily { flags, present }
    }

    fn candidate(name: &str, queue_families: Vec<QueueFamily>) -> AdapterCandidate {
        AdapterCandidate {
            physical_device: vk::PhysicalDevice::null(),
            name: name.to_string(),
            queue_families,
            extensions: DEVICE_EXTENSIONS.iter().cloned().collect(),
            support: SwapchainSupport {
                capabilities: vk::SurfaceCapabilitiesKHR::default(),
                formats: vec![vk::SurfaceFormatKHR {
                    format: vk::Format::B8G8R8A8_SRGB,
                    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
                }],
                present_modes: vec![vk::PresentModeKHR::FIFO],
            },
        }
    }

    #[test]
    fn resolves_shared_graphics_and_present_family() {
        let families = [
            family(vk::QueueFlags::TRANSFER, false),
            family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE, true),
        ];
        let indices = QueueFamilyIndices::resolve(&families).unwrap();
        assert_eq!(
            indices,
            QueueFamilyIndices {
                graphics: 1,
                present: 1
            }
        );
        assert_eq!(indices.sharing(), (vk::SharingMode::EXCLUSIVE, vec![]));
    }

    #[test]
    fn resolves_distinct_families_with_concurrent_sharing() {
        let families = [
            family(vk::QueueFlags::GRAPHICS, false),
            family(vk::QueueFlags::COMPUTE, true),
            family(vk::QueueFlags::GRAPHICS, true),
        ];
        let indices = QueueFamilyIndices::resolve(&families).unwrap();
        assert_eq!(indices.graphics, 0);
        assert_eq!(indices.present, 1);

        let (mode, shared) = indices.sharing();
        assert_eq!(mode, vk::SharingMode::CONCURRENT);
        assert_eq!(shared.len(), 2);
        assert_eq!(shared, vec![0, 1]);
    }

    #[test]
    fn never_selects_a_device_without_presentation() {
        let candidates = [
            candidate("headless", vec![family(vk::QueueFlags::GRAPHICS, false)]),
            candidate("display", vec![family(vk::QueueFlags::GRAPHICS, true)]),
        ];

        let (selected, _) = select_adapter(&candidates, DEVICE_EXTENSIONS).unwrap();
        assert_eq!(selected.name, "display");
    }

    #[test]
    fn fails_when_only_headless_devices_exist() {
        let candidates = [
            candidate("headless-a", vec![family(vk::QueueFlags::GRAPHICS, false)]),
            candidate("headless-b", vec![family(vk::QueueFlags::COMPUTE, false)]),
        ];

        assert!(matches!(
            select_adapter(&candidates, DEVICE_EXTENSIONS),
            Err(VulkanError::NoSuitableDevice)
        ));
    }

    #[test]
    fn first_suitable_candidate_wins() {
        let candidates = [
            candidate("first", vec![family(vk::QueueFlags::GRAPHICS, true)]),
            candidate("second", vec![family(vk::QueueFlags::GRAPHICS, true)]),
        ];

        let (selected, _) = select_adapter(&candidates, DEVICE_EXTENSIONS).unwrap();
        assert_eq!(selected.name, "first");
    }

    #[test]
    fn rejects_missing_extensions_and_empty_swapchain_support() {
        let mut no_swapchain = candidate("no-ext", vec![family(vk::QueueFlags::GRAPHICS, true)]);
        no_swapchain.extensions.clear();

        let mut no_modes = candidate("no-modes", vec![family(vk::QueueFlags::GRAPHICS, true)]);
        no_modes.support.present_modes.clear();

        let mut no_formats =
            candidate("no-formats", vec![family(vk::QueueFlags::GRAPHICS, true)]);
        no_formats.support.formats.clear();

        for rejected in [&no_swapchain, &no_modes, &no_formats] {
            assert!(matches!(
                rejected.check(DEVICE_EXTENSIONS),
                Err(VulkanError::Suitability(_))
            ));
        }

        assert!(matches!(
            select_adapter(&[no_swapchain, no_modes, no_formats], DEVICE_EXTENSIONS),
            Err(VulkanError::NoSuitableDevice)
        ));
    }

    #[test]
    fn surface_is_only_queried_for_devices_that_can_present() {
        let headless = candidate("headless", vec![family(vk::QueueFlags::GRAPHICS, false)]);
        assert!(!headless.can_present(DEVICE_EXTENSIONS));

        let mut no_ext = candidate("no-ext", vec![family(vk::QueueFlags::GRAPHICS, true)]);
        no_ext.extensions.clear();
        assert!(!no_ext.can_present(DEVICE_EXTENSIONS));

        let display = candidate("display", vec![family(vk::QueueFlags::GRAPHICS, true)]);
        assert!(display.can_present(DEVICE_EXTENSIONS));
    }

    #[test]
    fn unqueried_surface_support_rejects_the_device() {
        let mut headless = candidate("headless", vec![family(vk::QueueFlags::GRAPHICS, false)]);
        headless.support = SwapchainSupport::default();

        let candidates = [
            headless,
            candidate("display", vec![family(vk::QueueFlags::GRAPHICS, true)]),
        ];
        let (selected, indices) = select_adapter(&candidates, DEVICE_EXTENSIONS).unwrap();
        assert_eq!(selected.name, "display");
        assert_eq!(indices.present, 0);
    }

    #[test]
    fn failed_device_query_is_skipped() {
        let devices = [
            vk::PhysicalDevice::from_raw(1),
            vk::PhysicalDevice::from_raw(2),
            vk::PhysicalDevice::from_raw(3),
        ];

        let mut queried = Vec::new();
        let candidates = collect_candidates(devices, |physical_device| {
            queried.push(physical_device);
            match physical_device.as_raw() {
                1 => Err(VulkanError::Call {
                    operation: "query surface capabilities",
                    code: vk::ErrorCode::SURFACE_LOST_KHR,
                }),
                2 => Ok(candidate("headless", vec![family(vk::QueueFlags::GRAPHICS, false)])),
                _ => Ok(candidate("display", vec![family(vk::QueueFlags::GRAPHICS, true)])),
            }
        });

        assert_eq!(queried, devices);
        assert_eq!(candidates.len(), 2);

        let (selected, _) = select_adapter(&candidates, DEVICE_EXTENSIONS).unwrap();
        assert_eq!(selected.name, "display");
    }

    #[test]
    fn every_query_failing_means_no_suitable_device() {
        let devices = [vk::PhysicalDevice::from_raw(1)];
        let candidates = collect_candidates(devices, |_| {
            Err(VulkanError::Call {
                operation: "enumerate device extensions",
                code: vk::ErrorCode::INITIALIZATION_FAILED,
            })
        });

        assert!(candidates.is_empty());
        assert!(matches!(
            select_adapter(&candidates, DEVICE_EXTENSIONS),
            Err(VulkanError::NoSuitableDevice)
        ));
    }

    #[test]
    fn no_candidates_is_an_error() {
        assert!(matches!(
            select_adapter(&[], DEVICE_EXTENSIONS),
            Err(VulkanError::NoSuitableDevice)
        ));
    }
}
