use anyhow::Result;
use log::*;
use vulkanalia::prelude::v1_0::*;
use vulkanalia::vk::{KhrSurfaceExtension, KhrSwapchainExtension};

use super::constants;
use super::context::{Release, VulkanContext};
use super::error::VulkanError;
use super::instance::VulkanInstance;

#[derive(Debug)]
pub struct VulkanDevice {
    pub vk_device: Device,
}

impl VulkanDevice {
    unsafe fn pick_physical_device(
        instance: &VulkanInstance,
        context: &mut VulkanContext,
    ) -> Result<()> {
        let physical_devices = instance
            .vk_instance
            .enumerate_physical_devices()
            .map_err(VulkanError::enumeration("physical devices"))?;
        info!("Found {} physical devices.", physical_devices.len());

        let candidates = physical_devices
            .iter()
            .map(|d| {
                let properties = instance.vk_instance.get_physical_device_properties(*d);
                debug!(
                    "Physical device `{}` ({:?}).",
                    properties.device_name, properties.device_type
                );
                (*d, properties.device_type)
            })
            .collect::<Vec<_>>();

        let physical_device = select_physical_device(&candidates)?;
        let properties = instance
            .vk_instance
            .get_physical_device_properties(physical_device);
        info!("Selected physical device (`{}`).", properties.device_name);

        context.physical_device = physical_device;
        Ok(())
    }

    unsafe fn pick_queue_family(
        instance: &VulkanInstance,
        context: &mut VulkanContext,
    ) -> Result<()> {
        let properties = instance
            .vk_instance
            .get_physical_device_queue_family_properties(context.physical_device);
        info!("Found {} queue families.", properties.len());

        let index = select_queue_family(&properties, |index| {
            match instance.vk_instance.get_physical_device_surface_support_khr(
                context.physical_device,
                index,
                context.surface,
            ) {
                Ok(supported) => supported,
                Err(code) => {
                    warn!("Presentation support query for family {} failed: {}", index, code);
                    false
                }
            }
        })?;
        info!("Queue family {} supports graphics and presentation.", index);

        context.queue_family_index = index;
        Ok(())
    }

    pub unsafe fn new(
        entry: &Entry,
        instance: &VulkanInstance,
        validation: bool,
        context: &mut VulkanContext,
    ) -> Result<VulkanDevice> {
        VulkanDevice::pick_physical_device(instance, context)?;
        VulkanDevice::pick_queue_family(instance, context)?;

        let queue_priorities = &[1.0];
        let queue_info = vk::DeviceQueueCreateInfo::builder()
            .queue_family_index(context.queue_family_index)
            .queue_priorities(queue_priorities);

        let layers = if validation {
            vec![constants::VALIDATION_LAYER.as_ptr()]
        } else {
            vec![]
        };

        let mut extensions = vec![vk::KHR_SWAPCHAIN_EXTENSION.name.as_ptr()];

        // Required by Vulkan SDK on macOS since 1.3.216.
        if cfg!(target_os = "macos") && entry.version()? >= constants::PORTABILITY_MACOS_VERSION {
            extensions.push(vk::KHR_PORTABILITY_SUBSET_EXTENSION.name.as_ptr());
        }

        let features = vk::PhysicalDeviceFeatures::builder();

        let queue_infos = &[queue_info];
        let info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(queue_infos)
            .enabled_layer_names(&layers)
            .enabled_extension_names(&extensions)
            .enabled_features(&features);

        let device = instance
            .vk_instance
            .create_device(context.physical_device, &info, None)
            .map_err(VulkanError::DeviceCreationFailed)?;
        info!("Logical device created.");

        context.graphics_queue = device.get_device_queue(context.queue_family_index, 0);

        Ok(VulkanDevice { vk_device: device })
    }

    /// Releases a device-level handle. Instance-level handles are ignored.
    pub unsafe fn release(&self, release: Release) {
        let device = &self.vk_device;
        match release {
            Release::Fence(fence) => device.destroy_fence(fence, None),
            Release::Semaphore(semaphore) => device.destroy_semaphore(semaphore, None),
            Release::CommandPool(pool) => device.destroy_command_pool(pool, None),
            Release::Framebuffer(framebuffer) => device.destroy_framebuffer(framebuffer, None),
            Release::Pipeline(pipeline) => device.destroy_pipeline(pipeline, None),
            Release::PipelineLayout(layout) => device.destroy_pipeline_layout(layout, None),
            Release::RenderPass(render_pass) => device.destroy_render_pass(render_pass, None),
            Release::ImageView(view) => device.destroy_image_view(view, None),
            Release::Swapchain(swapchain) => device.destroy_swapchain_khr(swapchain, None),
            other => warn!("Device cannot release {:?}.", other),
        }
    }

    pub unsafe fn wait_idle(&self) -> Result<()> {
        self.vk_device.device_wait_idle()?;
        Ok(())
    }

    pub unsafe fn destroy(&self) {
        self.vk_device.destroy_device(None);
        info!("Logical device destroyed.");
    }
}

/// Position of a device type in the preference order, `None` if never acceptable.
pub fn device_type_rank(device_type: vk::PhysicalDeviceType) -> Option<usize> {
    constants::DEVICE_TYPE_PREFERENCE
        .iter()
        .position(|t| *t == device_type)
}

/// Picks the most preferred device type; ties go to the earliest device listed.
pub fn select_physical_device(
    candidates: &[(vk::PhysicalDevice, vk::PhysicalDeviceType)],
) -> Result<vk::PhysicalDevice, VulkanError> {
    if candidates.is_empty() {
        return Err(VulkanError::NoAcceleratorFound);
    }

    candidates
        .iter()
        .filter_map(|(device, device_type)| device_type_rank(*device_type).map(|r| (r, *device)))
        .min_by_key(|(rank, _)| *rank)
        .map(|(_, device)| device)
        .ok_or(VulkanError::NoSuitableAccelerator)
}

/// First family that can both draw and present to the surface.
pub fn select_queue_family(
    families: &[vk::QueueFamilyProperties],
    mut supports_present: impl FnMut(u32) -> bool,
) -> Result<u32, VulkanError> {
    families
        .iter()
        .enumerate()
        .map(|(i, f)| (i as u32, f))
        .find(|(i, f)| f.queue_flags.contains(vk::QueueFlags::GRAPHICS) && supports_present(*i))
        .map(|(i, _)| i)
        .ok_or(VulkanError::NoSuitableQueueFamily)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vulkan::error::ErrorKind;
    use vulkanalia::vk::Handle;

    fn device(raw: usize) -> vk::PhysicalDevice {
        vk::PhysicalDevice::from_raw(raw)
    }

    fn family(flags: vk::QueueFlags) -> vk::QueueFamilyProperties {
        vk::QueueFamilyProperties {
            queue_flags: flags,
            queue_count: 1,
            ..Default::default()
        }
    }

    #[test]
    fn discrete_wins_wherever_it_is_listed() {
        let kinds = [
            vk::PhysicalDeviceType::CPU,
            vk::PhysicalDeviceType::INTEGRATED_GPU,
            vk::PhysicalDeviceType::VIRTUAL_GPU,
            vk::PhysicalDeviceType::DISCRETE_GPU,
        ];

        for position in 0..kinds.len() {
            let mut candidates = kinds
                .iter()
                .filter(|k| **k != vk::PhysicalDeviceType::DISCRETE_GPU)
                .enumerate()
                .map(|(i, k)| (device(i + 1), *k))
                .collect::<Vec<_>>();
            candidates.insert(position, (device(99), vk::PhysicalDeviceType::DISCRETE_GPU));

            assert_eq!(select_physical_device(&candidates).unwrap(), device(99));
        }
    }

    #[test]
    fn falls_back_through_the_preference_order() {
        let candidates = [
            (device(1), vk::PhysicalDeviceType::CPU),
            (device(2), vk::PhysicalDeviceType::VIRTUAL_GPU),
        ];
        assert_eq!(select_physical_device(&candidates).unwrap(), device(2));

        let candidates = [
            (device(1), vk::PhysicalDeviceType::INTEGRATED_GPU),
            (device(2), vk::PhysicalDeviceType::INTEGRATED_GPU),
        ];
        assert_eq!(select_physical_device(&candidates).unwrap(), device(1));
    }

    #[test]
    fn no_devices_and_no_acceptable_devices_are_distinct_failures() {
        assert!(matches!(
            select_physical_device(&[]),
            Err(VulkanError::NoAcceleratorFound)
        ));

        let error =
            select_physical_device(&[(device(1), vk::PhysicalDeviceType::OTHER)]).unwrap_err();
        assert!(matches!(error, VulkanError::NoSuitableAccelerator));
        assert_eq!(error.kind(), ErrorKind::Selection);
    }

    #[test]
    fn ranks_follow_the_preference_order() {
        assert_eq!(device_type_rank(vk::PhysicalDeviceType::DISCRETE_GPU), Some(0));
        assert_eq!(device_type_rank(vk::PhysicalDeviceType::CPU), Some(3));
        assert_eq!(device_type_rank(vk::PhysicalDeviceType::OTHER), None);
    }

    #[test]
    fn queue_family_must_draw_and_present() {
        let families = [
            family(vk::QueueFlags::TRANSFER),
            family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE),
            family(vk::QueueFlags::GRAPHICS),
        ];

        assert_eq!(select_queue_family(&families, |_| true).unwrap(), 1);
        assert_eq!(select_queue_family(&families, |i| i == 2).unwrap(), 2);
    }

    #[test]
    fn split_graphics_and_present_families_are_rejected() {
        let families = [
            family(vk::QueueFlags::GRAPHICS),
            family(vk::QueueFlags::COMPUTE),
        ];

        let error = select_queue_family(&families, |i| i == 1).unwrap_err();
        assert!(matches!(error, VulkanError::NoSuitableQueueFamily));
        assert_eq!(error.kind(), ErrorKind::Selection);
    }

    #[test]
    fn presentation_is_only_queried_for_graphics_families() {
        let families = [
            family(vk::QueueFlags::COMPUTE),
            family(vk::QueueFlags::GRAPHICS),
        ];
        let mut queried = Vec::new();

        let index = select_queue_family(&families, |i| {
            queried.push(i);
            true
        })
        .unwrap();

        assert_eq!(index, 1);
        assert_eq!(queried, vec![1]);
    }

    #[test]
    fn no_families_is_a_selection_failure() {
        assert!(select_queue_family(&[], |_| true).is_err());
    }
}
