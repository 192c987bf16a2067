use anyhow::Result;
use log::*;
use vulkanalia::prelude::v1_0::*;
use vulkanalia::vk::{KhrSurfaceExtension, KhrSwapchainExtension};

use super::constants;
use super::context::VulkanContext;
use super::device::VulkanDevice;
use super::error::{NegotiationFailure, VulkanError};
use super::image::VulkanImage;
use super::instance::VulkanInstance;

/// What the swapchain was negotiated with. Fixed for the lifetime of the chain.
#[derive(Copy, Clone, Debug, Default)]
pub struct SwapchainMetadata {
    pub surface_format: vk::SurfaceFormatKHR,
    pub present_mode: vk::PresentModeKHR,
    pub extent: vk::Extent2D,
    pub pre_transform: vk::SurfaceTransformFlagsKHR,
    pub image_count: u32,
}

/// The swapchain with its images and one view per image, index for index.
#[derive(Clone, Debug, Default)]
pub struct PresentationChain {
    pub swapchain: vk::SwapchainKHR,
    pub images: Vec<vk::Image>,
    pub image_views: Vec<vk::ImageView>,
}

impl SwapchainMetadata {
    pub fn negotiate(
        capabilities: &vk::SurfaceCapabilitiesKHR,
        formats: &[vk::SurfaceFormatKHR],
        present_modes: &[vk::PresentModeKHR],
        framebuffer_size: (u32, u32),
    ) -> Result<Self, VulkanError> {
        Ok(Self {
            surface_format: choose_surface_format(formats)?,
            present_mode: choose_present_mode(present_modes)?,
            extent: choose_extent(capabilities, framebuffer_size),
            pre_transform: capabilities.current_transform,
            image_count: choose_image_count(capabilities),
        })
    }
}

/// sRGB BGRA8 with the sRGB non-linear colour space if offered, else the first entry.
pub fn choose_surface_format(
    formats: &[vk::SurfaceFormatKHR],
) -> Result<vk::SurfaceFormatKHR, VulkanError> {
    let first = formats
        .first()
        .copied()
        .ok_or(VulkanError::SurfaceNegotiationFailed {
            query: "surface formats",
            reason: NegotiationFailure::Empty,
        })?;

    Ok(formats
        .iter()
        .copied()
        .find(|f| {
            f.format == constants::PREFERRED_SURFACE_FORMAT
                && f.color_space == constants::PREFERRED_COLOR_SPACE
        })
        .unwrap_or(first))
}

pub fn choose_present_mode(
    present_modes: &[vk::PresentModeKHR],
) -> Result<vk::PresentModeKHR, VulkanError> {
    if present_modes.is_empty() {
        return Err(VulkanError::SurfaceNegotiationFailed {
            query: "present modes",
            reason: NegotiationFailure::Empty,
        });
    }

    Ok(if present_modes.contains(&constants::PREFERRED_PRESENT_MODE) {
        constants::PREFERRED_PRESENT_MODE
    } else {
        constants::FALLBACK_PRESENT_MODE
    })
}

/// The surface's own extent when it reports one, else the framebuffer size
/// clamped into the supported range.
pub fn choose_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    framebuffer_size: (u32, u32),
) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }

    let min = capabilities.min_image_extent;
    let max = capabilities.max_image_extent;
    let (width, height) = framebuffer_size;

    vk::Extent2D {
        width: width.max(min.width).min(max.width),
        height: height.max(min.height).min(max.height),
    }
}

/// One more than the minimum, capped by the maximum unless it is 0 (unbounded).
pub fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let count = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 && count > capabilities.max_image_count {
        capabilities.max_image_count
    } else {
        count
    }
}

fn negotiation(query: &'static str) -> impl FnOnce(vk::ErrorCode) -> VulkanError {
    move |code| VulkanError::SurfaceNegotiationFailed {
        query,
        reason: NegotiationFailure::Status(code),
    }
}

pub struct VulkanSwapchain;

impl VulkanSwapchain {
    pub unsafe fn negotiate(
        framebuffer_size: (u32, u32),
        instance: &VulkanInstance,
        context: &mut VulkanContext,
    ) -> Result<()> {
        let instance = &instance.vk_instance;

        let formats = instance
            .get_physical_device_surface_formats_khr(context.physical_device, context.surface)
            .map_err(negotiation("surface formats"))?;
        let present_modes = instance
            .get_physical_device_surface_present_modes_khr(context.physical_device, context.surface)
            .map_err(negotiation("present modes"))?;
        let capabilities = instance
            .get_physical_device_surface_capabilities_khr(context.physical_device, context.surface)
            .map_err(negotiation("surface capabilities"))?;

        let metadata = SwapchainMetadata::negotiate(
            &capabilities,
            &formats,
            &present_modes,
            framebuffer_size,
        )?;

        if metadata.surface_format.format != constants::PREFERRED_SURFACE_FORMAT {
            warn!(
                "Preferred surface format unavailable, using {:?}.",
                metadata.surface_format.format
            );
        }
        info!(
            "Surface negotiated: {:?} {:?}, {:?}, {}x{}, {} images.",
            metadata.surface_format.format,
            metadata.surface_format.color_space,
            metadata.present_mode,
            metadata.extent.width,
            metadata.extent.height,
            metadata.image_count
        );

        context.metadata = metadata;
        Ok(())
    }

    pub unsafe fn create(device: &VulkanDevice, context: &mut VulkanContext) -> Result<()> {
        let metadata = context.metadata;

        let info = vk::SwapchainCreateInfoKHR::builder()
            .surface(context.surface)
            .min_image_count(metadata.image_count)
            .image_format(metadata.surface_format.format)
            .image_color_space(metadata.surface_format.color_space)
            .image_extent(metadata.extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .pre_transform(metadata.pre_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(metadata.present_mode)
            .clipped(true)
            .old_swapchain(vk::SwapchainKHR::null());

        context.chain.swapchain = device
            .vk_device
            .create_swapchain_khr(&info, None)
            .map_err(VulkanError::creation("swapchain"))?;
        info!("Swapchain created.");

        // The driver may hand back more images than requested.
        context.chain.images = device
            .vk_device
            .get_swapchain_images_khr(context.chain.swapchain)
            .map_err(VulkanError::enumeration("swapchain images"))?;
        let image_count = context.chain.images.len() as u32;
        if image_count != metadata.image_count {
            info!(
                "Requested {} swapchain images, driver created {}.",
                metadata.image_count, image_count
            );
        }
        context.metadata.image_count = image_count;
        info!("Swapchain has {} images.", image_count);

        Ok(())
    }

    /// Negotiates the surface, creates the swapchain and wraps each image in a view.
    pub unsafe fn build(
        framebuffer_size: (u32, u32),
        instance: &VulkanInstance,
        device: &VulkanDevice,
        context: &mut VulkanContext,
    ) -> Result<()> {
        VulkanSwapchain::negotiate(framebuffer_size, instance, context)?;
        VulkanSwapchain::create(device, context)?;
        VulkanImage::create_views(device, context)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(format: vk::Format, color_space: vk::ColorSpaceKHR) -> vk::SurfaceFormatKHR {
        vk::SurfaceFormatKHR {
            format,
            color_space,
        }
    }

    fn capabilities(min_count: u32, max_count: u32) -> vk::SurfaceCapabilitiesKHR {
        vk::SurfaceCapabilitiesKHR {
            min_image_count: min_count,
            max_image_count: max_count,
            current_extent: vk::Extent2D {
                width: u32::MAX,
                height: u32::MAX,
            },
            min_image_extent: vk::Extent2D {
                width: 16,
                height: 16,
            },
            max_image_extent: vk::Extent2D {
                width: 4096,
                height: 2048,
            },
            current_transform: vk::SurfaceTransformFlagsKHR::IDENTITY,
            ..Default::default()
        }
    }

    #[test]
    fn srgb_format_is_preferred_over_earlier_entries() {
        let formats = [
            format(vk::Format::R8G8B8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR),
            format(vk::Format::B8G8R8A8_SRGB, vk::ColorSpaceKHR::SRGB_NONLINEAR),
        ];

        let chosen = choose_surface_format(&formats).unwrap();
        assert_eq!(chosen.format, vk::Format::B8G8R8A8_SRGB);
        assert_eq!(chosen.color_space, vk::ColorSpaceKHR::SRGB_NONLINEAR);
    }

    #[test]
    fn first_format_is_the_fallback() {
        let formats = [format(vk::Format::R8G8B8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR)];
        let chosen = choose_surface_format(&formats).unwrap();
        assert_eq!(chosen.format, vk::Format::R8G8B8A8_UNORM);
        assert_eq!(chosen.color_space, vk::ColorSpaceKHR::SRGB_NONLINEAR);
    }

    #[test]
    fn srgb_format_in_another_color_space_is_not_a_match() {
        let formats = [
            format(vk::Format::R16G16B16A16_SFLOAT, vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT),
            format(vk::Format::B8G8R8A8_SRGB, vk::ColorSpaceKHR::DISPLAY_P3_NONLINEAR_EXT),
        ];
        let chosen = choose_surface_format(&formats).unwrap();
        assert_eq!(chosen.format, vk::Format::R16G16B16A16_SFLOAT);
    }

    #[test]
    fn mailbox_is_preferred_and_fifo_is_the_fallback() {
        let modes = [vk::PresentModeKHR::FIFO, vk::PresentModeKHR::MAILBOX];
        assert_eq!(choose_present_mode(&modes).unwrap(), vk::PresentModeKHR::MAILBOX);

        let modes = [vk::PresentModeKHR::FIFO];
        assert_eq!(choose_present_mode(&modes).unwrap(), vk::PresentModeKHR::FIFO);

        let modes = [vk::PresentModeKHR::IMMEDIATE, vk::PresentModeKHR::FIFO];
        assert_eq!(choose_present_mode(&modes).unwrap(), vk::PresentModeKHR::FIFO);
    }

    #[test]
    fn empty_queries_fail_negotiation() {
        assert!(matches!(
            choose_surface_format(&[]),
            Err(VulkanError::SurfaceNegotiationFailed { .. })
        ));
        assert!(matches!(
            choose_present_mode(&[]),
            Err(VulkanError::SurfaceNegotiationFailed { .. })
        ));
    }

    #[test]
    fn definite_surface_extent_is_used_verbatim() {
        let mut capabilities = capabilities(2, 3);
        capabilities.current_extent = vk::Extent2D {
            width: 800,
            height: 600,
        };

        let extent = choose_extent(&capabilities, (10_000, 1));
        assert_eq!((extent.width, extent.height), (800, 600));
    }

    #[test]
    fn framebuffer_extent_is_clamped_per_dimension() {
        let capabilities = capabilities(2, 3);

        for (size, expected) in [
            ((640, 480), (640, 480)),
            ((1, 10_000), (16, 2048)),
            ((10_000, 1), (4096, 16)),
            ((0, 0), (16, 16)),
        ] {
            let extent = choose_extent(&capabilities, size);
            assert_eq!((extent.width, extent.height), expected);
            assert!(extent.width >= 16 && extent.width <= 4096);
            assert!(extent.height >= 16 && extent.height <= 2048);
        }
    }

    #[test]
    fn image_count_stays_within_a_bounded_range() {
        for (min, max) in [(1, 3), (2, 3), (2, 8), (3, 4)] {
            let count = choose_image_count(&capabilities(min, max));
            assert!(min < count && count <= max, "{} not in ({}, {}]", count, min, max);
        }

        assert_eq!(choose_image_count(&capabilities(3, 3)), 3);
    }

    #[test]
    fn unbounded_image_count_is_one_more_than_the_minimum() {
        for min in [1, 2, 3, 8] {
            assert_eq!(choose_image_count(&capabilities(min, 0)), min + 1);
        }
    }

    #[test]
    fn negotiation_combines_every_choice() {
        let metadata = SwapchainMetadata::negotiate(
            &capabilities(2, 0),
            &[format(vk::Format::B8G8R8A8_SRGB, vk::ColorSpaceKHR::SRGB_NONLINEAR)],
            &[vk::PresentModeKHR::FIFO],
            (640, 480),
        )
        .unwrap();

        assert_eq!(metadata.surface_format.format, vk::Format::B8G8R8A8_SRGB);
        assert_eq!(metadata.present_mode, vk::PresentModeKHR::FIFO);
        assert_eq!((metadata.extent.width, metadata.extent.height), (640, 480));
        assert_eq!(metadata.pre_transform, vk::SurfaceTransformFlagsKHR::IDENTITY);
        assert_eq!(metadata.image_count, 3);
    }
}
