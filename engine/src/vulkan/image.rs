use anyhow::Result;
use log::*;
use vulkanalia::prelude::v1_0::*;

use super::context::VulkanContext;
use super::device::VulkanDevice;
use super::error::{reserve_handles, VulkanError};

#[derive(Debug)]
pub struct VulkanImage;

impl VulkanImage {
    /// One 2D colour view per swapchain image, index for index.
    pub unsafe fn create_views(device: &VulkanDevice, context: &mut VulkanContext) -> Result<()> {
        let images = context.chain.images.clone();
        let format = context.metadata.surface_format.format;

        context.chain.image_views = reserve_handles("image views", images.len())?;

        let components = vk::ComponentMapping::builder()
            .r(vk::ComponentSwizzle::IDENTITY)
            .g(vk::ComponentSwizzle::IDENTITY)
            .b(vk::ComponentSwizzle::IDENTITY)
            .a(vk::ComponentSwizzle::IDENTITY)
            .build();

        let subresource_range = vk::ImageSubresourceRange::builder()
            .aspect_mask(vk::ImageAspectFlags::COLOR)
            .base_mip_level(0)
            .level_count(1)
            .base_array_layer(0)
            .layer_count(1)
            .build();

        for (i, image) in images.iter().enumerate() {
            let info = vk::ImageViewCreateInfo::builder()
                .image(*image)
                .view_type(vk::ImageViewType::_2D)
                .format(format)
                .components(components)
                .subresource_range(subresource_range);

            let view = device
                .vk_device
                .create_image_view(&info, None)
                .map_err(VulkanError::creation("image view"))?;
            debug!("Image view {} created.", i);
            context.chain.image_views.push(view);
        }
        info!("Created {} swapchain image views.", images.len());

        Ok(())
    }
}
