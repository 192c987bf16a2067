use super::context::VulkanContext;
use super::device::VulkanDevice;
use super::error::{reserve_handles, VulkanError};
use anyhow::Result;
use log::*;
use vulkanalia::prelude::v1_0::*;

pub struct VulkanFramebuffer;

impl VulkanFramebuffer {
    pub unsafe fn create(device: &VulkanDevice, context: &mut VulkanContext) -> Result<()> {
        let image_views = context.chain.image_views.clone();
        let extent = context.metadata.extent;

        context.resources.framebuffers = reserve_handles("framebuffers", image_views.len())?;

        for (i, view) in image_views.iter().enumerate() {
            let attachments = &[*view];
            let create_info = vk::FramebufferCreateInfo::builder()
                .render_pass(context.pipeline.render_pass)
                .attachments(attachments)
                .width(extent.width)
                .height(extent.height)
                .layers(1);

            let framebuffer = device
                .vk_device
                .create_framebuffer(&create_info, None)
                .map_err(VulkanError::creation("framebuffer"))?;
            debug!("Framebuffer {} created.", i);
            context.resources.framebuffers.push(framebuffer);
        }
        info!("Created {} framebuffers.", image_views.len());

        Ok(())
    }
}
