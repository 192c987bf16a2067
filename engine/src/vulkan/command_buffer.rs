use super::{
    constants,
    context::VulkanContext,
    device::VulkanDevice,
    error::VulkanError,
    framebuffer::VulkanFramebuffer,
};
use anyhow::Result;
use log::*;
use vulkanalia::prelude::v1_0::*;

/// Framebuffers and the command buffers that draw into them, one of each per
/// swapchain image. The command buffers are recorded once and replayed every frame.
#[derive(Clone, Debug, Default)]
pub struct FrameResources {
    pub framebuffers: Vec<vk::Framebuffer>,
    pub command_pool: vk::CommandPool,
    pub command_buffers: Vec<vk::CommandBuffer>,
}

#[derive(Debug)]
pub struct VulkanCommandBuffer;

impl VulkanCommandBuffer {
    pub unsafe fn build(device: &VulkanDevice, context: &mut VulkanContext) -> Result<()> {
        VulkanFramebuffer::create(device, context)?;
        VulkanCommandBuffer::create_command_pool(device, context)?;
        VulkanCommandBuffer::create_command_buffers(device, context)?;
        Ok(())
    }

    pub unsafe fn create_command_pool(
        device: &VulkanDevice,
        context: &mut VulkanContext,
    ) -> Result<()> {
        let info = vk::CommandPoolCreateInfo::builder()
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER)
            .queue_family_index(context.queue_family_index);

        context.resources.command_pool = device
            .vk_device
            .create_command_pool(&info, None)
            .map_err(VulkanError::creation("command pool"))?;
        info!("Command pool created.");

        Ok(())
    }

    pub unsafe fn create_command_buffers(
        device: &VulkanDevice,
        context: &mut VulkanContext,
    ) -> Result<()> {
        let allocate_info = vk::CommandBufferAllocateInfo::builder()
            .command_pool(context.resources.command_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(context.resources.framebuffers.len() as u32);

        context.resources.command_buffers = device
            .vk_device
            .allocate_command_buffers(&allocate_info)
            .map_err(VulkanError::creation("command buffers"))?;
        info!(
            "Allocated {} command buffers.",
            context.resources.command_buffers.len()
        );

        for (i, command_buffer) in context.resources.command_buffers.iter().enumerate() {
            VulkanCommandBuffer::record(
                device,
                context,
                *command_buffer,
                context.resources.framebuffers[i],
            )?;
        }
        info!("Command buffers recorded.");

        Ok(())
    }

    unsafe fn record(
        device: &VulkanDevice,
        context: &VulkanContext,
        command_buffer: vk::CommandBuffer,
        framebuffer: vk::Framebuffer,
    ) -> Result<()> {
        let info = vk::CommandBufferBeginInfo::builder()
            .flags(vk::CommandBufferUsageFlags::SIMULTANEOUS_USE);

        device
            .vk_device
            .begin_command_buffer(command_buffer, &info)
            .map_err(VulkanError::creation("command buffer recording"))?;

        let render_area = vk::Rect2D::builder()
            .offset(vk::Offset2D::default())
            .extent(context.metadata.extent);

        let color_clear_value = vk::ClearValue {
            color: vk::ClearColorValue {
                float32: constants::CLEAR_COLOR,
            },
        };

        let clear_values = &[color_clear_value];
        let info = vk::RenderPassBeginInfo::builder()
            .render_pass(context.pipeline.render_pass)
            .framebuffer(framebuffer)
            .render_area(render_area)
            .clear_values(clear_values);

        device
            .vk_device
            .cmd_begin_render_pass(command_buffer, &info, vk::SubpassContents::INLINE);

        device.vk_device.cmd_bind_pipeline(
            command_buffer,
            vk::PipelineBindPoint::GRAPHICS,
            context.pipeline.pipeline,
        );

        device
            .vk_device
            .cmd_draw(command_buffer, constants::TRIANGLE_VERTEX_COUNT, 1, 0, 0);
        device.vk_device.cmd_end_render_pass(command_buffer);

        device
            .vk_device
            .end_command_buffer(command_buffer)
            .map_err(VulkanError::creation("command buffer recording"))?;

        Ok(())
    }
}
