use std::path::Path;

use anyhow::Result;
use log::*;
use vulkanalia::prelude::v1_0::*;

use super::constants;
use super::context::VulkanContext;
use super::device::VulkanDevice;
use super::error::VulkanError;
use super::render_pass::VulkanRenderPass;
use super::shader::TransientShaderModule;

/// The render pass and the fixed graphics pipeline drawn inside it.
///
/// Viewport and scissor are baked to the swapchain extent, so a new extent
/// needs a new pipeline.
#[derive(Clone, Debug, Default)]
pub struct VulkanPipeline {
    pub render_pass: vk::RenderPass,
    pub pipeline_layout: vk::PipelineLayout,
    pub pipeline: vk::Pipeline,
}

impl VulkanPipeline {
    pub unsafe fn build(
        device: &VulkanDevice,
        vertex_shader: &Path,
        fragment_shader: &Path,
        context: &mut VulkanContext,
    ) -> Result<()> {
        VulkanRenderPass::create(device, context)?;

        // Both modules are destroyed when they go out of scope, whatever happens below.
        let vertex_shader_module = TransientShaderModule::load(device, vertex_shader)?;
        let fragment_shader_module = TransientShaderModule::load(device, fragment_shader)?;

        let vert_stage = vk::PipelineShaderStageCreateInfo::builder()
            .stage(vk::ShaderStageFlags::VERTEX)
            .module(vertex_shader_module.module)
            .name(constants::SHADER_ENTRY_POINT);

        let frag_stage = vk::PipelineShaderStageCreateInfo::builder()
            .stage(vk::ShaderStageFlags::FRAGMENT)
            .module(fragment_shader_module.module)
            .name(constants::SHADER_ENTRY_POINT);

        // The vertex shader emits its positions itself.
        let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::builder();
        let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::builder()
            .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
            .primitive_restart_enable(false);

        let viewport = full_viewport(context.metadata.extent);
        let scissor = full_scissor(context.metadata.extent);

        let viewports = &[viewport];
        let scissors = &[scissor];
        let viewport_state = vk::PipelineViewportStateCreateInfo::builder()
            .viewports(viewports)
            .scissors(scissors);

        // rasterizer
        let rasterization_state = vk::PipelineRasterizationStateCreateInfo::builder()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(vk::PolygonMode::FILL)
            .line_width(1.0)
            .cull_mode(vk::CullModeFlags::BACK)
            .front_face(vk::FrontFace::CLOCKWISE)
            .depth_bias_enable(false);

        // multisampling
        let multisample_state = vk::PipelineMultisampleStateCreateInfo::builder()
            .sample_shading_enable(false)
            .rasterization_samples(vk::SampleCountFlags::_1);

        // color blending
        let attachment = vk::PipelineColorBlendAttachmentState::builder()
            .color_write_mask(vk::ColorComponentFlags::all())
            .blend_enable(false);

        let attachments = &[attachment];
        let color_blend_state = vk::PipelineColorBlendStateCreateInfo::builder()
            .logic_op_enable(false)
            .logic_op(vk::LogicOp::COPY)
            .attachments(attachments)
            .blend_constants([0.0, 0.0, 0.0, 0.0]);

        // layout
        let layout_info = vk::PipelineLayoutCreateInfo::builder();
        context.pipeline.pipeline_layout = device
            .vk_device
            .create_pipeline_layout(&layout_info, None)
            .map_err(VulkanError::PipelineLayoutCreationFailed)?;
        info!("Pipeline layout created.");

        let stages = &[vert_stage, frag_stage];
        let info = vk::GraphicsPipelineCreateInfo::builder()
            .stages(stages)
            .vertex_input_state(&vertex_input_state)
            .input_assembly_state(&input_assembly_state)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization_state)
            .multisample_state(&multisample_state)
            .color_blend_state(&color_blend_state)
            .layout(context.pipeline.pipeline_layout)
            .render_pass(context.pipeline.render_pass)
            .subpass(0);

        context.pipeline.pipeline = device
            .vk_device
            .create_graphics_pipelines(vk::PipelineCache::null(), &[info], None)
            .map_err(VulkanError::PipelineCreationFailed)?
            .0[0];
        info!("Graphics pipeline created.");

        Ok(())
    }
}

fn full_viewport(extent: vk::Extent2D) -> vk::Viewport {
    vk::Viewport::builder()
        .width(extent.width as f32)
        .height(extent.height as f32)
        .max_depth(1.0)
        .build()
}

fn full_scissor(extent: vk::Extent2D) -> vk::Rect2D {
    vk::Rect2D::builder()
        .offset(vk::Offset2D::default())
        .extent(extent)
        .build()
}
